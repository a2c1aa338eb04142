use chrono::{DateTime, Utc};

/// The type used for primary keys in the database.
pub type PrimaryKey = i32;

/// A PlaySync account
#[derive(Debug, Clone)]
pub struct UserData {
    pub id: PrimaryKey,
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    /// The currently valid refresh token, if the user has an active session
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An uploaded video
#[derive(Debug, Clone)]
pub struct VideoData {
    pub id: PrimaryKey,
    pub title: String,
    pub description: String,
    /// Duration in seconds, as reported by the uploader
    pub duration: f64,
    pub video_url: String,
    pub thumbnail_url: String,
    pub views: i64,
    pub is_published: bool,
    pub owner_id: PrimaryKey,
    pub created_at: DateTime<Utc>,
}

/// A video with its owner denormalized
#[derive(Debug, Clone)]
pub struct VideoWithOwner {
    pub video: VideoData,
    pub owner: UserData,
}

#[derive(Debug, Clone)]
pub struct CommentData {
    pub id: PrimaryKey,
    pub content: String,
    pub video_id: PrimaryKey,
    pub owner_id: PrimaryKey,
    pub created_at: DateTime<Utc>,
}

/// A comment with its author denormalized
#[derive(Debug, Clone)]
pub struct CommentWithAuthor {
    pub comment: CommentData,
    pub author: UserData,
}

/// What a like points at.
///
/// A tagged target makes a like that points at two things at once
/// unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Video(PrimaryKey),
    Comment(PrimaryKey),
    Tweet(PrimaryKey),
}

impl LikeTarget {
    /// The discriminant as stored in the `target_type` column
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Video(_) => "video",
            Self::Comment(_) => "comment",
            Self::Tweet(_) => "tweet",
        }
    }

    pub fn id(&self) -> PrimaryKey {
        match self {
            Self::Video(id) | Self::Comment(id) | Self::Tweet(id) => *id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaylistData {
    pub id: PrimaryKey,
    pub name: String,
    pub description: String,
    pub owner_id: PrimaryKey,
    pub created_at: DateTime<Utc>,
}

/// A playlist with its owner and ordered videos populated
#[derive(Debug, Clone)]
pub struct PlaylistWithVideos {
    pub playlist: PlaylistData,
    pub owner: UserData,
    pub videos: Vec<VideoWithOwner>,
}

#[derive(Debug, Clone)]
pub struct TweetData {
    pub id: PrimaryKey,
    pub content: String,
    pub owner_id: PrimaryKey,
    pub created_at: DateTime<Utc>,
}

/// A user viewed as a channel, with derived counts computed at query time
#[derive(Debug, Clone)]
pub struct ChannelProfileData {
    pub user: UserData,
    pub subscriber_count: i64,
    pub subscribed_to_count: i64,
    /// Whether the viewing user subscribes to this channel
    pub is_subscribed: bool,
    pub videos: Vec<VideoData>,
}

/// Aggregate numbers for the dashboard of a channel
#[derive(Debug, Clone, Copy)]
pub struct ChannelStatsData {
    pub total_views: i64,
    pub total_videos: i64,
    pub total_subscribers: i64,
    pub total_likes: i64,
}

/// One page of a larger result set
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    /// Already hashed by the auth layer
    pub password: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
}

#[derive(Debug)]
pub struct UpdatedProfile {
    pub id: PrimaryKey,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
}

#[derive(Debug)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub video_url: String,
    pub thumbnail_url: String,
    pub owner_id: PrimaryKey,
}

#[derive(Debug)]
pub struct UpdatedVideo {
    pub id: PrimaryKey,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
}

/// Sortable columns for video listings.
///
/// A closed set so a caller-supplied sort key can never reach the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSort {
    #[default]
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl VideoSort {
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Views => "views",
            Self::Duration => "duration",
            Self::Title => "title",
        }
    }

    /// Maps a query string value to a sort column, ignoring unknown values
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            "views" => Some(Self::Views),
            "duration" => Some(Self::Duration),
            "title" => Some(Self::Title),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct VideoQuery {
    pub page: u32,
    pub limit: u32,
    /// Case-insensitive substring match against title or description
    pub query: Option<String>,
    pub owner_id: Option<PrimaryKey>,
    pub sort_by: VideoSort,
    pub ascending: bool,
}

impl Default for VideoQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            query: None,
            owner_id: None,
            sort_by: VideoSort::default(),
            ascending: false,
        }
    }
}

#[derive(Debug)]
pub struct NewComment {
    pub content: String,
    pub video_id: PrimaryKey,
    pub owner_id: PrimaryKey,
}

#[derive(Debug)]
pub struct NewPlaylist {
    pub name: String,
    pub description: String,
    pub owner_id: PrimaryKey,
}

#[derive(Debug)]
pub struct UpdatedPlaylist {
    pub id: PrimaryKey,
    pub name: String,
    pub description: String,
}

#[derive(Debug)]
pub struct NewTweet {
    pub content: String,
    pub owner_id: PrimaryKey,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_like_target_mapping() {
        let video = LikeTarget::Video(3);
        let comment = LikeTarget::Comment(4);
        let tweet = LikeTarget::Tweet(5);

        assert_eq!(video.kind(), "video");
        assert_eq!(comment.kind(), "comment");
        assert_eq!(tweet.kind(), "tweet");

        assert_eq!(video.id(), 3);
        assert_eq!(comment.id(), 4);
        assert_eq!(tweet.id(), 5);
    }

    #[test]
    fn test_video_sort_keys() {
        assert_eq!(VideoSort::from_key("createdAt"), Some(VideoSort::CreatedAt));
        assert_eq!(VideoSort::from_key("views"), Some(VideoSort::Views));
        assert_eq!(VideoSort::from_key("nonsense"), None);
        assert_eq!(VideoSort::default().column(), "created_at");
    }
}
