//! All schemas that are exposed from endpoints are defined here
//! along with the conversions from store data

use chrono::{DateTime, Utc};
use playsync_store::{
    ChannelProfileData, ChannelStatsData, CommentWithAuthor, Paginated, PlaylistWithVideos,
    TokenPair, TweetData, UserData, VideoData, VideoWithOwner,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: i32,
    username: String,
    email: String,
    full_name: String,
    avatar_url: String,
    cover_image_url: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    user: User,
    access_token: String,
    refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedTokens {
    access_token: String,
    refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    id: i32,
    title: String,
    description: String,
    duration: f64,
    video_file: String,
    thumbnail: String,
    views: i64,
    is_published: bool,
    /// Absent in contexts where the owner is implied
    owner: Option<User>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoPage {
    videos: Vec<Video>,
    total_videos: i64,
    page: u32,
    limit: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    id: i32,
    content: String,
    video_id: i32,
    owner: User,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    user: User,
    subscribers_count: i64,
    channels_subscribed_to_count: i64,
    is_subscribed: bool,
    videos: Vec<Video>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    id: i32,
    name: String,
    description: String,
    owner: User,
    videos: Vec<Video>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    id: i32,
    content: String,
    owner_id: i32,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    total_views: i64,
    total_videos: i64,
    total_subscribers: i64,
    total_likes: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    pub liked: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub subscribed: bool,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<User> for UserData {
    fn to_serialized(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            avatar_url: self.avatar_url.clone(),
            cover_image_url: self.cover_image_url.clone(),
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<Video> for VideoData {
    fn to_serialized(&self) -> Video {
        Video {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            duration: self.duration,
            video_file: self.video_url.clone(),
            thumbnail: self.thumbnail_url.clone(),
            views: self.views,
            is_published: self.is_published,
            owner: None,
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<Video> for VideoWithOwner {
    fn to_serialized(&self) -> Video {
        let mut video = self.video.to_serialized();
        video.owner = Some(self.owner.to_serialized());

        video
    }
}

impl ToSerialized<VideoPage> for Paginated<VideoWithOwner> {
    fn to_serialized(&self) -> VideoPage {
        VideoPage {
            videos: self.items.to_serialized(),
            total_videos: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}

impl ToSerialized<Comment> for CommentWithAuthor {
    fn to_serialized(&self) -> Comment {
        Comment {
            id: self.comment.id,
            content: self.comment.content.clone(),
            video_id: self.comment.video_id,
            owner: self.author.to_serialized(),
            created_at: self.comment.created_at,
        }
    }
}

impl ToSerialized<ChannelProfile> for ChannelProfileData {
    fn to_serialized(&self) -> ChannelProfile {
        ChannelProfile {
            user: self.user.to_serialized(),
            subscribers_count: self.subscriber_count,
            channels_subscribed_to_count: self.subscribed_to_count,
            is_subscribed: self.is_subscribed,
            videos: self.videos.to_serialized(),
        }
    }
}

impl ToSerialized<Playlist> for PlaylistWithVideos {
    fn to_serialized(&self) -> Playlist {
        Playlist {
            id: self.playlist.id,
            name: self.playlist.name.clone(),
            description: self.playlist.description.clone(),
            owner: self.owner.to_serialized(),
            videos: self.videos.to_serialized(),
            created_at: self.playlist.created_at,
        }
    }
}

impl ToSerialized<Tweet> for TweetData {
    fn to_serialized(&self) -> Tweet {
        Tweet {
            id: self.id,
            content: self.content.clone(),
            owner_id: self.owner_id,
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<ChannelStats> for ChannelStatsData {
    fn to_serialized(&self) -> ChannelStats {
        ChannelStats {
            total_views: self.total_views,
            total_videos: self.total_videos,
            total_subscribers: self.total_subscribers,
            total_likes: self.total_likes,
        }
    }
}

impl ToSerialized<RefreshedTokens> for TokenPair {
    fn to_serialized(&self) -> RefreshedTokens {
        RefreshedTokens {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}

pub fn login_result(user: &UserData, pair: &TokenPair) -> LoginResult {
    LoginResult {
        user: user.to_serialized(),
        access_token: pair.access_token.clone(),
        refresh_token: pair.refresh_token.clone(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn user_data() -> UserData {
        UserData {
            id: 1,
            username: "kira".to_string(),
            email: "kira@example.com".to_string(),
            password: "$argon2id$hash".to_string(),
            full_name: "Kira".to_string(),
            avatar_url: "https://media.example/avatar.png".to_string(),
            cover_image_url: None,
            refresh_token: Some("secret-token".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_serialization_omits_secrets() {
        let serialized = user_data().to_serialized();
        let value = serde_json::to_value(serialized).expect("serializes");

        assert_eq!(value["username"], "kira");
        assert_eq!(value["fullName"], "Kira");
        assert!(value.get("password").is_none());
        assert!(value.get("refreshToken").is_none());
    }

    #[test]
    fn test_video_owner_is_attached() {
        let video = VideoData {
            id: 7,
            title: "Test".to_string(),
            description: String::new(),
            duration: 12.5,
            video_url: "https://media.example/v.mp4".to_string(),
            thumbnail_url: "https://media.example/t.png".to_string(),
            views: 3,
            is_published: true,
            owner_id: 1,
            created_at: Utc::now(),
        };

        let with_owner = VideoWithOwner {
            video,
            owner: user_data(),
        };

        let value = serde_json::to_value(with_owner.to_serialized()).expect("serializes");

        assert_eq!(value["videoFile"], "https://media.example/v.mp4");
        assert_eq!(value["thumbnail"], "https://media.example/t.png");
        assert_eq!(value["owner"]["username"], "kira");
    }
}
