use async_trait::async_trait;
use thiserror::Error;

mod data;
pub use data::*;

mod pg;
pub use pg::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> DatabaseResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(e) => match e {
                DatabaseError::NotFound { .. } => Ok(()),
                e => Err(e),
            },
        }
    }
}

/// Represents a type that can fetch and mutate PlaySync data in a database
#[async_trait]
pub trait Database: Send + Sync {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData>;
    async fn user_by_username(&self, username: &str) -> Result<UserData>;
    /// Looks a user up by username or email, whichever matches
    async fn user_by_identity(&self, identity: &str) -> Result<UserData>;
    /// Fails with a conflict if the username or email is already taken
    async fn ensure_identity_available(&self, username: &str, email: &str) -> Result<()>;
    async fn create_user(&self, new_user: NewUser) -> Result<UserData>;
    async fn update_profile(&self, updated: UpdatedProfile) -> Result<UserData>;
    async fn update_password(&self, user_id: PrimaryKey, password_hash: &str) -> Result<()>;
    async fn set_refresh_token(&self, user_id: PrimaryKey, token: Option<&str>) -> Result<()>;
    /// Deletes a user and everything owned by or referencing them, in one
    /// transaction
    async fn delete_user_cascade(&self, user_id: PrimaryKey) -> Result<()>;
    async fn channel_profile(
        &self,
        username: &str,
        viewer: Option<PrimaryKey>,
    ) -> Result<ChannelProfileData>;

    async fn watch_history(&self, user_id: PrimaryKey) -> Result<Vec<VideoWithOwner>>;
    /// Appends a video to the history unless it's already present
    async fn push_watch_history(&self, user_id: PrimaryKey, video_id: PrimaryKey) -> Result<()>;
    /// Removes one video from the history, or clears it entirely
    async fn remove_watch_history(
        &self,
        user_id: PrimaryKey,
        video_id: Option<PrimaryKey>,
    ) -> Result<()>;

    async fn list_videos(&self, query: VideoQuery) -> Result<Paginated<VideoWithOwner>>;
    async fn video_by_id(&self, video_id: PrimaryKey) -> Result<VideoWithOwner>;
    async fn create_video(&self, new_video: NewVideo) -> Result<VideoData>;
    async fn update_video(&self, updated: UpdatedVideo) -> Result<VideoData>;
    async fn delete_video(&self, video_id: PrimaryKey) -> Result<()>;
    async fn set_video_published(&self, video_id: PrimaryKey, published: bool)
        -> Result<VideoData>;
    /// Atomic `views = views + 1`, immune to concurrent lost updates
    async fn increment_views(&self, video_id: PrimaryKey) -> Result<VideoData>;
    async fn videos_by_owner(&self, owner_id: PrimaryKey) -> Result<Vec<VideoWithOwner>>;
    async fn search_videos(&self, term: &str) -> Result<Vec<VideoWithOwner>>;
    async fn related_videos(&self, video_id: PrimaryKey, limit: u32)
        -> Result<Vec<VideoWithOwner>>;
    /// Published videos of every channel the user subscribes to, newest first
    async fn subscribed_videos(&self, user_id: PrimaryKey) -> Result<Vec<VideoWithOwner>>;

    async fn comments_by_video(
        &self,
        video_id: PrimaryKey,
        page: u32,
        limit: u32,
    ) -> Result<Vec<CommentWithAuthor>>;
    async fn comment_by_id(&self, comment_id: PrimaryKey) -> Result<CommentData>;
    async fn create_comment(&self, new_comment: NewComment) -> Result<CommentWithAuthor>;
    async fn update_comment(&self, comment_id: PrimaryKey, content: &str)
        -> Result<CommentWithAuthor>;
    async fn delete_comment(&self, comment_id: PrimaryKey) -> Result<()>;

    /// Removes the like if it exists, creates it otherwise. Returns whether
    /// the target is liked afterwards. Safe against concurrent toggles.
    async fn toggle_like(&self, user_id: PrimaryKey, target: LikeTarget) -> Result<bool>;
    async fn liked_videos(&self, user_id: PrimaryKey) -> Result<Vec<VideoWithOwner>>;

    /// Same toggle semantics as [Database::toggle_like]
    async fn toggle_subscription(
        &self,
        subscriber_id: PrimaryKey,
        channel_id: PrimaryKey,
    ) -> Result<bool>;
    async fn channel_subscribers(&self, channel_id: PrimaryKey) -> Result<Vec<UserData>>;
    async fn subscribed_channels(&self, subscriber_id: PrimaryKey) -> Result<Vec<UserData>>;

    async fn create_playlist(&self, new_playlist: NewPlaylist) -> Result<PlaylistData>;
    async fn playlist_by_id(&self, playlist_id: PrimaryKey) -> Result<PlaylistWithVideos>;
    async fn playlists_by_owner(&self, owner_id: PrimaryKey) -> Result<Vec<PlaylistWithVideos>>;
    async fn update_playlist(&self, updated: UpdatedPlaylist) -> Result<PlaylistData>;
    async fn add_video_to_playlist(
        &self,
        playlist_id: PrimaryKey,
        video_id: PrimaryKey,
    ) -> Result<()>;
    async fn remove_video_from_playlist(
        &self,
        playlist_id: PrimaryKey,
        video_id: PrimaryKey,
    ) -> Result<()>;
    async fn delete_playlist(&self, playlist_id: PrimaryKey) -> Result<()>;

    async fn create_tweet(&self, new_tweet: NewTweet) -> Result<TweetData>;
    async fn tweet_by_id(&self, tweet_id: PrimaryKey) -> Result<TweetData>;
    async fn tweets_by_owner(&self, owner_id: PrimaryKey) -> Result<Vec<TweetData>>;
    async fn update_tweet(&self, tweet_id: PrimaryKey, content: &str) -> Result<TweetData>;
    async fn delete_tweet(&self, tweet_id: PrimaryKey) -> Result<()>;

    async fn channel_stats(&self, user_id: PrimaryKey) -> Result<ChannelStatsData>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_conflict_or_ok() {
        let taken: Result<u32> = Ok(1);
        let free: Result<u32> = Err(DatabaseError::NotFound {
            resource: "user",
            identifier: "username",
        });
        let broken: Result<u32> = Err(DatabaseError::Internal("connection lost".into()));

        assert!(matches!(
            taken.conflict_or_ok("user", "username", "kira"),
            Err(DatabaseError::Conflict { field: "username", .. })
        ));
        assert!(free.conflict_or_ok("user", "username", "kira").is_ok());
        assert!(matches!(
            broken.conflict_or_ok("user", "username", "kira"),
            Err(DatabaseError::Internal(_))
        ));
    }
}
