use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    postgres::PgPoolOptions, prelude::FromRow, Error as SqlxError, PgPool, Postgres, QueryBuilder,
};

use crate::{
    util::like_pattern, ChannelProfileData, ChannelStatsData, CommentData, CommentWithAuthor,
    Database, DatabaseError, DatabaseResult, IntoDatabaseError, LikeTarget, NewComment,
    NewPlaylist, NewTweet, NewUser, NewVideo, Paginated, PlaylistData, PlaylistWithVideos,
    PrimaryKey, Result, TweetData, UpdatedPlaylist, UpdatedProfile, UpdatedVideo, UserData,
    VideoData, VideoQuery, VideoWithOwner,
};

/// A postgres database implementation for PlaySync
pub struct PgDatabase {
    pool: PgPool,
}

#[derive(FromRow)]
struct UserRow {
    id: PrimaryKey,
    username: String,
    email: String,
    password: String,
    full_name: String,
    avatar_url: String,
    cover_image_url: Option<String>,
    refresh_token: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserData {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            password: row.password,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            cover_image_url: row.cover_image_url,
            refresh_token: row.refresh_token,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct VideoRow {
    id: PrimaryKey,
    title: String,
    description: String,
    duration: f64,
    video_url: String,
    thumbnail_url: String,
    views: i64,
    is_published: bool,
    owner_id: PrimaryKey,
    created_at: DateTime<Utc>,
}

impl From<VideoRow> for VideoData {
    fn from(row: VideoRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            duration: row.duration,
            video_url: row.video_url,
            thumbnail_url: row.thumbnail_url,
            views: row.views,
            is_published: row.is_published,
            owner_id: row.owner_id,
            created_at: row.created_at,
        }
    }
}

/// A video joined with its owner, flattened with `u_` aliases
#[derive(FromRow)]
struct VideoOwnerRow {
    id: PrimaryKey,
    title: String,
    description: String,
    duration: f64,
    video_url: String,
    thumbnail_url: String,
    views: i64,
    is_published: bool,
    owner_id: PrimaryKey,
    created_at: DateTime<Utc>,
    u_id: PrimaryKey,
    u_username: String,
    u_email: String,
    u_password: String,
    u_full_name: String,
    u_avatar_url: String,
    u_cover_image_url: Option<String>,
    u_refresh_token: Option<String>,
    u_created_at: DateTime<Utc>,
}

impl From<VideoOwnerRow> for VideoWithOwner {
    fn from(row: VideoOwnerRow) -> Self {
        Self {
            video: VideoData {
                id: row.id,
                title: row.title,
                description: row.description,
                duration: row.duration,
                video_url: row.video_url,
                thumbnail_url: row.thumbnail_url,
                views: row.views,
                is_published: row.is_published,
                owner_id: row.owner_id,
                created_at: row.created_at,
            },
            owner: UserData {
                id: row.u_id,
                username: row.u_username,
                email: row.u_email,
                password: row.u_password,
                full_name: row.u_full_name,
                avatar_url: row.u_avatar_url,
                cover_image_url: row.u_cover_image_url,
                refresh_token: row.u_refresh_token,
                created_at: row.u_created_at,
            },
        }
    }
}

#[derive(FromRow)]
struct CommentAuthorRow {
    id: PrimaryKey,
    content: String,
    video_id: PrimaryKey,
    owner_id: PrimaryKey,
    created_at: DateTime<Utc>,
    u_id: PrimaryKey,
    u_username: String,
    u_email: String,
    u_password: String,
    u_full_name: String,
    u_avatar_url: String,
    u_cover_image_url: Option<String>,
    u_refresh_token: Option<String>,
    u_created_at: DateTime<Utc>,
}

impl From<CommentAuthorRow> for CommentWithAuthor {
    fn from(row: CommentAuthorRow) -> Self {
        Self {
            comment: CommentData {
                id: row.id,
                content: row.content,
                video_id: row.video_id,
                owner_id: row.owner_id,
                created_at: row.created_at,
            },
            author: UserData {
                id: row.u_id,
                username: row.u_username,
                email: row.u_email,
                password: row.u_password,
                full_name: row.u_full_name,
                avatar_url: row.u_avatar_url,
                cover_image_url: row.u_cover_image_url,
                refresh_token: row.u_refresh_token,
                created_at: row.u_created_at,
            },
        }
    }
}

#[derive(FromRow)]
struct PlaylistRow {
    id: PrimaryKey,
    name: String,
    description: String,
    owner_id: PrimaryKey,
    created_at: DateTime<Utc>,
}

impl From<PlaylistRow> for PlaylistData {
    fn from(row: PlaylistRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            owner_id: row.owner_id,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct TweetRow {
    id: PrimaryKey,
    content: String,
    owner_id: PrimaryKey,
    created_at: DateTime<Utc>,
}

impl From<TweetRow> for TweetData {
    fn from(row: TweetRow) -> Self {
        Self {
            id: row.id,
            content: row.content,
            owner_id: row.owner_id,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct ChannelStatsRow {
    total_views: i64,
    total_videos: i64,
    total_subscribers: i64,
    total_likes: i64,
}

const USER_ALIAS_COLUMNS: &str = "u.id AS u_id, u.username AS u_username, u.email AS u_email, \
     u.password AS u_password, u.full_name AS u_full_name, u.avatar_url AS u_avatar_url, \
     u.cover_image_url AS u_cover_image_url, u.refresh_token AS u_refresh_token, \
     u.created_at AS u_created_at";

fn video_owner_select() -> String {
    format!(
        "SELECT v.id, v.title, v.description, v.duration, v.video_url, v.thumbnail_url, \
         v.views, v.is_published, v.owner_id, v.created_at, {USER_ALIAS_COLUMNS} \
         FROM videos v INNER JOIN users u ON u.id = v.owner_id"
    )
}

fn comment_author_select() -> String {
    format!(
        "SELECT c.id, c.content, c.video_id, c.owner_id, c.created_at, {USER_ALIAS_COLUMNS} \
         FROM comments c INNER JOIN users u ON u.id = c.owner_id"
    )
}

impl PgDatabase {
    pub async fn new(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))?;

        Ok(Self { pool })
    }

    async fn fetch_user(&self, sql: &str, bind: &str, identifier: &'static str) -> Result<UserData> {
        sqlx::query_as::<_, UserRow>(sql)
            .bind(bind)
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("user", identifier))
    }

    async fn playlist_videos(&self, playlist_id: PrimaryKey) -> Result<Vec<VideoWithOwner>> {
        let sql = format!(
            "{} INNER JOIN playlist_videos pv ON pv.video_id = v.id \
             WHERE pv.playlist_id = $1 ORDER BY pv.position ASC",
            video_owner_select()
        );

        let rows = sqlx::query_as::<_, VideoOwnerRow>(&sql)
            .bind(playlist_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn comment_with_author(&self, comment_id: PrimaryKey) -> Result<CommentWithAuthor> {
        let sql = format!("{} WHERE c.id = $1", comment_author_select());

        sqlx::query_as::<_, CommentAuthorRow>(&sql)
            .bind(comment_id)
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("comment", "id"))
    }

    /// Verifies the like target exists before a toggle touches the likes table
    async fn ensure_target_exists(&self, target: LikeTarget) -> Result<()> {
        let (sql, resource) = match target {
            LikeTarget::Video(_) => ("SELECT id FROM videos WHERE id = $1", "video"),
            LikeTarget::Comment(_) => ("SELECT id FROM comments WHERE id = $1", "comment"),
            LikeTarget::Tweet(_) => ("SELECT id FROM tweets WHERE id = $1", "tweet"),
        };

        sqlx::query_scalar::<_, PrimaryKey>(sql)
            .bind(target.id())
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| e.not_found_or(resource, "id"))
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("user", "id"))
    }

    async fn user_by_username(&self, username: &str) -> Result<UserData> {
        self.fetch_user("SELECT * FROM users WHERE username = $1", username, "username")
            .await
    }

    async fn user_by_identity(&self, identity: &str) -> Result<UserData> {
        self.fetch_user(
            "SELECT * FROM users WHERE username = $1 OR email = $1",
            identity,
            "username or email",
        )
        .await
    }

    async fn ensure_identity_available(&self, username: &str, email: &str) -> Result<()> {
        self.user_by_username(username)
            .await
            .conflict_or_ok("user", "username", username)?;

        self.fetch_user("SELECT * FROM users WHERE email = $1", email, "email")
            .await
            .conflict_or_ok("user", "email", email)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        self.ensure_identity_available(&new_user.username, &new_user.email)
            .await?;

        sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (username, email, password, full_name, avatar_url, cover_image_url) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(&new_user.full_name)
        .bind(&new_user.avatar_url)
        .bind(&new_user.cover_image_url)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| conflict_on_unique(e, "user", "username or email", &new_user.username))
    }

    async fn update_profile(&self, updated: UpdatedProfile) -> Result<UserData> {
        let user = self.user_by_id(updated.id).await?;

        sqlx::query(
            "UPDATE users SET full_name = $1, email = $2, avatar_url = $3, cover_image_url = $4 \
             WHERE id = $5",
        )
        .bind(updated.full_name.unwrap_or(user.full_name))
        .bind(updated.email.as_deref().unwrap_or(&user.email))
        .bind(updated.avatar_url.unwrap_or(user.avatar_url))
        .bind(updated.cover_image_url.or(user.cover_image_url))
        .bind(updated.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(e, "user", "email", updated.email.as_deref().unwrap_or(""))
        })?;

        self.user_by_id(updated.id).await
    }

    async fn update_password(&self, user_id: PrimaryKey, password_hash: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            });
        }

        Ok(())
    }

    async fn set_refresh_token(&self, user_id: PrimaryKey, token: Option<&str>) -> Result<()> {
        sqlx::query("UPDATE users SET refresh_token = $1 WHERE id = $2")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn delete_user_cascade(&self, user_id: PrimaryKey) -> Result<()> {
        // Ensure user exists
        let _ = self.user_by_id(user_id).await?;

        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        let statements = [
            "DELETE FROM likes WHERE user_id = $1",
            "DELETE FROM likes WHERE target_type = 'video' \
             AND target_id IN (SELECT id FROM videos WHERE owner_id = $1)",
            "DELETE FROM likes WHERE target_type = 'comment' \
             AND target_id IN (SELECT id FROM comments WHERE owner_id = $1 \
             OR video_id IN (SELECT id FROM videos WHERE owner_id = $1))",
            "DELETE FROM likes WHERE target_type = 'tweet' \
             AND target_id IN (SELECT id FROM tweets WHERE owner_id = $1)",
            "DELETE FROM comments WHERE owner_id = $1 \
             OR video_id IN (SELECT id FROM videos WHERE owner_id = $1)",
            "DELETE FROM playlist_videos WHERE playlist_id IN \
             (SELECT id FROM playlists WHERE owner_id = $1) \
             OR video_id IN (SELECT id FROM videos WHERE owner_id = $1)",
            "DELETE FROM watch_history WHERE user_id = $1 \
             OR video_id IN (SELECT id FROM videos WHERE owner_id = $1)",
            "DELETE FROM subscriptions WHERE subscriber_id = $1 OR channel_id = $1",
            "DELETE FROM playlists WHERE owner_id = $1",
            "DELETE FROM tweets WHERE owner_id = $1",
            "DELETE FROM videos WHERE owner_id = $1",
            "DELETE FROM users WHERE id = $1",
        ];

        for statement in statements {
            sqlx::query(statement)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| e.any())?;
        }

        tx.commit().await.map_err(|e| e.any())
    }

    async fn channel_profile(
        &self,
        username: &str,
        viewer: Option<PrimaryKey>,
    ) -> Result<ChannelProfileData> {
        let user = self.user_by_username(username).await?;

        let subscriber_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM subscriptions WHERE channel_id = $1",
        )
        .bind(user.id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        let subscribed_to_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = $1",
        )
        .bind(user.id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        let is_subscribed = match viewer {
            Some(viewer_id) => sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM subscriptions \
                 WHERE channel_id = $1 AND subscriber_id = $2)",
            )
            .bind(user.id)
            .bind(viewer_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.any())?,
            None => false,
        };

        let videos = sqlx::query_as::<_, VideoRow>(
            "SELECT * FROM videos WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(user.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        Ok(ChannelProfileData {
            user,
            subscriber_count,
            subscribed_to_count,
            is_subscribed,
            videos: videos.into_iter().map(Into::into).collect(),
        })
    }

    async fn watch_history(&self, user_id: PrimaryKey) -> Result<Vec<VideoWithOwner>> {
        let sql = format!(
            "{} INNER JOIN watch_history wh ON wh.video_id = v.id \
             WHERE wh.user_id = $1 ORDER BY wh.position ASC",
            video_owner_select()
        );

        let rows = sqlx::query_as::<_, VideoOwnerRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn push_watch_history(&self, user_id: PrimaryKey, video_id: PrimaryKey) -> Result<()> {
        // Ensure video exists
        let _ = self.video_by_id(video_id).await?;

        sqlx::query(
            "INSERT INTO watch_history (user_id, video_id, position) \
             VALUES ($1, $2, COALESCE((SELECT MAX(position) + 1 FROM watch_history \
             WHERE user_id = $1), 0)) \
             ON CONFLICT (user_id, video_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(video_id)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())
        .map(|_| ())
    }

    async fn remove_watch_history(
        &self,
        user_id: PrimaryKey,
        video_id: Option<PrimaryKey>,
    ) -> Result<()> {
        let result = match video_id {
            Some(video_id) => {
                sqlx::query("DELETE FROM watch_history WHERE user_id = $1 AND video_id = $2")
                    .bind(user_id)
                    .bind(video_id)
                    .execute(&self.pool)
                    .await
            }
            None => {
                sqlx::query("DELETE FROM watch_history WHERE user_id = $1")
                    .bind(user_id)
                    .execute(&self.pool)
                    .await
            }
        };

        result.map_err(|e| e.any()).map(|_| ())
    }

    async fn list_videos(&self, query: VideoQuery) -> Result<Paginated<VideoWithOwner>> {
        let page = query.page.max(1);
        let limit = query.limit.clamp(1, 100);
        let offset = (page - 1) as i64 * limit as i64;
        let pattern = query.query.as_deref().map(like_pattern);

        let mut builder = QueryBuilder::<Postgres>::new(video_owner_select());
        builder.push(" WHERE TRUE");

        if let Some(owner_id) = query.owner_id {
            builder.push(" AND v.owner_id = ").push_bind(owner_id);
        }

        if let Some(pattern) = &pattern {
            builder
                .push(" AND (v.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR v.description ILIKE ")
                .push_bind(pattern.clone())
                .push(")");
        }

        builder
            .push(" ORDER BY v.")
            .push(query.sort_by.column())
            .push(if query.ascending { " ASC" } else { " DESC" })
            .push(" LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows: Vec<VideoOwnerRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        let mut count_builder =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM videos v WHERE TRUE");

        if let Some(owner_id) = query.owner_id {
            count_builder.push(" AND v.owner_id = ").push_bind(owner_id);
        }

        if let Some(pattern) = &pattern {
            count_builder
                .push(" AND (v.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR v.description ILIKE ")
                .push_bind(pattern.clone())
                .push(")");
        }

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(Paginated {
            items: rows.into_iter().map(Into::into).collect(),
            total,
            page,
            limit,
        })
    }

    async fn video_by_id(&self, video_id: PrimaryKey) -> Result<VideoWithOwner> {
        let sql = format!("{} WHERE v.id = $1", video_owner_select());

        sqlx::query_as::<_, VideoOwnerRow>(&sql)
            .bind(video_id)
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("video", "id"))
    }

    async fn create_video(&self, new_video: NewVideo) -> Result<VideoData> {
        sqlx::query_as::<_, VideoRow>(
            "INSERT INTO videos (title, description, duration, video_url, thumbnail_url, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(&new_video.title)
        .bind(&new_video.description)
        .bind(new_video.duration)
        .bind(&new_video.video_url)
        .bind(&new_video.thumbnail_url)
        .bind(new_video.owner_id)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.any())
    }

    async fn update_video(&self, updated: UpdatedVideo) -> Result<VideoData> {
        let existing = self.video_by_id(updated.id).await?;

        sqlx::query_as::<_, VideoRow>(
            "UPDATE videos SET title = $1, description = $2, thumbnail_url = $3 \
             WHERE id = $4 RETURNING *",
        )
        .bind(&updated.title)
        .bind(&updated.description)
        .bind(updated.thumbnail_url.unwrap_or(existing.video.thumbnail_url))
        .bind(updated.id)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.any())
    }

    async fn delete_video(&self, video_id: PrimaryKey) -> Result<()> {
        // Ensure video exists
        let _ = self.video_by_id(video_id).await?;

        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        let statements = [
            "DELETE FROM likes WHERE target_type = 'video' AND target_id = $1",
            "DELETE FROM likes WHERE target_type = 'comment' \
             AND target_id IN (SELECT id FROM comments WHERE video_id = $1)",
            "DELETE FROM comments WHERE video_id = $1",
            "DELETE FROM playlist_videos WHERE video_id = $1",
            "DELETE FROM watch_history WHERE video_id = $1",
            "DELETE FROM videos WHERE id = $1",
        ];

        for statement in statements {
            sqlx::query(statement)
                .bind(video_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| e.any())?;
        }

        tx.commit().await.map_err(|e| e.any())
    }

    async fn set_video_published(
        &self,
        video_id: PrimaryKey,
        published: bool,
    ) -> Result<VideoData> {
        sqlx::query_as::<_, VideoRow>(
            "UPDATE videos SET is_published = $1 WHERE id = $2 RETURNING *",
        )
        .bind(published)
        .bind(video_id)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.not_found_or("video", "id"))
    }

    async fn increment_views(&self, video_id: PrimaryKey) -> Result<VideoData> {
        sqlx::query_as::<_, VideoRow>(
            "UPDATE videos SET views = views + 1 WHERE id = $1 RETURNING *",
        )
        .bind(video_id)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.not_found_or("video", "id"))
    }

    async fn videos_by_owner(&self, owner_id: PrimaryKey) -> Result<Vec<VideoWithOwner>> {
        let sql = format!(
            "{} WHERE v.owner_id = $1 ORDER BY v.created_at DESC",
            video_owner_select()
        );

        let rows = sqlx::query_as::<_, VideoOwnerRow>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn search_videos(&self, term: &str) -> Result<Vec<VideoWithOwner>> {
        let sql = format!(
            "{} WHERE v.title ILIKE $1 OR v.description ILIKE $1 \
             ORDER BY v.created_at DESC",
            video_owner_select()
        );

        let rows = sqlx::query_as::<_, VideoOwnerRow>(&sql)
            .bind(like_pattern(term))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn related_videos(
        &self,
        video_id: PrimaryKey,
        limit: u32,
    ) -> Result<Vec<VideoWithOwner>> {
        let video = self.video_by_id(video_id).await?;

        let sql = format!(
            "{} WHERE v.owner_id = $1 AND v.id <> $2 \
             ORDER BY v.created_at DESC LIMIT $3",
            video_owner_select()
        );

        let rows = sqlx::query_as::<_, VideoOwnerRow>(&sql)
            .bind(video.video.owner_id)
            .bind(video_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn subscribed_videos(&self, user_id: PrimaryKey) -> Result<Vec<VideoWithOwner>> {
        let sql = format!(
            "{} INNER JOIN subscriptions s ON s.channel_id = v.owner_id \
             WHERE s.subscriber_id = $1 AND v.is_published = TRUE \
             ORDER BY v.created_at DESC",
            video_owner_select()
        );

        let rows = sqlx::query_as::<_, VideoOwnerRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn comments_by_video(
        &self,
        video_id: PrimaryKey,
        page: u32,
        limit: u32,
    ) -> Result<Vec<CommentWithAuthor>> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        let offset = (page - 1) as i64 * limit as i64;

        let sql = format!(
            "{} WHERE c.video_id = $1 ORDER BY c.created_at DESC LIMIT $2 OFFSET $3",
            comment_author_select()
        );

        let rows = sqlx::query_as::<_, CommentAuthorRow>(&sql)
            .bind(video_id)
            .bind(limit as i64)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn comment_by_id(&self, comment_id: PrimaryKey) -> Result<CommentData> {
        self.comment_with_author(comment_id).await.map(|c| c.comment)
    }

    async fn create_comment(&self, new_comment: NewComment) -> Result<CommentWithAuthor> {
        // Ensure video exists
        let _ = self.video_by_id(new_comment.video_id).await?;

        let id = sqlx::query_scalar::<_, PrimaryKey>(
            "INSERT INTO comments (content, video_id, owner_id) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&new_comment.content)
        .bind(new_comment.video_id)
        .bind(new_comment.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.comment_with_author(id).await
    }

    async fn update_comment(
        &self,
        comment_id: PrimaryKey,
        content: &str,
    ) -> Result<CommentWithAuthor> {
        let result = sqlx::query("UPDATE comments SET content = $1 WHERE id = $2")
            .bind(content)
            .bind(comment_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                resource: "comment",
                identifier: "id",
            });
        }

        self.comment_with_author(comment_id).await
    }

    async fn delete_comment(&self, comment_id: PrimaryKey) -> Result<()> {
        // Ensure comment exists
        let _ = self.comment_with_author(comment_id).await?;

        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        sqlx::query("DELETE FROM likes WHERE target_type = 'comment' AND target_id = $1")
            .bind(comment_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        tx.commit().await.map_err(|e| e.any())
    }

    async fn toggle_like(&self, user_id: PrimaryKey, target: LikeTarget) -> Result<bool> {
        self.ensure_target_exists(target).await?;

        let removed = sqlx::query(
            "DELETE FROM likes WHERE user_id = $1 AND target_type = $2 AND target_id = $3",
        )
        .bind(user_id)
        .bind(target.kind())
        .bind(target.id())
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        // The unique index on (user_id, target_type, target_id) makes this a
        // no-op when a concurrent toggle won the race, which still leaves the
        // target in the liked state.
        sqlx::query(
            "INSERT INTO likes (user_id, target_type, target_id) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, target_type, target_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(target.kind())
        .bind(target.id())
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        Ok(true)
    }

    async fn liked_videos(&self, user_id: PrimaryKey) -> Result<Vec<VideoWithOwner>> {
        let sql = format!(
            "{} INNER JOIN likes l ON l.target_id = v.id AND l.target_type = 'video' \
             WHERE l.user_id = $1 ORDER BY l.created_at DESC",
            video_owner_select()
        );

        let rows = sqlx::query_as::<_, VideoOwnerRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn toggle_subscription(
        &self,
        subscriber_id: PrimaryKey,
        channel_id: PrimaryKey,
    ) -> Result<bool> {
        // Ensure the channel exists
        let _ = self
            .user_by_id(channel_id)
            .await
            .map_err(|_| DatabaseError::NotFound {
                resource: "channel",
                identifier: "id",
            })?;

        let removed = sqlx::query(
            "DELETE FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO subscriptions (subscriber_id, channel_id) VALUES ($1, $2) \
             ON CONFLICT (subscriber_id, channel_id) DO NOTHING",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        Ok(true)
    }

    async fn channel_subscribers(&self, channel_id: PrimaryKey) -> Result<Vec<UserData>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT u.* FROM subscriptions s \
             INNER JOIN users u ON u.id = s.subscriber_id \
             WHERE s.channel_id = $1 ORDER BY s.created_at DESC",
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn subscribed_channels(&self, subscriber_id: PrimaryKey) -> Result<Vec<UserData>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT u.* FROM subscriptions s \
             INNER JOIN users u ON u.id = s.channel_id \
             WHERE s.subscriber_id = $1 ORDER BY s.created_at DESC",
        )
        .bind(subscriber_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_playlist(&self, new_playlist: NewPlaylist) -> Result<PlaylistData> {
        sqlx::query_as::<_, PlaylistRow>(
            "INSERT INTO playlists (name, description, owner_id) \
             VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&new_playlist.name)
        .bind(&new_playlist.description)
        .bind(new_playlist.owner_id)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.any())
    }

    async fn playlist_by_id(&self, playlist_id: PrimaryKey) -> Result<PlaylistWithVideos> {
        let playlist: PlaylistData =
            sqlx::query_as::<_, PlaylistRow>("SELECT * FROM playlists WHERE id = $1")
                .bind(playlist_id)
                .fetch_one(&self.pool)
                .await
                .map(Into::into)
                .map_err(|e| e.not_found_or("playlist", "id"))?;

        let owner = self.user_by_id(playlist.owner_id).await?;
        let videos = self.playlist_videos(playlist_id).await?;

        Ok(PlaylistWithVideos {
            playlist,
            owner,
            videos,
        })
    }

    async fn playlists_by_owner(&self, owner_id: PrimaryKey) -> Result<Vec<PlaylistWithVideos>> {
        let owner = self.user_by_id(owner_id).await?;

        let playlists = sqlx::query_as::<_, PlaylistRow>(
            "SELECT * FROM playlists WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        let mut populated = Vec::with_capacity(playlists.len());

        for playlist in playlists {
            let videos = self.playlist_videos(playlist.id).await?;

            populated.push(PlaylistWithVideos {
                playlist: playlist.into(),
                owner: owner.clone(),
                videos,
            });
        }

        Ok(populated)
    }

    async fn update_playlist(&self, updated: UpdatedPlaylist) -> Result<PlaylistData> {
        sqlx::query_as::<_, PlaylistRow>(
            "UPDATE playlists SET name = $1, description = $2 WHERE id = $3 RETURNING *",
        )
        .bind(&updated.name)
        .bind(&updated.description)
        .bind(updated.id)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.not_found_or("playlist", "id"))
    }

    async fn add_video_to_playlist(
        &self,
        playlist_id: PrimaryKey,
        video_id: PrimaryKey,
    ) -> Result<()> {
        // Ensure both sides exist
        let _ = self.playlist_by_id(playlist_id).await?;
        let _ = self.video_by_id(video_id).await?;

        sqlx::query(
            "INSERT INTO playlist_videos (playlist_id, video_id, position) \
             VALUES ($1, $2, COALESCE((SELECT MAX(position) + 1 FROM playlist_videos \
             WHERE playlist_id = $1), 0)) \
             ON CONFLICT (playlist_id, video_id) DO NOTHING",
        )
        .bind(playlist_id)
        .bind(video_id)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())
        .map(|_| ())
    }

    async fn remove_video_from_playlist(
        &self,
        playlist_id: PrimaryKey,
        video_id: PrimaryKey,
    ) -> Result<()> {
        // Ensure playlist exists
        let _ = self.playlist_by_id(playlist_id).await?;

        sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = $1 AND video_id = $2")
            .bind(playlist_id)
            .bind(video_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn delete_playlist(&self, playlist_id: PrimaryKey) -> Result<()> {
        // Ensure playlist exists
        let _ = self.playlist_by_id(playlist_id).await?;

        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = $1")
            .bind(playlist_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        sqlx::query("DELETE FROM playlists WHERE id = $1")
            .bind(playlist_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        tx.commit().await.map_err(|e| e.any())
    }

    async fn create_tweet(&self, new_tweet: NewTweet) -> Result<TweetData> {
        sqlx::query_as::<_, TweetRow>(
            "INSERT INTO tweets (content, owner_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(&new_tweet.content)
        .bind(new_tweet.owner_id)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.any())
    }

    async fn tweet_by_id(&self, tweet_id: PrimaryKey) -> Result<TweetData> {
        sqlx::query_as::<_, TweetRow>("SELECT * FROM tweets WHERE id = $1")
            .bind(tweet_id)
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("tweet", "id"))
    }

    async fn tweets_by_owner(&self, owner_id: PrimaryKey) -> Result<Vec<TweetData>> {
        let rows = sqlx::query_as::<_, TweetRow>(
            "SELECT * FROM tweets WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_tweet(&self, tweet_id: PrimaryKey, content: &str) -> Result<TweetData> {
        sqlx::query_as::<_, TweetRow>(
            "UPDATE tweets SET content = $1 WHERE id = $2 RETURNING *",
        )
        .bind(content)
        .bind(tweet_id)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.not_found_or("tweet", "id"))
    }

    async fn delete_tweet(&self, tweet_id: PrimaryKey) -> Result<()> {
        // Ensure tweet exists
        let _ = self.tweet_by_id(tweet_id).await?;

        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        sqlx::query("DELETE FROM likes WHERE target_type = 'tweet' AND target_id = $1")
            .bind(tweet_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        sqlx::query("DELETE FROM tweets WHERE id = $1")
            .bind(tweet_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        tx.commit().await.map_err(|e| e.any())
    }

    async fn channel_stats(&self, user_id: PrimaryKey) -> Result<ChannelStatsData> {
        let row = sqlx::query_as::<_, ChannelStatsRow>(
            "SELECT \
                COALESCE(SUM(v.views), 0)::BIGINT AS total_views, \
                COUNT(v.id) AS total_videos, \
                (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = $1) \
                    AS total_subscribers, \
                (SELECT COUNT(*) FROM likes l \
                    INNER JOIN videos lv ON lv.id = l.target_id AND l.target_type = 'video' \
                    WHERE lv.owner_id = $1) AS total_likes \
             FROM videos v WHERE v.owner_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        Ok(ChannelStatsData {
            total_views: row.total_views,
            total_videos: row.total_videos,
            total_subscribers: row.total_subscribers,
            total_likes: row.total_likes,
        })
    }
}

fn conflict_on_unique(
    e: SqlxError,
    resource: &'static str,
    field: &'static str,
    value: &str,
) -> DatabaseError {
    match &e {
        SqlxError::Database(db) if db.is_unique_violation() => DatabaseError::Conflict {
            resource,
            field,
            value: value.to_string(),
        },
        _ => e.any(),
    }
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }
}
