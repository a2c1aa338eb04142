use axum::{
    extract::{Path, State},
    routing::{get, post},
};
use playsync_store::{LikeTarget, PrimaryKey};

use crate::{
    auth::Session,
    envelope::ApiResponse,
    errors::ServerResult,
    serialized::{LikeStatus, ToSerialized, Video},
    Router, ServerContext,
};

async fn toggle(
    session: Session,
    context: ServerContext,
    target: LikeTarget,
) -> ServerResult<ApiResponse<LikeStatus>> {
    let liked = context
        .playsync
        .database
        .toggle_like(session.user().id, target)
        .await?;

    Ok(ApiResponse::ok(LikeStatus { liked }, "Like toggled"))
}

#[utoipa::path(
    post,
    path = "/api/v1/likes/toggle/v/{videoId}",
    tag = "likes",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = LikeStatus)
    )
)]
async fn toggle_video_like(
    session: Session,
    State(context): State<ServerContext>,
    Path(video_id): Path<PrimaryKey>,
) -> ServerResult<ApiResponse<LikeStatus>> {
    toggle(session, context, LikeTarget::Video(video_id)).await
}

#[utoipa::path(
    post,
    path = "/api/v1/likes/toggle/c/{commentId}",
    tag = "likes",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = LikeStatus)
    )
)]
async fn toggle_comment_like(
    session: Session,
    State(context): State<ServerContext>,
    Path(comment_id): Path<PrimaryKey>,
) -> ServerResult<ApiResponse<LikeStatus>> {
    toggle(session, context, LikeTarget::Comment(comment_id)).await
}

#[utoipa::path(
    post,
    path = "/api/v1/likes/toggle/t/{tweetId}",
    tag = "likes",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = LikeStatus)
    )
)]
async fn toggle_tweet_like(
    session: Session,
    State(context): State<ServerContext>,
    Path(tweet_id): Path<PrimaryKey>,
) -> ServerResult<ApiResponse<LikeStatus>> {
    toggle(session, context, LikeTarget::Tweet(tweet_id)).await
}

#[utoipa::path(
    get,
    path = "/api/v1/likes/videos",
    tag = "likes",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Video>)
    )
)]
async fn liked_videos(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<ApiResponse<Vec<Video>>> {
    let videos = context
        .playsync
        .database
        .liked_videos(session.user().id)
        .await?;

    Ok(ApiResponse::ok(videos.to_serialized(), "Liked videos fetched"))
}

pub fn router() -> Router {
    Router::new()
        .route("/toggle/v/:videoId", post(toggle_video_like))
        .route("/toggle/c/:commentId", post(toggle_comment_like))
        .route("/toggle/t/:tweetId", post(toggle_tweet_like))
        .route("/videos", get(liked_videos))
}
