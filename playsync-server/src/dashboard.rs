use axum::{extract::State, routing::get};

use crate::{
    auth::Session,
    envelope::ApiResponse,
    errors::ServerResult,
    serialized::{ChannelStats, ToSerialized, Video},
    Router, ServerContext,
};

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    tag = "dashboard",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = ChannelStats)
    )
)]
async fn channel_stats(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<ApiResponse<ChannelStats>> {
    let stats = context
        .playsync
        .database
        .channel_stats(session.user().id)
        .await?;

    Ok(ApiResponse::ok(stats.to_serialized(), "Channel stats fetched"))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/videos",
    tag = "dashboard",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Video>)
    )
)]
async fn dashboard_videos(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<ApiResponse<Vec<Video>>> {
    let videos = context
        .playsync
        .database
        .videos_by_owner(session.user().id)
        .await?;

    Ok(ApiResponse::ok(
        videos.to_serialized(),
        "Channel videos fetched",
    ))
}

pub fn router() -> Router {
    Router::new()
        .route("/stats", get(channel_stats))
        .route("/videos", get(dashboard_videos))
}
