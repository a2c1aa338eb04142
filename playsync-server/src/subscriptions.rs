use axum::{
    extract::{Path, State},
    routing::{get, post},
};
use playsync_store::PrimaryKey;

use crate::{
    auth::Session,
    envelope::ApiResponse,
    errors::ServerResult,
    serialized::{SubscriptionStatus, ToSerialized, User},
    Router, ServerContext,
};

#[utoipa::path(
    post,
    path = "/api/v1/subscriptions/c/{channelId}",
    tag = "subscriptions",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = SubscriptionStatus)
    )
)]
async fn toggle_subscription(
    session: Session,
    State(context): State<ServerContext>,
    Path(channel_id): Path<PrimaryKey>,
) -> ServerResult<ApiResponse<SubscriptionStatus>> {
    let subscribed = context
        .playsync
        .database
        .toggle_subscription(session.user().id, channel_id)
        .await?;

    Ok(ApiResponse::ok(
        SubscriptionStatus { subscribed },
        "Subscription toggled",
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/c/{channelId}",
    tag = "subscriptions",
    responses(
        (status = 200, body = Vec<User>)
    )
)]
async fn channel_subscribers(
    State(context): State<ServerContext>,
    Path(channel_id): Path<PrimaryKey>,
) -> ServerResult<ApiResponse<Vec<User>>> {
    let subscribers = context
        .playsync
        .database
        .channel_subscribers(channel_id)
        .await?;

    Ok(ApiResponse::ok(
        subscribers.to_serialized(),
        "Subscribers fetched",
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/u/{subscriberId}",
    tag = "subscriptions",
    responses(
        (status = 200, body = Vec<User>)
    )
)]
async fn subscribed_channels(
    State(context): State<ServerContext>,
    Path(subscriber_id): Path<PrimaryKey>,
) -> ServerResult<ApiResponse<Vec<User>>> {
    let channels = context
        .playsync
        .database
        .subscribed_channels(subscriber_id)
        .await?;

    Ok(ApiResponse::ok(
        channels.to_serialized(),
        "Subscribed channels fetched",
    ))
}

pub fn router() -> Router {
    Router::new()
        .route(
            "/c/:channelId",
            post(toggle_subscription).get(channel_subscribers),
        )
        .route("/u/:subscriberId", get(subscribed_channels))
}
