use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
};
use playsync_store::{NewTweet, PrimaryKey};
use serde_json::json;

use crate::{
    auth::{ensure_owner, Session},
    envelope::ApiResponse,
    errors::ServerResult,
    schemas::{TweetSchema, ValidatedJson},
    serialized::{ToSerialized, Tweet},
    Router, ServerContext,
};

#[utoipa::path(
    post,
    path = "/api/v1/tweets",
    tag = "tweets",
    request_body = TweetSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 201, body = Tweet)
    )
)]
async fn create_tweet(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<TweetSchema>,
) -> ServerResult<ApiResponse<Tweet>> {
    let tweet = context
        .playsync
        .database
        .create_tweet(NewTweet {
            content: body.content,
            owner_id: session.user().id,
        })
        .await?;

    Ok(ApiResponse::created(
        tweet.to_serialized(),
        "Tweet posted successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/tweets/user/{userId}",
    tag = "tweets",
    responses(
        (status = 200, body = Vec<Tweet>)
    )
)]
async fn user_tweets(
    State(context): State<ServerContext>,
    Path(user_id): Path<PrimaryKey>,
) -> ServerResult<ApiResponse<Vec<Tweet>>> {
    let tweets = context.playsync.database.tweets_by_owner(user_id).await?;

    Ok(ApiResponse::ok(tweets.to_serialized(), "Tweets fetched"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/tweets/{tweetId}",
    tag = "tweets",
    request_body = TweetSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Tweet)
    )
)]
async fn update_tweet(
    session: Session,
    State(context): State<ServerContext>,
    Path(tweet_id): Path<PrimaryKey>,
    ValidatedJson(body): ValidatedJson<TweetSchema>,
) -> ServerResult<ApiResponse<Tweet>> {
    let existing = context.playsync.database.tweet_by_id(tweet_id).await?;
    ensure_owner(existing.owner_id, session.user().id)?;

    let tweet = context
        .playsync
        .database
        .update_tweet(tweet_id, &body.content)
        .await?;

    Ok(ApiResponse::ok(
        tweet.to_serialized(),
        "Tweet updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tweets/{tweetId}",
    tag = "tweets",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "The tweet and its likes were deleted")
    )
)]
async fn delete_tweet(
    session: Session,
    State(context): State<ServerContext>,
    Path(tweet_id): Path<PrimaryKey>,
) -> ServerResult<ApiResponse<serde_json::Value>> {
    let existing = context.playsync.database.tweet_by_id(tweet_id).await?;
    ensure_owner(existing.owner_id, session.user().id)?;

    context.playsync.database.delete_tweet(tweet_id).await?;

    Ok(ApiResponse::ok(json!({}), "Tweet deleted successfully"))
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_tweet))
        .route("/user/:userId", get(user_tweets))
        .route("/:tweetId", patch(update_tweet).delete(delete_tweet))
}
