use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
};
use playsync_store::{NewComment, PrimaryKey};
use serde_json::json;

use crate::{
    auth::{ensure_owner, Session},
    envelope::ApiResponse,
    errors::ServerResult,
    schemas::{CommentSchema, PageQuery, ValidatedJson},
    serialized::{Comment, ToSerialized},
    Router, ServerContext,
};

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 10;

#[utoipa::path(
    get,
    path = "/api/v1/comments/{videoId}",
    tag = "comments",
    responses(
        (status = 200, body = Vec<Comment>)
    )
)]
async fn video_comments(
    State(context): State<ServerContext>,
    Path(video_id): Path<PrimaryKey>,
    Query(query): Query<PageQuery>,
) -> ServerResult<ApiResponse<Vec<Comment>>> {
    let comments = context
        .playsync
        .database
        .comments_by_video(
            video_id,
            query.page.unwrap_or(DEFAULT_PAGE),
            query.limit.unwrap_or(DEFAULT_LIMIT),
        )
        .await?;

    Ok(ApiResponse::ok(comments.to_serialized(), "Comments fetched"))
}

#[utoipa::path(
    post,
    path = "/api/v1/comments/{videoId}",
    tag = "comments",
    request_body = CommentSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 201, body = Comment)
    )
)]
async fn create_comment(
    session: Session,
    State(context): State<ServerContext>,
    Path(video_id): Path<PrimaryKey>,
    ValidatedJson(body): ValidatedJson<CommentSchema>,
) -> ServerResult<ApiResponse<Comment>> {
    let comment = context
        .playsync
        .database
        .create_comment(NewComment {
            content: body.content,
            video_id,
            owner_id: session.user().id,
        })
        .await?;

    Ok(ApiResponse::created(
        comment.to_serialized(),
        "Comment added successfully",
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/comments/c/{commentId}",
    tag = "comments",
    request_body = CommentSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Comment)
    )
)]
async fn update_comment(
    session: Session,
    State(context): State<ServerContext>,
    Path(comment_id): Path<PrimaryKey>,
    ValidatedJson(body): ValidatedJson<CommentSchema>,
) -> ServerResult<ApiResponse<Comment>> {
    let existing = context.playsync.database.comment_by_id(comment_id).await?;
    ensure_owner(existing.owner_id, session.user().id)?;

    let comment = context
        .playsync
        .database
        .update_comment(comment_id, &body.content)
        .await?;

    Ok(ApiResponse::ok(
        comment.to_serialized(),
        "Comment updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/comments/c/{commentId}",
    tag = "comments",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "The comment and its likes were deleted")
    )
)]
async fn delete_comment(
    session: Session,
    State(context): State<ServerContext>,
    Path(comment_id): Path<PrimaryKey>,
) -> ServerResult<ApiResponse<serde_json::Value>> {
    let existing = context.playsync.database.comment_by_id(comment_id).await?;
    ensure_owner(existing.owner_id, session.user().id)?;

    context.playsync.database.delete_comment(comment_id).await?;

    Ok(ApiResponse::ok(json!({}), "Comment deleted successfully"))
}

pub fn router() -> Router {
    Router::new()
        .route("/:videoId", get(video_comments).post(create_comment))
        .route("/c/:commentId", patch(update_comment).delete(delete_comment))
}
