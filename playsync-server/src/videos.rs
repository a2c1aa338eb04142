use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{get, patch, post},
};
use playsync_store::{NewVideo, PrimaryKey, UpdatedVideo, VideoQuery, VideoSort};
use serde_json::json;
use validator::Validate;

use crate::{
    auth::{ensure_owner, Session},
    envelope::ApiResponse,
    errors::{ServerError, ServerResult},
    schemas::{SearchQuery, VideoDetailsSchema, VideoListQuery},
    serialized::{ToSerialized, Video, VideoPage},
    uploads::{store_media, UploadForm},
    Router, ServerContext,
};

/// How many related videos are returned at most
const RELATED_VIDEOS_LIMIT: u32 = 10;

#[utoipa::path(
    get,
    path = "/api/v1/videos",
    tag = "videos",
    responses(
        (status = 200, body = VideoPage)
    )
)]
async fn list_videos(
    State(context): State<ServerContext>,
    Query(query): Query<VideoListQuery>,
) -> ServerResult<ApiResponse<VideoPage>> {
    let defaults = VideoQuery::default();

    let page = context
        .playsync
        .database
        .list_videos(VideoQuery {
            page: query.page.unwrap_or(defaults.page),
            limit: query.limit.unwrap_or(defaults.limit),
            query: query.query,
            owner_id: query.user_id,
            sort_by: query
                .sort_by
                .as_deref()
                .and_then(VideoSort::from_key)
                .unwrap_or_default(),
            ascending: query.sort_type.as_deref() == Some("asc"),
        })
        .await?;

    Ok(ApiResponse::ok(page.to_serialized(), "Videos fetched"))
}

#[utoipa::path(
    post,
    path = "/api/v1/videos",
    tag = "videos",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 201, body = Video)
    )
)]
async fn publish_video(
    session: Session,
    State(context): State<ServerContext>,
    multipart: Multipart,
) -> ServerResult<ApiResponse<Video>> {
    let mut form = UploadForm::read(multipart, &context.config.temp_dir).await?;

    let schema = VideoDetailsSchema {
        title: form.text("title").unwrap_or_default().to_string(),
        description: form.text("description").unwrap_or_default().to_string(),
    };

    if let Err(e) = schema.validate() {
        form.discard().await;
        return Err(ServerError::Validation(e.to_string()));
    }

    let duration = form
        .text("duration")
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.);

    let Some(video_file) = form.take_file("videoFile") else {
        form.discard().await;
        return Err(ServerError::Validation(
            "A video file is required".to_string(),
        ));
    };

    let Some(thumbnail) = form.take_file("thumbnail") else {
        playsync_store::discard_temp(&video_file.path).await;
        form.discard().await;
        return Err(ServerError::Validation(
            "A thumbnail file is required".to_string(),
        ));
    };

    form.discard().await;

    // Both uploads run before either result is checked, so each temp copy
    // is removed even when the other upload fails
    let video_url = store_media(&context, video_file).await;
    let thumbnail_url = store_media(&context, thumbnail).await;

    let (video_url, thumbnail_url) = (video_url?, thumbnail_url?);

    let video = context
        .playsync
        .database
        .create_video(NewVideo {
            title: schema.title,
            description: schema.description,
            duration,
            video_url,
            thumbnail_url,
            owner_id: session.user().id,
        })
        .await?;

    Ok(ApiResponse::created(
        video.to_serialized(),
        "Video published successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/search",
    tag = "videos",
    responses(
        (status = 200, body = Vec<Video>)
    )
)]
async fn search_videos(
    State(context): State<ServerContext>,
    Query(query): Query<SearchQuery>,
) -> ServerResult<ApiResponse<Vec<Video>>> {
    let videos = context.playsync.database.search_videos(&query.q).await?;

    Ok(ApiResponse::ok(videos.to_serialized(), "Videos fetched"))
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/subscribed",
    tag = "videos",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Video>)
    )
)]
async fn subscribed_videos(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<ApiResponse<Vec<Video>>> {
    let videos = context
        .playsync
        .database
        .subscribed_videos(session.user().id)
        .await?;

    Ok(ApiResponse::ok(
        videos.to_serialized(),
        "Subscription feed fetched",
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/related/{videoId}",
    tag = "videos",
    responses(
        (status = 200, body = Vec<Video>)
    )
)]
async fn related_videos(
    State(context): State<ServerContext>,
    Path(video_id): Path<PrimaryKey>,
) -> ServerResult<ApiResponse<Vec<Video>>> {
    let videos = context
        .playsync
        .database
        .related_videos(video_id, RELATED_VIDEOS_LIMIT)
        .await?;

    Ok(ApiResponse::ok(
        videos.to_serialized(),
        "Related videos fetched",
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/videos/view/{videoId}",
    tag = "videos",
    responses(
        (status = 200, body = Video)
    )
)]
async fn count_view(
    State(context): State<ServerContext>,
    Path(video_id): Path<PrimaryKey>,
) -> ServerResult<ApiResponse<Video>> {
    let video = context.playsync.database.increment_views(video_id).await?;

    Ok(ApiResponse::ok(video.to_serialized(), "View counted"))
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/{videoId}",
    tag = "videos",
    responses(
        (status = 200, body = Video)
    )
)]
async fn video_by_id(
    State(context): State<ServerContext>,
    Path(video_id): Path<PrimaryKey>,
) -> ServerResult<ApiResponse<Video>> {
    let video = context.playsync.database.video_by_id(video_id).await?;

    Ok(ApiResponse::ok(video.to_serialized(), "Video fetched"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/videos/{videoId}",
    tag = "videos",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Video)
    )
)]
async fn update_video(
    session: Session,
    State(context): State<ServerContext>,
    Path(video_id): Path<PrimaryKey>,
    multipart: Multipart,
) -> ServerResult<ApiResponse<Video>> {
    let existing = context.playsync.database.video_by_id(video_id).await?;
    ensure_owner(existing.video.owner_id, session.user().id)?;

    let mut form = UploadForm::read(multipart, &context.config.temp_dir).await?;

    let schema = VideoDetailsSchema {
        title: form.text("title").unwrap_or_default().to_string(),
        description: form.text("description").unwrap_or_default().to_string(),
    };

    if let Err(e) = schema.validate() {
        form.discard().await;
        return Err(ServerError::Validation(e.to_string()));
    }

    let thumbnail = form.take_file("thumbnail");
    form.discard().await;

    let thumbnail_url = match thumbnail {
        Some(file) => Some(store_media(&context, file).await?),
        None => None,
    };

    let replaced_thumbnail = thumbnail_url.is_some();

    let video = context
        .playsync
        .database
        .update_video(UpdatedVideo {
            id: video_id,
            title: schema.title,
            description: schema.description,
            thumbnail_url,
        })
        .await?;

    if replaced_thumbnail {
        if let Err(e) = context
            .playsync
            .media
            .delete(&existing.video.thumbnail_url)
            .await
        {
            log::warn!("Failed to delete previous thumbnail: {}", e);
        }
    }

    Ok(ApiResponse::ok(
        video.to_serialized(),
        "Video updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/videos/{videoId}",
    tag = "videos",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "The video and everything referencing it was deleted")
    )
)]
async fn delete_video(
    session: Session,
    State(context): State<ServerContext>,
    Path(video_id): Path<PrimaryKey>,
) -> ServerResult<ApiResponse<serde_json::Value>> {
    let existing = context.playsync.database.video_by_id(video_id).await?;
    ensure_owner(existing.video.owner_id, session.user().id)?;

    context.playsync.database.delete_video(video_id).await?;

    for url in [&existing.video.video_url, &existing.video.thumbnail_url] {
        if let Err(e) = context.playsync.media.delete(url).await {
            log::warn!("Failed to delete media file {}: {}", url, e);
        }
    }

    Ok(ApiResponse::ok(json!({}), "Video deleted successfully"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/videos/publish/{videoId}",
    tag = "videos",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Video)
    )
)]
async fn toggle_publish(
    session: Session,
    State(context): State<ServerContext>,
    Path(video_id): Path<PrimaryKey>,
) -> ServerResult<ApiResponse<Video>> {
    let existing = context.playsync.database.video_by_id(video_id).await?;
    ensure_owner(existing.video.owner_id, session.user().id)?;

    let video = context
        .playsync
        .database
        .set_video_published(video_id, !existing.video.is_published)
        .await?;

    Ok(ApiResponse::ok(
        video.to_serialized(),
        "Publish status toggled",
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/uploaded",
    tag = "videos",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Video>)
    )
)]
async fn own_videos(
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
        "Uploaded videos fetched",
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/uploaded/{userId}",
    tag = "videos",
    responses(
        (status = 200, body = Vec<Video>)
    )
)]
async fn videos_by_user(
    State(context): State<ServerContext>,
    Path(user_id): Path<PrimaryKey>,
) -> ServerResult<ApiResponse<Vec<Video>>> {
    let videos = context.playsync.database.videos_by_owner(user_id).await?;

    Ok(ApiResponse::ok(
        videos.to_serialized(),
        "Uploaded videos fetched",
    ))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_videos).post(publish_video))
        .route("/search", get(search_videos))
        .route("/subscribed", get(subscribed_videos))
        .route("/uploaded", get(own_videos))
        .route("/uploaded/:userId", get(videos_by_user))
        .route("/related/:videoId", get(related_videos))
        .route("/view/:videoId", patch(count_view))
        .route("/publish/:videoId", patch(toggle_publish))
        .route(
            "/:videoId",
            get(video_by_id).patch(update_video).delete(delete_video),
        )
}
