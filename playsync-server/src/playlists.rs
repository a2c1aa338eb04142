use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
};
use playsync_store::{NewPlaylist, PrimaryKey, UpdatedPlaylist};
use serde_json::json;

use crate::{
    auth::{ensure_owner, Session},
    envelope::ApiResponse,
    errors::ServerResult,
    schemas::{PlaylistSchema, ValidatedJson},
    serialized::{Playlist, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    post,
    path = "/api/v1/playlist",
    tag = "playlist",
    request_body = PlaylistSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 201, body = Playlist)
    )
)]
async fn create_playlist(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<PlaylistSchema>,
) -> ServerResult<ApiResponse<Playlist>> {
    let created = context
        .playsync
        .database
        .create_playlist(NewPlaylist {
            name: body.name,
            description: body.description,
            owner_id: session.user().id,
        })
        .await?;

    let playlist = context.playsync.database.playlist_by_id(created.id).await?;

    Ok(ApiResponse::created(
        playlist.to_serialized(),
        "Playlist created successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/playlist/user/{userId}",
    tag = "playlist",
    responses(
        (status = 200, body = Vec<Playlist>)
    )
)]
async fn user_playlists(
    State(context): State<ServerContext>,
    Path(user_id): Path<PrimaryKey>,
) -> ServerResult<ApiResponse<Vec<Playlist>>> {
    let playlists = context.playsync.database.playlists_by_owner(user_id).await?;

    Ok(ApiResponse::ok(playlists.to_serialized(), "Playlists fetched"))
}

#[utoipa::path(
    get,
    path = "/api/v1/playlist/{playlistId}",
    tag = "playlist",
    responses(
        (status = 200, body = Playlist)
    )
)]
async fn playlist_by_id(
    State(context): State<ServerContext>,
    Path(playlist_id): Path<PrimaryKey>,
) -> ServerResult<ApiResponse<Playlist>> {
    let playlist = context.playsync.database.playlist_by_id(playlist_id).await?;

    Ok(ApiResponse::ok(playlist.to_serialized(), "Playlist fetched"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/playlist/{playlistId}",
    tag = "playlist",
    request_body = PlaylistSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Playlist)
    )
)]
async fn update_playlist(
    session: Session,
    State(context): State<ServerContext>,
    Path(playlist_id): Path<PrimaryKey>,
    ValidatedJson(body): ValidatedJson<PlaylistSchema>,
) -> ServerResult<ApiResponse<Playlist>> {
    let existing = context.playsync.database.playlist_by_id(playlist_id).await?;
    ensure_owner(existing.playlist.owner_id, session.user().id)?;

    context
        .playsync
        .database
        .update_playlist(UpdatedPlaylist {
            id: playlist_id,
            name: body.name,
            description: body.description,
        })
        .await?;

    let playlist = context.playsync.database.playlist_by_id(playlist_id).await?;

    Ok(ApiResponse::ok(
        playlist.to_serialized(),
        "Playlist updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/playlist/{playlistId}",
    tag = "playlist",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "The playlist was deleted")
    )
)]
async fn delete_playlist(
    session: Session,
    State(context): State<ServerContext>,
    Path(playlist_id): Path<PrimaryKey>,
) -> ServerResult<ApiResponse<serde_json::Value>> {
    let existing = context.playsync.database.playlist_by_id(playlist_id).await?;
    ensure_owner(existing.playlist.owner_id, session.user().id)?;

    context.playsync.database.delete_playlist(playlist_id).await?;

    Ok(ApiResponse::ok(json!({}), "Playlist deleted successfully"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/playlist/add/{videoId}/{playlistId}",
    tag = "playlist",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Playlist)
    )
)]
async fn add_video(
    session: Session,
    State(context): State<ServerContext>,
    Path((video_id, playlist_id)): Path<(PrimaryKey, PrimaryKey)>,
) -> ServerResult<ApiResponse<Playlist>> {
    let existing = context.playsync.database.playlist_by_id(playlist_id).await?;
    ensure_owner(existing.playlist.owner_id, session.user().id)?;

    context
        .playsync
        .database
        .add_video_to_playlist(playlist_id, video_id)
        .await?;

    let playlist = context.playsync.database.playlist_by_id(playlist_id).await?;

    Ok(ApiResponse::ok(
        playlist.to_serialized(),
        "Video added to playlist",
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/playlist/remove/{videoId}/{playlistId}",
    tag = "playlist",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Playlist)
    )
)]
async fn remove_video(
    session: Session,
    State(context): State<ServerContext>,
    Path((video_id, playlist_id)): Path<(PrimaryKey, PrimaryKey)>,
) -> ServerResult<ApiResponse<Playlist>> {
    let existing = context.playsync.database.playlist_by_id(playlist_id).await?;
    ensure_owner(existing.playlist.owner_id, session.user().id)?;

    context
        .playsync
        .database
        .remove_video_from_playlist(playlist_id, video_id)
        .await?;

    let playlist = context.playsync.database.playlist_by_id(playlist_id).await?;

    Ok(ApiResponse::ok(
        playlist.to_serialized(),
        "Video removed from playlist",
    ))
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_playlist))
        .route("/user/:userId", get(user_playlists))
        .route("/add/:videoId/:playlistId", patch(add_video))
        .route("/remove/:videoId/:playlistId", patch(remove_video))
        .route(
            "/:playlistId",
            get(playlist_by_id)
                .patch(update_playlist)
                .delete(delete_playlist),
        )
}
