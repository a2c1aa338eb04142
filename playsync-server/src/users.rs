use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use axum_extra::extract::CookieJar;
use playsync_store::{NewRegistration, UpdatedProfile};
use serde_json::json;
use validator::Validate;

use crate::{
    auth::{expired_cookies, token_cookies, OptionalSession, Session, REFRESH_TOKEN_COOKIE},
    envelope::ApiResponse,
    errors::{ServerError, ServerResult},
    schemas::{
        ChangePasswordSchema, HistoryDeleteSchema, LoginSchema, RefreshSchema, RegisterSchema,
        UpdateAccountSchema, ValidatedJson, WatchHistorySchema,
    },
    serialized::{login_result, ChannelProfile, LoginResult, RefreshedTokens, ToSerialized, User, Video},
    uploads::{store_media, UploadForm},
    Router, ServerContext,
};

#[utoipa::path(
    post,
    path = "/api/v1/users/register",
    tag = "users",
    responses(
        (status = 201, body = User)
    )
)]
async fn register(
    State(context): State<ServerContext>,
    multipart: Multipart,
) -> ServerResult<ApiResponse<User>> {
    let mut form = UploadForm::read(multipart, &context.config.temp_dir).await?;

    let schema = RegisterSchema {
        username: form.text("username").unwrap_or_default().to_string(),
        email: form.text("email").unwrap_or_default().to_string(),
        password: form.text("password").unwrap_or_default().to_string(),
        full_name: form.text("fullName").unwrap_or_default().to_string(),
    };

    if let Err(e) = schema.validate() {
        form.discard().await;
        return Err(ServerError::Validation(e.to_string()));
    }

    // Reject a taken identity before anything is sent to the media service
    if let Err(e) = context
        .playsync
        .auth
        .ensure_available(&schema.username, &schema.email)
        .await
    {
        form.discard().await;
        return Err(e.into());
    }

    let Some(avatar) = form.take_file("avatar") else {
        form.discard().await;
        return Err(ServerError::Validation(
            "An avatar file is required".to_string(),
        ));
    };

    let cover_image = form.take_file("coverImage");
    form.discard().await;

    // Both uploads run before either result is checked, so each temp copy
    // is removed even when the other upload fails
    let avatar_url = store_media(&context, avatar).await;

    let cover_image_url = match cover_image {
        Some(file) => store_media(&context, file).await.map(Some),
        None => Ok(None),
    };

    let (avatar_url, cover_image_url) = (avatar_url?, cover_image_url?);

    let user = context
        .playsync
        .auth
        .register(NewRegistration {
            username: schema.username,
            email: schema.email,
            password: schema.password,
            full_name: schema.full_name,
            avatar_url,
            cover_image_url,
        })
        .await?;

    Ok(ApiResponse::created(
        user.to_serialized(),
        "User registered successfully",
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    tag = "users",
    request_body = LoginSchema,
    responses(
        (status = 200, body = LoginResult)
    )
)]
async fn login(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<LoginSchema>,
) -> ServerResult<impl IntoResponse> {
    let identity = body
        .username
        .or(body.email)
        .ok_or_else(|| ServerError::Validation("Username or email is required".to_string()))?;

    let (user, pair) = context.playsync.auth.login(&identity, &body.password).await?;
    let jar = token_cookies(&pair, context.config.production);

    Ok((
        jar,
        ApiResponse::ok(login_result(&user, &pair), "User logged in successfully"),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/logout",
    tag = "users",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "The session was ended and auth cookies cleared")
    )
)]
async fn logout(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<impl IntoResponse> {
    context.playsync.auth.logout(session.user().id).await?;

    Ok((
        expired_cookies(),
        ApiResponse::ok(json!({}), "User logged out successfully"),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/refresh-token",
    tag = "users",
    request_body = RefreshSchema,
    responses(
        (status = 200, body = RefreshedTokens)
    )
)]
async fn refresh_token(
    State(context): State<ServerContext>,
    jar: CookieJar,
    body: Option<ValidatedJson<RefreshSchema>>,
) -> ServerResult<impl IntoResponse> {
    let token = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| body.and_then(|b| b.0.refresh_token))
        .ok_or(ServerError::MissingToken)?;

    let (_, pair) = context.playsync.auth.refresh(&token).await?;
    let jar = token_cookies(&pair, context.config.production);

    Ok((
        jar,
        ApiResponse::ok(pair.to_serialized(), "Access token refreshed"),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/change-password",
    tag = "users",
    request_body = ChangePasswordSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "The password was changed")
    )
)]
async fn change_password(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<ChangePasswordSchema>,
) -> ServerResult<ApiResponse<serde_json::Value>> {
    context
        .playsync
        .auth
        .change_password(session.user().id, &body.old_password, &body.new_password)
        .await?;

    Ok(ApiResponse::ok(json!({}), "Password changed successfully"))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/c",
    tag = "users",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = User)
    )
)]
async fn current_user(session: Session) -> ApiResponse<User> {
    ApiResponse::ok(session.user().to_serialized(), "Current user fetched")
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/update-account",
    tag = "users",
    request_body = UpdateAccountSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = User)
    )
)]
async fn update_account(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<UpdateAccountSchema>,
) -> ServerResult<ApiResponse<User>> {
    let user = context
        .playsync
        .database
        .update_profile(UpdatedProfile {
            id: session.user().id,
            full_name: body.full_name,
            email: body.email,
            avatar_url: None,
            cover_image_url: None,
        })
        .await?;

    Ok(ApiResponse::ok(
        user.to_serialized(),
        "Account updated successfully",
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/avatar",
    tag = "users",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = User)
    )
)]
async fn update_avatar(
    session: Session,
    State(context): State<ServerContext>,
    multipart: Multipart,
) -> ServerResult<ApiResponse<User>> {
    let mut form = UploadForm::read(multipart, &context.config.temp_dir).await?;

    let Some(file) = form.take_file("avatar") else {
        form.discard().await;
        return Err(ServerError::Validation(
            "An avatar file is required".to_string(),
        ));
    };

    form.discard().await;

    let previous = session.user().avatar_url;
    let avatar_url = store_media(&context, file).await?;

    let user = context
        .playsync
        .database
        .update_profile(UpdatedProfile {
            id: session.user().id,
            full_name: None,
            email: None,
            avatar_url: Some(avatar_url),
            cover_image_url: None,
        })
        .await?;

    if let Err(e) = context.playsync.media.delete(&previous).await {
        log::warn!("Failed to delete previous avatar: {}", e);
    }

    Ok(ApiResponse::ok(
        user.to_serialized(),
        "Avatar updated successfully",
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/cover-image",
    tag = "users",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = User)
    )
)]
async fn update_cover_image(
    session: Session,
    State(context): State<ServerContext>,
    multipart: Multipart,
) -> ServerResult<ApiResponse<User>> {
    let mut form = UploadForm::read(multipart, &context.config.temp_dir).await?;

    let Some(file) = form.take_file("coverImage") else {
        form.discard().await;
        return Err(ServerError::Validation(
            "A cover image file is required".to_string(),
        ));
    };

    form.discard().await;

    let previous = session.user().cover_image_url;
    let cover_image_url = store_media(&context, file).await?;

    let user = context
        .playsync
        .database
        .update_profile(UpdatedProfile {
            id: session.user().id,
            full_name: None,
            email: None,
            avatar_url: None,
            cover_image_url: Some(cover_image_url),
        })
        .await?;

    if let Some(previous) = previous {
        if let Err(e) = context.playsync.media.delete(&previous).await {
            log::warn!("Failed to delete previous cover image: {}", e);
        }
    }

    Ok(ApiResponse::ok(
        user.to_serialized(),
        "Cover image updated successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/c/{username}",
    tag = "users",
    responses(
        (status = 200, body = ChannelProfile)
    )
)]
async fn channel_profile(
    session: OptionalSession,
    State(context): State<ServerContext>,
    Path(username): Path<String>,
) -> ServerResult<ApiResponse<ChannelProfile>> {
    let viewer = session.0.map(|u| u.id);

    let profile = context
        .playsync
        .database
        .channel_profile(&username, viewer)
        .await?;

    Ok(ApiResponse::ok(
        profile.to_serialized(),
        "Channel profile fetched",
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/c/{username}/videos",
    tag = "users",
    responses(
        (status = 200, body = Vec<Video>)
    )
)]
async fn channel_videos(
    State(context): State<ServerContext>,
    Path(username): Path<String>,
) -> ServerResult<ApiResponse<Vec<Video>>> {
    let user = context.playsync.database.user_by_username(&username).await?;
    let videos = context.playsync.database.videos_by_owner(user.id).await?;

    Ok(ApiResponse::ok(
        videos.to_serialized(),
        "Channel videos fetched",
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/history",
    tag = "users",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Video>)
    )
)]
async fn watch_history(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<ApiResponse<Vec<Video>>> {
    let videos = context
        .playsync
        .database
        .watch_history(session.user().id)
        .await?;

    Ok(ApiResponse::ok(
        videos.to_serialized(),
        "Watch history fetched",
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/history",
    tag = "users",
    request_body = WatchHistorySchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "The video was added to the watch history")
    )
)]
async fn push_watch_history(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<WatchHistorySchema>,
) -> ServerResult<ApiResponse<serde_json::Value>> {
    context
        .playsync
        .database
        .push_watch_history(session.user().id, body.video_id)
        .await?;

    Ok(ApiResponse::ok(json!({}), "Video added to watch history"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/delete-watch-history",
    tag = "users",
    request_body = HistoryDeleteSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "One entry, or the whole history, was removed")
    )
)]
async fn remove_watch_history(
    session: Session,
    State(context): State<ServerContext>,
    body: Option<ValidatedJson<HistoryDeleteSchema>>,
) -> ServerResult<ApiResponse<serde_json::Value>> {
    let video_id = body.and_then(|b| b.0.video_id);

    context
        .playsync
        .database
        .remove_watch_history(session.user().id, video_id)
        .await?;

    Ok(ApiResponse::ok(json!({}), "Watch history updated"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/delete-account",
    tag = "users",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "The account and everything it owned was deleted")
    )
)]
async fn delete_account(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<impl IntoResponse> {
    context
        .playsync
        .database
        .delete_user_cascade(session.user().id)
        .await?;

    Ok((
        expired_cookies(),
        ApiResponse::ok(json!({}), "Account deleted successfully"),
    ))
}

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
        .route("/change-password", post(change_password))
        .route("/c", get(current_user))
        .route("/update-account", patch(update_account))
        .route("/avatar", patch(update_avatar))
        .route("/cover-image", patch(update_cover_image))
        .route("/c/:username", get(channel_profile))
        .route("/c/:username/videos", get(channel_videos))
        .route("/history", get(watch_history).post(push_watch_history))
        .route("/delete-watch-history", delete(remove_watch_history))
        .route("/delete-account", delete(delete_account))
}
