// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile and read-model routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ChannelProfile, UserProfile, WatchedVideo};
use crate::response::ApiResponse;
use crate::services::profile::{self, ImageKind};
use crate::services::read_models;
use crate::services::uploads::UploadForm;
use crate::AppState;
use axum::{
    extract::multipart::MultipartRejection,
    extract::{rejection::JsonRejection, rejection::PathRejection, Multipart, Path, State},
    routing::{get, patch},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// API routes (require authentication via access token).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/users/current-user", get(get_current_user))
        .route("/api/v1/users/update-account", patch(update_account))
        .route("/api/v1/users/avatar", patch(update_avatar))
        .route("/api/v1/users/cover-image", patch(update_cover_image))
        .route("/api/v1/users/history", get(get_watch_history))
}

/// Routes where authentication is optional.
pub fn optional_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/v1/users/c/{username}", get(get_channel_profile))
}

// ─── Current User ────────────────────────────────────────────

/// The identity resolved by the auth middleware, as is.
async fn get_current_user(Extension(user): Extension<AuthUser>) -> ApiResponse<UserProfile> {
    ApiResponse::ok(user.profile, "Current user fetched successfully")
}

// ─── Account Details ─────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

async fn update_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: std::result::Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> Result<ApiResponse<UserProfile>> {
    let Json(body) = body?;
    let updated = profile::update_account(
        &state,
        user.id(),
        body.full_name.as_deref(),
        body.email.as_deref(),
    )
    .await?;
    Ok(ApiResponse::ok(updated, "Account details updated successfully"))
}

// ─── Images ──────────────────────────────────────────────────

async fn update_avatar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UserProfile>> {
    let mut form = UploadForm::read(multipart?).await?;
    let updated =
        profile::update_image(&state, user.id(), ImageKind::Avatar, form.take_file("avatar"))
            .await?;
    Ok(ApiResponse::ok(updated, "Avatar image updated successfully"))
}

async fn update_cover_image(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UserProfile>> {
    let mut form = UploadForm::read(multipart?).await?;
    let updated = profile::update_image(
        &state,
        user.id(),
        ImageKind::CoverImage,
        form.take_file("coverImage"),
    )
    .await?;
    Ok(ApiResponse::ok(updated, "Cover image updated successfully"))
}

// ─── Channel Profile ─────────────────────────────────────────

async fn get_channel_profile(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Option<AuthUser>>,
    username: std::result::Result<Path<String>, PathRejection>,
) -> Result<ApiResponse<ChannelProfile>> {
    let Path(username) = username?;
    if username.trim().is_empty() {
        return Err(AppError::BadRequest("username is missing".to_string()));
    }

    let channel = read_models::channel_profile(
        &state.db,
        &username,
        caller.as_ref().map(AuthUser::id),
    )
    .await?;
    Ok(ApiResponse::ok(channel, "User channel fetched successfully"))
}

// ─── Watch History ───────────────────────────────────────────

async fn get_watch_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<ApiResponse<Vec<WatchedVideo>>> {
    let stored = state
        .db
        .get_user(user.id())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let history = read_models::watch_history(&state.db, &stored).await?;
    Ok(ApiResponse::ok(history, "Watch history fetched successfully"))
}
