// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration and session routes.

use axum::{
    extract::{rejection::JsonRejection, Multipart, State},
    extract::multipart::MultipartRejection,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::auth::{AuthUser, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::models::UserProfile;
use crate::response::{ApiResponse, Empty};
use crate::services::session::{self, Credentials, Registration};
use crate::services::tokens::TokenPair;
use crate::services::uploads::UploadForm;
use crate::AppState;

/// Public session routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/users/register", post(register))
        .route("/api/v1/users/login", post(login))
        .route("/api/v1/users/refresh-token", post(refresh_token))
}

/// Session routes that need an authenticated caller.
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/users/logout", post(logout))
        .route("/api/v1/users/change-password", post(change_password))
}

// ─── Cookies ─────────────────────────────────────────────────

fn session_cookie(
    name: &'static str,
    value: String,
    max_age_secs: u64,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(
            i64::try_from(max_age_secs).unwrap_or(i64::MAX),
        ))
        .build()
}

/// Removal cookie with the same attributes as the one being cleared.
fn removal_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::ZERO)
        .build()
}

fn with_session_cookies(state: &AppState, jar: CookieJar, tokens: &TokenPair) -> CookieJar {
    let secure = state.config.cookie_secure;
    jar.add(session_cookie(
        ACCESS_TOKEN_COOKIE,
        tokens.access_token.clone(),
        state.tokens.access_ttl_secs(),
        secure,
    ))
    .add(session_cookie(
        REFRESH_TOKEN_COOKIE,
        tokens.refresh_token.clone(),
        state.tokens.refresh_ttl_secs(),
        secure,
    ))
}

fn without_session_cookies(state: &AppState, jar: CookieJar) -> CookieJar {
    let secure = state.config.cookie_secure;
    jar.add(removal_cookie(ACCESS_TOKEN_COOKIE, secure))
        .add(removal_cookie(REFRESH_TOKEN_COOKIE, secure))
}

// ─── Register ────────────────────────────────────────────────

/// Create an account from a multipart form.
async fn register(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UserProfile>> {
    let mut form = UploadForm::read(multipart?).await?;

    let input = Registration {
        full_name: form.text("fullName").map(str::to_string),
        email: form.text("email").map(str::to_string),
        username: form.text("username").map(str::to_string),
        password: form.text("password").map(str::to_string),
        avatar: form.take_file("avatar"),
        cover_image: form.take_file("coverImage"),
    };

    let user = session::register(&state, input).await?;
    Ok(ApiResponse::created(user, "User registered successfully"))
}

// ─── Login ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, ApiResponse<LoginResponse>)> {
    let Json(body) = body?;

    let outcome = session::login(
        &state,
        Credentials {
            username: body.username,
            email: body.email,
            password: body.password,
        },
    )
    .await?;

    let jar = with_session_cookies(&state, jar, &outcome.tokens);
    Ok((
        jar,
        ApiResponse::ok(
            LoginResponse {
                user: outcome.user,
                access_token: outcome.tokens.access_token,
                refresh_token: outcome.tokens.refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}

// ─── Logout ──────────────────────────────────────────────────

async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<Empty>)> {
    session::logout(&state, user.id()).await?;
    let jar = without_session_cookies(&state, jar);
    Ok((jar, ApiResponse::ok(Empty::default(), "User logged out")))
}

// ─── Refresh ─────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Exchange a refresh token (cookie first, then JSON body) for a new pair.
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: std::result::Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<(CookieJar, ApiResponse<RefreshResponse>)> {
    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| body.ok().and_then(|Json(b)| b.refresh_token));

    let tokens = session::refresh(&state, presented.as_deref()).await?;

    let jar = with_session_cookies(&state, jar, &tokens);
    Ok((
        jar,
        ApiResponse::ok(
            RefreshResponse {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            },
            "Access token refreshed",
        ),
    ))
}

// ─── Change Password ─────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    old_password: Option<String>,
    #[serde(default)]
    new_password: Option<String>,
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: std::result::Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<ApiResponse<Empty>> {
    let Json(body) = body?;
    session::change_password(
        &state,
        user.id(),
        body.old_password.as_deref(),
        body.new_password.as_deref(),
    )
    .await?;
    Ok(ApiResponse::ok(Empty::default(), "Password changed successfully"))
}
