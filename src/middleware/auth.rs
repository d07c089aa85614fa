// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access-token authentication middleware.

use crate::error::AppError;
use crate::models::UserProfile;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Cookie carrying the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Authenticated caller, loaded from the store without secret fields.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub profile: UserProfile,
}

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.profile.id
    }
}

/// Middleware that requires a valid access token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = resolve_identity(&state, request.headers(), &jar).await?;
    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Middleware that resolves the caller if possible.
///
/// Missing or rejected credentials continue as anonymous; store failures
/// are returned to the caller. Handlers read `Extension<Option<AuthUser>>`.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let resolved = resolve_identity(&state, request.headers(), &jar).await;
    let auth_user = anonymous_on_auth_failure(resolved)?;
    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

fn anonymous_on_auth_failure(
    resolved: Result<AuthUser, AppError>,
) -> Result<Option<AuthUser>, AppError> {
    match resolved {
        Ok(user) => Ok(Some(user)),
        Err(AppError::Unauthorized(reason)) => {
            tracing::debug!(reason = %reason, "Continuing unauthenticated");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Bearer token from the `Authorization` header, else the access cookie.
pub fn extract_access_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    match from_header {
        Some(token) => Some(token.to_string()),
        None => jar
            .get(ACCESS_TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty()),
    }
}

/// Verify the access token and load the referenced user.
async fn resolve_identity(
    state: &AppState,
    headers: &HeaderMap,
    jar: &CookieJar,
) -> Result<AuthUser, AppError> {
    let token = extract_access_token(headers, jar).ok_or_else(|| {
        AppError::Unauthorized("Unauthorized request: No token found".to_string())
    })?;

    let claims = state
        .tokens
        .verify_access(&token)
        .map_err(|_| AppError::Unauthorized("Invalid access token".to_string()))?;

    let user = state.db.get_user(&claims.sub).await?.ok_or_else(|| {
        tracing::warn!(user_id = %claims.sub, "Access token for unknown user");
        AppError::Unauthorized("Invalid access token: User not found".to_string())
    })?;

    Ok(AuthUser {
        profile: UserProfile::from(user),
    })
}
