// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account session lifecycle.
//!
//! A session is active iff the user record holds a refresh token. Login and
//! refresh overwrite it (last write wins across concurrent logins), logout
//! clears it. A refresh token is only accepted if it equals the stored one,
//! so any earlier token is dead as soon as a newer one is written.

use crate::db::UserUpdate;
use crate::error::AppError;
use crate::models::{NewUser, User, UserProfile};
use crate::services::tokens::TokenPair;
use crate::services::uploads::{self, IncomingFile};
use crate::AppState;
use subtle::ConstantTimeEq;

/// Registration input as received from the form.
#[derive(Debug, Default)]
pub struct Registration {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<IncomingFile>,
    pub cover_image: Option<IncomingFile>,
}

/// Login input; either identifier may be used.
#[derive(Debug, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Successful login.
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

/// Trimmed, non-empty value of an optional input.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Create an account.
pub async fn register(state: &AppState, input: Registration) -> Result<UserProfile, AppError> {
    let (Some(full_name), Some(email), Some(username), Some(password)) = (
        non_empty(input.full_name.as_deref()),
        non_empty(input.email.as_deref()),
        non_empty(input.username.as_deref()),
        input.password.as_deref().filter(|p| !p.trim().is_empty()),
    ) else {
        return Err(AppError::BadRequest("All fields are required".to_string()));
    };
    let username = username.to_lowercase();

    if state
        .db
        .find_user_by_username_or_email(Some(&username), Some(email))
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "User with email or username already exists".to_string(),
        ));
    }

    let avatar_file = input
        .avatar
        .ok_or_else(|| AppError::BadRequest("Avatar file is required".to_string()))?;

    let avatar_path = uploads::stage(&state.config.upload_dir, &avatar_file).await?;
    let avatar = state
        .media
        .upload(&avatar_path)
        .await
        .ok_or_else(|| AppError::BadRequest("Avatar upload failed".to_string()))?;

    let cover_image = match input.cover_image {
        Some(file) => upload_best_effort(state, &file).await.unwrap_or_else(|| {
            tracing::warn!(username = %username, "Cover image upload failed, registering without one");
            String::new()
        }),
        None => String::new(),
    };

    let user = User::new(NewUser {
        username,
        email: email.to_string(),
        full_name: full_name.to_string(),
        password: password.to_string(),
        avatar: avatar.url,
        cover_image,
    })?;
    state.db.insert_user(&user).await?;

    let created = state.db.get_user(&user.id).await?.ok_or_else(|| {
        AppError::internal("Something went wrong while registering the user")
    })?;

    tracing::info!(user_id = %created.id, username = %created.username, "User registered");
    Ok(UserProfile::from(created))
}

async fn upload_best_effort(state: &AppState, file: &IncomingFile) -> Option<String> {
    let path = match uploads::stage(&state.config.upload_dir, file).await {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to stage optional upload");
            return None;
        }
    };
    state.media.upload(&path).await.map(|media| media.url)
}

/// Verify credentials and start a new session.
pub async fn login(state: &AppState, input: Credentials) -> Result<LoginOutcome, AppError> {
    let username = non_empty(input.username.as_deref()).map(str::to_lowercase);
    let email = non_empty(input.email.as_deref());

    if username.is_none() && email.is_none() {
        return Err(AppError::BadRequest(
            "username or email is required".to_string(),
        ));
    }
    let password = input
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("password is required".to_string()))?;

    let user = state
        .db
        .find_user_by_username_or_email(username.as_deref(), email)
        .await?
        .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

    if !user.is_password_correct(password)? {
        tracing::warn!(user_id = %user.id, "Login rejected: wrong password");
        return Err(AppError::Unauthorized(
            "Invalid user credentials".to_string(),
        ));
    }

    let tokens = start_session(state, &user).await?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(LoginOutcome {
        user: UserProfile::from(user),
        tokens,
    })
}

/// Issue a token pair and store its refresh token on the user record.
async fn start_session(state: &AppState, user: &User) -> Result<TokenPair, AppError> {
    let tokens = state.tokens.issue_pair(user)?;
    if !state
        .db
        .set_refresh_token(&user.id, Some(&tokens.refresh_token))
        .await?
    {
        return Err(AppError::internal(
            "Something went wrong while generating refresh and access token",
        ));
    }
    Ok(tokens)
}

/// End the caller's session.
pub async fn logout(state: &AppState, user_id: &str) -> Result<(), AppError> {
    if !state.db.set_refresh_token(user_id, None).await? {
        tracing::warn!(user_id = %user_id, "Logout for user that no longer exists");
    }
    tracing::info!(user_id = %user_id, "User logged out");
    Ok(())
}

/// Rotate the session: exchange the current refresh token for a new pair.
pub async fn refresh(state: &AppState, presented: Option<&str>) -> Result<TokenPair, AppError> {
    let presented = non_empty(presented)
        .ok_or_else(|| AppError::Unauthorized("unauthorized request".to_string()))?;

    let claims = state
        .tokens
        .verify_refresh(presented)
        .map_err(|_| AppError::Unauthorized("Invalid refresh token".to_string()))?;

    let user = state
        .db
        .get_user(&claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

    let matches_stored = user
        .refresh_token
        .as_deref()
        .is_some_and(|stored| bool::from(stored.as_bytes().ct_eq(presented.as_bytes())));

    if !matches_stored {
        tracing::warn!(user_id = %user.id, "Rejected stale or reused refresh token");
        return Err(AppError::Unauthorized(
            AppError::STALE_REFRESH_TOKEN.to_string(),
        ));
    }

    let tokens = start_session(state, &user).await?;
    tracing::info!(user_id = %user.id, "Refresh token rotated");
    Ok(tokens)
}

/// Replace the caller's password after checking the old one.
pub async fn change_password(
    state: &AppState,
    user_id: &str,
    old_password: Option<&str>,
    new_password: Option<&str>,
) -> Result<(), AppError> {
    let (Some(old_password), Some(new_password)) = (
        old_password.filter(|p| !p.is_empty()),
        new_password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Both old and new passwords are required".to_string(),
        ));
    };

    let mut user = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !user.is_password_correct(old_password)? {
        tracing::warn!(user_id = %user_id, "Password change rejected: wrong old password");
        return Err(AppError::Unauthorized("Invalid old password".to_string()));
    }

    user.set_password(new_password)?;
    user.check()?;
    let hash = user
        .password_hash
        .as_deref()
        .ok_or_else(|| AppError::internal("Password hash missing after update"))?;

    // Only the hash is written; a concurrent logout stays in effect.
    state
        .db
        .update_user(user_id, UserUpdate::PasswordHash(hash))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user_id, "Password changed");
    Ok(())
}
