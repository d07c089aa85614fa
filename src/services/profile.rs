// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile updates for the authenticated user.

use crate::db::UserUpdate;
use crate::error::AppError;
use crate::models::{User, UserProfile};
use crate::services::uploads::{self, IncomingFile};
use crate::AppState;

/// Which profile image is being replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Avatar,
    CoverImage,
}

impl ImageKind {
    fn label(self) -> &'static str {
        match self {
            ImageKind::Avatar => "Avatar",
            ImageKind::CoverImage => "Cover image",
        }
    }

    fn current(self, user: &User) -> &str {
        match self {
            ImageKind::Avatar => &user.avatar,
            ImageKind::CoverImage => &user.cover_image,
        }
    }

    fn update(self, url: &str) -> UserUpdate<'_> {
        match self {
            ImageKind::Avatar => UserUpdate::Avatar(url),
            ImageKind::CoverImage => UserUpdate::CoverImage(url),
        }
    }
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

/// Update full name and email. Both are required.
pub async fn update_account(
    state: &AppState,
    user_id: &str,
    full_name: Option<&str>,
    email: Option<&str>,
) -> Result<UserProfile, AppError> {
    let (Some(full_name), Some(email)) = (
        full_name.map(str::trim).filter(|v| !v.is_empty()),
        email.map(str::trim).filter(|v| !v.is_empty()),
    ) else {
        return Err(AppError::BadRequest("All fields are required".to_string()));
    };

    if let Some(other) = state
        .db
        .find_user_by_username_or_email(None, Some(email))
        .await?
    {
        if other.id != user_id {
            return Err(AppError::Conflict("Email is already in use".to_string()));
        }
    }

    let user = state
        .db
        .update_user(user_id, UserUpdate::AccountDetails { full_name, email })
        .await?
        .ok_or_else(user_not_found)?;

    tracing::info!(user_id = %user_id, "Account details updated");
    Ok(UserProfile::from(user))
}

/// Upload a new avatar or cover image and point the profile at it.
///
/// The previous image stays at the media host; its URL is logged so it can
/// be removed out of band.
pub async fn update_image(
    state: &AppState,
    user_id: &str,
    kind: ImageKind,
    file: Option<IncomingFile>,
) -> Result<UserProfile, AppError> {
    let file =
        file.ok_or_else(|| AppError::BadRequest(format!("{} file is missing", kind.label())))?;

    let path = uploads::stage(&state.config.upload_dir, &file).await?;
    let media = state.media.upload(&path).await.ok_or_else(|| {
        AppError::BadRequest(format!("Error while uploading {}", kind.label().to_lowercase()))
    })?;

    let previous = state
        .db
        .get_user(user_id)
        .await?
        .map(|user| kind.current(&user).to_string())
        .unwrap_or_default();
    let user = state
        .db
        .update_user(user_id, kind.update(&media.url))
        .await?
        .ok_or_else(user_not_found)?;

    tracing::info!(
        user_id = %user_id,
        kind = kind.label(),
        public_id = %media.public_id,
        previous = %previous,
        "Profile image replaced"
    );
    Ok(UserProfile::from(user))
}
