// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

use crate::error::AppError;
use crate::services::password;

/// User account stored in Firestore.
///
/// The password hash and the current refresh token never leave the server;
/// anything sent to a client goes through [`UserProfile`].
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Account ID (also used as document ID)
    #[serde(rename = "_id")]
    pub id: String,
    /// Unique handle, always lowercase
    #[validate(length(min = 1), custom(function = "validate_lowercase"))]
    pub username: String,
    /// Unique email address
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub full_name: String,
    /// Avatar URL at the media host
    #[validate(url)]
    pub avatar: String,
    /// Cover image URL, empty when none was uploaded
    #[serde(default)]
    pub cover_image: String,
    /// Argon2 PHC hash
    #[serde(rename = "password", default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Most recently issued refresh token; `None` means no active session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Watched video IDs in watch order
    #[serde(default)]
    pub watch_history: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

fn validate_lowercase(username: &str) -> Result<(), ValidationError> {
    if username.chars().any(char::is_uppercase) {
        return Err(ValidationError::new("lowercase"));
    }
    Ok(())
}

/// Input for creating a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub avatar: String,
    pub cover_image: String,
}

impl User {
    /// Build a new account record, hashing the password.
    pub fn new(input: NewUser) -> Result<Self, AppError> {
        let now = chrono::Utc::now().to_rfc3339();
        Ok(Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            username: input.username.trim().to_lowercase(),
            email: input.email.trim().to_string(),
            full_name: input.full_name.trim().to_string(),
            avatar: input.avatar,
            cover_image: input.cover_image,
            password_hash: Some(password::hash_password(&input.password)?),
            refresh_token: None,
            watch_history: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Replace the stored password hash.
    pub fn set_password(&mut self, new_password: &str) -> Result<(), AppError> {
        self.password_hash = Some(password::hash_password(new_password)?);
        self.touch();
        Ok(())
    }

    /// Check a candidate password against the stored hash.
    ///
    /// Fails with an internal error if the account has no hash at all.
    pub fn is_password_correct(&self, candidate: &str) -> Result<bool, AppError> {
        let hash = self
            .password_hash
            .as_deref()
            .ok_or_else(|| AppError::internal("User password is missing in the database"))?;
        password::verify_password(candidate, hash)
    }

    /// A session is active iff a refresh token is stored.
    pub fn has_active_session(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }

    /// Run model validation, mapping failures to a 400.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()
            .map_err(|e| AppError::BadRequest(format!("Invalid user record: {}", e)))
    }
}

/// A user record with the password hash and refresh token removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    pub watch_history: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar: user.avatar,
            cover_image: user.cover_image,
            watch_history: user.watch_history,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user() -> User {
        User::new(NewUser {
            username: "  Ana ".to_string(),
            email: "ana@x.com".to_string(),
            full_name: "Ana A".to_string(),
            password: "p1".to_string(),
            avatar: "https://media.example/ana.png".to_string(),
            cover_image: String::new(),
        })
        .unwrap()
    }

    #[test]
    fn test_new_user_normalizes_and_hashes() {
        let user = new_user();
        assert_eq!(user.username, "ana");
        assert_ne!(user.password_hash.as_deref(), Some("p1"));
        assert!(user.is_password_correct("p1").unwrap());
        assert!(!user.is_password_correct("p2").unwrap());
        assert!(!user.has_active_session());
        user.check().unwrap();
    }

    #[test]
    fn test_profile_json_has_no_secrets() {
        let mut user = new_user();
        user.refresh_token = Some("rt".to_string());

        let stored = serde_json::to_value(&user).unwrap();
        assert!(stored.get("password").is_some());
        assert!(stored.get("refreshToken").is_some());

        let json = serde_json::to_value(UserProfile::from(user)).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("refreshToken").is_none());
        assert_eq!(json["fullName"], "Ana A");
        assert_eq!(json["coverImage"], "");
    }

    #[test]
    fn test_missing_hash_is_internal_error() {
        let mut user = new_user();
        user.password_hash = None;
        assert!(matches!(
            user.is_password_correct("p1"),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_check_rejects_bad_email() {
        let mut user = new_user();
        user.email = "not-an-email".to_string();
        assert!(matches!(user.check(), Err(AppError::BadRequest(_))));
    }
}
