// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (accounts, credentials, session refresh token)
//! - Subscriptions (subscriber → channel edges, read only here)
//! - Videos (read only here)

use crate::db::{collections, UserUpdate};
use crate::error::AppError;
use crate::models::{Subscription, User, Video};
use serde::{Deserialize, Serialize};

/// Partial user document for field-masked writes. Fields left `None` are
/// omitted, which deletes them if they are in the mask.
#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserFields {
    #[serde(rename = "password", skip_serializing_if = "Option::is_none")]
    password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    watch_history: Option<Vec<String>>,
    updated_at: String,
}

/// Firestore-backed credential store.
#[derive(Clone)]
pub struct FirestoreStore {
    client: firestore::FirestoreDb,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the first user matching `username` OR `email`.
    pub async fn find_user_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        let username = username.map(str::to_string);
        let email = email.map(str::to_string);

        let matches: Vec<User> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| {
                q.for_any([
                    username
                        .as_ref()
                        .and_then(|u| q.field("username").eq(u.clone())),
                    email.as_ref().and_then(|e| q.field("email").eq(e.clone())),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(matches.into_iter().next())
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let username = username.to_string();
        let matches: Vec<User> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("username").eq(username.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(matches.into_iter().next())
    }

    /// Create a user, rejecting a taken username or email.
    ///
    /// Firestore has no unique indexes, so this is check-then-write; two
    /// concurrent registrations for the same name can both pass the check.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        if self
            .find_user_by_username_or_email(Some(&user.username), Some(&user.email))
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "User with email or username already exists".to_string(),
            ));
        }
        self.create_user_document(user).await
    }

    /// Write a new user document.
    async fn create_user_document(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Write only the fields named by `update` (plus `updatedAt`).
    ///
    /// The write requires the document to exist, so a deleted user is never
    /// recreated as a partial document.
    pub async fn update_user(
        &self,
        user_id: &str,
        update: UserUpdate<'_>,
    ) -> Result<Option<User>, AppError> {
        let mut patch = UserFields {
            updated_at: chrono::Utc::now().to_rfc3339(),
            ..UserFields::default()
        };
        match update {
            UserUpdate::RefreshToken(token) => patch.refresh_token = token.map(str::to_string),
            UserUpdate::PasswordHash(hash) => patch.password_hash = Some(hash.to_string()),
            UserUpdate::AccountDetails { full_name, email } => {
                patch.full_name = Some(full_name.to_string());
                patch.email = Some(email.to_string());
            }
            UserUpdate::Avatar(url) => patch.avatar = Some(url.to_string()),
            UserUpdate::CoverImage(url) => patch.cover_image = Some(url.to_string()),
            UserUpdate::AppendWatchHistory(video_id) => {
                // No atomic append that keeps repeats; two concurrent appends
                // for the same user can lose one entry.
                let Some(user) = self.get_user(user_id).await? else {
                    return Ok(None);
                };
                let mut history = user.watch_history;
                history.push(video_id.to_string());
                patch.watch_history = Some(history);
            }
        }

        let mut fields: Vec<&str> = update.field_paths().to_vec();
        fields.push("updatedAt");

        let result: Result<User, _> = self
            .client
            .fluent()
            .update()
            .fields(fields)
            .in_col(collections::USERS)
            .precondition(firestore::FirestoreWritePrecondition::Exists(true))
            .document_id(user_id)
            .object(&patch)
            .execute()
            .await;

        match result {
            Ok(user) => Ok(Some(user)),
            Err(firestore::errors::FirestoreError::DataNotFoundError(_)) => Ok(None),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    // ─── Subscription Operations ─────────────────────────────────

    pub async fn subscriptions_to_channel(
        &self,
        channel_id: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        self.subscriptions_where("channel", channel_id).await
    }

    pub async fn subscriptions_by_subscriber(
        &self,
        subscriber_id: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        self.subscriptions_where("subscriber", subscriber_id).await
    }

    async fn subscriptions_where(
        &self,
        field: &'static str,
        user_id: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        let user_id = user_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::SUBSCRIPTIONS)
            .filter(move |q| q.for_all([q.field(field).eq(user_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn record_subscription(&self, subscription: &Subscription) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::SUBSCRIPTIONS)
            .document_id(&subscription.id)
            .object(subscription)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Video Operations ────────────────────────────────────────

    pub async fn get_video(&self, video_id: &str) -> Result<Option<Video>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::VIDEOS)
            .obj()
            .one(video_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn insert_video(&self, video: &Video) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::VIDEOS)
            .document_id(&video.id)
            .object(video)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
