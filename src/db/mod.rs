//! Credential store (Firestore in production, in-memory for tests).
//!
//! [`Database`] is the single process-scoped handle injected through
//! `AppState`; every data access goes through it.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::config::{Config, StoreBackend};
use crate::error::AppError;
use crate::models::{Subscription, User, Video};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const SUBSCRIPTIONS: &str = "subscriptions";
    pub const VIDEOS: &str = "videos";
}

/// A change to some fields of a stored user.
///
/// Each variant names the stored fields it writes; `updatedAt` is always
/// written too. Everything else in the record is left as stored.
#[derive(Debug, Clone, Copy)]
pub enum UserUpdate<'a> {
    /// `None` clears the session.
    RefreshToken(Option<&'a str>),
    /// Argon2 PHC string, already hashed.
    PasswordHash(&'a str),
    AccountDetails { full_name: &'a str, email: &'a str },
    Avatar(&'a str),
    CoverImage(&'a str),
    AppendWatchHistory(&'a str),
}

impl UserUpdate<'_> {
    /// Stored field names written by this update, excluding `updatedAt`.
    pub fn field_paths(&self) -> &'static [&'static str] {
        match self {
            UserUpdate::RefreshToken(_) => &["refreshToken"],
            UserUpdate::PasswordHash(_) => &["password"],
            UserUpdate::AccountDetails { .. } => &["fullName", "email"],
            UserUpdate::Avatar(_) => &["avatar"],
            UserUpdate::CoverImage(_) => &["coverImage"],
            UserUpdate::AppendWatchHistory(_) => &["watchHistory"],
        }
    }

    /// Apply to an in-memory record.
    pub fn apply(&self, user: &mut User) {
        match *self {
            UserUpdate::RefreshToken(token) => user.refresh_token = token.map(str::to_string),
            UserUpdate::PasswordHash(hash) => user.password_hash = Some(hash.to_string()),
            UserUpdate::AccountDetails { full_name, email } => {
                user.full_name = full_name.to_string();
                user.email = email.to_string();
            }
            UserUpdate::Avatar(url) => user.avatar = url.to_string(),
            UserUpdate::CoverImage(url) => user.cover_image = url.to_string(),
            UserUpdate::AppendWatchHistory(video_id) => {
                user.watch_history.push(video_id.to_string())
            }
        }
        user.touch();
    }
}

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreStore),
    Memory(MemoryStore),
}

/// Forward a call to whichever backend is active.
macro_rules! dispatch {
    ($self:ident.$method:ident($($arg:expr),*)) => {
        match &$self.backend {
            Backend::Firestore(store) => store.$method($($arg),*).await,
            Backend::Memory(store) => store.$method($($arg),*).await,
        }
    };
}

/// Credential store handle.
#[derive(Clone)]
pub struct Database {
    backend: Backend,
}

impl Database {
    /// Connect to the backend selected by configuration.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.store_backend {
            StoreBackend::Firestore => Ok(Self {
                backend: Backend::Firestore(FirestoreStore::new(&config.gcp_project_id).await?),
            }),
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory credential store; data is lost on restart");
                Ok(Self::in_memory())
            }
        }
    }

    /// Create an empty in-memory store.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(MemoryStore::new()),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        dispatch!(self.get_user(user_id))
    }

    /// First user whose username or email matches. `None` inputs match nothing.
    pub async fn find_user_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        if username.is_none() && email.is_none() {
            return Ok(None);
        }
        dispatch!(self.find_user_by_username_or_email(username, email))
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        dispatch!(self.find_user_by_username(username))
    }

    /// Validate and create a new user. A taken username or email is a conflict.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        user.check()?;
        dispatch!(self.insert_user(user))
    }

    /// Apply a field-scoped update. Fields not named by `update` are left
    /// untouched. Returns the stored record after the write, or `None` if
    /// the user no longer exists.
    pub async fn update_user(
        &self,
        user_id: &str,
        update: UserUpdate<'_>,
    ) -> Result<Option<User>, AppError> {
        dispatch!(self.update_user(user_id, update))
    }

    /// Set or clear the stored refresh token.
    ///
    /// Last write wins; returns `false` if the user no longer exists.
    pub async fn set_refresh_token(
        &self,
        user_id: &str,
        refresh_token: Option<&str>,
    ) -> Result<bool, AppError> {
        Ok(self
            .update_user(user_id, UserUpdate::RefreshToken(refresh_token))
            .await?
            .is_some())
    }

    /// Append a video to the user's watch history.
    pub async fn push_watch_history(&self, user_id: &str, video_id: &str) -> Result<(), AppError> {
        self.update_user(user_id, UserUpdate::AppendWatchHistory(video_id))
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    // ─── Subscription Operations ─────────────────────────────────

    /// Edges where `channel_id` is the channel (its subscribers).
    pub async fn subscriptions_to_channel(
        &self,
        channel_id: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        dispatch!(self.subscriptions_to_channel(channel_id))
    }

    /// Edges where `subscriber_id` is the subscriber (channels it follows).
    pub async fn subscriptions_by_subscriber(
        &self,
        subscriber_id: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        dispatch!(self.subscriptions_by_subscriber(subscriber_id))
    }

    pub async fn record_subscription(&self, subscription: &Subscription) -> Result<(), AppError> {
        dispatch!(self.record_subscription(subscription))
    }

    // ─── Video Operations ────────────────────────────────────────

    pub async fn get_video(&self, video_id: &str) -> Result<Option<Video>, AppError> {
        dispatch!(self.get_video(video_id))
    }

    pub async fn insert_video(&self, video: &Video) -> Result<(), AppError> {
        dispatch!(self.insert_video(video))
    }
}
