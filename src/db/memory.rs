// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process credential store for tests and local development.
//!
//! Mirrors the Firestore operations over plain maps. Unlike Firestore, the
//! username/email uniqueness check and the insert happen under one lock,
//! and so does every field update.

use crate::db::UserUpdate;
use crate::error::AppError;
use crate::models::{Subscription, User, Video};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Collections {
    users: HashMap<String, User>,
    subscriptions: Vec<Subscription>,
    videos: HashMap<String, Video>,
}

/// Shared in-memory store; clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.inner.read().await.users.get(user_id).cloned())
    }

    pub async fn find_user_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        let data = self.inner.read().await;
        Ok(data
            .users
            .values()
            .find(|u| {
                username.is_some_and(|name| u.username == name)
                    || email.is_some_and(|email| u.email == email)
            })
            .cloned())
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.find_user_by_username_or_email(Some(username), None)
            .await
    }

    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let mut data = self.inner.write().await;
        let taken = data
            .users
            .values()
            .any(|u| u.username == user.username || u.email == user.email);
        if taken {
            return Err(AppError::Conflict(
                "User with email or username already exists".to_string(),
            ));
        }
        data.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    /// Apply `update` to the stored record under the write lock.
    pub async fn update_user(
        &self,
        user_id: &str,
        update: UserUpdate<'_>,
    ) -> Result<Option<User>, AppError> {
        let mut data = self.inner.write().await;
        Ok(data.users.get_mut(user_id).map(|user| {
            update.apply(user);
            user.clone()
        }))
    }

    pub async fn subscriptions_to_channel(
        &self,
        channel_id: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        let data = self.inner.read().await;
        Ok(data
            .subscriptions
            .iter()
            .filter(|s| s.channel == channel_id)
            .cloned()
            .collect())
    }

    pub async fn subscriptions_by_subscriber(
        &self,
        subscriber_id: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        let data = self.inner.read().await;
        Ok(data
            .subscriptions
            .iter()
            .filter(|s| s.subscriber == subscriber_id)
            .cloned()
            .collect())
    }

    pub async fn record_subscription(&self, subscription: &Subscription) -> Result<(), AppError> {
        self.inner
            .write()
            .await
            .subscriptions
            .push(subscription.clone());
        Ok(())
    }

    pub async fn get_video(&self, video_id: &str) -> Result<Option<Video>, AppError> {
        Ok(self.inner.read().await.videos.get(video_id).cloned())
    }

    pub async fn insert_video(&self, video: &Video) -> Result<(), AppError> {
        self.inner
            .write()
            .await
            .videos
            .insert(video.id.clone(), video.clone());
        Ok(())
    }
}
