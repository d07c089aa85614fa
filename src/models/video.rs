// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Video and subscription records consumed by the read models.

use serde::{Deserialize, Serialize};

/// Stored video record. Owned and written by the video feature; accounts
/// only read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(rename = "_id")]
    pub id: String,
    /// Owning user ID
    pub owner: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Playback URL at the media host
    pub video_file: String,
    pub thumbnail: String,
    /// Duration in seconds
    pub duration: f64,
    #[serde(default)]
    pub views: u64,
    #[serde(default = "default_published")]
    pub is_published: bool,
    pub created_at: String,
}

fn default_published() -> bool {
    true
}

/// Directed edge: `subscriber` follows `channel`. Both are user IDs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(rename = "_id")]
    pub id: String,
    pub subscriber: String,
    pub channel: String,
    pub created_at: String,
}

impl Subscription {
    pub fn new(subscriber: &str, channel: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            subscriber: subscriber.to_string(),
            channel: channel.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
