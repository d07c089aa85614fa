// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Media host client (Cloudinary) for avatar and cover images.
//!
//! Uploads a staged local file and returns its durable URL. Failures are
//! logged and reported as `None`; nothing is retried. The staged file is
//! removed after every attempt.

use crate::config::{CloudinaryConfig, Config};
use crate::error::AppError;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Result of a successful upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedMedia {
    pub public_id: String,
    pub url: String,
    #[serde(default)]
    pub secure_url: Option<String>,
}

/// Why an upload produced no URL. Only logged; callers see `None`.
#[derive(Debug, thiserror::Error)]
enum UploadError {
    #[error("cannot read staged file: {0}")]
    Read(std::io::Error),

    #[error("refusing to upload empty file")]
    Empty,

    #[error("system time error: {0}")]
    Clock(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Media host client.
#[derive(Clone)]
pub struct MediaService {
    http: reqwest::Client,
    base_url: String,
    /// `None` in offline mode
    credentials: Option<CloudinaryConfig>,
}

impl MediaService {
    pub fn new(credentials: CloudinaryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://api.cloudinary.com/v1_1".to_string(),
            credentials: Some(credentials),
        }
    }

    /// Build from configuration. Without credentials, debug builds fall back
    /// to offline mode; release builds refuse to start.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        match &config.cloudinary {
            Some(credentials) => Ok(Self::new(credentials.clone())),
            #[cfg(debug_assertions)]
            None => {
                tracing::warn!("Cloudinary credentials missing, media host running offline");
                Ok(Self::new_mock())
            }
            #[cfg(not(debug_assertions))]
            None => Err(AppError::internal("Cloudinary credentials are not configured")),
        }
    }

    /// Create an offline media host for testing.
    /// Only available in debug/test builds.
    #[cfg(debug_assertions)]
    pub fn new_mock() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://media.invalid".to_string(),
            credentials: None,
        }
    }

    /// Upload a staged file. Returns `None` if the media host produced no URL.
    pub async fn upload(&self, local_path: &Path) -> Option<UploadedMedia> {
        let result = self.try_upload(local_path).await;

        if let Err(e) = tokio::fs::remove_file(local_path).await {
            tracing::debug!(path = %local_path.display(), error = %e, "Staged file already gone");
        }

        match result {
            Ok(media) => {
                tracing::info!(public_id = %media.public_id, url = %media.url, "Media uploaded");
                Some(media)
            }
            Err(e) => {
                tracing::warn!(path = %local_path.display(), error = %e, "Media upload failed");
                None
            }
        }
    }

    async fn try_upload(&self, local_path: &Path) -> Result<UploadedMedia, UploadError> {
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(UploadError::Read)?;

        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }

        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let Some(credentials) = &self.credentials else {
            return Ok(offline_media(&self.base_url, &file_name));
        };

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| UploadError::Clock(e.to_string()))?
            .as_secs()
            .to_string();

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", credentials.api_key.clone())
            .text("timestamp", timestamp.clone())
            .text(
                "signature",
                sign_params(&[("timestamp", &timestamp)], &credentials.api_secret),
            );

        let url = format!("{}/{}/auto/upload", self.base_url, credentials.cloud_name);
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}

fn offline_media(base_url: &str, file_name: &str) -> UploadedMedia {
    let stem = file_name.split('.').next().unwrap_or(file_name);
    let url = format!("{}/{}", base_url, file_name);
    UploadedMedia {
        public_id: stem.to_string(),
        url: url.clone(),
        secure_url: Some(url),
    }
}

/// Cloudinary request signature: SHA-1 over the sorted `k=v&...` string
/// with the API secret appended.
fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}
