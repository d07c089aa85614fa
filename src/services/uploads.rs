// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Multipart form parsing and local staging of uploaded files.
//!
//! Files are buffered in memory while the form is read and only written to
//! the staging directory right before they are handed to the media host, so
//! a request rejected during validation leaves nothing on disk.

use crate::error::AppError;
use axum::body::Bytes;
use axum::extract::Multipart;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A file received in a multipart form.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Parsed multipart form: text fields plus the first file of each file field.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, IncomingFile>,
}

impl UploadForm {
    /// Read the whole multipart body.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await?;
                    // Browsers send an empty part for an untouched file input.
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    form.files.entry(name).or_insert(IncomingFile {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                None => {
                    let text = field.text().await?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    /// Text field value, if present.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn take_file(&mut self, name: &str) -> Option<IncomingFile> {
        self.files.remove(name)
    }
}

/// Write a file into the staging directory under a fresh unique name.
pub async fn stage(dir: &Path, file: &IncomingFile) -> Result<PathBuf, AppError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::internal(format!("Failed to create upload dir: {}", e)))?;

    let extension = Path::new(&file.file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    let path = dir.join(format!("{}{}", uuid::Uuid::new_v4().simple(), extension));
    tokio::fs::write(&path, &file.bytes)
        .await
        .map_err(|e| AppError::internal(format!("Failed to stage upload: {}", e)))?;

    tracing::debug!(path = %path.display(), bytes = file.bytes.len(), "Staged upload");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stage_writes_file_with_safe_name() {
        let dir = std::env::temp_dir().join("streamhub-accounts-stage-test");
        let file = IncomingFile {
            file_name: "../../etc/Avatar.PNG".to_string(),
            content_type: Some("image/png".to_string()),
            bytes: Bytes::from_static(b"png-bytes"),
        };

        let path = stage(&dir, &file).await.unwrap();

        assert_eq!(path.parent(), Some(dir.as_path()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"png-bytes");
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
