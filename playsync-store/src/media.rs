use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    /// The media service rejected or failed the request
    #[error("Media service returned {status}: {body}")]
    Rejected { status: StatusCode, body: String },
    /// The file could not be read from disk before upload
    #[error("Failed to read media file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Represents a service that stores uploaded media files and serves them by
/// public url
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Uploads a local file, returning the public url it is served from
    async fn upload(&self, local_path: &Path) -> Result<String, MediaError>;
    /// Deletes a previously uploaded file by its public url
    async fn delete(&self, url: &str) -> Result<(), MediaError>;
}

/// A [MediaStore] backed by an HTTP media service
pub struct HttpMediaStore {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

impl HttpMediaStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MediaStore for HttpMediaStore {
    async fn upload(&self, local_path: &Path) -> Result<String, MediaError> {
        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());

        let contents = tokio::fs::read(local_path).await?;
        let part = multipart::Part::bytes(contents).file_name(file_name);
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected { status, body });
        }

        let parsed: UploadResponse = response.json().await?;
        Ok(parsed.url)
    }

    async fn delete(&self, url: &str) -> Result<(), MediaError> {
        let response = self
            .client
            .delete(format!("{}/delete", self.base_url))
            .query(&[("url", url)])
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected { status, body });
        }

        Ok(())
    }
}

/// Removes a temporary file, logging instead of failing if it can't be
/// removed. Intake files are in a scratch directory, so a leak here is
/// harmless.
pub async fn discard_temp(path: &PathBuf) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        log::warn!("Failed to remove temporary file {:?}: {}", path, e);
    }
}
