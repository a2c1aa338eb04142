use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use axum::extract::Multipart;
use chrono::Utc;
use playsync_store::util::{random_string, sanitize_filename};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// The most a single upload request may carry
pub const MAX_UPLOAD_BYTES: usize = 500 * 1024 * 1024;

const ALLOWED_MIME_TYPES: [&str; 10] = [
    "video/mp4",
    "video/x-msvideo",
    "video/x-matroska",
    "video/x-flv",
    "video/webm",
    "video/quicktime",
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to read multipart body: {0}")]
    Multipart(String),
    /// Carries the offending MIME type
    #[error("File type {0} is not allowed")]
    UnsupportedType(String),
    #[error("Failed to store uploaded file: {0}")]
    Io(#[from] std::io::Error),
}

/// A file field streamed to the scratch directory
#[derive(Debug)]
pub struct TempFile {
    pub path: PathBuf,
    pub mime: String,
    pub original_name: String,
}

/// A parsed multipart form with its file fields already on disk
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, TempFile>,
}

impl UploadForm {
    /// Reads the entire form, streaming file fields into `temp_dir`. Files
    /// written so far are discarded if any part of the form is rejected.
    pub async fn read(multipart: Multipart, temp_dir: &Path) -> Result<Self, UploadError> {
        let mut form = Self::default();

        match form.read_into(multipart, temp_dir).await {
            Ok(()) => Ok(form),
            Err(e) => {
                form.discard().await;
                Err(e)
            }
        }
    }

    async fn read_into(&mut self, mut multipart: Multipart, temp_dir: &Path) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(temp_dir).await?;

        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| UploadError::Multipart(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(|n| n.to_string());

            match file_name {
                Some(file_name) => {
                    let mime = field.content_type().unwrap_or_default().to_string();

                    if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
                        return Err(UploadError::UnsupportedType(mime));
                    }

                    let original_name = sanitize_filename(&file_name);
                    let unique_name = format!(
                        "{}-{}-{}",
                        Utc::now().timestamp_millis(),
                        random_string(8),
                        original_name
                    );

                    let path = temp_dir.join(unique_name);
                    let mut file = tokio::fs::File::create(&path).await?;

                    // Insert before streaming so a failed write still gets
                    // cleaned up by discard()
                    self.files.insert(
                        name,
                        TempFile {
                            path: path.clone(),
                            mime,
                            original_name,
                        },
                    );

                    while let Some(chunk) = field
                        .chunk()
                        .await
                        .map_err(|e| UploadError::Multipart(e.to_string()))?
                    {
                        file.write_all(&chunk).await?;
                    }

                    file.flush().await?;
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| UploadError::Multipart(e.to_string()))?;

                    self.fields.insert(name, value);
                }
            }
        }

        Ok(())
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.as_str())
    }

    /// Takes a file field out of the form, leaving cleanup of it to the caller
    pub fn take_file(&mut self, name: &str) -> Option<TempFile> {
        self.files.remove(name)
    }

    /// Removes every file still held by the form from disk
    pub async fn discard(&mut self) {
        for file in self.files.values() {
            playsync_store::discard_temp(&file.path).await;
        }

        self.files.clear();
    }
}

/// Forwards a temp file to the media service, removing the temp copy no
/// matter how the upload went
pub async fn store_media(
    context: &crate::ServerContext,
    file: TempFile,
) -> crate::errors::ServerResult<String> {
    Ok(upload_and_discard(context.playsync.media.as_ref(), file).await?)
}

async fn upload_and_discard(
    media: &dyn playsync_store::MediaStore,
    file: TempFile,
) -> Result<String, playsync_store::MediaError> {
    let result = media.upload(&file.path).await;
    playsync_store::discard_temp(&file.path).await;

    result
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mime_allow_list() {
        assert!(ALLOWED_MIME_TYPES.contains(&"video/mp4"));
        assert!(ALLOWED_MIME_TYPES.contains(&"image/png"));
        assert!(!ALLOWED_MIME_TYPES.contains(&"application/x-sh"));
        assert!(!ALLOWED_MIME_TYPES.contains(&"text/html"));
    }

    #[test]
    fn test_form_accessors() {
        let mut form = UploadForm::default();
        form.fields.insert("title".to_string(), "My clip".to_string());
        form.files.insert(
            "thumbnail".to_string(),
            TempFile {
                path: PathBuf::from("/tmp/x"),
                mime: "image/png".to_string(),
                original_name: "x.png".to_string(),
            },
        );

        assert_eq!(form.text("title"), Some("My clip"));
        assert_eq!(form.text("missing"), None);

        let file = form.take_file("thumbnail").expect("file exists");
        assert_eq!(file.mime, "image/png");
        assert!(form.take_file("thumbnail").is_none());
    }

    #[test]
    fn test_unsupported_type_message() {
        let error = UploadError::UnsupportedType("video/ogg".to_string());
        assert_eq!(error.to_string(), "File type video/ogg is not allowed");
    }

    struct RejectingMedia;

    #[axum::async_trait]
    impl playsync_store::MediaStore for RejectingMedia {
        async fn upload(&self, _local_path: &Path) -> Result<String, playsync_store::MediaError> {
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "down").into())
        }

        async fn delete(&self, _url: &str) -> Result<(), playsync_store::MediaError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_upload_still_removes_temp_copy() {
        let path = std::env::temp_dir().join(format!("media-{}.png", random_string(8)));
        tokio::fs::write(&path, b"pixels").await.expect("writes");

        let file = TempFile {
            path: path.clone(),
            mime: "image/png".to_string(),
            original_name: "pixels.png".to_string(),
        };

        let result = upload_and_discard(&RejectingMedia, file).await;

        assert!(result.is_err());
        assert!(!path.exists());
    }
}
