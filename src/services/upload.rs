//! Local-disk storage for uploaded product images.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::info;

use crate::config::UploadConfig;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unsupported file type '{0}'; allowed: jpg, jpeg, png, gif, webp")]
    UnsupportedType(String),

    #[error("File exceeds the {0} MB size limit")]
    TooLarge(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct UploadService {
    config: UploadConfig,
}

impl UploadService {
    #[must_use]
    pub const fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    /// Persist uploaded bytes under a generated filename and return the
    /// public URL path the file is served at.
    pub async fn save(&self, original_filename: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let extension = Path::new(original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(UploadError::UnsupportedType(extension));
        }

        let max_bytes = self.config.max_file_size_mb * 1024 * 1024;
        if bytes.len() as u64 > max_bytes {
            return Err(UploadError::TooLarge(self.config.max_file_size_mb));
        }

        let upload_dir = PathBuf::from(&self.config.upload_dir);
        if !upload_dir.exists() {
            fs::create_dir_all(&upload_dir).await?;
        }

        let filename = format!("{}.{extension}", uuid::Uuid::new_v4());
        let file_path = upload_dir.join(&filename);

        fs::write(&file_path, bytes).await?;

        info!(path = %file_path.display(), "Stored uploaded image");

        Ok(format!("/uploads/{filename}"))
    }

    /// Remove a previously stored file given its public URL path. Unknown
    /// or external URLs are left alone.
    pub async fn delete(&self, url: &str) -> Result<(), UploadError> {
        let Some(filename) = url.strip_prefix("/uploads/") else {
            return Ok(());
        };

        let file_path = PathBuf::from(&self.config.upload_dir).join(filename);
        if file_path.exists() {
            fs::remove_file(&file_path).await?;
            info!(path = %file_path.display(), "Deleted uploaded image");
        }

        Ok(())
    }
}
