use crate::core::parser::decode_text;
use crate::UploadError;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Only names ending in this exact suffix are accepted.
pub const KML_EXTENSION: &str = ".kml";

/// Reject anything whose client-supplied name does not end in `.kml` (case-sensitive).
pub fn validate_file_name(file_name: &str) -> Result<(), UploadError> {
    if file_name.ends_with(KML_EXTENSION) {
        Ok(())
    } else {
        Err(UploadError::InvalidFileType {
            file_name: file_name.to_string(),
        })
    }
}

/// An upload persisted by [`UploadStore::store`].
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Name as sent by the client. Never used to build a path.
    pub original_name: String,
    pub storage_path: PathBuf,
    pub size: u64,
    pub sha256: String,
    pub received_at: DateTime<Utc>,
}

/// Disk storage for uploads under a single directory, keyed by generated names.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validate the name, then write `content` to a fresh `<uuid>.kml` file.
    pub async fn store(&self, original_name: &str, content: &[u8]) -> Result<UploadedFile, UploadError> {
        validate_file_name(original_name)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let storage_path = self.dir.join(format!("{}{}", Uuid::new_v4(), KML_EXTENSION));
        tokio::fs::write(&storage_path, content).await?;

        let file = UploadedFile {
            original_name: original_name.to_string(),
            storage_path,
            size: content.len() as u64,
            sha256: format!("{:x}", Sha256::digest(content)),
            received_at: Utc::now(),
        };
        debug!("Stored upload {} at {}", file.original_name, file.storage_path.display());
        Ok(file)
    }

    /// Read a stored upload back as text.
    pub async fn read_text(&self, file: &UploadedFile) -> Result<String, UploadError> {
        let bytes = tokio::fs::read(&file.storage_path).await?;
        Ok(decode_text(&bytes))
    }

    /// Remove a stored upload. Failures are logged, not returned.
    pub async fn discard(&self, file: &UploadedFile) {
        if let Err(e) = tokio::fs::remove_file(&file.storage_path).await {
            warn!("Failed to remove upload {}: {}", file.storage_path.display(), e);
        }
    }
}
