use std::io;
use std::path::Path;
use std::sync::Arc;

use chrono::FixedOffset;
use tokio::fs;
use tracing::{error, info, warn};

use crate::core::error::{AppError, Result};
use crate::features::documents::models::Document;
use crate::features::documents::services::DocumentStore;
use crate::modules::storage::{IngestedFile, UploadIngestor};

/// Composes the upload ingestor and the document store.
///
/// Neither sequence below is transactional. Upload writes the file and then
/// inserts the row; a failed insert removes the file again. Delete removes the
/// file and then the row; a failed row delete is only logged, leaving a row
/// that points at nothing until someone deletes it again.
pub struct DocumentService {
    store: Arc<DocumentStore>,
    ingestor: Arc<UploadIngestor>,
    display_offset: FixedOffset,
}

impl DocumentService {
    pub fn new(
        store: Arc<DocumentStore>,
        ingestor: Arc<UploadIngestor>,
        display_offset: FixedOffset,
    ) -> Self {
        Self {
            store,
            ingestor,
            display_offset,
        }
    }

    pub fn ingestor(&self) -> &UploadIngestor {
        &self.ingestor
    }

    pub fn display_offset(&self) -> &FixedOffset {
        &self.display_offset
    }

    /// Record an ingested file. On failure the file is discarded so it does
    /// not become an orphan.
    pub async fn register_upload(&self, file: IngestedFile) -> Result<Document> {
        let filepath = file.filepath.to_string_lossy().into_owned();

        match self
            .store
            .create(&file.original_filename, &file.filename, &filepath, file.filesize)
            .await
        {
            Ok(document) => {
                info!(
                    "Upload registered: id={}, original_filename={}",
                    document.id, document.original_filename
                );
                Ok(document)
            }
            Err(e) => {
                warn!(
                    "Metadata insert failed for {}, discarding stored file",
                    file.filepath.display()
                );
                file.discard().await;
                Err(e)
            }
        }
    }

    pub async fn list(&self) -> Result<Vec<Document>> {
        self.store.list().await
    }

    /// Resolve a document whose file is present on disk
    pub async fn find_downloadable(&self, id: i64) -> Result<Document> {
        let document = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(AppError::DocumentNotFound(id))?;

        match fs::metadata(&document.filepath).await {
            Ok(metadata) if metadata.is_file() => Ok(document),
            Ok(_) => Err(AppError::Internal(format!(
                "{} is not a regular file",
                document.filepath
            ))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(AppError::FileNotFound(id)),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Remove the file (if still there) and then the row. Returns the deleted id.
    pub async fn delete(&self, id: i64) -> Result<i64> {
        let document = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(AppError::DocumentNotFound(id))?;

        remove_if_present(Path::new(&document.filepath)).await?;

        if let Err(e) = self.store.delete(id).await {
            error!(
                "File {} removed but row for document {} could not be deleted: {}",
                document.filepath, id, e
            );
            return Err(e);
        }

        info!("Document deleted: id={}, filename={}", id, document.filename);
        Ok(id)
    }
}

async fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("File {} was already missing", path.display());
            Ok(())
        }
        Err(e) => Err(AppError::Io(e)),
    }
}
