//! Upload ingestion onto local disk
//!
//! A file part is accepted only when it declares `application/pdf`. Its bytes
//! are streamed chunk by chunk into the upload directory and the size limit is
//! checked before each write, so an oversized upload never lands on disk in
//! full. Partial files left by a failed ingest are removed here; removing a
//! fully ingested file after a later failure is up to the caller.

use std::io;
use std::path::{Path, PathBuf};
use std::pin::pin;

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use chrono::Utc;
use futures::{Stream, StreamExt};
use rand::Rng;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::core::config::UploadConfig;
use crate::shared::constants::{
    FALLBACK_MIME_TYPE, MAX_STORED_NAME_LEN, PDF_MIME_TYPE, PDF_SIGNATURE,
};
use crate::shared::validation::sanitize_filename;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no file uploaded")]
    NoFile,

    #[error("declared content type '{0}' is not application/pdf")]
    InvalidType(String),

    #[error("payload does not start with a PDF signature")]
    InvalidSignature,

    #[error("file exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("unexpected file field '{0}'")]
    UnexpectedField(String),

    #[error("malformed multipart body: {0}")]
    Multipart(String),

    #[error("failed to write upload: {0}")]
    Io(#[from] io::Error),
}

/// A file that has been fully written to the upload directory but not yet
/// recorded in the document store
#[derive(Debug)]
pub struct IngestedFile {
    pub original_filename: String,
    pub filename: String,
    pub filepath: PathBuf,
    pub filesize: i64,
}

impl IngestedFile {
    /// Best-effort removal of the stored bytes. Failures are logged, not returned.
    pub async fn discard(&self) {
        remove_quietly(&self.filepath).await;
    }
}

pub struct UploadIngestor {
    upload_dir: PathBuf,
    max_file_size: usize,
    require_pdf_signature: bool,
}

impl UploadIngestor {
    /// Create the upload directory if needed and resolve it to an absolute path
    pub fn new(config: &UploadConfig) -> io::Result<Self> {
        std::fs::create_dir_all(&config.dir)?;
        let upload_dir = std::fs::canonicalize(&config.dir)?;

        Ok(Self {
            upload_dir,
            max_file_size: config.max_file_size,
            require_pdf_signature: config.require_pdf_signature,
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// `<unix-millis>-<random>-<sanitized original name>`, shortened to fit
    /// in a single path component
    pub fn storage_name(original_filename: &str) -> String {
        let suffix: u32 = rand::thread_rng().gen_range(0..=1_000_000_000);
        let prefix = format!("{}-{}-", Utc::now().timestamp_millis(), suffix);
        let budget = MAX_STORED_NAME_LEN.saturating_sub(prefix.len());

        format!(
            "{}{}",
            prefix,
            shorten_keeping_extension(&sanitize_filename(original_filename), budget)
        )
    }

    /// Translate a multipart parser failure. Hitting the request body limit is
    /// reported as the same condition as an oversized file.
    pub fn classify(&self, err: MultipartError) -> IngestError {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            IngestError::TooLarge {
                limit: self.max_file_size,
            }
        } else {
            IngestError::Multipart(err.body_text())
        }
    }

    /// Validate the declared type, then stream `chunks` to a new file in the
    /// upload directory.
    pub async fn ingest<S, E>(
        &self,
        original_filename: &str,
        content_type: Option<&str>,
        chunks: S,
    ) -> Result<IngestedFile, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<IngestError>,
    {
        let content_type = content_type.unwrap_or(FALLBACK_MIME_TYPE);
        if content_type != PDF_MIME_TYPE {
            debug!(
                "Rejected upload '{}' with content type '{}'",
                original_filename, content_type
            );
            return Err(IngestError::InvalidType(content_type.to_string()));
        }

        let filename = Self::storage_name(original_filename);
        let filepath = self.upload_dir.join(&filename);

        let mut file = fs::File::create(&filepath).await?;
        let written = self.write_chunks(&mut file, chunks).await;
        drop(file);

        match written {
            Ok(filesize) => {
                debug!("Stored upload {} ({} bytes)", filepath.display(), filesize);
                Ok(IngestedFile {
                    original_filename: original_filename.to_string(),
                    filename,
                    filepath,
                    filesize,
                })
            }
            Err(e) => {
                remove_quietly(&filepath).await;
                Err(e)
            }
        }
    }

    async fn write_chunks<S, E>(&self, file: &mut fs::File, chunks: S) -> Result<i64, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<IngestError>,
    {
        let mut chunks = pin!(chunks);
        let mut written: usize = 0;
        let mut head: Vec<u8> = Vec::with_capacity(PDF_SIGNATURE.len());

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(Into::into)?;

            if written + chunk.len() > self.max_file_size {
                return Err(IngestError::TooLarge {
                    limit: self.max_file_size,
                });
            }

            if self.require_pdf_signature && head.len() < PDF_SIGNATURE.len() {
                let take = (PDF_SIGNATURE.len() - head.len()).min(chunk.len());
                head.extend_from_slice(&chunk[..take]);
                if !PDF_SIGNATURE.starts_with(&head) {
                    return Err(IngestError::InvalidSignature);
                }
            }

            file.write_all(&chunk).await?;
            written += chunk.len();
        }

        if self.require_pdf_signature && head.as_slice() != PDF_SIGNATURE {
            return Err(IngestError::InvalidSignature);
        }

        file.flush().await?;
        Ok(written as i64)
    }
}

/// Cut `name` down to `max_len` bytes, keeping a short extension intact.
/// Expects the ASCII output of `sanitize_filename`.
fn shorten_keeping_extension(name: &str, max_len: usize) -> String {
    if name.len() <= max_len {
        return name.to_string();
    }

    match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot <= 16 && name.len() - dot < max_len => {
            let extension = &name[dot..];
            format!("{}{}", &name[..max_len - extension.len()], extension)
        }
        _ => name[..max_len].to_string(),
    }
}

async fn remove_quietly(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!("Removed upload {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove upload {}: {}", path.display(), e),
    }
}
