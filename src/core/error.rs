use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::modules::storage::IngestError;
use crate::shared::types::ErrorResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{error}: {message}")]
    Validation { error: String, message: String },

    #[error("Document not found: {0}")]
    DocumentNotFound(i64),

    #[error("File missing from storage for document {0}")]
    FileNotFound(i64),

    #[error("Cannot {method} {path}")]
    RouteNotFound { method: String, path: String },

    #[error("{operation}: {source}")]
    Failed {
        operation: Operation,
        #[source]
        source: Box<AppError>,
    },

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Coarse error taxonomy shared by every endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Storage,
    Unknown,
}

/// Document operation a storage failure happened in, used to pick the
/// response tag and message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    List,
    Download,
    Delete,
}

impl Operation {
    fn error(&self) -> &'static str {
        match self {
            Operation::Upload => "Failed to upload document",
            Operation::List => "Failed to fetch documents",
            Operation::Download => "Failed to download document",
            Operation::Delete => "Failed to delete document",
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Operation::Upload => "An error occurred while processing your upload",
            Operation::List => "An error occurred while retrieving documents",
            Operation::Download => "An error occurred while preparing the download",
            Operation::Delete => "An error occurred while deleting the document",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.error())
    }
}

impl AppError {
    pub fn validation(error: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            error: error.into(),
            message: message.into(),
        }
    }

    /// Attach the failing operation to storage and internal errors.
    /// Validation and not-found errors pass through untouched.
    pub fn during(self, operation: Operation) -> Self {
        match self {
            AppError::Database(_) | AppError::Io(_) | AppError::Internal(_) => AppError::Failed {
                operation,
                source: Box::new(self),
            },
            other => other,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation { .. } => ErrorKind::Validation,
            AppError::DocumentNotFound(_)
            | AppError::FileNotFound(_)
            | AppError::RouteNotFound { .. } => ErrorKind::NotFound,
            AppError::Database(_) | AppError::Io(_) => ErrorKind::Storage,
            AppError::Failed { source, .. } => source.kind(),
            AppError::Internal(_) => ErrorKind::Unknown,
        }
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::NoFile => {
                AppError::validation("No file uploaded", "Please select a PDF file to upload")
            }
            IngestError::TooLarge { limit } => AppError::validation(
                "File too large",
                format!("Maximum file size is {}", human_size(limit)),
            ),
            IngestError::UnexpectedField(_) => {
                AppError::validation("Unexpected field", "File field name must be \"file\"")
            }
            IngestError::InvalidType(_) | IngestError::InvalidSignature => {
                AppError::validation("Upload failed", "Only PDF files are allowed!")
            }
            IngestError::Multipart(msg) => AppError::validation("File upload error", msg),
            IngestError::Io(e) => AppError::Io(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::debug!(kind = ?self.kind(), "Request failed: {}", self);

        let (status, error, message) = match self {
            AppError::Validation { error, message } => (StatusCode::BAD_REQUEST, error, message),
            AppError::DocumentNotFound(_) => (
                StatusCode::NOT_FOUND,
                "Document not found".to_string(),
                "The requested document does not exist".to_string(),
            ),
            AppError::FileNotFound(id) => {
                tracing::warn!("Document {} has a row but no file on disk", id);
                (
                    StatusCode::NOT_FOUND,
                    "File not found".to_string(),
                    "The document file is missing from storage".to_string(),
                )
            }
            AppError::RouteNotFound { method, path } => (
                StatusCode::NOT_FOUND,
                "Not Found".to_string(),
                format!("Cannot {} {}", method, path),
            ),
            AppError::Failed { operation, source } => {
                tracing::error!("{}: {:?}", operation, source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    operation.error().to_string(),
                    operation.message().to_string(),
                )
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "StorageError".to_string(),
                    "Database error occurred".to_string(),
                )
            }
            AppError::Io(ref e) => {
                tracing::error!("Storage I/O error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "StorageError".to_string(),
                    "File storage error occurred".to_string(),
                )
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "ServerError".to_string(),
                    "Internal Server Error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error, message })).into_response()
    }
}

/// Render a byte count the way the upload limit is advertised ("10MB", "512KB")
fn human_size(bytes: usize) -> String {
    const MB: usize = 1024 * 1024;
    const KB: usize = 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{}KB", bytes / KB)
    } else {
        format!("{} bytes", bytes)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
