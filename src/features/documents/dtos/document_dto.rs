use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::documents::models::Document;
use crate::shared::constants::DISPLAY_TIME_FORMAT;

/// Upload document request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadDocumentDto {
    /// The PDF file to upload (declared type must be application/pdf)
    #[schema(format = Binary, content_media_type = "application/pdf")]
    pub file: String,
}

/// A stored document as returned by the list endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponseDto {
    pub id: i64,
    /// Filename as uploaded by the client
    pub original_filename: String,
    /// Name of the file on disk
    pub filename: String,
    /// Location of the file on disk
    pub filepath: String,
    /// Size in bytes
    pub filesize: i64,
    /// Upload time in the display timezone
    #[schema(example = "2024-05-01 14:03:27")]
    pub created_at: String,
}

/// Summary of a freshly uploaded document
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadedDocumentDto {
    pub id: i64,
    /// Filename as uploaded by the client
    #[schema(example = "report.pdf")]
    pub filename: String,
    pub filesize: i64,
    #[schema(example = "2024-05-01 14:03:27")]
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadDocumentResponseDto {
    #[schema(example = "File uploaded successfully")]
    pub message: String,
    pub document: UploadedDocumentDto,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentListResponseDto {
    /// All documents, newest first
    pub documents: Vec<DocumentResponseDto>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteDocumentResponseDto {
    #[schema(example = "Document deleted successfully")]
    pub message: String,
    #[serde(rename = "deletedId")]
    pub deleted_id: i64,
}

/// Render a UTC timestamp in the display timezone
pub fn format_created_at(created_at: &DateTime<Utc>, offset: &FixedOffset) -> String {
    created_at
        .with_timezone(offset)
        .format(DISPLAY_TIME_FORMAT)
        .to_string()
}

impl DocumentResponseDto {
    pub fn from_model(document: Document, offset: &FixedOffset) -> Self {
        Self {
            id: document.id,
            created_at: format_created_at(&document.created_at, offset),
            original_filename: document.original_filename,
            filename: document.filename,
            filepath: document.filepath,
            filesize: document.filesize,
        }
    }
}

impl UploadedDocumentDto {
    pub fn from_model(document: Document, offset: &FixedOffset) -> Self {
        Self {
            id: document.id,
            created_at: format_created_at(&document.created_at, offset),
            filename: document.original_filename,
            filesize: document.filesize,
        }
    }
}
