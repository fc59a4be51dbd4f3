//! Storage module for uploaded file bytes
//!
//! Validates incoming file parts and streams them into the local upload
//! directory under collision-resistant names.

mod ingestor;

pub use ingestor::{IngestError, IngestedFile, UploadIngestor};
