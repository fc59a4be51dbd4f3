use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::documents::handlers::{
    delete_document, download_document, list_documents, upload_document,
};
use crate::features::documents::services::DocumentService;
use crate::shared::constants::MULTIPART_OVERHEAD;

/// Create routes for the documents feature
pub fn routes(service: Arc<DocumentService>) -> Router {
    let body_limit = upload_body_limit(service.ingestor().max_file_size());

    Router::new()
        .route(
            "/api/documents/upload",
            post(upload_document).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/documents", get(list_documents))
        .route(
            "/api/documents/{id}",
            get(download_document).delete(delete_document),
        )
        .with_state(service)
}

/// Allow body size up to the file limit + buffer for multipart overhead
fn upload_body_limit(max_file_size: usize) -> usize {
    max_file_size.saturating_add(MULTIPART_OVERHEAD)
}
