use utoipa::{Modify, OpenApi};

use crate::features::documents::{dtos as documents_dtos, handlers as documents_handlers};
use crate::shared::types::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        documents_handlers::upload_document,
        documents_handlers::list_documents,
        documents_handlers::download_document,
        documents_handlers::delete_document,
    ),
    components(
        schemas(
            // Shared
            ErrorResponse,
            // Documents
            documents_dtos::UploadDocumentDto,
            documents_dtos::DocumentResponseDto,
            documents_dtos::UploadedDocumentDto,
            documents_dtos::UploadDocumentResponseDto,
            documents_dtos::DocumentListResponseDto,
            documents_dtos::DeleteDocumentResponseDto,
        )
    ),
    tags(
        (name = "documents", description = "PDF upload, listing, download and deletion"),
    ),
    info(
        title = "Docvault API",
        version = "0.1.0",
        description = "API documentation for Docvault",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
