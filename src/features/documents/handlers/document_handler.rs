use axum::{
    body::Body,
    extract::{Multipart, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    Json,
};
use futures::StreamExt;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::debug;

use crate::core::error::{AppError, Operation, Result};
use crate::core::extractor::DocumentId;
use crate::features::documents::dtos::{
    DeleteDocumentResponseDto, DocumentListResponseDto, DocumentResponseDto, UploadDocumentDto,
    UploadDocumentResponseDto, UploadedDocumentDto,
};
use crate::features::documents::services::DocumentService;
use crate::modules::storage::{IngestError, IngestedFile, UploadIngestor};
use crate::shared::constants::FILE_FIELD_NAME;
use crate::shared::types::ErrorResponse;

/// Upload a PDF document
///
/// Accepts multipart/form-data with a single `file` part whose declared
/// content type is `application/pdf`.
#[utoipa::path(
    post,
    path = "/api/documents/upload",
    tag = "documents",
    request_body(
        content = UploadDocumentDto,
        content_type = "multipart/form-data",
        description = "Multipart form with one PDF under the `file` field",
    ),
    responses(
        (status = 201, description = "File uploaded successfully", body = UploadDocumentResponseDto),
        (status = 400, description = "Missing file, wrong type, unexpected field or file too large", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn upload_document(
    State(service): State<Arc<DocumentService>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadDocumentResponseDto>)> {
    let file = receive_file(service.ingestor(), multipart)
        .await
        .map_err(|e| e.during(Operation::Upload))?;

    let document = service
        .register_upload(file)
        .await
        .map_err(|e| e.during(Operation::Upload))?;

    Ok((
        StatusCode::CREATED,
        Json(UploadDocumentResponseDto {
            message: "File uploaded successfully".to_string(),
            document: UploadedDocumentDto::from_model(document, service.display_offset()),
        }),
    ))
}

/// List all documents, newest first
#[utoipa::path(
    get,
    path = "/api/documents",
    tag = "documents",
    responses(
        (status = 200, description = "All stored documents", body = DocumentListResponseDto),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn list_documents(
    State(service): State<Arc<DocumentService>>,
) -> Result<Json<DocumentListResponseDto>> {
    let documents = service
        .list()
        .await
        .map_err(|e| e.during(Operation::List))?;

    let offset = service.display_offset();
    Ok(Json(DocumentListResponseDto {
        documents: documents
            .into_iter()
            .map(|d| DocumentResponseDto::from_model(d, offset))
            .collect(),
    }))
}

/// Download a document
///
/// Streams the stored bytes as an attachment named after the original filename.
#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    tag = "documents",
    params(("id" = i64, Path, description = "Document ID")),
    responses(
        (status = 200, description = "PDF bytes sent as an attachment named after the original file"),
        (status = 400, description = "Non-numeric ID", body = ErrorResponse),
        (status = 404, description = "Document or its file not found", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn download_document(
    State(service): State<Arc<DocumentService>>,
    DocumentId(id): DocumentId,
) -> Result<Response> {
    let document = service
        .find_downloadable(id)
        .await
        .map_err(|e| e.during(Operation::Download))?;

    let response = ServeFile::new(&document.filepath)
        .oneshot(Request::new(Body::empty()))
        .await
        .unwrap_or_else(|never| match never {});

    // The file can vanish between the existence check and the open
    match response.status() {
        StatusCode::OK => {}
        StatusCode::NOT_FOUND => return Err(AppError::FileNotFound(id)),
        status => {
            return Err(AppError::Internal(format!(
                "serving {} returned {}",
                document.filepath, status
            ))
            .during(Operation::Download))
        }
    }

    let disposition = HeaderValue::from_str(&content_disposition(&document.original_filename))
        .map_err(|e| AppError::Internal(e.to_string()).during(Operation::Download))?;

    let mut response = response.map(Body::new);
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, disposition);

    debug!("Serving document {} from {}", id, document.filepath);
    Ok(response)
}

/// Delete a document and its file
#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    tag = "documents",
    params(("id" = i64, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document deleted successfully", body = DeleteDocumentResponseDto),
        (status = 400, description = "Non-numeric ID", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn delete_document(
    State(service): State<Arc<DocumentService>>,
    DocumentId(id): DocumentId,
) -> Result<Json<DeleteDocumentResponseDto>> {
    // No ownership check: the service has no notion of users
    let deleted_id = service
        .delete(id)
        .await
        .map_err(|e| e.during(Operation::Delete))?;

    Ok(Json(DeleteDocumentResponseDto {
        message: "Document deleted successfully".to_string(),
        deleted_id,
    }))
}

/// Pull the single `file` part out of the multipart body and ingest it.
/// A file already written is discarded if a later part is rejected.
async fn receive_file(ingestor: &UploadIngestor, mut multipart: Multipart) -> Result<IngestedFile> {
    let mut received: Option<IngestedFile> = None;

    match collect_parts(ingestor, &mut multipart, &mut received).await {
        Ok(()) => received.ok_or_else(|| IngestError::NoFile.into()),
        Err(e) => {
            if let Some(file) = received {
                file.discard().await;
            }
            Err(e.into())
        }
    }
}

async fn collect_parts(
    ingestor: &UploadIngestor,
    multipart: &mut Multipart,
    received: &mut Option<IngestedFile>,
) -> std::result::Result<(), IngestError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ingestor.classify(e))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        // Text parts are ignored, as are file inputs submitted without a file
        let Some(file_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            debug!("Ignoring non-file field: {}", field_name);
            continue;
        };

        if field_name != FILE_FIELD_NAME || received.is_some() {
            return Err(IngestError::UnexpectedField(field_name));
        }

        let content_type = field.content_type().map(str::to_string);
        let chunks = field.map(|chunk| chunk.map_err(|e| ingestor.classify(e)));

        *received = Some(
            ingestor
                .ingest(&file_name, content_type.as_deref(), chunks)
                .await?,
        );
    }

    Ok(())
}

/// `attachment` disposition carrying the original filename. Names that are not
/// plain printable ASCII get an ASCII fallback plus an RFC 5987 `filename*`.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    if fallback == filename {
        format!("attachment; filename=\"{}\"", fallback)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(filename)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{pdf_bytes, pdf_part, TestContext};
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::Value;

    #[test]
    fn test_content_disposition_plain_name() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
    }

    #[test]
    fn test_content_disposition_escapes_unsafe_names() {
        assert_eq!(
            content_disposition("rapport été.pdf"),
            "attachment; filename=\"rapport _t_.pdf\"; filename*=UTF-8''rapport%20%C3%A9t%C3%A9.pdf"
        );
        assert!(content_disposition("a\"b.pdf").starts_with("attachment; filename=\"a_b.pdf\""));
    }

    #[tokio::test]
    async fn test_upload_download_delete_scenario() {
        let ctx = TestContext::new().await;
        let server = ctx.server();
        let bytes = pdf_bytes(2 * 1024 * 1024);

        let response = server
            .post("/api/documents/upload")
            .multipart(MultipartForm::new().add_part("file", pdf_part(bytes.clone(), "report.pdf")))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["message"], "File uploaded successfully");
        assert_eq!(body["document"]["filename"], "report.pdf");
        assert_eq!(body["document"]["filesize"], 2_097_152);
        assert!(body["document"]["created_at"].is_string());
        let id = body["document"]["id"].as_i64().unwrap();

        let response = server.get(&format!("/api/documents/{id}")).await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.as_bytes().as_ref(), bytes.as_slice());
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(disposition, "attachment; filename=\"report.pdf\"");

        let response = server.delete(&format!("/api/documents/{id}")).await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let body = response.json::<Value>();
        assert_eq!(body["message"], "Document deleted successfully");
        assert_eq!(body["deletedId"], id);

        let response = server.get(&format!("/api/documents/{id}")).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"], "Document not found");
        assert_eq!(ctx.uploaded_file_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_then_list_shows_one_new_entry() {
        let ctx = TestContext::new().await;
        let server = ctx.server();

        let response = server
            .post("/api/documents/upload")
            .multipart(MultipartForm::new().add_part("file", pdf_part(pdf_bytes(1000), "my report.pdf")))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);

        let body = server.get("/api/documents").await.json::<Value>();
        let documents = body["documents"].as_array().unwrap();
        assert_eq!(documents.len(), 1);

        let document = &documents[0];
        assert_eq!(document["original_filename"], "my report.pdf");
        assert_eq!(document["filesize"], 1000);
        assert_ne!(document["filename"], document["original_filename"]);
        assert!(document["filename"]
            .as_str()
            .unwrap()
            .ends_with("-my_report.pdf"));
        let filepath = document["filepath"].as_str().unwrap();
        assert_eq!(std::fs::read(filepath).unwrap().len(), 1000);
    }

    #[tokio::test]
    async fn test_list_returns_newest_first() {
        let ctx = TestContext::new().await;
        let server = ctx.server();

        for name in ["t1.pdf", "t2.pdf", "t3.pdf"] {
            let response = server
                .post("/api/documents/upload")
                .multipart(MultipartForm::new().add_part("file", pdf_part(pdf_bytes(64), name)))
                .await;
            assert_eq!(response.status_code(), StatusCode::CREATED);
        }

        let body = server.get("/api/documents").await.json::<Value>();
        let names: Vec<&str> = body["documents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["original_filename"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["t3.pdf", "t2.pdf", "t1.pdf"]);
    }

    #[tokio::test]
    async fn test_upload_without_file_is_rejected() {
        let ctx = TestContext::new().await;
        let server = ctx.server();

        let response = server
            .post("/api/documents/upload")
            .multipart(MultipartForm::new().add_text("note", "no file here"))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert_eq!(body["error"], "No file uploaded");
        assert_eq!(body["message"], "Please select a PDF file to upload");
    }

    #[tokio::test]
    async fn test_upload_non_pdf_creates_nothing() {
        let ctx = TestContext::new().await;
        let server = ctx.server();

        let part = Part::bytes(b"just text".to_vec())
            .file_name("notes.txt")
            .mime_type("text/plain");
        let response = server
            .post("/api/documents/upload")
            .multipart(MultipartForm::new().add_part("file", part))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["message"], "Only PDF files are allowed!");
        assert_eq!(ctx.uploaded_file_count(), 0);
        assert!(ctx.store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_too_large_leaves_no_orphan() {
        let ctx = TestContext::with_max_file_size(1024).await;
        let server = ctx.server();

        let response = server
            .post("/api/documents/upload")
            .multipart(MultipartForm::new().add_part("file", pdf_part(pdf_bytes(1100), "big.pdf")))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert_eq!(body["error"], "File too large");
        assert_eq!(body["message"], "Maximum file size is 1KB");
        assert_eq!(ctx.uploaded_file_count(), 0);
        assert!(ctx.store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_body_limit_overflow_is_reported_as_too_large() {
        let ctx = TestContext::with_max_file_size(1024).await;
        let server = ctx.server();

        // The oversized text part trips the request body limit before the
        // file part is reached
        let form = MultipartForm::new()
            .add_text("padding", "x".repeat(2 * 1024 * 1024))
            .add_part("file", pdf_part(pdf_bytes(10), "small.pdf"));
        let response = server.post("/api/documents/upload").multipart(form).await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert_eq!(body["error"], "File too large");
        assert_eq!(body["message"], "Maximum file size is 1KB");
        assert_eq!(ctx.uploaded_file_count(), 0);
        assert!(ctx.store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_with_very_long_filename() {
        let ctx = TestContext::new().await;
        let server = ctx.server();
        let original = format!("{}.pdf", "a".repeat(240));

        let response = server
            .post("/api/documents/upload")
            .multipart(MultipartForm::new().add_part("file", pdf_part(pdf_bytes(10), &original)))
            .await;

        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert_eq!(response.json::<Value>()["document"]["filename"], original.as_str());

        let documents = ctx.store.list().await.unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].original_filename, original);
        assert!(documents[0].filename.len() <= 255);
        assert!(documents[0].filename.ends_with(".pdf"));
        assert_eq!(ctx.uploaded_file_count(), 1);
    }

    #[tokio::test]
    async fn test_upload_write_failure_carries_upload_tag() {
        let ctx = TestContext::new().await;
        let server = ctx.server();
        std::fs::remove_dir_all(ctx.service.ingestor().upload_dir()).unwrap();

        let response = server
            .post("/api/documents/upload")
            .multipart(MultipartForm::new().add_part("file", pdf_part(pdf_bytes(10), "a.pdf")))
            .await;

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.json::<Value>();
        assert_eq!(body["error"], "Failed to upload document");
        assert_eq!(body["message"], "An error occurred while processing your upload");
        assert!(ctx.store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_under_wrong_field_name() {
        let ctx = TestContext::new().await;
        let server = ctx.server();

        let response = server
            .post("/api/documents/upload")
            .multipart(MultipartForm::new().add_part("document", pdf_part(pdf_bytes(10), "a.pdf")))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Unexpected field");
        assert_eq!(ctx.uploaded_file_count(), 0);
    }

    #[tokio::test]
    async fn test_second_file_discards_the_first() {
        let ctx = TestContext::new().await;
        let server = ctx.server();

        let form = MultipartForm::new()
            .add_part("file", pdf_part(pdf_bytes(10), "a.pdf"))
            .add_part("file", pdf_part(pdf_bytes(10), "b.pdf"));
        let response = server.post("/api/documents/upload").multipart(form).await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Unexpected field");
        assert_eq!(ctx.uploaded_file_count(), 0);
        assert!(ctx.store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_storage_failure_removes_file() {
        let ctx = TestContext::new().await;
        let server = ctx.server();
        ctx.store.close().await;

        let response = server
            .post("/api/documents/upload")
            .multipart(MultipartForm::new().add_part("file", pdf_part(pdf_bytes(10), "a.pdf")))
            .await;

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.json::<Value>();
        assert_eq!(body["error"], "Failed to upload document");
        assert_eq!(body["message"], "An error occurred while processing your upload");
        assert_eq!(ctx.uploaded_file_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let ctx = TestContext::new().await;
        let server = ctx.server();

        let response = server.get("/api/documents/4242").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"], "Document not found");

        let response = server.delete("/api/documents/4242").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"], "Document not found");
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_rejected() {
        let ctx = TestContext::new().await;
        let server = ctx.server();

        for response in [
            server.get("/api/documents/abc").await,
            server.delete("/api/documents/12abc").await,
        ] {
            assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
            let body = response.json::<Value>();
            assert_eq!(body["error"], "Invalid document ID");
            assert_eq!(body["message"], "Document ID must be a valid number");
        }
    }

    #[tokio::test]
    async fn test_download_with_missing_file_reports_file_not_found() {
        let ctx = TestContext::new().await;
        let server = ctx.server();

        let response = server
            .post("/api/documents/upload")
            .multipart(MultipartForm::new().add_part("file", pdf_part(pdf_bytes(10), "a.pdf")))
            .await;
        let id = response.json::<Value>()["document"]["id"].as_i64().unwrap();
        let document = ctx.store.get_by_id(id).await.unwrap().unwrap();
        std::fs::remove_file(&document.filepath).unwrap();

        let response = server.get(&format!("/api/documents/{id}")).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        let body = response.json::<Value>();
        assert_eq!(body["error"], "File not found");
        assert_eq!(body["message"], "The document file is missing from storage");

        // delete still succeeds and removes the row
        let response = server.delete(&format!("/api/documents/{id}")).await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert!(ctx.store.get_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_download_of_non_regular_file_is_a_download_failure() {
        let ctx = TestContext::new().await;
        let server = ctx.server();

        let response = server
            .post("/api/documents/upload")
            .multipart(MultipartForm::new().add_part("file", pdf_part(pdf_bytes(10), "a.pdf")))
            .await;
        let id = response.json::<Value>()["document"]["id"].as_i64().unwrap();
        let document = ctx.store.get_by_id(id).await.unwrap().unwrap();
        std::fs::remove_file(&document.filepath).unwrap();
        std::fs::create_dir(&document.filepath).unwrap();

        let response = server.get(&format!("/api/documents/{id}")).await;
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
        let body = response.json::<Value>();
        assert_eq!(body["error"], "Failed to download document");
        assert_eq!(body["message"], "An error occurred while preparing the download");
    }

    #[tokio::test]
    async fn test_list_storage_failure() {
        let ctx = TestContext::new().await;
        let server = ctx.server();
        ctx.store.close().await;

        let response = server.get("/api/documents").await;
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.json::<Value>()["error"], "Failed to fetch documents");
    }
}
