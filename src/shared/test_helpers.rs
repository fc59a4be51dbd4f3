#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use axum_test::{multipart::Part, TestServer};
#[cfg(test)]
use chrono::FixedOffset;
#[cfg(test)]
use tempfile::TempDir;

#[cfg(test)]
use crate::core::app::create_router;
#[cfg(test)]
use crate::core::config::{AppConfig, Config, DatabaseConfig, SwaggerConfig, UploadConfig};
#[cfg(test)]
use crate::core::database;
#[cfg(test)]
use crate::features::documents::{DocumentService, DocumentStore};
#[cfg(test)]
use crate::modules::storage::UploadIngestor;

/// A fully wired service backed by a throwaway database and upload directory
#[cfg(test)]
pub struct TestContext {
    pub config: Config,
    pub store: Arc<DocumentStore>,
    pub service: Arc<DocumentService>,
    _dir: TempDir,
}

#[cfg(test)]
impl TestContext {
    pub async fn new() -> Self {
        Self::with_max_file_size(UploadConfig::DEFAULT_MAX_FILE_SIZE).await
    }

    pub async fn with_max_file_size(max_file_size: usize) -> Self {
        let dir = TempDir::new().unwrap();

        let config = Config {
            app: AppConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                allowed_origins: vec!["http://localhost:5173".to_string()],
            },
            database: DatabaseConfig {
                path: dir.path().join("documents.db"),
                acquire_timeout_secs: 5,
            },
            upload: UploadConfig {
                dir: dir.path().join("uploads"),
                max_file_size,
                require_pdf_signature: false,
                display_utc_offset_minutes: UploadConfig::DEFAULT_DISPLAY_UTC_OFFSET_MINUTES,
            },
            swagger: SwaggerConfig {
                username: None,
                password: None,
                title: "Docvault API".to_string(),
                version: "0.1.0".to_string(),
                description: "test".to_string(),
            },
        };

        let pool = database::create_pool(&config.database).await.unwrap();
        let store = Arc::new(DocumentStore::new(pool));
        store.init_schema().await.unwrap();

        let ingestor = Arc::new(UploadIngestor::new(&config.upload).unwrap());
        let offset = FixedOffset::east_opt(config.upload.display_utc_offset_minutes * 60).unwrap();
        let service = Arc::new(DocumentService::new(Arc::clone(&store), ingestor, offset));

        Self {
            config,
            store,
            service,
            _dir: dir,
        }
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(create_router(&self.config, Arc::clone(&self.service))).unwrap()
    }

    /// Number of files currently in the upload directory
    pub fn uploaded_file_count(&self) -> usize {
        std::fs::read_dir(self.service.ingestor().upload_dir())
            .unwrap()
            .count()
    }
}

/// PDF-looking payload of exactly `len` bytes
#[cfg(test)]
pub fn pdf_bytes(len: usize) -> Vec<u8> {
    let mut bytes = b"%PDF-1.4\n".to_vec();
    bytes.resize(len, b'x');
    bytes
}

/// Multipart file part declared as application/pdf
#[cfg(test)]
pub fn pdf_part(bytes: Vec<u8>, file_name: &str) -> Part {
    Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_type("application/pdf")
}
