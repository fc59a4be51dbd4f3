use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::core::error::{AppError, Result};
use crate::features::documents::models::Document;

/// Owner of the `documents` table.
///
/// Wraps the single process-wide SQLite handle. There is no migration
/// mechanism: `init_schema` only creates what is missing.
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the table and its index if they do not exist yet
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                original_filename TEXT NOT NULL,
                filename TEXT NOT NULL,
                filepath TEXT NOT NULL,
                filesize INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_created_at ON documents(created_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        debug!("documents schema ready");
        Ok(())
    }

    /// Insert a row and return it as stored
    pub async fn create(
        &self,
        original_filename: &str,
        filename: &str,
        filepath: &str,
        filesize: i64,
    ) -> Result<Document> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (original_filename, filename, filepath, filesize, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, original_filename, filename, filepath, filesize, created_at
            "#,
        )
        .bind(original_filename)
        .bind(filename)
        .bind(filepath)
        .bind(filesize)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert document '{}': {:?}", filename, e);
            AppError::Database(e)
        })?;

        info!(
            "Document created: id={}, filename={}, size={}",
            document.id, document.filename, document.filesize
        );

        Ok(document)
    }

    /// All documents, newest first. Unbounded.
    pub async fn list(&self) -> Result<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, original_filename, filename, filepath, filesize, created_at
            FROM documents
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Document>> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, original_filename, filename, filepath, filesize, created_at
            FROM documents
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    /// Remove the row. Deleting an id that does not exist is not an error.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            debug!("Delete of document {} matched no row", id);
        } else {
            info!("Document row deleted: id={}", id);
        }

        Ok(())
    }

    /// Close the handle, waiting for in-flight queries to release it
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection closed");
    }
}
