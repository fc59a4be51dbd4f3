use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for a stored document
#[derive(Debug, Clone, FromRow)]
pub struct Document {
    pub id: i64,
    /// Name supplied by the client, used as the download name
    pub original_filename: String,
    /// Sanitized, unique name of the file on disk
    pub filename: String,
    pub filepath: String,
    pub filesize: i64,
    pub created_at: DateTime<Utc>,
}
