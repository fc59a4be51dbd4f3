use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body returned by every failing request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Short machine-readable error tag, e.g. "Document not found"
    #[schema(example = "Document not found")]
    pub error: String,
    /// Human-readable explanation
    #[schema(example = "The requested document does not exist")]
    pub message: String,
}
