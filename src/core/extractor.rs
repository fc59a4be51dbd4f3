use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::core::error::AppError;

/// Numeric `{id}` path parameter. Anything that is not an integer is
/// rejected with a validation error before the handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentId(pub i64);

impl<S> FromRequestParts<S> for DocumentId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| invalid_document_id())?;

        parse_document_id(&raw)
            .map(DocumentId)
            .ok_or_else(invalid_document_id)
    }
}

fn parse_document_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

fn invalid_document_id() -> AppError {
    AppError::validation("Invalid document ID", "Document ID must be a valid number")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_id() {
        assert_eq!(parse_document_id("42"), Some(42));
        assert_eq!(parse_document_id("-3"), Some(-3));
        assert_eq!(parse_document_id("abc"), None);
        assert_eq!(parse_document_id("12abc"), None);
        assert_eq!(parse_document_id(""), None);
        assert_eq!(parse_document_id("99999999999999999999"), None);
    }
}
