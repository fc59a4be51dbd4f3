mod document_service;
mod document_store;

pub use document_service::DocumentService;
pub use document_store::DocumentStore;
