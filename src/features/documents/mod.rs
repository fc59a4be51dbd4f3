//! PDF document storage feature.
//!
//! Uploaded files are written to the local upload directory and tracked in
//! the `documents` table.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/documents/upload` | Upload one PDF (multipart field `file`) |
//! | GET | `/api/documents` | List all documents, newest first |
//! | GET | `/api/documents/{id}` | Download a document |
//! | DELETE | `/api/documents/{id}` | Delete a document and its file |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::{DocumentService, DocumentStore};
