//! Modules layer - Infrastructure components for external integrations
//!
//! Contains adapters for the resources the service writes to, currently the
//! local upload directory.

pub mod storage;
