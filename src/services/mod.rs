//! Domain services. Each one owns one table (or the upload directory) and is
//! cheap to clone into request handlers.

pub mod access_gate;
pub mod catalog_service;
pub mod credential_service;
pub mod media_store;
pub mod session_service;
