//! Kobodrop Core Library
//!
//! This crate provides the domain models, pairing codes, upload validation,
//! error types and configuration shared by every Kobodrop component.

pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod pairing;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use pairing::{generate_code, PairingCode, CODE_ALPHABET, CODE_LENGTH};
pub use storage_types::StorageBackend;
pub use validation::{UploadValidator, ALLOWED_EXTENSIONS, MAX_FILE_SIZE_BYTES};
