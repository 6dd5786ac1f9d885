//! Kobodrop Storage Library
//!
//! Blob storage for uploaded files. It includes the Storage trait and
//! implementations for S3-compatible object stores and the local filesystem.
//!
//! # Storage key format
//!
//! Every backend stores a file under `uploads/{session_id}/{file_id}/{filename}`.
//! The filename is kept verbatim so the object carries its original name.
//! Keys must not contain `..` segments or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::compute_storage_path;
pub use kobodrop_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{
    BoxedReader, ByteStream, Storage, StorageError, StorageResult, StorageUpload,
};
