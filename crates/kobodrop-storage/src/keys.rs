//! Shared key layout for storage backends.

use uuid::Uuid;

/// Storage path of a file: `uploads/{session_id}/{file_id}/{filename}`.
///
/// The filename is embedded as-is; callers validate it before uploading.
pub fn compute_storage_path(session_id: Uuid, file_id: Uuid, filename: &str) -> String {
    format!("uploads/{}/{}/{}", session_id, file_id, filename)
}

/// Reject keys that could escape the storage root or address a directory.
pub(crate) fn check_key(storage_key: &str) -> Result<(), String> {
    if storage_key.is_empty() {
        return Err("Storage key is empty".to_string());
    }
    if storage_key.starts_with('/') || storage_key.contains('\\') {
        return Err("Storage key contains invalid characters".to_string());
    }
    if storage_key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err("Storage key contains an invalid segment".to_string());
    }
    Ok(())
}

/// Percent-encode each segment of a key for use in a URL path.
pub(crate) fn encode_key_for_url(storage_key: &str) -> String {
    storage_key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
