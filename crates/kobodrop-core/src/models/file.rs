use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Metadata for one uploaded file.
///
/// `session_id` is a plain reference: removing a session never removes its files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileMetadata {
    pub id: Uuid,
    pub session_id: Uuid,
    /// Original filename as uploaded, unsanitized
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// MIME type reported by the uploader
    #[serde(rename = "type")]
    pub content_type: String,
    pub storage_path: String,
    pub download_url: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Input of `FileRegistry::add_metadata`.
///
/// `id` is set when the file id was chosen before upload, since it is part of the
/// storage path. Repositories assign a fresh id otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFileMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub session_id: Uuid,
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub content_type: String,
    pub storage_path: String,
    pub download_url: String,
    pub uploaded_at: DateTime<Utc>,
}

impl NewFileMetadata {
    /// The stored record, keeping a pre-assigned id.
    pub fn into_record(self) -> FileMetadata {
        let id = self.id.unwrap_or_else(Uuid::new_v4);
        self.with_id(id)
    }

    pub fn with_id(self, id: Uuid) -> FileMetadata {
        FileMetadata {
            id,
            session_id: self.session_id,
            name: self.name,
            size: self.size,
            content_type: self.content_type,
            storage_path: self.storage_path,
            download_url: self.download_url,
            uploaded_at: self.uploaded_at,
        }
    }
}

/// Upload progress event.
///
/// `bytes_transferred` never decreases between events of one upload and never
/// exceeds `total_bytes`. Both `total_bytes` and `progress` (percentage, 0 to 100)
/// are `None` while the length of the upload is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct UploadProgress {
    pub bytes_transferred: u64,
    pub total_bytes: Option<u64>,
    pub progress: Option<f64>,
}

impl UploadProgress {
    /// A declared total smaller than what already arrived is raised to match.
    pub fn new(bytes_transferred: u64, total_bytes: Option<u64>) -> Self {
        let total_bytes = total_bytes.map(|total| total.max(bytes_transferred));
        let progress = total_bytes.map(|total| {
            if total == 0 {
                100.0
            } else {
                bytes_transferred as f64 / total as f64 * 100.0
            }
        });
        Self {
            bytes_transferred,
            total_bytes,
            progress,
        }
    }

    /// Final event of an upload of `size` bytes.
    pub fn complete(size: u64) -> Self {
        Self::new(size, Some(size))
    }

    pub fn is_complete(&self) -> bool {
        self.total_bytes == Some(self.bytes_transferred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_serializes_as_type() {
        let meta = NewFileMetadata {
            id: None,
            session_id: Uuid::new_v4(),
            name: "book.epub".to_string(),
            size: 12,
            content_type: "application/epub+zip".to_string(),
            storage_path: "uploads/a/b/book.epub".to_string(),
            download_url: "http://localhost/media/uploads/a/b/book.epub".to_string(),
            uploaded_at: Utc::now(),
        }
        .with_id(Uuid::new_v4());

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["type"], "application/epub+zip");
        assert!(json.get("content_type").is_none());
    }

    #[test]
    fn progress_percentage() {
        assert_eq!(UploadProgress::new(50, Some(200)).progress, Some(25.0));
        assert_eq!(UploadProgress::complete(0).progress, Some(100.0));

        let overrun = UploadProgress::new(300, Some(200));
        assert_eq!(overrun.total_bytes, Some(300));
        assert_eq!(overrun.progress, Some(100.0));
    }

    #[test]
    fn unknown_length_has_no_total() {
        let p = UploadProgress::new(8192, None);
        assert_eq!(p.total_bytes, None);
        assert_eq!(p.progress, None);
        assert!(!p.is_complete());

        let json = serde_json::to_value(p).unwrap();
        assert!(json["total_bytes"].is_null());
    }
}
