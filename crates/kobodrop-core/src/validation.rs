//! Upload validation
//!
//! Only the upload endpoint validates. Files already in the registry are served
//! whatever their extension or size.

use crate::error::AppError;

/// Extensions an e-reader can open, lowercase and without the leading dot.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "epub", "pdf", "mobi", "kepub", "txt", "html", "htm", "rtf", "cbz", "cbr", "jpeg", "jpg",
    "png", "bmp", "tiff", "tif", "gif",
];

/// 5 GiB
pub const MAX_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024 * 1024;

const MAX_FILENAME_LENGTH: usize = 255;

#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_file_size: u64,
    allowed_extensions: Vec<String>,
}

impl Default for UploadValidator {
    fn default() -> Self {
        Self::new(
            MAX_FILE_SIZE_BYTES,
            ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        )
    }
}

impl UploadValidator {
    pub fn new(max_file_size: u64, allowed_extensions: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// The filename becomes the last segment of the storage path, so it must be a
    /// single plain segment.
    pub fn validate_filename(&self, filename: &str) -> Result<(), AppError> {
        if filename.trim().is_empty() {
            return Err(AppError::InvalidInput("Filename is required".to_string()));
        }
        if filename.len() > MAX_FILENAME_LENGTH {
            return Err(AppError::InvalidInput(format!(
                "Filename exceeds {} bytes",
                MAX_FILENAME_LENGTH
            )));
        }
        if filename.contains(['/', '\\']) || filename == "." || filename == ".." {
            return Err(AppError::InvalidInput(format!(
                "Invalid filename: {}",
                filename
            )));
        }
        if filename.chars().any(char::is_control) {
            return Err(AppError::InvalidInput(
                "Filename contains control characters".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_extension(&self, filename: &str) -> Result<(), AppError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, e)| e.to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                AppError::InvalidInput(format!("File has no extension: {}", filename))
            })?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(AppError::InvalidInput(format!(
                "Unsupported file type .{} (allowed: {})",
                extension,
                self.allowed_extensions.join(", ")
            )));
        }
        Ok(())
    }

    pub fn validate_size(&self, size: u64) -> Result<(), AppError> {
        if size > self.max_file_size {
            return Err(AppError::PayloadTooLarge(format!(
                "File is {} bytes; the limit is {} bytes",
                size, self.max_file_size
            )));
        }
        Ok(())
    }

    /// Checks the name; the size is checked once known. Empty files are allowed.
    pub fn validate_upload(&self, filename: &str) -> Result<(), AppError> {
        self.validate_filename(filename)?;
        self.validate_extension(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_listed_extension() {
        let validator = UploadValidator::default();
        for ext in ALLOWED_EXTENSIONS {
            assert!(validator.validate_upload(&format!("book.{ext}")).is_ok(), "{ext}");
            assert!(
                validator
                    .validate_upload(&format!("BOOK.{}", ext.to_uppercase()))
                    .is_ok(),
                "{ext}"
            );
        }
    }

    #[test]
    fn rejects_other_extensions() {
        let validator = UploadValidator::default();
        assert!(validator.validate_upload("setup.exe").is_err());
        assert!(validator.validate_upload("noextension").is_err());
        assert!(validator.validate_upload("trailingdot.").is_err());
    }

    #[test]
    fn extension_is_text_after_last_dot() {
        let validator = UploadValidator::default();
        assert!(validator.validate_upload(".epub").is_ok());
        assert!(validator.validate_upload("archive.tar.cbz").is_ok());
        assert!(validator.validate_upload("book.epub.exe").is_err());
    }

    #[test]
    fn rejects_path_segments() {
        let validator = UploadValidator::default();
        assert!(validator.validate_filename("../etc/passwd.txt").is_err());
        assert!(validator.validate_filename("dir\\book.epub").is_err());
        assert!(validator.validate_filename("..").is_err());
        assert!(validator.validate_filename("My Book.epub").is_ok());
    }

    #[test]
    fn size_limits() {
        let validator = UploadValidator::default();
        assert!(validator.validate_size(MAX_FILE_SIZE_BYTES).is_ok());
        assert!(matches!(
            validator.validate_size(MAX_FILE_SIZE_BYTES + 1),
            Err(AppError::PayloadTooLarge(_))
        ));
        assert!(validator.validate_size(0).is_ok());
    }

    #[test]
    fn configured_extensions_are_normalized() {
        let validator = UploadValidator::new(10, vec![" .EPUB".to_string(), "".to_string()]);
        assert_eq!(validator.allowed_extensions(), ["epub".to_string()]);
    }
}
