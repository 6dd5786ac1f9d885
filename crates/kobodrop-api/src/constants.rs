//! API constants

/// Prefix of the JSON API. Handler path annotations repeat it as a literal.
pub const API_PREFIX: &str = "/api/v0";

/// Mount point of the local storage backend's files.
pub const MEDIA_PREFIX: &str = "/media";
