pub mod download;
pub mod files;
pub mod health;
pub mod kobo;
pub mod sessions;
