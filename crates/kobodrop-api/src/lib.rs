//! Kobodrop API Library
//!
//! This crate provides the HTTP handlers, the e-reader pages and application setup.

// Module declarations
mod api_doc;
pub mod constants;
mod handlers;
pub mod setup;
pub mod telemetry;
mod views;

// Public modules
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::{AppState, Repositories};
