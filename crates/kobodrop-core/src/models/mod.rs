//! Data models shared by the record store, the services and the HTTP surface.

mod file;
mod session;

pub use file::*;
pub use session::*;
