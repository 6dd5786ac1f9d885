//! In-process repositories
//!
//! Used when no `DATABASE_URL` is configured and as the store behind the HTTP
//! tests. Each map sits behind its own lock, so single-record operations are
//! atomic; nothing survives a restart.

mod files;
mod sessions;

pub use files::MemoryFileRepository;
pub use sessions::MemorySessionRepository;
