//! Record store for sessions and file metadata
//!
//! Two collections back the broker: `sessions` and `files`. Both are reached
//! through the [`SessionRepository`] and [`FileRepository`] traits so callers can
//! run against Postgres or an in-process store interchangeably.

pub mod memory;
pub mod postgres;
pub mod traits;

pub use memory::{MemoryFileRepository, MemorySessionRepository};
pub use postgres::{run_migrations, FileRepositoryPg, SessionRepositoryPg};
pub use traits::{FileRepository, SessionRepository};
