//! Kobodrop Services Layer
//!
//! The broker's business logic: pairing sessions, the file registry, blob
//! transfer with progress, the size-based download dispatcher and the pairing
//! lookup behind the e-reader page. Every component receives its store handles
//! at construction; nothing here reaches for global clients.

pub mod download;
pub mod fetch;
pub mod listing;
pub mod registry;
pub mod session;
pub mod transfer;

pub use download::{
    content_disposition, route_for_size, DownloadDispatcher, DownloadPlan, DownloadRoute,
    ProxiedDownload,
};
pub use fetch::{BlobFetcher, BodyStream, FetchedBlob, HttpBlobFetcher, StorageBlobFetcher};
pub use listing::{KoboListing, KoboPage, ListedFile};
pub use registry::FileRegistry;
pub use session::SessionStore;
pub use transfer::{BlobTransfer, ProgressCallback, UploadSource, UploadedBlob};
