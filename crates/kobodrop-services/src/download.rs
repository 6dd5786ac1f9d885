//! Download Dispatcher
//!
//! Small files are proxied through this server so the e-reader receives a
//! `Content-Disposition` carrying the original filename. Files above the proxy
//! limit redirect to their blob URL instead, trading the nice filename for not
//! holding a long transfer open here.

use std::fmt;
use std::sync::Arc;

use kobodrop_core::models::FileMetadata;
use kobodrop_core::AppError;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use uuid::Uuid;

use crate::fetch::{BlobFetcher, BodyStream};
use crate::registry::FileRegistry;

/// 50 MiB
pub const DEFAULT_PROXY_MAX_BYTES: u64 = 52_428_800;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// RFC 5987 `attr-char`: everything else is percent-encoded in `filename*`.
const ATTR_CHAR_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadRoute {
    /// Stream through this server
    Proxy,
    /// Send the client to the blob URL
    Direct,
}

/// Files strictly larger than `proxy_max_bytes` go direct.
pub fn route_for_size(size: u64, proxy_max_bytes: u64) -> DownloadRoute {
    if size > proxy_max_bytes {
        DownloadRoute::Direct
    } else {
        DownloadRoute::Proxy
    }
}

/// `attachment; filename="<ascii>"; filename*=UTF-8''<encoded>`
///
/// The quoted fallback replaces every character outside printable ASCII, plus
/// `"` and `\`, with `_`.
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            ' '..='~' => c,
            _ => '_',
        })
        .collect();
    let encoded = utf8_percent_encode(filename, ATTR_CHAR_ENCODE);
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

pub struct ProxiedDownload {
    pub content_disposition: String,
    pub content_type: String,
    pub content_length: Option<u64>,
    pub body: BodyStream,
}

impl fmt::Debug for ProxiedDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxiedDownload")
            .field("content_disposition", &self.content_disposition)
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum DownloadPlan {
    Redirect { url: String },
    Proxy(ProxiedDownload),
}

#[derive(Clone)]
pub struct DownloadDispatcher {
    registry: FileRegistry,
    fetcher: Arc<dyn BlobFetcher>,
    proxy_max_bytes: u64,
}

impl DownloadDispatcher {
    pub fn new(registry: FileRegistry, fetcher: Arc<dyn BlobFetcher>, proxy_max_bytes: u64) -> Self {
        Self {
            registry,
            fetcher,
            proxy_max_bytes,
        }
    }

    pub fn proxy_max_bytes(&self) -> u64 {
        self.proxy_max_bytes
    }

    /// Decide how `file_id` is served and, for the proxy path, open the upstream.
    #[tracing::instrument(skip(self), fields(operation = "dispatch_download", file_id = %file_id))]
    pub async fn dispatch(&self, file_id: Uuid) -> Result<DownloadPlan, AppError> {
        let file = self
            .registry
            .get(file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        match route_for_size(file.size, self.proxy_max_bytes) {
            DownloadRoute::Direct => {
                tracing::debug!(size_bytes = file.size, "Redirecting large file to blob URL");
                Ok(DownloadPlan::Redirect {
                    url: file.download_url,
                })
            }
            DownloadRoute::Proxy => self.proxy(&file).await.map(DownloadPlan::Proxy),
        }
    }

    async fn proxy(&self, file: &FileMetadata) -> Result<ProxiedDownload, AppError> {
        let fetched = self.fetcher.fetch(file).await?;
        tracing::debug!(
            size_bytes = file.size,
            upstream_length = ?fetched.content_length,
            "Proxying file"
        );

        Ok(ProxiedDownload {
            content_disposition: content_disposition(&file.name),
            content_type: fetched
                .content_type
                .filter(|ct| !ct.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            content_length: fetched.content_length,
            body: fetched.body,
        })
    }
}
