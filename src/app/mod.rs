pub mod archive;
mod cancel;
pub mod folders;
pub mod listing;
mod stream_output;

pub use archive::{ArchiveOptions, ResolvedKeys, SKIPPED_MANIFEST_ENTRY};
pub use cancel::CancelToken;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{ArchiveRequest, ArchiveSummary, ObjectListing, PresignedUrl};
use crate::errors::{ArchiveError, BucketBrowserError, FolderError, StoreError};
use crate::ports::ObjectStorePort;
use crate::utils::skip_sink::SkipSink;

/// Longest lifetime a SigV4 presigned URL may have.
pub const MAX_PRESIGN_LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);

pub const DEFAULT_PRESIGN_LIFETIME: Duration = Duration::from_secs(3600);

/// Entry points exposed to the outer surface (CLI today).
pub struct AppCore {
    store: Arc<dyn ObjectStorePort>,
}

impl AppCore {
    pub fn new(store: Arc<dyn ObjectStorePort>) -> Self {
        Self { store }
    }

    /// List one level (or everything, with an empty delimiter) below `prefix`.
    ///
    /// # Errors
    /// Returns an error if any page of the listing fails or `cancel` is tripped.
    pub fn list_objects(
        &self,
        prefix: &str,
        delimiter: &str,
        cancel: &CancelToken,
    ) -> Result<ObjectListing, StoreError> {
        listing::list_objects(self.store.as_ref(), prefix, delimiter, cancel)
    }

    /// Every folder path implied by the bucket's keys, sorted.
    ///
    /// # Errors
    /// Returns an error if enumerating the bucket fails at any page or `cancel` is tripped.
    pub fn derive_folders(&self, cancel: &CancelToken) -> Result<Vec<String>, FolderError> {
        folders::derive_folders(self.store.as_ref(), cancel)
    }

    /// Stream the requested keys and folders as a ZIP container into `writer`.
    ///
    /// # Errors
    /// Returns an error only if the container cannot be finalized.
    pub fn build_archive<W: Write>(
        &self,
        request: &ArchiveRequest,
        writer: W,
        options: &ArchiveOptions,
        sink: &dyn SkipSink,
        cancel: &CancelToken,
    ) -> Result<ArchiveSummary<W>, ArchiveError> {
        archive::build_archive(self.store.as_ref(), request, writer, options, sink, cancel)
    }

    /// Time-limited download URL for one object.
    ///
    /// # Errors
    /// Returns an error for an empty key, a lifetime outside `1s..=7d`, or a store failure.
    pub fn presign_url(
        &self,
        key: &str,
        lifetime: Duration,
    ) -> Result<PresignedUrl, BucketBrowserError> {
        if key.is_empty() {
            return Err(BucketBrowserError::InvalidInput(
                "object key must not be empty".to_string(),
            ));
        }
        if lifetime.is_zero() || lifetime > MAX_PRESIGN_LIFETIME {
            return Err(BucketBrowserError::InvalidInput(format!(
                "expiry must be between 1 and {} seconds",
                MAX_PRESIGN_LIFETIME.as_secs()
            )));
        }

        let url = self.store.presign(key, lifetime)?;
        let expires_at = chrono::Utc::now()
            + chrono::Duration::from_std(lifetime)
                .map_err(|e| BucketBrowserError::InvalidInput(e.to_string()))?;
        Ok(PresignedUrl {
            url,
            expires_at: expires_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        })
    }
}
