//! Compensating cleanup for media uploaded during a single mutation attempt.
//!
//! Uploads cannot be rolled back transactionally, so the engine tracks every
//! URL it uploads while an atomic unit is being assembled. If the unit aborts,
//! the batch is purged best-effort: individual deletion failures are logged
//! and never escalate over the primary error.

use crate::store::{FileUpload, MediaError, MediaStore, MediaUrl};

/// The uploaded-this-attempt set.
#[derive(Debug, Default)]
pub struct UploadBatch {
    urls: Vec<MediaUrl>,
}

impl UploadBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload one file and track the resulting URL for potential rollback.
    pub fn upload<M: MediaStore>(
        &mut self,
        media: &M,
        file: &FileUpload,
    ) -> Result<MediaUrl, MediaError> {
        let url = media.upload(file)?;
        self.urls.push(url.clone());
        Ok(url)
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn urls(&self) -> &[MediaUrl] {
        &self.urls
    }

    /// Delete every URL uploaded during this attempt (best-effort).
    pub fn purge<M: MediaStore>(self, media: &M) {
        purge_urls(media, &self.urls);
    }
}

/// Best-effort deletion of a set of media URLs.
///
/// Failures are swallowed: the catalog invariant is never sacrificed for
/// media tidiness, so a failed cleanup leaves an orphaned object and a log
/// line rather than an inconsistent catalog.
pub fn purge_urls<M: MediaStore>(media: &M, urls: &[MediaUrl]) {
    for url in urls {
        if let Err(e) = media.delete(url) {
            tracing::warn!(url = %url, error = %e, "media cleanup failed; object orphaned");
        }
    }
}
