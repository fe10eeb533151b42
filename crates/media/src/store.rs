//! Media object store abstraction.
//!
//! The store is stateless from the engine's point of view: every call is
//! independently retryable, and `delete` is idempotent (deleting an unknown
//! URL is not an error).

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stable URL of a stored media object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaUrl(String);

impl MediaUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for MediaUrl {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaUrl {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Raw file buffer submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    /// Alt text carried alongside the file, attached to the resulting image.
    pub alt_text: Option<String>,
}

impl FileUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            bytes,
            alt_text: None,
        }
    }

    pub fn with_alt_text(mut self, alt_text: impl Into<String>) -> Self {
        self.alt_text = Some(alt_text.into());
        self
    }
}

/// Media store operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("media upload failed: {0}")]
    Upload(String),

    #[error("media delete failed: {0}")]
    Delete(String),
}

/// Object storage for uploaded media.
///
/// Implementations must keep `delete` idempotent: deleting a URL that does not
/// exist (or was already deleted) succeeds.
pub trait MediaStore: Send + Sync {
    /// Upload a raw file buffer, returning its stable URL.
    fn upload(&self, file: &FileUpload) -> Result<MediaUrl, MediaError>;

    /// Delete a previously uploaded object by URL (idempotent).
    fn delete(&self, url: &MediaUrl) -> Result<(), MediaError>;
}

impl<M> MediaStore for Arc<M>
where
    M: MediaStore + ?Sized,
{
    fn upload(&self, file: &FileUpload) -> Result<MediaUrl, MediaError> {
        (**self).upload(file)
    }

    fn delete(&self, url: &MediaUrl) -> Result<(), MediaError> {
        (**self).delete(url)
    }
}

#[derive(Debug, Default)]
struct InMemoryMediaState {
    objects: HashSet<MediaUrl>,
    uploads: Vec<MediaUrl>,
    deletes: Vec<MediaUrl>,
    fail_uploads: bool,
    fail_deletes: bool,
}

/// In-memory media store for tests/dev.
///
/// Records every upload and delete call so tests can assert compensating
/// cleanup happened (or didn't).
#[derive(Debug, Default)]
pub struct InMemoryMediaStore {
    inner: RwLock<InMemoryMediaState>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs currently held by the store (uploaded and not deleted).
    pub fn stored(&self) -> Vec<MediaUrl> {
        let state = self.inner.read().expect("media store lock poisoned");
        state.objects.iter().cloned().collect()
    }

    /// Every upload call made, in order.
    pub fn uploads(&self) -> Vec<MediaUrl> {
        let state = self.inner.read().expect("media store lock poisoned");
        state.uploads.clone()
    }

    /// Every delete call made, in order (including idempotent no-ops).
    pub fn deletes(&self) -> Vec<MediaUrl> {
        let state = self.inner.read().expect("media store lock poisoned");
        state.deletes.clone()
    }

    /// Make subsequent uploads fail (simulated outage).
    pub fn set_fail_uploads(&self, fail: bool) {
        let mut state = self.inner.write().expect("media store lock poisoned");
        state.fail_uploads = fail;
    }

    /// Make subsequent deletes fail (simulated outage).
    pub fn set_fail_deletes(&self, fail: bool) {
        let mut state = self.inner.write().expect("media store lock poisoned");
        state.fail_deletes = fail;
    }
}

impl MediaStore for InMemoryMediaStore {
    fn upload(&self, file: &FileUpload) -> Result<MediaUrl, MediaError> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| MediaError::Upload("media store lock poisoned".to_string()))?;

        if state.fail_uploads {
            return Err(MediaError::Upload(format!(
                "simulated upload failure for '{}'",
                file.filename
            )));
        }

        let url = MediaUrl::new(format!("mem://media/{}/{}", Uuid::now_v7(), file.filename));
        state.objects.insert(url.clone());
        state.uploads.push(url.clone());
        Ok(url)
    }

    fn delete(&self, url: &MediaUrl) -> Result<(), MediaError> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| MediaError::Delete("media store lock poisoned".to_string()))?;

        if state.fail_deletes {
            return Err(MediaError::Delete(format!(
                "simulated delete failure for '{url}'"
            )));
        }

        // Idempotent: removing an unknown URL is still a success.
        state.objects.remove(url);
        state.deletes.push(url.clone());
        Ok(())
    }
}
