//! `mercantile-media` — media lifecycle management.
//!
//! Uploads raw file buffers to object storage, returns stable URLs, and
//! deletes URLs on request. Stateless; every call is independently retryable.

pub mod batch;
pub mod store;

pub use batch::{purge_urls, UploadBatch};
pub use store::{FileUpload, InMemoryMediaStore, MediaError, MediaStore, MediaUrl};
