use serde::{Deserialize, Serialize};

use mercantile_media::MediaUrl;

/// An uploaded image attached to a product or variant.
///
/// Value object: two images with the same URL and alt text are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: MediaUrl,
    pub alt_text: Option<String>,
}

impl Image {
    pub fn new(url: MediaUrl, alt_text: Option<String>) -> Self {
        Self { url, alt_text }
    }
}
