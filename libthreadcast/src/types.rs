//! Core data types shared by the publishing pipeline

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Web origin used to build human-facing post links
pub const BSKY_WEB_URL: &str = "https://bsky.app";

/// Strong reference to a record created in the repository
///
/// Serializes as `{"uri": ..., "cid": ...}`, the shape expected inside a
/// reply reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    /// AT URI, e.g. `at://did:plc:abc/app.bsky.feed.post/3kxyz`
    pub uri: String,
    /// Content identifier of the record version
    pub cid: String,
}

impl RecordRef {
    pub fn new(uri: impl Into<String>, cid: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            cid: cid.into(),
        }
    }

    /// Record key: the last path segment of the AT URI
    pub fn rkey(&self) -> &str {
        self.uri.rsplit('/').next().unwrap_or(&self.uri)
    }

    /// Public web URL for this post under the given handle
    pub fn web_url(&self, handle: &str) -> String {
        format!("{}/profile/{}/post/{}", BSKY_WEB_URL, handle, self.rkey())
    }
}

/// Position of a post inside a thread
///
/// `root` is always the first post of the thread and `parent` the post
/// immediately before this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRef {
    pub root: RecordRef,
    pub parent: RecordRef,
}

impl ReplyRef {
    /// Reply link for the post following `parent` in the thread rooted at `root`
    pub fn new(root: &RecordRef, parent: &RecordRef) -> Self {
        Self {
            root: root.clone(),
            parent: parent.clone(),
        }
    }
}

/// Opaque blob descriptor returned by `uploadBlob`
///
/// Never inspected; it is embedded verbatim into exactly one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(pub serde_json::Value);

/// Supported image MIME types for blob uploads
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageMimeType {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageMimeType {
    /// Detect MIME type from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detect MIME type from a file path, defaulting to JPEG
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .unwrap_or(Self::Jpeg)
    }

    /// Get the MIME type string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }
}

impl std::fmt::Display for ImageMimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw image bytes ready for upload, already read from disk by the caller
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub mime_type: ImageMimeType,
}

impl ImageUpload {
    pub fn new(bytes: Vec<u8>, mime_type: ImageMimeType) -> Self {
        Self { bytes, mime_type }
    }
}
