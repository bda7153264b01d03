//! Values returned by the read, head and listing operations.

use std::time::SystemTime;

use bytes::Bytes;

use super::condition::ETag;

/// Result of a successful full-object write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOutcome {
    /// ETag of the object after the write.
    pub etag: ETag,
    /// HTTP status of the response.
    pub status: u16,
    /// Last-Modified reported with the response, when present.
    pub last_modified: Option<SystemTime>,
}

/// Object content together with the attributes needed to verify a write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectContent {
    pub body: Bytes,
    pub etag: ETag,
    pub last_modified: Option<SystemTime>,
    pub content_type: Option<String>,
    /// User metadata (names without the `x-amz-meta-` prefix).
    pub metadata: Vec<(String, String)>,
}

impl ObjectContent {
    /// Look up a user metadata value by name (case-insensitive).
    pub fn metadata_value(&self, name: &str) -> Option<&str> {
        lookup(&self.metadata, name)
    }
}

/// Object attributes from a HEAD request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub size: u64,
    pub etag: Option<ETag>,
    pub last_modified: Option<SystemTime>,
    pub content_type: Option<String>,
    pub metadata: Vec<(String, String)>,
}

impl ObjectMetadata {
    /// Look up a user metadata value by name (case-insensitive).
    pub fn metadata_value(&self, name: &str) -> Option<&str> {
        lookup(&self.metadata, name)
    }
}

/// One entry of a bucket listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub etag: Option<ETag>,
    /// As reported by the service (ISO-8601).
    pub last_modified: Option<String>,
}

/// One page of a bucket listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListPage {
    pub objects: Vec<ObjectSummary>,
    pub is_truncated: bool,
    /// Marker to pass for the next page; set only when the page is truncated.
    pub next_marker: Option<String>,
}

fn lookup<'a>(metadata: &'a [(String, String)], name: &str) -> Option<&'a str> {
    metadata
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
