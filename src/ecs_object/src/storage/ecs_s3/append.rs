//! Append-to-object.
//!
//! An append is a `PUT` carrying the special range `bytes=-1-`. The service
//! writes the body at the current end of the object and reports where it
//! landed in `x-emc-append-offset`, which is also the object length before
//! the append.
//!
//! Appends are not idempotent: replaying one duplicates the content. Nothing
//! in this crate retries them.

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, ETAG, RANGE};
use http::{HeaderValue, Method};

use super::condition::ETag;
use super::error::{ObjectError, ObjectResult};
use super::protocol::{classify, WireRequest, WireResponse};

/// `Range` value that turns a put into an append.
pub const APPEND_RANGE: &str = "bytes=-1-";

/// Response header carrying the offset the appended bytes were written at.
pub const APPEND_OFFSET_HEADER: &str = "x-emc-append-offset";

/// Result of a successful append.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppendOutcome {
    /// ETag after the append, when the service returns one.
    pub etag: Option<ETag>,
    /// HTTP status of the response.
    pub status: u16,
    /// Offset the new bytes were written at (object length before the append).
    pub append_offset: u64,
    /// Number of bytes appended.
    pub appended_len: u64,
}

impl AppendOutcome {
    /// Object length right after this append.
    pub fn object_length(&self) -> u64 {
        self.append_offset.saturating_add(self.appended_len)
    }
}

/// Encode an append request.
pub fn encode_append(bucket: &str, key: &str, content: Bytes) -> WireRequest {
    let mut wire = WireRequest::new(Method::PUT, bucket, Some(key.to_string()));
    wire.headers
        .insert(RANGE, HeaderValue::from_static(APPEND_RANGE));
    wire.headers
        .insert(CONTENT_LENGTH, HeaderValue::from(content.len()));
    wire.body = content;
    wire
}

/// Decode an append response.
pub fn decode_append(response: &WireResponse, appended_len: u64) -> ObjectResult<AppendOutcome> {
    if !response.status.is_success() {
        return Err(classify(response));
    }
    let raw = response.header(APPEND_OFFSET_HEADER).ok_or_else(|| {
        ObjectError::invalid_response("append_object", "missing x-emc-append-offset header")
    })?;
    let append_offset = raw.trim().parse::<u64>().map_err(|_| {
        ObjectError::invalid_response(
            "append_object",
            format!("unparseable append offset '{}'", raw),
        )
    })?;

    Ok(AppendOutcome {
        etag: response.header(ETAG.as_str()).map(ETag::new),
        status: response.status.as_u16(),
        append_offset,
        appended_len,
    })
}
