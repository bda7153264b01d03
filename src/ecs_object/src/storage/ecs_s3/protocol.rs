//! Translation between logical requests and the wire protocol.
//!
//! Encoders turn requests into [`WireRequest`]s; decoders turn
//! [`WireResponse`]s into typed outcomes or classified [`ObjectError`]s.
//!
//! ```text
//! WriteRequest ──encode_write──▶ WireRequest ──transport──▶ WireResponse
//!                                                               │
//!          WriteOutcome / ObjectError ◀──decode_write / classify┘
//! ```
//!
//! ## Error classification
//!
//! | Response | Classification |
//! |----------|----------------|
//! | code `ObjectUnderRetention` (any status) | `ObjectUnderRetention` |
//! | status 412 | `PreconditionFailed` |
//! | status 404 or code `NoSuchKey` | `NotFound` |
//! | anything else | `Service` |

use std::time::SystemTime;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG, LAST_MODIFIED, RANGE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::Deserialize;
use tracing::trace;

use super::condition::ETag;
use super::error::{ObjectError, ObjectResult, ServiceErrorDetail};
use super::object::{ListPage, ObjectContent, ObjectMetadata, ObjectSummary, WriteOutcome};
use super::request::WriteRequest;
use super::retention::is_retention_violation;

/// Prefix of user metadata headers.
pub const METADATA_PREFIX: &str = "x-amz-meta-";

/// Header carrying the service-assigned request id.
pub const REQUEST_ID_HEADER: &str = "x-amz-request-id";

/// A request as it goes over the wire.
#[derive(Clone, Debug)]
pub struct WireRequest {
    pub method: Method,
    pub bucket: String,
    /// Object key; `None` for bucket-level requests such as listing.
    pub key: Option<String>,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl WireRequest {
    pub fn new(method: Method, bucket: impl Into<String>, key: Option<String>) -> Self {
        Self {
            method,
            bucket: bucket.into(),
            key,
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Header value as a string, if present and printable.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A response as it comes off the wire.
#[derive(Clone, Debug)]
pub struct WireResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl WireResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Add a header. Names or values that are not valid HTTP are skipped.
    pub fn with_header(mut self, name: &str, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value.as_ref()),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Header value as a string, if present and printable.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub(crate) fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> ObjectResult<()> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ObjectError::configuration(format!("invalid header name '{}'", name)))?;
    let header_value = HeaderValue::from_str(value).map_err(|_| {
        ObjectError::configuration(format!("invalid value for header '{}'", name))
    })?;
    headers.append(header_name, header_value);
    Ok(())
}

/// Encode a put (plain or ranged) request.
///
/// # Errors
///
/// Returns [`ObjectError::Configuration`] when a metadata entry or content
/// type is not a valid header.
pub fn encode_write(request: &WriteRequest) -> ObjectResult<WireRequest> {
    let mut wire = WireRequest::new(
        Method::PUT,
        request.bucket(),
        Some(request.key().to_string()),
    );
    let headers = &mut wire.headers;

    headers.insert(CONTENT_LENGTH, HeaderValue::from(request.body().len()));
    if let Some(range) = request.range() {
        insert_header(headers, RANGE.as_str(), &range.header_value())?;
    }
    if let Some(conditions) = request.conditions() {
        for (name, value) in conditions.header_pairs() {
            insert_header(headers, name, &value)?;
        }
    }
    if let Some(retention) = request.retention() {
        let (name, value) = retention.header();
        insert_header(headers, name, &value)?;
    }
    if let Some(content_type) = request.content_type() {
        insert_header(headers, CONTENT_TYPE.as_str(), content_type)?;
    }
    for (name, value) in request.metadata() {
        let header = format!("{}{}", METADATA_PREFIX, name.to_ascii_lowercase());
        insert_header(headers, &header, value)?;
    }

    wire.body = request.body().clone();
    Ok(wire)
}

pub fn encode_get(bucket: &str, key: &str) -> WireRequest {
    WireRequest::new(Method::GET, bucket, Some(key.to_string()))
}

pub fn encode_head(bucket: &str, key: &str) -> WireRequest {
    WireRequest::new(Method::HEAD, bucket, Some(key.to_string()))
}

pub fn encode_delete(bucket: &str, key: &str) -> WireRequest {
    WireRequest::new(Method::DELETE, bucket, Some(key.to_string()))
}

/// Encode a ListObjects (v1) request. `max_keys` is at least one.
pub fn encode_list(
    bucket: &str,
    prefix: Option<&str>,
    marker: Option<&str>,
    max_keys: u32,
) -> WireRequest {
    let mut wire = WireRequest::new(Method::GET, bucket, None);
    if let Some(prefix) = prefix {
        wire.query.push(("prefix".to_string(), prefix.to_string()));
    }
    if let Some(marker) = marker {
        wire.query.push(("marker".to_string(), marker.to_string()));
    }
    wire.query
        .push(("max-keys".to_string(), max_keys.max(1).to_string()));
    wire
}

/// Decode a put response.
pub fn decode_write(response: &WireResponse) -> ObjectResult<WriteOutcome> {
    if !response.status.is_success() {
        return Err(classify(response));
    }
    let etag = response
        .header(ETAG.as_str())
        .map(ETag::new)
        .ok_or_else(|| ObjectError::invalid_response("put_object", "missing ETag header"))?;

    Ok(WriteOutcome {
        etag,
        status: response.status.as_u16(),
        last_modified: last_modified(&response.headers),
    })
}

/// Decode a get response.
pub fn decode_get(response: &WireResponse) -> ObjectResult<ObjectContent> {
    if !response.status.is_success() {
        return Err(classify(response));
    }
    let etag = response
        .header(ETAG.as_str())
        .map(ETag::new)
        .ok_or_else(|| ObjectError::invalid_response("get_object", "missing ETag header"))?;

    Ok(ObjectContent {
        body: response.body.clone(),
        etag,
        last_modified: last_modified(&response.headers),
        content_type: response.header(CONTENT_TYPE.as_str()).map(str::to_string),
        metadata: user_metadata(&response.headers),
    })
}

/// Decode a head response; a 404 means the object does not exist.
pub fn decode_head(response: &WireResponse) -> ObjectResult<Option<ObjectMetadata>> {
    if response.status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !response.status.is_success() {
        return Err(classify(response));
    }
    let size = response
        .header(CONTENT_LENGTH.as_str())
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| ObjectError::invalid_response("head_object", "missing Content-Length"))?;

    Ok(Some(ObjectMetadata {
        size,
        etag: response.header(ETAG.as_str()).map(ETag::new),
        last_modified: last_modified(&response.headers),
        content_type: response.header(CONTENT_TYPE.as_str()).map(str::to_string),
        metadata: user_metadata(&response.headers),
    }))
}

/// Decode a delete response. Deleting a missing object is not an error.
pub fn decode_delete(response: &WireResponse) -> ObjectResult<()> {
    if response.status.is_success() {
        return Ok(());
    }
    match classify(response) {
        ObjectError::NotFound(_) => Ok(()),
        err => Err(err),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListBucketResultXml {
    #[serde(rename = "IsTruncated")]
    is_truncated: bool,
    #[serde(rename = "NextMarker")]
    next_marker: Option<String>,
    #[serde(rename = "Contents")]
    contents: Vec<ContentsXml>,
}

#[derive(Debug, Deserialize)]
struct ContentsXml {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Size", default)]
    size: u64,
    #[serde(rename = "ETag", default)]
    etag: Option<String>,
    #[serde(rename = "LastModified", default)]
    last_modified: Option<String>,
}

/// Decode a ListObjects (v1) response.
///
/// Without a delimiter the service may omit `NextMarker`; the last key of a
/// truncated page is then the marker for the next one.
pub fn decode_list(response: &WireResponse) -> ObjectResult<ListPage> {
    if !response.status.is_success() {
        return Err(classify(response));
    }
    let text = std::str::from_utf8(&response.body)
        .map_err(|e| ObjectError::invalid_response("list_objects", e.to_string()))?;
    let result: ListBucketResultXml = quick_xml::de::from_str(text)
        .map_err(|e| ObjectError::invalid_response("list_objects", e.to_string()))?;

    let objects: Vec<ObjectSummary> = result
        .contents
        .into_iter()
        .map(|c| ObjectSummary {
            key: c.key,
            size: c.size,
            etag: c.etag.map(ETag::new),
            last_modified: c.last_modified,
        })
        .collect();

    let next_marker = if result.is_truncated {
        result
            .next_marker
            .filter(|m| !m.is_empty())
            .or_else(|| objects.last().map(|o| o.key.clone()))
    } else {
        None
    };

    Ok(ListPage {
        objects,
        is_truncated: result.is_truncated,
        next_marker,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBodyXml {
    #[serde(rename = "Code")]
    code: Option<String>,
    #[serde(rename = "Message")]
    message: Option<String>,
    #[serde(rename = "RequestId")]
    request_id: Option<String>,
    #[serde(rename = "Resource")]
    resource: Option<String>,
}

fn parse_error_body(body: &[u8]) -> ErrorBodyXml {
    if body.is_empty() {
        return ErrorBodyXml::default();
    }
    let Ok(text) = std::str::from_utf8(body) else {
        return ErrorBodyXml::default();
    };
    quick_xml::de::from_str(text).unwrap_or_else(|e| {
        trace!(error = %e, "unparseable error body");
        ErrorBodyXml::default()
    })
}

/// Classify a failed response.
///
/// Retention is checked by error code first, since the service is free to
/// report it with any status.
pub fn classify(response: &WireResponse) -> ObjectError {
    let body = parse_error_body(&response.body);
    let detail = ServiceErrorDetail {
        status: response.status.as_u16(),
        code: body.code.filter(|c| !c.is_empty()),
        message: body.message.filter(|m| !m.is_empty()),
        request_id: body
            .request_id
            .or_else(|| response.header(REQUEST_ID_HEADER).map(str::to_string)),
        resource: body.resource,
    };

    if is_retention_violation(detail.code.as_deref()) {
        ObjectError::ObjectUnderRetention(detail)
    } else if response.status == StatusCode::PRECONDITION_FAILED
        || detail.code.as_deref() == Some("PreconditionFailed")
    {
        ObjectError::PreconditionFailed(detail)
    } else if response.status == StatusCode::NOT_FOUND
        || detail.code.as_deref() == Some("NoSuchKey")
    {
        ObjectError::NotFound(detail)
    } else {
        ObjectError::Service(detail)
    }
}

fn last_modified(headers: &HeaderMap) -> Option<SystemTime> {
    headers
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| httpdate::parse_http_date(v).ok())
}

fn user_metadata(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let name = name.as_str().strip_prefix(METADATA_PREFIX)?;
            let value = value.to_str().ok()?;
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}
