//! In-memory ECS service for testing.
//!
//! `MockObjectService` implements [`ObjectTransport`] by interpreting wire
//! requests the way the real service does: range updates, append,
//! preconditions, retention and listing. Tests therefore exercise the real
//! encoders and decoders end to end.
//!
//! The service clock only moves forward with wall time plus whatever
//! [`MockObjectService::advance_clock`] adds, and is truncated to whole
//! seconds like HTTP dates.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use http::{Method, StatusCode};
use md5::{Digest, Md5};
use quick_xml::escape::escape;

use super::append::{APPEND_OFFSET_HEADER, APPEND_RANGE};
use super::condition::{ETag, ETagCondition};
use super::error::ObjectResult;
use super::protocol::{WireRequest, WireResponse, METADATA_PREFIX};
use super::retention::{
    OBJECT_UNDER_RETENTION_CODE, RETENTION_PERIOD_HEADER, RETENTION_POLICY_HEADER,
};
use super::transport::ObjectTransport;

type Reply<T> = Result<T, WireResponse>;

#[derive(Clone, Debug)]
struct StoredObject {
    data: Bytes,
    etag: ETag,
    last_modified: SystemTime,
    content_type: Option<String>,
    metadata: Vec<(String, String)>,
    retain_until: Option<SystemTime>,
}

impl StoredObject {
    /// Same object with new content; attributes and retention carry over.
    fn with_data(&self, data: Bytes, now: SystemTime) -> Self {
        Self {
            etag: content_etag(&data),
            data,
            last_modified: now,
            ..self.clone()
        }
    }
}

enum WriteMode {
    Replace,
    Append,
    Update { start: u64, last: Option<u64> },
}

#[derive(Default)]
struct ServiceState {
    objects: BTreeMap<(String, String), StoredObject>,
    policies: HashMap<String, Duration>,
    clock_skew: Duration,
    requests: Vec<WireRequest>,
}

/// In-memory mock of the ECS object API.
///
/// # Example
///
/// ```rust,ignore
/// let service = Arc::new(MockObjectService::new().with_retention_policy("hold-me", 60));
/// let client = EcsObjectClient::new(service.clone(), ObjectClientConfig::default());
///
/// client.put_object(&request).await?;
/// assert!(service.contains("bucket", "key-1"));
/// ```
#[derive(Default)]
pub struct MockObjectService {
    state: RwLock<ServiceState>,
}

impl MockObjectService {
    /// Create a new empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a named retention policy lasting `secs` seconds.
    pub fn with_retention_policy(self, name: impl Into<String>, secs: u64) -> Self {
        self.state
            .write()
            .unwrap()
            .policies
            .insert(name.into(), Duration::from_secs(secs));
        self
    }

    /// Move the service clock forward.
    pub fn advance_clock(&self, by: Duration) {
        self.state.write().unwrap().clock_skew += by;
    }

    /// Current service time.
    pub fn now(&self) -> SystemTime {
        self.state.read().unwrap().now()
    }

    /// Check if an object exists (synchronous, for tests).
    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.object_data(bucket, key).is_some()
    }

    /// Get object data directly (synchronous, for tests).
    pub fn object_data(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.state
            .read()
            .unwrap()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.data.clone())
    }

    /// All keys in a bucket, in listing order.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.state
            .read()
            .unwrap()
            .objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.state.read().unwrap().requests.len()
    }

    /// The most recent request received.
    pub fn last_request(&self) -> Option<WireRequest> {
        self.state.read().unwrap().requests.last().cloned()
    }

    fn handle(&self, request: WireRequest) -> WireResponse {
        let mut state = self.state.write().unwrap();
        state.requests.push(request.clone());
        let now = state.now();

        let reply = match (&request.method, request.key.as_deref()) {
            (&Method::PUT, Some(key)) => state.put(&request, key, now),
            (&Method::GET, Some(key)) => state.get(&request.bucket, key, true),
            (&Method::HEAD, Some(key)) => state.get(&request.bucket, key, false),
            (&Method::DELETE, Some(key)) => state.delete(&request.bucket, key, now),
            (&Method::GET, None) => Ok(state.list(&request)),
            _ => Err(error_response(
                StatusCode::METHOD_NOT_ALLOWED,
                "MethodNotAllowed",
                "The specified method is not allowed against this resource.",
                &format!("/{}", request.bucket),
            )),
        };
        reply.unwrap_or_else(|response| response)
    }
}

#[async_trait]
impl ObjectTransport for MockObjectService {
    async fn execute(&self, request: WireRequest) -> ObjectResult<WireResponse> {
        Ok(self.handle(request))
    }
}

impl ServiceState {
    fn now(&self) -> SystemTime {
        let now = SystemTime::now() + self.clock_skew;
        let secs = now
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn put(&mut self, request: &WireRequest, key: &str, now: SystemTime) -> Reply<WireResponse> {
        let id = (request.bucket.clone(), key.to_string());
        let resource = format!("/{}/{}", id.0, id.1);
        let existing = self.objects.get(&id);

        check_conditions(request, existing, &resource)?;
        if let Some(object) = existing {
            check_retention(object, now, &resource)?;
        }

        let body = &request.body;
        let (object, append_offset) = match write_mode(request.header("range"), &resource)? {
            WriteMode::Replace => {
                let object = StoredObject {
                    data: body.clone(),
                    etag: content_etag(body),
                    last_modified: now,
                    content_type: request.header("content-type").map(str::to_string),
                    metadata: request_metadata(request),
                    retain_until: self.retention_deadline(request, now, &resource)?,
                };
                (object, None)
            }
            WriteMode::Append => {
                let prior = existing.ok_or_else(|| no_such_key(&resource))?;
                let mut data = BytesMut::with_capacity(prior.data.len() + body.len());
                data.extend_from_slice(&prior.data);
                data.extend_from_slice(body);
                (prior.with_data(data.freeze(), now), Some(prior.data.len()))
            }
            WriteMode::Update { start, last } => {
                let prior = existing.ok_or_else(|| no_such_key(&resource))?;
                let data = apply_update(&prior.data, start, last, body)
                    .ok_or_else(|| invalid_range(&resource))?;
                (prior.with_data(data, now), None)
            }
        };

        let mut response = WireResponse::new(StatusCode::OK)
            .with_header("etag", object.etag.header_value())
            .with_header("last-modified", httpdate::fmt_http_date(now));
        if let Some(offset) = append_offset {
            response = response.with_header(APPEND_OFFSET_HEADER, offset.to_string());
        }
        self.objects.insert(id, object);
        Ok(response)
    }

    fn get(&self, bucket: &str, key: &str, with_body: bool) -> Reply<WireResponse> {
        let resource = format!("/{}/{}", bucket, key);
        let object = self
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .ok_or_else(|| no_such_key(&resource))?;

        let mut response = WireResponse::new(StatusCode::OK)
            .with_header("etag", object.etag.header_value())
            .with_header("last-modified", httpdate::fmt_http_date(object.last_modified))
            .with_header("content-length", object.data.len().to_string());
        if let Some(content_type) = &object.content_type {
            response = response.with_header("content-type", content_type);
        }
        for (name, value) in &object.metadata {
            response = response.with_header(&format!("{}{}", METADATA_PREFIX, name), value);
        }
        if with_body {
            response = response.with_body(object.data.clone());
        }
        Ok(response)
    }

    fn delete(&mut self, bucket: &str, key: &str, now: SystemTime) -> Reply<WireResponse> {
        let id = (bucket.to_string(), key.to_string());
        if let Some(object) = self.objects.get(&id) {
            check_retention(object, now, &format!("/{}/{}", bucket, key))?;
            self.objects.remove(&id);
        }
        Ok(WireResponse::new(StatusCode::NO_CONTENT))
    }

    fn list(&self, request: &WireRequest) -> WireResponse {
        let prefix = request.query_param("prefix").unwrap_or_default();
        let marker = request.query_param("marker");
        let max_keys = request
            .query_param("max-keys")
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000usize);

        let mut matching = self
            .objects
            .iter()
            .filter(|((bucket, key), _)| {
                *bucket == request.bucket
                    && key.starts_with(prefix)
                    && marker.is_none_or(|m| key.as_str() > m)
            })
            .map(|((_, key), object)| (key, object));
        let page: Vec<_> = matching.by_ref().take(max_keys).collect();
        let truncated = matching.next().is_some();

        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <ListBucketResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">",
        );
        xml.push_str(&format!(
            "<Name>{}</Name><Prefix>{}</Prefix><MaxKeys>{}</MaxKeys><IsTruncated>{}</IsTruncated>",
            escape(request.bucket.as_str()),
            escape(prefix),
            max_keys,
            truncated
        ));
        for (key, object) in page {
            xml.push_str(&format!(
                "<Contents><Key>{}</Key><ETag>{}</ETag><Size>{}</Size></Contents>",
                escape(key.as_str()),
                escape(object.etag.header_value().as_str()),
                object.data.len()
            ));
        }
        xml.push_str("</ListBucketResult>");

        WireResponse::new(StatusCode::OK)
            .with_header("content-type", "application/xml")
            .with_body(xml)
    }

    fn retention_deadline(
        &self,
        request: &WireRequest,
        now: SystemTime,
        resource: &str,
    ) -> Reply<Option<SystemTime>> {
        let invalid = |message: &str| {
            error_response(StatusCode::BAD_REQUEST, "InvalidArgument", message, resource)
        };
        match (
            request.header(RETENTION_PERIOD_HEADER),
            request.header(RETENTION_POLICY_HEADER),
        ) {
            (Some(_), Some(_)) => Err(invalid("Retention period and policy are exclusive.")),
            (Some(secs), None) => secs
                .parse::<u64>()
                .map(|secs| Some(now + Duration::from_secs(secs)))
                .map_err(|_| invalid("Invalid retention period.")),
            (None, Some(name)) => self
                .policies
                .get(name)
                .map(|period| Some(now + *period))
                .ok_or_else(|| invalid("Unknown retention policy.")),
            (None, None) => Ok(None),
        }
    }
}

fn check_conditions(
    request: &WireRequest,
    existing: Option<&StoredObject>,
    resource: &str,
) -> Reply<()> {
    let failed = || {
        error_response(
            StatusCode::PRECONDITION_FAILED,
            "PreconditionFailed",
            "At least one of the pre-conditions you specified did not hold",
            resource,
        )
    };

    if let Some(value) = request.header("if-match") {
        let holds = match (ETagCondition::from_header_value(value), existing) {
            (_, None) => false,
            (ETagCondition::Any, Some(_)) => true,
            (ETagCondition::Exact(etag), Some(object)) => etag.strong_eq(&object.etag),
        };
        if !holds {
            return Err(failed());
        }
    }
    if let Some(value) = request.header("if-none-match") {
        let holds = match (ETagCondition::from_header_value(value), existing) {
            (_, None) => true,
            (ETagCondition::Any, Some(_)) => false,
            (ETagCondition::Exact(etag), Some(object)) => !etag.weak_eq(&object.etag),
        };
        if !holds {
            return Err(failed());
        }
    }
    if let (Some(value), Some(object)) = (request.header("if-unmodified-since"), existing) {
        if object.last_modified > parse_date(value, resource)? {
            return Err(failed());
        }
    }
    if let (Some(value), Some(object)) = (request.header("if-modified-since"), existing) {
        if object.last_modified <= parse_date(value, resource)? {
            return Err(failed());
        }
    }
    Ok(())
}

fn check_retention(object: &StoredObject, now: SystemTime, resource: &str) -> Reply<()> {
    match object.retain_until {
        Some(until) if now < until => Err(error_response(
            StatusCode::CONFLICT,
            OBJECT_UNDER_RETENTION_CODE,
            "The object is under retention and can't be modified.",
            resource,
        )),
        _ => Ok(()),
    }
}

fn write_mode(range: Option<&str>, resource: &str) -> Reply<WriteMode> {
    let Some(range) = range else {
        return Ok(WriteMode::Replace);
    };
    if range == APPEND_RANGE {
        return Ok(WriteMode::Append);
    }
    let parse = || {
        let (start, last) = range.strip_prefix("bytes=")?.split_once('-')?;
        let start = start.parse().ok()?;
        let last = match last {
            "" => None,
            last => Some(last.parse().ok()?),
        };
        Some(WriteMode::Update { start, last })
    };
    parse().ok_or_else(|| {
        error_response(
            StatusCode::BAD_REQUEST,
            "InvalidArgument",
            "Invalid Range header.",
            resource,
        )
    })
}

/// Splice `body` into `data`; `None` if the update is not allowed.
fn apply_update(data: &Bytes, start: u64, last: Option<u64>, body: &Bytes) -> Option<Bytes> {
    if start > data.len() as u64 {
        return None;
    }
    let start = start as usize;
    let mut out = BytesMut::with_capacity(data.len().max(start + body.len()));
    out.extend_from_slice(&data[..start]);
    out.extend_from_slice(body);

    if let Some(last) = last {
        let window = last.checked_sub(start as u64)?.checked_add(1)?;
        if window != body.len() as u64 {
            return None;
        }
        let end = start + body.len();
        if end < data.len() {
            out.extend_from_slice(&data[end..]);
        }
    }
    Some(out.freeze())
}

fn parse_date(value: &str, resource: &str) -> Reply<SystemTime> {
    httpdate::parse_http_date(value).map_err(|_| {
        error_response(
            StatusCode::BAD_REQUEST,
            "InvalidArgument",
            "Invalid date header.",
            resource,
        )
    })
}

fn request_metadata(request: &WireRequest) -> Vec<(String, String)> {
    request
        .headers
        .iter()
        .filter_map(|(name, value)| {
            let name = name.as_str().strip_prefix(METADATA_PREFIX)?;
            Some((name.to_string(), value.to_str().ok()?.to_string()))
        })
        .collect()
}

fn content_etag(data: &[u8]) -> ETag {
    ETag::new(hex::encode(Md5::digest(data)))
}

fn no_such_key(resource: &str) -> WireResponse {
    error_response(
        StatusCode::NOT_FOUND,
        "NoSuchKey",
        "The specified key does not exist.",
        resource,
    )
}

fn invalid_range(resource: &str) -> WireResponse {
    error_response(
        StatusCode::RANGE_NOT_SATISFIABLE,
        "InvalidRange",
        "The requested range cannot be satisfied.",
        resource,
    )
}

fn error_response(status: StatusCode, code: &str, message: &str, resource: &str) -> WireResponse {
    let body = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <Error><Code>{}</Code><Message>{}</Message>\
         <Resource>{}</Resource><RequestId>mock-request</RequestId></Error>",
        code,
        escape(message),
        escape(resource)
    );
    WireResponse::new(status)
        .with_header("content-type", "application/xml")
        .with_body(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ecs_s3::append::encode_append;
    use crate::storage::ecs_s3::protocol::{encode_get, encode_write};
    use crate::storage::ecs_s3::request::WriteRequest;

    fn put(service: &MockObjectService, key: &str, body: &'static str) -> WireResponse {
        let request = WriteRequest::builder("bucket", key).body(body).build().unwrap();
        service.handle(encode_write(&request).unwrap())
    }

    #[test]
    fn test_apply_update() {
        let data = Bytes::from("The cat crossed the road.");
        let dog = Bytes::from("dog");

        let out = apply_update(&data, 4, Some(6), &dog).unwrap();
        assert_eq!(&out[..], b"The dog crossed the road.");

        let out = apply_update(&data, 4, None, &dog).unwrap();
        assert_eq!(&out[..], b"The dog");

        // Window past the end grows the object.
        let out = apply_update(&Bytes::from("abcde"), 3, Some(6), &Bytes::from("WXYZ")).unwrap();
        assert_eq!(&out[..], b"abcWXYZ");

        // Gaps and body/window mismatches are refused.
        assert!(apply_update(&data, 100, None, &dog).is_none());
        assert!(apply_update(&data, 4, Some(9), &dog).is_none());
        assert!(apply_update(&data, 4, Some(3), &dog).is_none());
    }

    #[test]
    fn test_put_and_get() {
        let service = MockObjectService::new();
        let response = put(&service, "key-1", "hello");
        assert_eq!(response.status, StatusCode::OK);
        let etag = response.header("etag").unwrap().to_string();

        let response = service.handle(encode_get("bucket", "key-1"));
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(&response.body[..], b"hello");
        assert_eq!(response.header("etag"), Some(etag.as_str()));
        assert_eq!(service.request_count(), 2);
    }

    #[test]
    fn test_append_reports_offset() {
        let service = MockObjectService::new();
        put(&service, "key-1", "What goes up");

        let response = service.handle(encode_append("bucket", "key-1", Bytes::from("!")));
        assert_eq!(response.header(APPEND_OFFSET_HEADER), Some("12"));
        assert_eq!(
            service.object_data("bucket", "key-1").unwrap(),
            Bytes::from("What goes up!")
        );

        let response = service.handle(encode_append("bucket", "missing", Bytes::from("!")));
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_advance_clock() {
        let service = MockObjectService::new();
        let before = service.now();
        service.advance_clock(Duration::from_secs(60));
        assert!(service.now() >= before + Duration::from_secs(60));
    }

    #[test]
    fn test_keys_are_sorted_per_bucket() {
        let service = MockObjectService::new();
        put(&service, "b", "2");
        put(&service, "a", "1");
        assert_eq!(service.keys("bucket"), vec!["a".to_string(), "b".to_string()]);
        assert!(service.keys("other").is_empty());
        assert!(service.contains("bucket", "a"));
        assert!(!service.contains("other", "a"));
    }
}
