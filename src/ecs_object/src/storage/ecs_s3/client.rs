//! ECS object client - the main entry point.
//!
//! This module provides `EcsObjectClient`, which pairs the protocol
//! translation in this crate with an [`ObjectTransport`].

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace, warn};

use super::append::{decode_append, encode_append, AppendOutcome};
use super::config::ObjectClientConfig;
use super::error::{ObjectError, ObjectResult};
use super::http_transport::HttpTransport;
use super::object::{ListPage, ObjectContent, ObjectMetadata, WriteOutcome};
use super::protocol::{
    decode_delete, decode_get, decode_head, decode_list, decode_write, encode_delete, encode_get,
    encode_head, encode_list, encode_write,
};
use super::request::WriteRequest;
use super::transport::ObjectTransport;

/// Client for ECS object operations.
///
/// Every call is one request/response exchange. The client holds no locks,
/// caches or sessions and never retries; concurrent writers coordinate
/// through [`WriteConditions`](super::condition::WriteConditions).
///
/// # Example
///
/// ```rust,ignore
/// let client = EcsObjectClient::connect(ObjectClientConfig::new(endpoint))?;
///
/// let created = client
///     .put_object(&WriteRequest::builder("bucket", "key-1").body("What goes up").build()?)
///     .await?;
///
/// let offset = client.append("bucket", "key-1", " must come down.").await?;
/// assert_eq!(offset, 12);
/// ```
#[derive(Clone)]
pub struct EcsObjectClient {
    transport: Arc<dyn ObjectTransport>,
    config: ObjectClientConfig,
}

impl EcsObjectClient {
    /// Create a client over an existing transport.
    pub fn new(transport: Arc<dyn ObjectTransport>, config: ObjectClientConfig) -> Self {
        Self { transport, config }
    }

    /// Create a client talking HTTP to `config.endpoint`.
    pub fn connect(config: ObjectClientConfig) -> ObjectResult<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(Arc::new(transport), config))
    }

    pub fn config(&self) -> &ObjectClientConfig {
        &self.config
    }

    /// Write an object, either replacing it or updating the requested range.
    ///
    /// # Errors
    ///
    /// - [`ObjectError::Configuration`] if the request cannot be encoded; nothing is sent
    /// - [`ObjectError::PreconditionFailed`] if a condition did not hold
    /// - [`ObjectError::ObjectUnderRetention`] if the object is still retained
    /// - [`ObjectError::NotFound`] for a ranged update of a missing object
    pub async fn put_object(&self, request: &WriteRequest) -> ObjectResult<WriteOutcome> {
        let wire = encode_write(request)?;
        trace!(
            bucket = request.bucket(),
            key = request.key(),
            len = request.body().len(),
            ranged = request.range().is_some(),
            "put object"
        );

        let response = self.transport.execute(wire).await?;
        decode_write(&response).inspect_err(|e| log_failure("put_object", request.key(), e))
    }

    /// Append `content` to an existing object.
    ///
    /// Appends are never retried: replaying one duplicates the content.
    pub async fn append_object(
        &self,
        bucket: &str,
        key: &str,
        content: impl Into<Bytes>,
    ) -> ObjectResult<AppendOutcome> {
        let content = content.into();
        let appended_len = content.len() as u64;
        trace!(bucket, key, len = appended_len, "append object");

        let response = self
            .transport
            .execute(encode_append(bucket, key, content))
            .await?;
        let outcome = decode_append(&response, appended_len)
            .inspect_err(|e| log_failure("append_object", key, e))?;
        debug!(
            bucket,
            key,
            offset = outcome.append_offset,
            length = outcome.object_length(),
            "appended to object"
        );
        Ok(outcome)
    }

    /// Append `content` and return the offset it was written at, i.e. the
    /// object length before the append.
    pub async fn append(
        &self,
        bucket: &str,
        key: &str,
        content: impl Into<Bytes>,
    ) -> ObjectResult<u64> {
        Ok(self.append_object(bucket, key, content).await?.append_offset)
    }

    /// Read a whole object.
    pub async fn get_object(&self, bucket: &str, key: &str) -> ObjectResult<ObjectContent> {
        trace!(bucket, key, "get object");
        let response = self.transport.execute(encode_get(bucket, key)).await?;
        decode_get(&response).inspect_err(|e| log_failure("get_object", key, e))
    }

    /// Fetch object attributes; `None` if the object does not exist.
    pub async fn head_object(&self, bucket: &str, key: &str) -> ObjectResult<Option<ObjectMetadata>> {
        trace!(bucket, key, "head object");
        let response = self.transport.execute(encode_head(bucket, key)).await?;
        decode_head(&response).inspect_err(|e| log_failure("head_object", key, e))
    }

    /// Delete an object. Deleting a missing object is not an error; deleting
    /// a retained one is.
    pub async fn delete_object(&self, bucket: &str, key: &str) -> ObjectResult<()> {
        trace!(bucket, key, "delete object");
        let response = self.transport.execute(encode_delete(bucket, key)).await?;
        decode_delete(&response).inspect_err(|e| log_failure("delete_object", key, e))
    }

    /// List one page of keys after `marker`.
    pub async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        marker: Option<&str>,
    ) -> ObjectResult<ListPage> {
        let wire = encode_list(bucket, prefix, marker, self.config.list_page_size);
        let response = self.transport.execute(wire).await?;
        decode_list(&response).inspect_err(|e| log_failure("list_objects", bucket, e))
    }

    /// Delete every object in `bucket`, following listing markers.
    ///
    /// Returns the number of objects deleted. Stops at the first failure,
    /// e.g. an object still under retention.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::InvalidResponse`] if a truncated page carries
    /// no marker to continue from.
    pub async fn clean_bucket(&self, bucket: &str) -> ObjectResult<usize> {
        let mut deleted = 0;
        let mut marker: Option<String> = None;

        loop {
            let page = self.list_objects(bucket, None, marker.as_deref()).await?;
            for object in &page.objects {
                self.delete_object(bucket, &object.key).await?;
                deleted += 1;
            }
            if !page.is_truncated {
                break;
            }
            match page.next_marker {
                Some(next) => marker = Some(next),
                None => {
                    warn!(bucket, deleted, "truncated listing without a marker");
                    return Err(ObjectError::invalid_response(
                        "list_objects",
                        "truncated listing without a marker",
                    ));
                }
            }
        }

        debug!(bucket, deleted, "cleaned bucket");
        Ok(deleted)
    }
}

fn log_failure(operation: &str, key: &str, error: &ObjectError) {
    match error {
        ObjectError::ObjectUnderRetention(_) => {
            warn!(operation, key, status = ?error.status(), "object under retention")
        }
        _ => debug!(
            operation,
            key,
            status = ?error.status(),
            code = ?error.error_code(),
            %error,
            "request failed"
        ),
    }
}
