//! Write requests.
//!
//! [`WriteRequest`] is an immutable, validated description of a single
//! object write. It can only be produced by [`WriteRequestBuilder::build`],
//! which rejects illegal combinations before anything reaches the network.

use std::time::Duration;

use bytes::Bytes;

use super::condition::WriteConditions;
use super::error::{ObjectError, ObjectResult};
use super::range::ByteRange;
use super::retention::Retention;

/// A single object write (full replacement or ranged update).
///
/// # Example
///
/// ```rust,ignore
/// let request = WriteRequest::builder("my-bucket", "key-1")
///     .body("dog")
///     .range(ByteRange::from_offset_length(4, 3))
///     .build()?;
///
/// let outcome = client.put_object(&request).await?;
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct WriteRequest {
    bucket: String,
    key: String,
    body: Bytes,
    range: Option<ByteRange>,
    conditions: Option<WriteConditions>,
    retention: Option<Retention>,
    content_type: Option<String>,
    metadata: Vec<(String, String)>,
}

impl WriteRequest {
    /// Start building a write to `bucket`/`key`.
    pub fn builder(bucket: impl Into<String>, key: impl Into<String>) -> WriteRequestBuilder {
        WriteRequestBuilder::new(bucket, key)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn range(&self) -> Option<&ByteRange> {
        self.range.as_ref()
    }

    pub fn conditions(&self) -> Option<&WriteConditions> {
        self.conditions.as_ref()
    }

    pub fn retention(&self) -> Option<&Retention> {
        self.retention.as_ref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// User metadata in insertion order.
    pub fn metadata(&self) -> &[(String, String)] {
        &self.metadata
    }

    /// Whether resending this request after a lost response is harmless.
    ///
    /// Plain and ranged writes converge on the same content. Writes guarded
    /// by a specific ETag do not: the first attempt changes the ETag, so the
    /// caller must re-read it before retrying.
    pub fn is_safe_to_retry(&self) -> bool {
        self.conditions
            .as_ref()
            .is_none_or(WriteConditions::is_safe_to_retry)
    }
}

/// Builder for [`WriteRequest`].
#[derive(Clone, Debug, Default)]
pub struct WriteRequestBuilder {
    bucket: String,
    key: String,
    body: Bytes,
    range: Option<ByteRange>,
    conditions: Option<WriteConditions>,
    retention_period: Option<Duration>,
    retention_policy: Option<String>,
    content_type: Option<String>,
    metadata: Vec<(String, String)>,
}

impl WriteRequestBuilder {
    /// Create a new builder.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            ..Default::default()
        }
    }

    /// Set the content to write.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Turn the write into a partial update of `range`.
    pub fn range(mut self, range: ByteRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Attach preconditions. Empty conditions are dropped.
    pub fn conditions(mut self, conditions: WriteConditions) -> Self {
        self.conditions = (!conditions.is_empty()).then_some(conditions);
        self
    }

    /// Keep the object immutable for `period` after the write.
    pub fn retention_period(mut self, period: Duration) -> Self {
        self.retention_period = Some(period);
        self
    }

    /// Apply the service-defined retention policy `name`.
    pub fn retention_policy(mut self, name: impl Into<String>) -> Self {
        self.retention_policy = Some(name.into());
        self
    }

    /// Set the content type.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Add a user metadata entry.
    ///
    /// Names are case-insensitive, like the headers they travel in. Re-adding
    /// a name replaces its value in place and keeps the first spelling.
    pub fn metadata(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self
            .metadata
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.metadata.push((name, value)),
        }
        self
    }

    /// Validate and produce the request.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::Configuration`] if both a retention period and
    /// a retention policy were set.
    pub fn build(self) -> ObjectResult<WriteRequest> {
        let retention = match (self.retention_period, self.retention_policy) {
            (Some(_), Some(_)) => {
                return Err(ObjectError::configuration(
                    "retention period and retention policy are mutually exclusive",
                ))
            }
            (Some(period), None) => Some(Retention::Period(period)),
            (None, Some(policy)) => Some(Retention::Policy(policy)),
            (None, None) => None,
        };

        Ok(WriteRequest {
            bucket: self.bucket,
            key: self.key,
            body: self.body,
            range: self.range,
            conditions: self.conditions,
            retention,
            content_type: self.content_type,
            metadata: self.metadata,
        })
    }
}
