//! # ECS S3 Extensions
//!
//! This module implements the client side of the object-level extensions
//! ECS adds on top of the S3 API.
//!
//! ## Overview
//!
//! Beyond plain puts and gets, ECS supports:
//!
//! - **Range updates**: overwrite a window of an existing object in place
//! - **Append**: add bytes at the end and learn where they landed
//! - **Conditional writes**: `If-Match` / `If-None-Match` (with `*`) and
//!   `If-Modified-Since` / `If-Unmodified-Since` on `PUT`
//! - **Retention**: keep an object immutable for a period or by named policy
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       EcsObjectClient                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Request model:                                               │
//! │  ├─ WriteRequest (+ ByteRange, WriteConditions, Retention)    │
//! │  └─ append content                                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Protocol:                                                    │
//! │  ├─ encode_* → WireRequest (headers, body)                    │
//! │  └─ decode_* / classify ← WireResponse                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ObjectTransport (HttpTransport / in-memory service)          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//!
//! ```text
//! PUT /{bucket}/{key}
//!   Range: bytes=S-E | bytes=S- | bytes=-1- (append)
//!   If-Match / If-None-Match: "etag" | *
//!   If-Modified-Since / If-Unmodified-Since: <HTTP-date>
//!   x-emc-retention-period: <seconds> | x-emc-retention-policy: <name>
//!   x-amz-meta-<name>: <value>
//!
//! 200 OK              ETag, x-emc-append-offset (append)
//! 412                 PreconditionFailed
//! 409 / any           <Code>ObjectUnderRetention</Code>
//! 404                 NoSuchKey
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let client = EcsObjectClient::connect(ObjectClientConfig::new("https://ecs:9021"))?;
//!
//! let created = client
//!     .put_object(
//!         &WriteRequest::builder("bucket", "key-1")
//!             .body("The cat crossed the road.")
//!             .build()?,
//!     )
//!     .await?;
//!
//! // Replace "cat" with "dog", but only if nobody else wrote in between.
//! client
//!     .put_object(
//!         &WriteRequest::builder("bucket", "key-1")
//!             .body("dog")
//!             .range(ByteRange::from_offset_length(4, 3))
//!             .conditions(
//!                 WriteConditions::builder()
//!                     .if_match(ETagCondition::Exact(created.etag))
//!                     .build(),
//!             )
//!             .build()?,
//!     )
//!     .await?;
//! ```

mod append;
mod client;
mod condition;
mod config;
mod error;
mod http_transport;
mod object;
mod protocol;
mod range;
mod request;
mod retention;
mod transport;

pub use append::{AppendOutcome, APPEND_OFFSET_HEADER, APPEND_RANGE};
pub use client::EcsObjectClient;
pub use condition::{ETag, ETagCondition, WriteConditions};
pub use config::{ObjectClientConfig, DEFAULT_LIST_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT_MS};
pub use error::{ErrorKind, ObjectError, ObjectResult, ServiceErrorDetail};
pub use http_transport::HttpTransport;
pub use object::{ListPage, ObjectContent, ObjectMetadata, ObjectSummary, WriteOutcome};
pub use protocol::{classify, WireRequest, WireResponse, METADATA_PREFIX};
pub use range::ByteRange;
pub use request::{WriteRequest, WriteRequestBuilder};
pub use retention::{
    is_retention_violation, Retention, OBJECT_UNDER_RETENTION_CODE, RETENTION_PERIOD_HEADER,
    RETENTION_POLICY_HEADER,
};
pub use transport::ObjectTransport;

#[cfg(test)]
pub(crate) mod mock_service;
