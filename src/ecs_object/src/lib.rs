//! Client-side protocol logic for the ECS flavour of S3.
//!
//! ECS extends plain S3 object writes with byte-range updates, append,
//! conditional writes and retention. The types under [`storage::ecs_s3`]
//! turn those features into wire requests and classify what comes back.

pub mod storage;

pub use storage::ecs_s3::{
    AppendOutcome, ByteRange, ETag, ETagCondition, EcsObjectClient, ErrorKind, HttpTransport,
    ListPage, ObjectClientConfig, ObjectContent, ObjectError, ObjectMetadata, ObjectResult,
    ObjectSummary, ObjectTransport, Retention, ServiceErrorDetail, WireRequest, WireResponse,
    WriteConditions, WriteOutcome, WriteRequest, WriteRequestBuilder,
};
