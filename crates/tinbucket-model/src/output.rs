//! Response document shapes.
//!
//! Each struct here corresponds to one of the XML documents the service
//! emits. The field order follows the element order S3 clients expect.

use crate::types::{
    BucketEntry, CommonPrefix, DeleteErrorEntry, DeletedObject, Grant, ObjectEntry, Owner, Part,
};

/// The `ListAllMyBucketsResult` document.
#[derive(Debug, Clone, Default)]
pub struct ListAllMyBucketsResult {
    /// The owner block (the caller's access key).
    pub owner: Owner,
    /// All buckets.
    pub buckets: Vec<BucketEntry>,
}

/// The v1 `ListBucketResult` document (no `list-type` query).
#[derive(Debug, Clone, Default)]
pub struct ListBucketResult {
    /// The bucket name.
    pub name: String,
    /// The requested prefix.
    pub prefix: String,
    /// The requested marker.
    pub marker: String,
    /// Marker for the next page when truncated and a delimiter is in play.
    pub next_marker: Option<String>,
    /// The effective max-keys value.
    pub max_keys: i32,
    /// The requested delimiter.
    pub delimiter: Option<String>,
    /// Whether more keys remain.
    pub is_truncated: bool,
    /// The object entries.
    pub contents: Vec<ObjectEntry>,
    /// Delimiter groupings.
    pub common_prefixes: Vec<CommonPrefix>,
}

/// The v2 `ListBucketResult` document (`list-type=2`).
#[derive(Debug, Clone, Default)]
pub struct ListBucketResultV2 {
    /// The bucket name.
    pub name: String,
    /// The requested prefix.
    pub prefix: String,
    /// The requested delimiter.
    pub delimiter: Option<String>,
    /// The effective max-keys value.
    pub max_keys: i32,
    /// Number of keys returned: contents plus common prefixes.
    pub key_count: i32,
    /// Whether more keys remain.
    pub is_truncated: bool,
    /// The continuation token this page was requested with.
    pub continuation_token: Option<String>,
    /// The token to request the next page with.
    pub next_continuation_token: Option<String>,
    /// The object entries.
    pub contents: Vec<ObjectEntry>,
    /// Delimiter groupings.
    pub common_prefixes: Vec<CommonPrefix>,
}

/// The `InitiateMultipartUploadResult` document.
#[derive(Debug, Clone)]
pub struct InitiateMultipartUploadResult {
    /// The bucket.
    pub bucket: String,
    /// The key being uploaded.
    pub key: String,
    /// The assigned upload ID.
    pub upload_id: String,
}

/// The `CompleteMultipartUploadResult` document.
#[derive(Debug, Clone)]
pub struct CompleteMultipartUploadResult {
    /// Location of the assembled object (`/bucket/key`).
    pub location: String,
    /// The bucket.
    pub bucket: String,
    /// The key.
    pub key: String,
    /// The quoted composite ETag.
    pub etag: String,
}

/// The `ListPartsResult` document.
#[derive(Debug, Clone)]
pub struct ListPartsResult {
    /// The bucket.
    pub bucket: String,
    /// The key being uploaded.
    pub key: String,
    /// The upload ID.
    pub upload_id: String,
    /// Storage class, always `STANDARD`.
    pub storage_class: String,
    /// The staged parts, sorted by part number.
    pub parts: Vec<Part>,
}

/// The `CopyObjectResult` document.
#[derive(Debug, Clone)]
pub struct CopyObjectResult {
    /// The quoted ETag of the copied object.
    pub etag: String,
    /// When the copy was made.
    pub last_modified: chrono::DateTime<chrono::Utc>,
}

/// The `DeleteResult` document for batch deletes.
#[derive(Debug, Clone, Default)]
pub struct DeleteResult {
    /// Successfully deleted keys. Empty in quiet mode.
    pub deleted: Vec<DeletedObject>,
    /// Per-key failures.
    pub errors: Vec<DeleteErrorEntry>,
}

/// The `LocationConstraint` document.
#[derive(Debug, Clone)]
pub struct LocationConstraint {
    /// The bucket's region.
    pub region: String,
}

/// The `VersioningConfiguration` document. Versioning is not supported, so
/// the document is always empty (acknowledged-but-unset).
#[derive(Debug, Clone, Default)]
pub struct VersioningConfiguration;

/// The `AccessControlPolicy` document.
#[derive(Debug, Clone)]
pub struct AccessControlPolicy {
    /// The bucket owner.
    pub owner: Owner,
    /// The grant list.
    pub grants: Vec<Grant>,
}
