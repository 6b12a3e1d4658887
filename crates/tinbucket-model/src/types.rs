//! Plain structs for the S3 XML document components.
//!
//! These types mirror the elements of the 2006-03-01 S3 schema that TinBucket
//! emits or accepts. They carry no behavior; the XML codec in `tinbucket-xml`
//! knows how to read and write them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// The Owner element carried by listings and ACL documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Owner {
    /// Owner identifier (the access key id of the caller).
    pub id: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
}

impl Owner {
    /// Build an owner whose ID and display name are both `id`.
    #[must_use]
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            display_name: Some(id.clone()),
            id: Some(id),
        }
    }
}

/// A bucket entry in `ListAllMyBucketsResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketEntry {
    /// The bucket name.
    pub name: String,
    /// When the bucket was created.
    pub creation_date: DateTime<Utc>,
}

/// An object entry in `ListBucketResult` Contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// The object key.
    pub key: String,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
    /// Quoted MD5-based ETag.
    pub etag: String,
    /// Object size in bytes.
    pub size: i64,
    /// Storage class, always `STANDARD` here.
    pub storage_class: String,
    /// The owner block, present in v1 listings.
    pub owner: Option<Owner>,
}

/// A common prefix produced by delimiter grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonPrefix {
    /// The grouped prefix, ending with the delimiter.
    pub prefix: String,
}

/// One part declared by the client in a `CompleteMultipartUpload` body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedPart {
    /// The part number.
    pub part_number: Option<i32>,
    /// The ETag returned when the part was uploaded.
    pub etag: Option<String>,
}

/// The parsed `CompleteMultipartUpload` request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedMultipartUpload {
    /// The declared parts, in the client's order.
    pub parts: Vec<CompletedPart>,
}

/// One key named in a batch `Delete` request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectIdentifier {
    /// The key to delete.
    pub key: String,
}

/// The parsed batch `Delete` request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delete {
    /// The keys to delete.
    pub objects: Vec<ObjectIdentifier>,
    /// Quiet mode suppresses `Deleted` entries in the response.
    pub quiet: bool,
}

/// A successfully deleted key in a `DeleteResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedObject {
    /// The deleted key.
    pub key: String,
}

/// A per-key failure in a `DeleteResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteErrorEntry {
    /// The key that failed to delete.
    pub key: String,
    /// The S3 error code string.
    pub code: String,
    /// The failure message.
    pub message: String,
}

/// A staged part in a `ListPartsResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// The part number.
    pub part_number: i32,
    /// When the part was uploaded.
    pub last_modified: DateTime<Utc>,
    /// Quoted MD5 ETag of the part body.
    pub etag: String,
    /// Part size in bytes.
    pub size: i64,
}

/// A grantee inside an ACL grant. TinBucket only ever grants to the owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grantee {
    /// Grantee identifier.
    pub id: String,
    /// Display name.
    pub display_name: Option<String>,
}

/// A single grant inside an `AccessControlPolicy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    /// Who the permission is granted to.
    pub grantee: Grantee,
    /// The granted permission, e.g. `FULL_CONTROL`.
    pub permission: String,
}

/// Bucket access level. Only two levels exist: private buckets require a
/// signed request for every operation, public-read buckets additionally
/// permit anonymous GET/HEAD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BucketAcl {
    /// Signed requests only.
    #[default]
    Private,
    /// Anonymous reads permitted.
    PublicRead,
}

impl BucketAcl {
    /// Canonical string form as stored and as used in `x-amz-acl`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::PublicRead => "public-read",
        }
    }

    /// Parse from the stored/header string form. Unknown values fall back to
    /// private.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "public-read" => Self::PublicRead,
            _ => Self::Private,
        }
    }
}

impl std::fmt::Display for BucketAcl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-supplied object metadata: the `x-amz-meta-*` header map.
///
/// Stored schema-lessly as JSON text in the metadata store and restored onto
/// GET/HEAD responses verbatim.
pub type UserMetadata = HashMap<String, String>;
