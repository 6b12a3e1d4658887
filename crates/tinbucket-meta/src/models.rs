//! Row types for the metadata tables.
//!
//! They map to database tables via `sqlx::FromRow` and serialize to JSON for
//! the admin surface. Timestamps are UTC; identifiers are UUIDs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A credential pair clients sign requests with.
///
/// The secret is returned to the admin exactly once, on creation; afterwards
/// it only ever feeds signature verification.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct AccessKey {
    /// Internal UUID.
    pub id: Uuid,

    /// The public access key ID (`AK...`, 20 characters).
    pub access_key_id: String,

    /// The secret key material.
    #[serde(skip_serializing)]
    pub secret_access_key: String,

    /// Human-readable label shown in the admin UI.
    pub display_name: String,

    /// Disabled keys fail every signature check.
    pub is_active: bool,

    /// When the key was created.
    pub created_at: DateTime<Utc>,

    /// When the key was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A storage bucket: a namespace for objects.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Bucket {
    /// Internal UUID.
    pub id: Uuid,

    /// Globally unique bucket name.
    pub name: String,

    /// The access key that owns this bucket.
    pub owner_id: Uuid,

    /// Region reported by GetBucketLocation.
    pub region: String,

    /// Access level: `private` or `public-read`.
    pub acl: String,

    /// Size cap in bytes; 0 means unlimited.
    pub max_size: i64,

    /// When the bucket was created.
    pub created_at: DateTime<Utc>,
}

/// An object row. The payload lives on disk; `storage_path` records the
/// bucket-relative handle for observability, while readers always derive the
/// real path from `(bucket, key)`.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct ObjectRecord {
    /// Internal UUID.
    pub id: Uuid,

    /// The owning bucket.
    pub bucket_id: Uuid,

    /// Object key, `/`-separated.
    pub key: String,

    /// Size in bytes.
    pub size: i64,

    /// Quoted hex MD5 (single-part) or composite ETag (multipart).
    pub etag: String,

    /// MIME type.
    pub content_type: String,

    /// Bucket-relative storage handle.
    pub storage_path: String,

    /// `x-amz-meta-*` headers, serialized as a JSON object.
    pub metadata: String,

    /// When the object content was last written.
    pub last_modified: DateTime<Utc>,

    /// When the row was first created.
    pub created_at: DateTime<Utc>,
}

impl ObjectRecord {
    /// Deserialize the user-metadata JSON blob. Malformed blobs (which can
    /// only come from manual database edits) read as empty.
    #[must_use]
    pub fn user_metadata(&self) -> std::collections::HashMap<String, String> {
        serde_json::from_str(&self.metadata).unwrap_or_default()
    }
}

/// An in-progress multipart upload.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct MultipartUpload {
    /// Internal UUID.
    pub id: Uuid,

    /// The upload ID handed to the client (128-bit random, hex).
    pub upload_id: String,

    /// The destination bucket.
    pub bucket_id: Uuid,

    /// The destination key.
    pub key: String,

    /// Content type captured at initiation.
    pub content_type: String,

    /// `x-amz-meta-*` headers captured at initiation, as JSON.
    pub metadata: String,

    /// When the upload was initiated.
    pub initiated_at: DateTime<Utc>,
}

/// A staged part of a multipart upload.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct MultipartPart {
    /// Internal UUID.
    pub id: Uuid,

    /// The owning upload's `upload_id`.
    pub upload_id: String,

    /// Part number, 1 through 10000.
    pub part_number: i64,

    /// Part size in bytes.
    pub size: i64,

    /// Quoted hex MD5 of the part body.
    pub etag: String,

    /// Staging-relative storage handle.
    pub storage_path: String,

    /// When the part was uploaded (or last overwritten).
    pub created_at: DateTime<Utc>,
}
