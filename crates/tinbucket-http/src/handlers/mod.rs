//! S3 operation handlers.
//!
//! [`TinBucketS3`] owns the metadata store and the filesystem store and
//! dispatches each routed operation to its handler. Handlers stay thin:
//! validate, consult the metadata store, move bytes through the filesystem
//! store, render XML.

mod bucket;
mod multipart;
mod object;

use bytes::Bytes;
use tinbucket_meta::{Bucket, MetaError, MetaStore};
use tinbucket_model::error::S3Error;
use tinbucket_model::operations::S3Operation;
use tinbucket_store::{FsStore, StoreError};
use tracing::debug;

use crate::auth::Principal;
use crate::body::S3ResponseBody;
use crate::router::RoutingContext;

/// Service-level configuration the handlers need.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Region reported for new buckets and GetBucketLocation.
    pub region: String,
    /// Allowed CORS origins; `None` allows any origin.
    pub cors_origins: Option<Vec<String>>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_owned(),
            cors_origins: None,
        }
    }
}

impl ServiceConfig {
    /// Resolve the `Access-Control-Allow-Origin` value for a request origin.
    ///
    /// With no configured origins every caller gets `*`; otherwise the
    /// request origin is echoed back only when it is on the list.
    #[must_use]
    pub fn allowed_origin(&self, request_origin: Option<&str>) -> Option<String> {
        match &self.cors_origins {
            None => Some("*".to_owned()),
            Some(origins) => request_origin
                .filter(|origin| origins.iter().any(|allowed| allowed == origin))
                .map(ToOwned::to_owned),
        }
    }
}

/// The S3 business logic provider.
#[derive(Clone, Debug)]
pub struct TinBucketS3 {
    pub(crate) meta: MetaStore,
    pub(crate) store: FsStore,
    pub(crate) config: ServiceConfig,
}

impl TinBucketS3 {
    /// Create the provider from its two stores and the service config.
    #[must_use]
    pub fn new(meta: MetaStore, store: FsStore, config: ServiceConfig) -> Self {
        Self {
            meta,
            store,
            config,
        }
    }

    /// The service configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The metadata store.
    #[must_use]
    pub fn meta(&self) -> &MetaStore {
        &self.meta
    }

    /// The filesystem store.
    #[must_use]
    pub fn store(&self) -> &FsStore {
        &self.store
    }

    /// Dispatch a routed, authenticated operation to its handler.
    ///
    /// # Errors
    ///
    /// Returns the `S3Error` the failing handler produced; the service layer
    /// renders it into the XML error response.
    pub async fn handle_operation(
        &self,
        parts: &http::request::Parts,
        body: Bytes,
        ctx: &RoutingContext,
        principal: &Principal,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        debug!(
            operation = %ctx.operation,
            bucket = ?ctx.bucket,
            key = ?ctx.key,
            "dispatching S3 operation"
        );

        match ctx.operation {
            S3Operation::ListBuckets => self.list_buckets(principal).await,
            S3Operation::CreateBucket => self.create_bucket(parts, ctx, principal).await,
            S3Operation::HeadBucket => self.head_bucket(ctx).await,
            S3Operation::DeleteBucket => self.delete_bucket(ctx).await,
            S3Operation::GetBucketLocation => self.get_bucket_location(ctx).await,
            S3Operation::GetBucketVersioning => self.get_bucket_versioning(ctx).await,
            S3Operation::GetBucketAcl => self.get_bucket_acl(ctx).await,
            S3Operation::ListObjects => self.list_objects(ctx, false).await,
            S3Operation::ListObjectsV2 => self.list_objects(ctx, true).await,
            S3Operation::DeleteObjects => self.delete_objects(ctx, &body).await,
            S3Operation::PutObject => self.put_object(parts, ctx, &body).await,
            S3Operation::GetObject => self.get_object(parts, ctx, true).await,
            S3Operation::HeadObject => self.get_object(parts, ctx, false).await,
            S3Operation::DeleteObject => self.delete_object(ctx).await,
            S3Operation::CopyObject => self.copy_object(parts, ctx).await,
            S3Operation::CreateMultipartUpload => {
                self.create_multipart_upload(parts, ctx).await
            }
            S3Operation::UploadPart => self.upload_part(ctx, &body).await,
            S3Operation::CompleteMultipartUpload => {
                self.complete_multipart_upload(ctx, &body).await
            }
            S3Operation::AbortMultipartUpload => self.abort_multipart_upload(ctx).await,
            S3Operation::ListParts => self.list_parts(ctx).await,
        }
    }

    // -----------------------------------------------------------------------
    // Shared lookups
    // -----------------------------------------------------------------------

    /// The bucket name from the routing context.
    pub(crate) fn require_bucket_name<'a>(&self, ctx: &'a RoutingContext) -> Result<&'a str, S3Error> {
        ctx.bucket
            .as_deref()
            .ok_or_else(|| S3Error::invalid_argument("bucket name is required"))
    }

    /// The object key from the routing context.
    pub(crate) fn require_key<'a>(&self, ctx: &'a RoutingContext) -> Result<&'a str, S3Error> {
        ctx.key
            .as_deref()
            .ok_or_else(|| S3Error::invalid_argument("object key is required"))
    }

    /// Fetch a bucket row or fail with NoSuchBucket.
    pub(crate) async fn fetch_bucket(&self, name: &str) -> Result<Bucket, S3Error> {
        self.meta
            .get_bucket(name)
            .await
            .map_err(meta_error_to_s3)?
            .ok_or_else(|| S3Error::no_such_bucket(name))
    }
}

/// Map a metadata store failure to its S3 wire error.
pub(crate) fn meta_error_to_s3(err: MetaError) -> S3Error {
    match err {
        MetaError::BucketNotFound(name) => S3Error::no_such_bucket(name),
        MetaError::BucketAlreadyExists(name) => S3Error::bucket_already_exists(name),
        MetaError::ObjectNotFound { key, .. } => S3Error::no_such_key(key),
        MetaError::UploadNotFound(id) => S3Error::no_such_upload(id),
        MetaError::AccessKeyNotFound(_) => S3Error::access_denied(),
        err @ MetaError::NoSurvivingKey(_) => {
            S3Error::internal_error("cannot reassign bucket ownership").with_source(err)
        }
        MetaError::Sqlx(err) => S3Error::internal_error("metadata store failure").with_source(err),
    }
}

/// Map a filesystem store failure to its S3 wire error.
pub(crate) fn store_error_to_s3(err: StoreError) -> S3Error {
    match err {
        StoreError::NotFound { key, .. } => S3Error::no_such_key(key),
        StoreError::PartNotFound { part_number, .. } => S3Error::invalid_argument(format!(
            "part {part_number} was not uploaded for this multipart upload"
        )),
        // Keys that escape the storage root are refused outright.
        err @ StoreError::PathEscapes(_) => {
            S3Error::internal_error("storage path rejected").with_source(err)
        }
        StoreError::Io(err) => S3Error::internal_error("storage failure").with_source(err),
    }
}
