//! Bucket-level operation handlers.

use tinbucket_model::error::S3Error;
use tinbucket_model::output::{
    AccessControlPolicy, ListAllMyBucketsResult, ListBucketResult, ListBucketResultV2,
    LocationConstraint, VersioningConfiguration,
};
use tinbucket_model::types::{
    BucketAcl, BucketEntry, CommonPrefix, Grant, Grantee, ObjectEntry, Owner,
};
use tinbucket_model::validation::validate_bucket_name;
use tinbucket_xml::to_xml;
use tracing::info;

use super::{TinBucketS3, meta_error_to_s3, store_error_to_s3};
use crate::auth::Principal;
use crate::body::S3ResponseBody;
use crate::request::{header_str, query_param};
use crate::response::{build_response, empty_response, quote_etag, xml_response};
use crate::router::RoutingContext;

/// Default and maximum page size for listings.
const MAX_KEYS_CEILING: i64 = 1000;

impl TinBucketS3 {
    /// ListBuckets: every bucket in the store, with the caller as Owner.
    pub(crate) async fn list_buckets(
        &self,
        principal: &Principal,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let buckets = self.meta.list_buckets().await.map_err(meta_error_to_s3)?;

        let doc = ListAllMyBucketsResult {
            owner: Owner::from_id(principal.access_key_id()),
            buckets: buckets
                .into_iter()
                .map(|b| BucketEntry {
                    name: b.name,
                    creation_date: b.created_at,
                })
                .collect(),
        };

        xml_response(http::StatusCode::OK, to_xml("ListAllMyBucketsResult", &doc)?)
    }

    /// CreateBucket: validate the name, insert the row, create the directory.
    pub(crate) async fn create_bucket(
        &self,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
        principal: &Principal,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let name = self.require_bucket_name(ctx)?;
        validate_bucket_name(name)?;

        let Principal::Key { id: owner_id, .. } = principal else {
            return Err(S3Error::access_denied());
        };

        let acl = header_str(parts, "x-amz-acl")
            .map(|v| BucketAcl::parse(&v))
            .unwrap_or_default();

        let bucket = self
            .meta
            .insert_bucket(name, *owner_id, &self.config.region, acl.as_str(), 0)
            .await
            .map_err(meta_error_to_s3)?;

        self.store
            .create_bucket_dir(&bucket.name)
            .await
            .map_err(store_error_to_s3)?;

        info!(bucket = %bucket.name, acl = %acl, "created bucket");

        let builder = http::Response::builder()
            .status(http::StatusCode::OK)
            .header("Location", format!("/{name}"));
        build_response(builder, S3ResponseBody::empty())
    }

    /// HeadBucket: 200 if the bucket exists, NoSuchBucket otherwise.
    pub(crate) async fn head_bucket(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let name = self.require_bucket_name(ctx)?;
        self.fetch_bucket(name).await?;
        empty_response(http::StatusCode::OK)
    }

    /// DeleteBucket: requires the bucket to be empty, then removes the row
    /// and the directory tree.
    pub(crate) async fn delete_bucket(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let name = self.require_bucket_name(ctx)?;
        let bucket = self.fetch_bucket(name).await?;

        let objects = self
            .meta
            .count_objects(bucket.id)
            .await
            .map_err(meta_error_to_s3)?;
        if objects > 0 {
            return Err(S3Error::bucket_not_empty(name));
        }

        self.meta.delete_bucket(name).await.map_err(meta_error_to_s3)?;
        self.store
            .remove_bucket_dir(name)
            .await
            .map_err(store_error_to_s3)?;

        info!(bucket = %name, "deleted bucket");
        empty_response(http::StatusCode::NO_CONTENT)
    }

    /// GetBucketLocation: the bucket's region.
    pub(crate) async fn get_bucket_location(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let name = self.require_bucket_name(ctx)?;
        let bucket = self.fetch_bucket(name).await?;

        let doc = LocationConstraint {
            region: bucket.region,
        };
        xml_response(http::StatusCode::OK, to_xml("LocationConstraint", &doc)?)
    }

    /// GetBucketVersioning: always the empty (unset) configuration.
    pub(crate) async fn get_bucket_versioning(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let name = self.require_bucket_name(ctx)?;
        self.fetch_bucket(name).await?;

        xml_response(
            http::StatusCode::OK,
            to_xml("VersioningConfiguration", &VersioningConfiguration)?,
        )
    }

    /// GetBucketAcl: FULL_CONTROL for the owning access key.
    pub(crate) async fn get_bucket_acl(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let name = self.require_bucket_name(ctx)?;
        let bucket = self.fetch_bucket(name).await?;

        let owner_key = self
            .meta
            .get_access_key_by_id(bucket.owner_id)
            .await
            .map_err(meta_error_to_s3)?;
        let owner_id = owner_key
            .map(|k| k.access_key_id)
            .unwrap_or_else(|| bucket.owner_id.to_string());

        let doc = AccessControlPolicy {
            owner: Owner::from_id(owner_id.clone()),
            grants: vec![Grant {
                grantee: Grantee {
                    id: owner_id.clone(),
                    display_name: Some(owner_id),
                },
                permission: "FULL_CONTROL".to_owned(),
            }],
        };
        xml_response(http::StatusCode::OK, to_xml("AccessControlPolicy", &doc)?)
    }

    /// ListObjects / ListObjectsV2 over the shared listing engine.
    ///
    /// The v2 shape is selected by `list-type=2`; both shapes run the same
    /// key-ordered scan with prefix filtering, delimiter grouping, and
    /// `max-keys + 1` truncation detection.
    pub(crate) async fn list_objects(
        &self,
        ctx: &RoutingContext,
        v2: bool,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let name = self.require_bucket_name(ctx)?;
        let bucket = self.fetch_bucket(name).await?;
        let params = &ctx.query_params;

        let prefix = query_param(params, "prefix").unwrap_or("").to_owned();
        let delimiter = query_param(params, "delimiter")
            .filter(|d| !d.is_empty())
            .map(ToOwned::to_owned);
        let max_keys = query_param(params, "max-keys")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(MAX_KEYS_CEILING)
            .clamp(1, MAX_KEYS_CEILING);

        let after = if v2 {
            query_param(params, "continuation-token")
        } else {
            query_param(params, "marker").filter(|m| !m.is_empty())
        };

        let page = self
            .meta
            .list_objects_page(bucket.id, &prefix, after, max_keys)
            .await
            .map_err(meta_error_to_s3)?;

        // The pagination cursor is the last key of the raw page, before
        // delimiter grouping removes entries from Contents.
        let next_token = if page.is_truncated {
            page.objects.last().map(|o| o.key.clone())
        } else {
            None
        };

        let mut contents = Vec::new();
        let mut common_prefixes = std::collections::BTreeSet::new();
        for record in page.objects {
            if let Some(delim) = &delimiter {
                if let Some(grouped) = compute_common_prefix(&record.key, &prefix, delim) {
                    common_prefixes.insert(grouped);
                    continue;
                }
            }
            contents.push(ObjectEntry {
                etag: quote_etag(&record.etag),
                last_modified: record.last_modified,
                size: record.size,
                storage_class: "STANDARD".to_owned(),
                owner: None,
                key: record.key,
            });
        }

        let common_prefixes: Vec<CommonPrefix> = common_prefixes
            .into_iter()
            .map(|prefix| CommonPrefix { prefix })
            .collect();

        let max_keys_i32 = i32::try_from(max_keys).unwrap_or(i32::MAX);
        let xml = if v2 {
            let key_count = i32::try_from(contents.len() + common_prefixes.len()).unwrap_or(0);
            let doc = ListBucketResultV2 {
                name: bucket.name,
                prefix,
                delimiter,
                max_keys: max_keys_i32,
                key_count,
                is_truncated: page.is_truncated,
                continuation_token: after.map(ToOwned::to_owned),
                next_continuation_token: next_token,
                contents,
                common_prefixes,
            };
            to_xml("ListBucketResult", &doc)?
        } else {
            let doc = ListBucketResult {
                name: bucket.name,
                prefix,
                marker: after.unwrap_or("").to_owned(),
                next_marker: next_token,
                max_keys: max_keys_i32,
                delimiter,
                is_truncated: page.is_truncated,
                contents,
                common_prefixes,
            };
            to_xml("ListBucketResult", &doc)?
        };

        xml_response(http::StatusCode::OK, xml)
    }
}

/// Compute the delimiter grouping for one key, if any.
///
/// Strips `prefix`, looks for the first `delimiter` occurrence in the
/// remainder, and returns `prefix + remainder-up-to-and-including-delimiter`.
fn compute_common_prefix(key: &str, prefix: &str, delimiter: &str) -> Option<String> {
    let remainder = key.strip_prefix(prefix)?;
    let idx = remainder.find(delimiter)?;
    Some(format!("{prefix}{}", &remainder[..idx + delimiter.len()]))
}
