//! Object-level operation handlers.

use bytes::Bytes;
use chrono::Utc;
use tinbucket_auth::etag::compute_md5;
use tinbucket_model::error::S3Error;
use tinbucket_model::output::{CopyObjectResult, DeleteResult};
use tinbucket_model::types::{Delete, DeleteErrorEntry, DeletedObject};
use tinbucket_model::validation::validate_object_key;
use tinbucket_xml::{from_xml, to_xml};
use tracing::{info, warn};

use super::{TinBucketS3, meta_error_to_s3, store_error_to_s3};
use crate::body::S3ResponseBody;
use crate::request::{collect_metadata, content_type_or_default, header_str, parse_copy_source, parse_range};
use crate::response::{
    build_response, empty_response, http_date, quote_etag, set_metadata_headers, xml_response,
};
use crate::router::RoutingContext;

impl TinBucketS3 {
    /// PutObject: write bytes, then upsert the row.
    ///
    /// The filesystem write completes before the metadata upsert, so a
    /// concurrent reader observes either the old row with the old bytes or
    /// the new row with the new bytes.
    pub(crate) async fn put_object(
        &self,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
        body: &Bytes,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket_name = self.require_bucket_name(ctx)?;
        let key = self.require_key(ctx)?;
        validate_object_key(key)?;

        let bucket = self.fetch_bucket(bucket_name).await?;
        if bucket.max_size > 0 && body.len() as i64 > bucket.max_size {
            return Err(S3Error::new(tinbucket_model::S3ErrorCode::EntityTooLarge));
        }

        let etag = compute_md5(body);
        let content_type = content_type_or_default(parts);
        let metadata = collect_metadata(parts);
        let metadata_json = serde_json::to_string(&metadata)
            .map_err(|e| S3Error::internal_error("metadata serialization failed").with_source(e))?;

        let size = self
            .store
            .write_object(bucket_name, key, body)
            .await
            .map_err(store_error_to_s3)?;

        self.meta
            .upsert_object(
                bucket.id,
                key,
                i64::try_from(size).unwrap_or(i64::MAX),
                &etag,
                &content_type,
                &format!("{bucket_name}/{key}"),
                &metadata_json,
            )
            .await
            .map_err(meta_error_to_s3)?;

        info!(bucket = %bucket_name, key = %key, size, "put object");

        let builder = http::Response::builder()
            .status(http::StatusCode::OK)
            .header("ETag", quote_etag(&etag));
        build_response(builder, S3ResponseBody::empty())
    }

    /// GetObject / HeadObject: shared lookup and headers; GET additionally
    /// streams the body and honors `Range`.
    pub(crate) async fn get_object(
        &self,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
        with_body: bool,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket_name = self.require_bucket_name(ctx)?;
        let key = self.require_key(ctx)?;

        let bucket = self.fetch_bucket(bucket_name).await?;
        let record = self
            .meta
            .get_object(bucket.id, key)
            .await
            .map_err(meta_error_to_s3)?
            .ok_or_else(|| S3Error::no_such_key(key))?;

        let size = u64::try_from(record.size).unwrap_or(0);
        let range = match header_str(parts, "range") {
            Some(header) => Some(parse_range(&header, size)?),
            None => None,
        };

        let mut builder = http::Response::builder()
            .header("Content-Type", &record.content_type)
            .header("ETag", quote_etag(&record.etag))
            .header("Last-Modified", http_date(&record.last_modified))
            .header("Accept-Ranges", "bytes");
        builder = set_metadata_headers(builder, &record.user_metadata());

        let (status, content_length) = match range {
            Some((start, end)) => {
                builder = builder.header("Content-Range", format!("bytes {start}-{end}/{size}"));
                (http::StatusCode::PARTIAL_CONTENT, end - start + 1)
            }
            None => (http::StatusCode::OK, size),
        };
        builder = builder
            .status(status)
            .header("Content-Length", content_length);

        // Folder markers have no file body.
        if !with_body || (record.key.ends_with('/') && record.size == 0) {
            return build_response(builder, S3ResponseBody::empty());
        }

        let reader = self
            .store
            .open_object(bucket_name, key, range)
            .await
            .map_err(store_error_to_s3)?;

        build_response(builder, S3ResponseBody::from_file(reader.file, reader.len))
    }

    /// DeleteObject: idempotent; 204 whether or not the object existed.
    pub(crate) async fn delete_object(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket_name = self.require_bucket_name(ctx)?;
        let key = self.require_key(ctx)?;
        let bucket = self.fetch_bucket(bucket_name).await?;

        self.remove_object(bucket.id, bucket_name, key).await?;
        empty_response(http::StatusCode::NO_CONTENT)
    }

    /// DeleteObjects: the batch `?delete` POST.
    pub(crate) async fn delete_objects(
        &self,
        ctx: &RoutingContext,
        body: &Bytes,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket_name = self.require_bucket_name(ctx)?;
        let bucket = self.fetch_bucket(bucket_name).await?;

        let request: Delete = from_xml(body)
            .map_err(|e| S3Error::invalid_argument(format!("malformed Delete body: {e}")))?;

        let mut result = DeleteResult::default();
        for object in request.objects {
            match self.remove_object(bucket.id, bucket_name, &object.key).await {
                Ok(()) => {
                    if !request.quiet {
                        result.deleted.push(DeletedObject { key: object.key });
                    }
                }
                Err(err) => {
                    warn!(bucket = %bucket_name, key = %object.key, error = %err, "batch delete entry failed");
                    result.errors.push(DeleteErrorEntry {
                        key: object.key,
                        code: "InternalError".to_owned(),
                        message: err.message.clone(),
                    });
                }
            }
        }

        info!(
            bucket = %bucket_name,
            deleted = result.deleted.len(),
            failed = result.errors.len(),
            "batch delete"
        );
        xml_response(http::StatusCode::OK, to_xml("DeleteResult", &result)?)
    }

    /// CopyObject: triggered by `x-amz-copy-source` on PUT.
    pub(crate) async fn copy_object(
        &self,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let dst_bucket_name = self.require_bucket_name(ctx)?;
        let dst_key = self.require_key(ctx)?;
        validate_object_key(dst_key)?;

        let source = header_str(parts, "x-amz-copy-source")
            .ok_or_else(|| S3Error::invalid_argument("missing x-amz-copy-source header"))?;
        let (src_bucket_name, src_key) = parse_copy_source(&source)?;

        let src_bucket = self.fetch_bucket(&src_bucket_name).await?;
        let src_record = self
            .meta
            .get_object(src_bucket.id, &src_key)
            .await
            .map_err(meta_error_to_s3)?
            .ok_or_else(|| S3Error::no_such_key(&src_key))?;
        let dst_bucket = self.fetch_bucket(dst_bucket_name).await?;

        self.store
            .copy_object(&src_bucket_name, &src_key, dst_bucket_name, dst_key)
            .await
            .map_err(store_error_to_s3)?;

        let record = self
            .meta
            .upsert_object(
                dst_bucket.id,
                dst_key,
                src_record.size,
                &src_record.etag,
                &src_record.content_type,
                &format!("{dst_bucket_name}/{dst_key}"),
                &src_record.metadata,
            )
            .await
            .map_err(meta_error_to_s3)?;

        info!(
            src_bucket = %src_bucket_name,
            src_key = %src_key,
            dst_bucket = %dst_bucket_name,
            dst_key = %dst_key,
            "copied object"
        );

        let doc = CopyObjectResult {
            etag: quote_etag(&record.etag),
            last_modified: Utc::now(),
        };
        xml_response(http::StatusCode::OK, to_xml("CopyObjectResult", &doc)?)
    }

    /// Remove one object's bytes and row. A missing row is not an error.
    async fn remove_object(
        &self,
        bucket_id: uuid::Uuid,
        bucket_name: &str,
        key: &str,
    ) -> Result<(), S3Error> {
        let existed = self
            .meta
            .get_object(bucket_id, key)
            .await
            .map_err(meta_error_to_s3)?
            .is_some();

        if existed {
            self.store
                .delete_object(bucket_name, key)
                .await
                .map_err(store_error_to_s3)?;
            self.meta
                .delete_object(bucket_id, key)
                .await
                .map_err(meta_error_to_s3)?;
        }

        Ok(())
    }
}
