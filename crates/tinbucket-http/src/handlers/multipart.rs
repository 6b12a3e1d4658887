//! Multipart upload operation handlers.
//!
//! State lives in two tables (`multipart_uploads`, `multipart_parts`) plus
//! staged part files under `D/.multipart/<upload_id>/`. Transitions:
//!
//! - Create inserts the upload row.
//! - UploadPart stages bytes and upserts the part row; retries and
//!   out-of-order uploads are fine.
//! - Complete validates the client's declared parts, assembles ascending,
//!   and commits the object row while destroying upload state in one
//!   transaction.
//! - Abort destroys staged bytes and rows; it is idempotent.

use bytes::Bytes;
use tinbucket_auth::etag::{compute_md5, compute_multipart_etag};
use tinbucket_meta::MultipartUpload;
use tinbucket_model::error::S3Error;
use tinbucket_model::output::{
    CompleteMultipartUploadResult, InitiateMultipartUploadResult, ListPartsResult,
};
use tinbucket_model::types::{CompletedMultipartUpload, Part};
use tinbucket_model::validation::validate_object_key;
use tinbucket_xml::{from_xml, to_xml};
use tracing::info;

use super::{TinBucketS3, meta_error_to_s3, store_error_to_s3};
use crate::body::S3ResponseBody;
use crate::request::{collect_metadata, content_type_or_default, query_param};
use crate::response::{build_response, empty_response, quote_etag, xml_response};
use crate::router::RoutingContext;

/// Part numbers accepted by UploadPart.
const PART_NUMBER_RANGE: std::ops::RangeInclusive<i64> = 1..=10_000;

impl TinBucketS3 {
    /// CreateMultipartUpload: mint an upload ID and capture content type and
    /// user metadata for the eventual object.
    pub(crate) async fn create_multipart_upload(
        &self,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket_name = self.require_bucket_name(ctx)?;
        let key = self.require_key(ctx)?;
        validate_object_key(key)?;
        let bucket = self.fetch_bucket(bucket_name).await?;

        let content_type = content_type_or_default(parts);
        let metadata = collect_metadata(parts);
        let metadata_json = serde_json::to_string(&metadata)
            .map_err(|e| S3Error::internal_error("metadata serialization failed").with_source(e))?;

        let upload = self
            .meta
            .create_upload(bucket.id, key, &content_type, &metadata_json)
            .await
            .map_err(meta_error_to_s3)?;

        info!(
            bucket = %bucket_name,
            key = %key,
            upload_id = %upload.upload_id,
            "initiated multipart upload"
        );

        let doc = InitiateMultipartUploadResult {
            bucket: bucket_name.to_owned(),
            key: key.to_owned(),
            upload_id: upload.upload_id,
        };
        xml_response(
            http::StatusCode::OK,
            to_xml("InitiateMultipartUploadResult", &doc)?,
        )
    }

    /// UploadPart: stage the bytes and upsert the part row.
    pub(crate) async fn upload_part(
        &self,
        ctx: &RoutingContext,
        body: &Bytes,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let upload = self.require_upload(ctx).await?;

        let part_number: i64 = query_param(&ctx.query_params, "partNumber")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| S3Error::invalid_argument("partNumber must be an integer"))?;
        if !PART_NUMBER_RANGE.contains(&part_number) {
            return Err(S3Error::invalid_argument(
                "part number must be between 1 and 10000",
            ));
        }

        let etag = compute_md5(body);
        let size = self
            .store
            .write_part(&upload.upload_id, part_number, body)
            .await
            .map_err(store_error_to_s3)?;

        self.meta
            .upsert_part(
                &upload.upload_id,
                part_number,
                i64::try_from(size).unwrap_or(i64::MAX),
                &etag,
                &format!("part-{part_number}"),
            )
            .await
            .map_err(meta_error_to_s3)?;

        info!(
            upload_id = %upload.upload_id,
            part_number,
            size,
            "staged part"
        );

        let builder = http::Response::builder()
            .status(http::StatusCode::OK)
            .header("ETag", quote_etag(&etag));
        build_response(builder, S3ResponseBody::empty())
    }

    /// ListParts: the staged parts sorted by part number.
    pub(crate) async fn list_parts(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket_name = self.require_bucket_name(ctx)?;
        let upload = self.require_upload(ctx).await?;

        let parts = self
            .meta
            .list_parts(&upload.upload_id)
            .await
            .map_err(meta_error_to_s3)?;

        let doc = ListPartsResult {
            bucket: bucket_name.to_owned(),
            key: upload.key.clone(),
            upload_id: upload.upload_id.clone(),
            storage_class: "STANDARD".to_owned(),
            parts: parts
                .into_iter()
                .map(|p| Part {
                    part_number: i32::try_from(p.part_number).unwrap_or(0),
                    last_modified: p.created_at,
                    etag: quote_etag(&p.etag),
                    size: p.size,
                })
                .collect(),
        };
        xml_response(http::StatusCode::OK, to_xml("ListPartsResult", &doc)?)
    }

    /// CompleteMultipartUpload: validate the declared parts, assemble, and
    /// commit.
    pub(crate) async fn complete_multipart_upload(
        &self,
        ctx: &RoutingContext,
        body: &Bytes,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket_name = self.require_bucket_name(ctx)?;
        let upload = self.require_upload(ctx).await?;

        let request: CompletedMultipartUpload = from_xml(body).map_err(|e| {
            S3Error::invalid_argument(format!("malformed CompleteMultipartUpload body: {e}"))
        })?;
        if request.parts.is_empty() {
            return Err(S3Error::invalid_argument(
                "CompleteMultipartUpload must declare at least one part",
            ));
        }

        let staged = self
            .meta
            .list_parts(&upload.upload_id)
            .await
            .map_err(meta_error_to_s3)?;

        // Validate the declared sequence: every part staged, numbers
        // strictly ascending.
        let mut part_numbers = Vec::with_capacity(request.parts.len());
        let mut part_etags = Vec::with_capacity(request.parts.len());
        let mut total_size: i64 = 0;
        let mut previous: Option<i64> = None;

        for declared in &request.parts {
            let number = i64::from(
                declared
                    .part_number
                    .ok_or_else(|| S3Error::invalid_argument("part is missing PartNumber"))?,
            );

            if previous.is_some_and(|prev| number <= prev) {
                return Err(S3Error::invalid_part_order());
            }
            previous = Some(number);

            let staged_part = staged
                .iter()
                .find(|p| p.part_number == number)
                .ok_or_else(|| {
                    S3Error::invalid_argument(format!("part {number} was never uploaded"))
                })?;

            part_numbers.push(number);
            part_etags.push(staged_part.etag.clone());
            total_size += staged_part.size;
        }

        let assembled_size = self
            .store
            .assemble_parts(&upload.upload_id, &part_numbers, bucket_name, &upload.key)
            .await
            .map_err(store_error_to_s3)?;
        debug_assert_eq!(assembled_size as i64, total_size);

        let etag = compute_multipart_etag(&part_etags);
        let etag_stored = etag.trim_matches('"');

        let record = self
            .meta
            .complete_upload(
                &upload,
                total_size,
                etag_stored,
                &format!("{bucket_name}/{}", upload.key),
            )
            .await
            .map_err(meta_error_to_s3)?;

        info!(
            bucket = %bucket_name,
            key = %record.key,
            upload_id = %upload.upload_id,
            parts = part_numbers.len(),
            size = total_size,
            "completed multipart upload"
        );

        let doc = CompleteMultipartUploadResult {
            location: format!("/{bucket_name}/{}", record.key),
            bucket: bucket_name.to_owned(),
            key: record.key,
            etag,
        };
        xml_response(
            http::StatusCode::OK,
            to_xml("CompleteMultipartUploadResult", &doc)?,
        )
    }

    /// AbortMultipartUpload: destroy staged bytes and rows. Idempotent; a
    /// repeated abort of the same upload ID still answers 204.
    pub(crate) async fn abort_multipart_upload(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let upload_id = query_param(&ctx.query_params, "uploadId")
            .ok_or_else(|| S3Error::invalid_argument("uploadId is required"))?
            .to_owned();

        self.store
            .purge_staging(&upload_id)
            .await
            .map_err(store_error_to_s3)?;
        let existed = self
            .meta
            .delete_upload(&upload_id)
            .await
            .map_err(meta_error_to_s3)?;

        info!(upload_id = %upload_id, existed, "aborted multipart upload");
        empty_response(http::StatusCode::NO_CONTENT)
    }

    /// Resolve the `uploadId` query parameter to its upload row.
    async fn require_upload(&self, ctx: &RoutingContext) -> Result<MultipartUpload, S3Error> {
        let upload_id = query_param(&ctx.query_params, "uploadId")
            .ok_or_else(|| S3Error::invalid_argument("uploadId is required"))?;

        self.meta
            .get_upload(upload_id)
            .await
            .map_err(meta_error_to_s3)?
            .ok_or_else(|| S3Error::no_such_upload(upload_id))
    }
}
