//! The per-request auth gate.
//!
//! Runs once per S3 request, after the body is buffered and the route is
//! resolved. Chooses the authentication mode from the request shape:
//!
//! 1. `AWSAccessKeyId` query parameter -> V2 presigned URL
//! 2. `X-Amz-Algorithm` query parameter -> V4 presigned URL
//! 3. `Authorization` header -> V4 header signature
//! 4. Anonymous GET/HEAD against a `public-read` bucket
//! 5. Otherwise -> MissingSecurityHeader
//!
//! Signed paths resolve the access key in the metadata store; unknown or
//! disabled keys fail with AccessDenied before any signature math runs. A
//! failed comparison logs a terse warn line (access key id, method, path)
//! and never the received signature or the secret.

use bytes::Bytes;
use tinbucket_auth::error::AuthError;
use tinbucket_meta::MetaStore;
use tinbucket_model::error::S3Error;
use tinbucket_model::types::BucketAcl;
use tracing::warn;
use uuid::Uuid;

use crate::request::query_has_key;
use crate::router::RoutingContext;

/// The authenticated caller attached to a request.
#[derive(Debug, Clone)]
pub enum Principal {
    /// Unauthenticated read access to a public-read bucket.
    Anonymous,
    /// A verified access key.
    Key {
        /// The key's internal ID (bucket ownership references this).
        id: Uuid,
        /// The public access key ID.
        access_key_id: String,
    },
}

impl Principal {
    /// The access key ID to report in Owner blocks; anonymous callers render
    /// as `anonymous`.
    #[must_use]
    pub fn access_key_id(&self) -> &str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Key { access_key_id, .. } => access_key_id,
        }
    }
}

/// Authenticate a request, producing a [`Principal`] or the S3 error to
/// return.
///
/// # Errors
///
/// - `AccessDenied` for unknown/disabled keys, malformed auth material, and
///   expired presigned URLs.
/// - `SignatureDoesNotMatch` when every signature candidate fails to match.
/// - `MissingSecurityHeader` when no credentials are present and the target
///   bucket does not permit anonymous reads.
pub async fn authenticate(
    parts: &http::request::Parts,
    body: &Bytes,
    ctx: &RoutingContext,
    meta: &MetaStore,
) -> Result<Principal, S3Error> {
    let query = &ctx.query_params;

    if query_has_key(query, "AWSAccessKeyId") {
        return verify_v2_presigned(parts, meta).await;
    }

    if query_has_key(query, "X-Amz-Algorithm") {
        return verify_v4_presigned(parts, meta).await;
    }

    if parts.headers.contains_key(http::header::AUTHORIZATION) {
        return verify_v4_header(parts, body, meta).await;
    }

    // Anonymous access: GET/HEAD on a public-read bucket only.
    if matches!(parts.method, http::Method::GET | http::Method::HEAD)
        && !ctx.operation.is_mutation()
    {
        if let Some(bucket_name) = &ctx.bucket {
            let bucket = meta
                .get_bucket(bucket_name)
                .await
                .map_err(|e| S3Error::internal_error("bucket lookup failed").with_source(e))?;
            if let Some(bucket) = bucket {
                if BucketAcl::parse(&bucket.acl) == BucketAcl::PublicRead {
                    return Ok(Principal::Anonymous);
                }
            }
        }
    }

    Err(S3Error::missing_security_header())
}

/// V2 presigned path: `AWSAccessKeyId` + `Expires` + `Signature`.
async fn verify_v2_presigned(
    parts: &http::request::Parts,
    meta: &MetaStore,
) -> Result<Principal, S3Error> {
    let query = parts.uri.query().unwrap_or("");
    let params =
        tinbucket_auth::sigv2::parse_v2_params(query).map_err(|e| auth_error_to_s3(&e, parts))?;

    let key = lookup_active_key(meta, &params.access_key_id).await?;

    tinbucket_auth::verify_presigned_v2(parts, &key.secret_access_key)
        .map_err(|e| auth_error_to_s3(&e, parts))?;

    Ok(Principal::Key {
        id: key.id,
        access_key_id: key.access_key_id,
    })
}

/// V4 presigned path: `X-Amz-Algorithm` and friends.
async fn verify_v4_presigned(
    parts: &http::request::Parts,
    meta: &MetaStore,
) -> Result<Principal, S3Error> {
    let query = parts.uri.query().unwrap_or("");
    let params = tinbucket_auth::presigned::parse_presigned_params(query)
        .map_err(|e| auth_error_to_s3(&e, parts))?;

    let key = lookup_active_key(meta, &params.access_key_id).await?;

    tinbucket_auth::verify_presigned_v4(parts, &key.secret_access_key)
        .map_err(|e| auth_error_to_s3(&e, parts))?;

    Ok(Principal::Key {
        id: key.id,
        access_key_id: key.access_key_id,
    })
}

/// V4 header path: the `Authorization` header.
async fn verify_v4_header(
    parts: &http::request::Parts,
    body: &Bytes,
    meta: &MetaStore,
) -> Result<Principal, S3Error> {
    let auth_header = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(S3Error::access_denied)?;

    let parsed = tinbucket_auth::sigv4::parse_authorization_header(auth_header)
        .map_err(|e| auth_error_to_s3(&e, parts))?;

    let key = lookup_active_key(meta, &parsed.access_key_id).await?;

    tinbucket_auth::verify_sigv4(parts, body, &key.secret_access_key)
        .map_err(|e| auth_error_to_s3(&e, parts))?;

    Ok(Principal::Key {
        id: key.id,
        access_key_id: key.access_key_id,
    })
}

/// Resolve an access key that exists and is active.
async fn lookup_active_key(
    meta: &MetaStore,
    access_key_id: &str,
) -> Result<tinbucket_meta::AccessKey, S3Error> {
    let key = meta
        .get_access_key(access_key_id)
        .await
        .map_err(|e| S3Error::internal_error("access key lookup failed").with_source(e))?;

    match key {
        Some(key) if key.is_active => Ok(key),
        Some(_) => {
            warn!(access_key_id, "rejected disabled access key");
            Err(S3Error::access_denied())
        }
        None => {
            warn!(access_key_id, "rejected unknown access key");
            Err(S3Error::access_denied())
        }
    }
}

/// Map a verification failure to the wire error, logging mismatches.
fn auth_error_to_s3(err: &AuthError, parts: &http::request::Parts) -> S3Error {
    match err {
        AuthError::SignatureDoesNotMatch => {
            warn!(
                method = %parts.method,
                path = %parts.uri.path(),
                "signature mismatch"
            );
            S3Error::signature_does_not_match()
        }
        AuthError::RequestExpired => S3Error::with_message(
            tinbucket_model::S3ErrorCode::AccessDenied,
            "Request has expired",
        ),
        // Malformed or incomplete auth material.
        _ => S3Error::access_denied(),
    }
}
