//! The hyper `Service` implementation for the S3 surface.
//!
//! Request lifecycle:
//!
//! 1. Health probes (`HEAD /`, `GET /health`) answered directly
//! 2. CORS preflight (`OPTIONS`) answered from configuration
//! 3. Routing to an S3 operation
//! 4. Body buffering for PUT/POST (signature verification needs the bytes,
//!    and handlers re-read them)
//! 5. The auth gate
//! 6. Handler dispatch
//! 7. Common headers on every response

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::Service;
use tinbucket_model::error::S3Error;
use tracing::{debug, error, info};

use crate::auth::authenticate;
use crate::body::S3ResponseBody;
use crate::handlers::TinBucketS3;
use crate::response::{add_common_headers, empty_response, error_to_response, generate_request_id};
use crate::router::resolve_route;

/// The S3 HTTP service.
#[derive(Clone, Debug)]
pub struct S3Service {
    inner: Arc<TinBucketS3>,
}

impl S3Service {
    /// Wrap the provider into a hyper-compatible service.
    #[must_use]
    pub fn new(inner: Arc<TinBucketS3>) -> Self {
        Self { inner }
    }

    /// The wrapped provider.
    #[must_use]
    pub fn provider(&self) -> &Arc<TinBucketS3> {
        &self.inner
    }
}

impl Service<http::Request<Incoming>> for S3Service {
    type Response = http::Response<S3ResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let provider = Arc::clone(&self.inner);

        Box::pin(async move {
            let request_id = generate_request_id();

            let origin = req
                .headers()
                .get(http::header::ORIGIN)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned);
            let allowed_origin = provider.config().allowed_origin(origin.as_deref());

            let response = process_request(req, provider.as_ref(), &request_id).await;
            Ok(add_common_headers(
                response,
                &request_id,
                allowed_origin.as_deref(),
            ))
        })
    }
}

/// Run one request through the S3 pipeline.
async fn process_request(
    req: http::Request<Incoming>,
    provider: &TinBucketS3,
    request_id: &str,
) -> http::Response<S3ResponseBody> {
    let method = req.method().clone();
    let uri = req.uri().clone();
    debug!(%method, %uri, request_id, "processing S3 request");

    // Health probes.
    if method == Method::HEAD && uri.path() == "/" {
        return empty_response(http::StatusCode::OK)
            .unwrap_or_else(|err| error_to_response(&err, request_id));
    }
    if method == Method::GET && uri.path() == "/health" {
        return health_response();
    }

    // CORS preflight. The Allow-Origin header is stamped with the common
    // headers after the pipeline.
    if method == Method::OPTIONS {
        return preflight_response();
    }

    // Route.
    let ctx = match resolve_route(&req) {
        Ok(ctx) => ctx,
        Err(err) => {
            debug!(%method, %uri, error = %err, request_id, "failed to route S3 request");
            return error_to_response(&err, request_id);
        }
    };

    // Buffer the body for PUT/POST; other methods are treated as empty so
    // signature verification and handlers share the same bytes.
    let (parts, incoming) = req.into_parts();
    let body = if matches!(parts.method, Method::PUT | Method::POST) {
        match incoming.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                error!(error = %err, request_id, "failed to read request body");
                let s3_err = S3Error::internal_error("failed to read request body");
                return error_to_response(&s3_err, request_id);
            }
        }
    } else {
        Bytes::new()
    };

    // Auth gate.
    let principal = match authenticate(&parts, &body, &ctx, provider.meta()).await {
        Ok(principal) => principal,
        Err(err) => {
            debug!(
                %method, %uri, code = %err.code, request_id,
                "request failed authentication"
            );
            return error_to_response(&err, request_id);
        }
    };

    info!(
        operation = %ctx.operation,
        bucket = ?ctx.bucket,
        key = ?ctx.key,
        caller = principal.access_key_id(),
        request_id,
        "handling S3 request"
    );

    // Dispatch.
    match provider.handle_operation(&parts, body, &ctx, &principal).await {
        Ok(response) => response,
        Err(err) => {
            debug!(code = %err.code, request_id, "S3 operation returned error");
            error_to_response(&err, request_id)
        }
    }
}

/// The JSON health document for orchestration probes.
fn health_response() -> http::Response<S3ResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(S3ResponseBody::from_string(
            r#"{"status":"running","service":"s3"}"#,
        ))
        .expect("static health response should be valid")
}

/// Answer a CORS preflight with the supported methods and headers.
fn preflight_response() -> http::Response<S3ResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, HEAD, OPTIONS",
        )
        .header(
            "Access-Control-Allow-Headers",
            "Authorization, Content-Type, Content-MD5, x-amz-content-sha256, x-amz-date, x-amz-acl, x-amz-copy-source, x-amz-meta-*",
        )
        .header("Access-Control-Max-Age", "86400")
        .body(S3ResponseBody::empty())
        .expect("static preflight response should be valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_produce_health_json() {
        let resp = health_response();
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get("Content-Type")
                .and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
    }

    #[test]
    fn test_should_produce_preflight_response() {
        let resp = preflight_response();
        assert_eq!(resp.status(), http::StatusCode::OK);
        let methods = resp
            .headers()
            .get("Access-Control-Allow-Methods")
            .and_then(|v| v.to_str().ok())
            .expect("methods header");
        assert!(methods.contains("PUT"));
        assert!(methods.contains("HEAD"));
    }
}
