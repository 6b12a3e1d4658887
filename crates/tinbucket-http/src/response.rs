//! Response construction helpers.
//!
//! Builds XML and header-only responses, renders [`S3Error`] into the flat
//! `<Error>` document, and stamps the common headers (`x-amz-request-id`,
//! `Server`, CORS) onto every response.

use http::header::HeaderValue;
use tinbucket_model::error::S3Error;
use tinbucket_xml::error_to_xml;
use uuid::Uuid;

use crate::body::S3ResponseBody;

/// Generate a request ID (UUID v4 without dashes).
#[must_use]
pub fn generate_request_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Build an XML response with the given status.
///
/// # Errors
///
/// Returns an `S3Error` if the response cannot be constructed.
pub fn xml_response(
    status: http::StatusCode,
    xml: Vec<u8>,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    build_response(
        http::Response::builder()
            .status(status)
            .header("Content-Type", "application/xml"),
        S3ResponseBody::from_xml(xml),
    )
}

/// Build an empty response with the given status.
///
/// # Errors
///
/// Returns an `S3Error` if the response cannot be constructed.
pub fn empty_response(status: http::StatusCode) -> Result<http::Response<S3ResponseBody>, S3Error> {
    build_response(http::Response::builder().status(status), S3ResponseBody::empty())
}

/// Build a response from a builder, converting build errors to `S3Error`.
///
/// # Errors
///
/// Returns an `S3Error` if a header value was invalid.
pub fn build_response(
    builder: http::response::Builder,
    body: S3ResponseBody,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    builder
        .body(body)
        .map_err(|e| S3Error::internal_error(format!("failed to build HTTP response: {e}")))
}

/// Set an optional header on a response builder if the value is `Some`.
#[must_use]
pub fn set_optional_header(
    builder: http::response::Builder,
    name: &str,
    value: Option<&str>,
) -> http::response::Builder {
    if let Some(v) = value {
        if let Ok(hv) = HeaderValue::from_str(v) {
            return builder.header(name, hv);
        }
    }
    builder
}

/// Set `x-amz-meta-*` headers from a stored metadata map.
#[must_use]
pub fn set_metadata_headers(
    mut builder: http::response::Builder,
    metadata: &std::collections::HashMap<String, String>,
) -> http::response::Builder {
    for (key, value) in metadata {
        let header_name = format!("x-amz-meta-{key}");
        if let Ok(hv) = HeaderValue::from_str(value) {
            builder = builder.header(header_name, hv);
        }
    }
    builder
}

/// Format a timestamp as an HTTP date (`Last-Modified` and friends).
#[must_use]
pub fn http_date(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Quote a stored hex ETag for the wire.
#[must_use]
pub fn quote_etag(etag: &str) -> String {
    format!("\"{etag}\"")
}

/// Render an [`S3Error`] into its XML error response.
pub fn error_to_response(err: &S3Error, request_id: &str) -> http::Response<S3ResponseBody> {
    let xml = error_to_xml(
        err.code.as_str(),
        &err.message,
        err.resource.as_deref(),
        request_id,
    );

    http::Response::builder()
        .status(err.status_code)
        .header("Content-Type", "application/xml")
        .body(S3ResponseBody::from_xml(xml))
        .unwrap_or_else(|_| {
            // Static parts only; cannot fail. Fall back to a bare 500.
            let mut resp = http::Response::new(S3ResponseBody::empty());
            *resp.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
            resp
        })
}

/// Add the common headers every response carries.
pub fn add_common_headers(
    mut response: http::Response<S3ResponseBody>,
    request_id: &str,
    allowed_origin: Option<&str>,
) -> http::Response<S3ResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert("x-amz-request-id", hv.clone());
        headers.insert("x-amz-id-2", hv);
    }

    headers.insert("Server", HeaderValue::from_static("TinBucket"));
    headers.insert("Accept-Ranges", HeaderValue::from_static("bytes"));

    if let Some(origin) = allowed_origin {
        if let Ok(hv) = HeaderValue::from_str(origin) {
            headers.insert("Access-Control-Allow-Origin", hv);
        }
        headers.insert(
            "Access-Control-Expose-Headers",
            HeaderValue::from_static(
                "ETag, x-amz-request-id, x-amz-id-2, Content-Range, Accept-Ranges",
            ),
        );
    }

    response
}
