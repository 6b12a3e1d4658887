//! S3 request routing for path-style URLs.
//!
//! The router maps `(method, path, query, headers)` onto an S3 operation.
//! S3 reuses a small set of methods for dozens of operations, so the
//! discriminators are sub-resource query parameters (`?uploads`,
//! `?uploadId`, `?delete`, `?location`, ...) and the `x-amz-copy-source`
//! header. Only path-style addressing is supported: the bucket is the first
//! path segment and the (greedy, percent-decoded) key is the rest.

use http::Method;
use percent_encoding::percent_decode_str;
use tinbucket_model::error::S3Error;
use tinbucket_model::operations::S3Operation;

/// The result of routing an HTTP request.
#[derive(Debug, Clone)]
pub struct RoutingContext {
    /// The resolved bucket name, if any.
    pub bucket: Option<String>,
    /// The resolved object key, if any.
    pub key: Option<String>,
    /// The identified S3 operation.
    pub operation: S3Operation,
    /// Parsed query parameters from the request URI.
    pub query_params: Vec<(String, String)>,
}

/// Resolve an HTTP request to a routing context.
///
/// # Errors
///
/// Returns a `MethodNotAllowed` error for unroutable method/sub-resource
/// combinations (including WebDAV `PROPFIND` probes).
pub fn resolve_route<B>(req: &http::Request<B>) -> Result<RoutingContext, S3Error> {
    let method = req.method();
    let uri = req.uri();
    let headers = req.headers();

    // Some clients probe for WebDAV before falling back to S3.
    if method.as_str() == "PROPFIND" {
        return Err(S3Error::method_not_allowed("PROPFIND"));
    }

    let query_params = parse_query_params(uri.query().unwrap_or(""));
    let (bucket, key) = parse_path(uri.path());

    let operation = identify_operation(method, bucket.as_ref(), key.as_ref(), &query_params, headers)?;

    Ok(RoutingContext {
        bucket,
        key,
        operation,
        query_params,
    })
}

/// Parse the URI path into an optional bucket and optional key.
///
/// Path format: `/{bucket}` or `/{bucket}/{key...}` where the key is greedy
/// and percent-decoded. A trailing slash after the bucket (`/{bucket}/`)
/// resolves to no key.
fn parse_path(path: &str) -> (Option<String>, Option<String>) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return (None, None);
    }

    if let Some(pos) = trimmed.find('/') {
        let bucket = decode_uri_component(&trimmed[..pos]);
        let key_raw = &trimmed[pos + 1..];
        let key = if key_raw.is_empty() {
            None
        } else {
            Some(decode_uri_component(key_raw))
        };
        (Some(bucket), key)
    } else {
        (Some(decode_uri_component(trimmed)), None)
    }
}

/// Decode a percent-encoded URI component.
fn decode_uri_component(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Parse a query string into key-value pairs. A bare key parses to an empty
/// value (`?uploads` carries no value but still selects the sub-resource).
fn parse_query_params(query: &str) -> Vec<(String, String)> {
    if query.is_empty() {
        return Vec::new();
    }

    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| {
            if let Some(pos) = pair.find('=') {
                (
                    decode_uri_component(&pair[..pos]),
                    decode_uri_component(&pair[pos + 1..]),
                )
            } else {
                (decode_uri_component(pair), String::new())
            }
        })
        .collect()
}

/// Check whether a query parameter is present.
fn query_has_key(params: &[(String, String)], key: &str) -> bool {
    params.iter().any(|(k, _)| k == key)
}

/// Get the value of a query parameter by name.
fn query_value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Identify the S3 operation from method, path structure, query, and headers.
fn identify_operation(
    method: &Method,
    bucket: Option<&String>,
    key: Option<&String>,
    query_params: &[(String, String)],
    headers: &http::HeaderMap,
) -> Result<S3Operation, S3Error> {
    match (bucket.is_some(), key.is_some()) {
        // Service level: only ListBuckets.
        (false, _) => match *method {
            Method::GET => Ok(S3Operation::ListBuckets),
            _ => Err(S3Error::method_not_allowed(method.as_str())),
        },

        // Bucket level.
        (true, false) => identify_bucket_operation(method, query_params),

        // Object level.
        (true, true) => identify_object_operation(method, query_params, headers),
    }
}

/// Identify a bucket-level operation (bucket present, no key).
fn identify_bucket_operation(
    method: &Method,
    params: &[(String, String)],
) -> Result<S3Operation, S3Error> {
    match *method {
        Method::GET => Ok(identify_bucket_get(params)),
        Method::PUT => Ok(S3Operation::CreateBucket),
        Method::DELETE => Ok(S3Operation::DeleteBucket),
        Method::HEAD => Ok(S3Operation::HeadBucket),
        Method::POST if query_has_key(params, "delete") => Ok(S3Operation::DeleteObjects),
        _ => Err(S3Error::method_not_allowed(method.as_str())),
    }
}

/// Identify a GET operation on a bucket.
fn identify_bucket_get(params: &[(String, String)]) -> S3Operation {
    if query_has_key(params, "location") {
        return S3Operation::GetBucketLocation;
    }
    if query_has_key(params, "versioning") {
        return S3Operation::GetBucketVersioning;
    }
    if query_has_key(params, "acl") {
        return S3Operation::GetBucketAcl;
    }
    if query_value(params, "list-type") == Some("2") {
        return S3Operation::ListObjectsV2;
    }

    // Default: the v1 listing shape.
    S3Operation::ListObjects
}

/// Identify an object-level operation (bucket + key present).
fn identify_object_operation(
    method: &Method,
    params: &[(String, String)],
    headers: &http::HeaderMap,
) -> Result<S3Operation, S3Error> {
    let has_upload_id = query_has_key(params, "uploadId");

    match *method {
        Method::GET => Ok(if has_upload_id {
            S3Operation::ListParts
        } else {
            S3Operation::GetObject
        }),
        Method::HEAD => Ok(S3Operation::HeadObject),
        Method::PUT => {
            if has_upload_id && query_has_key(params, "partNumber") {
                return Ok(S3Operation::UploadPart);
            }
            if headers.contains_key("x-amz-copy-source") {
                return Ok(S3Operation::CopyObject);
            }
            Ok(S3Operation::PutObject)
        }
        Method::DELETE => Ok(if has_upload_id {
            S3Operation::AbortMultipartUpload
        } else {
            S3Operation::DeleteObject
        }),
        Method::POST => {
            if query_has_key(params, "uploads") {
                return Ok(S3Operation::CreateMultipartUpload);
            }
            if has_upload_id {
                return Ok(S3Operation::CompleteMultipartUpload);
            }
            Err(S3Error::method_not_allowed("POST"))
        }
        _ => Err(S3Error::method_not_allowed(method.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use http::Request;
    use tinbucket_model::S3ErrorCode;

    use super::*;

    fn request(method: &str, uri: &str) -> Request<()> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .expect("valid request")
    }

    fn route(method: &str, uri: &str) -> RoutingContext {
        resolve_route(&request(method, uri)).expect("should resolve")
    }

    // --- Service level ---

    #[test]
    fn test_should_route_list_buckets() {
        let ctx = route("GET", "/");
        assert!(ctx.bucket.is_none());
        assert_eq!(ctx.operation, S3Operation::ListBuckets);
    }

    // --- Bucket level ---

    #[test]
    fn test_should_route_bucket_crud() {
        assert_eq!(route("PUT", "/mybucket").operation, S3Operation::CreateBucket);
        assert_eq!(route("DELETE", "/mybucket").operation, S3Operation::DeleteBucket);
        assert_eq!(route("HEAD", "/mybucket").operation, S3Operation::HeadBucket);
    }

    #[test]
    fn test_should_route_bucket_sub_resources() {
        assert_eq!(
            route("GET", "/mybucket?location").operation,
            S3Operation::GetBucketLocation
        );
        assert_eq!(
            route("GET", "/mybucket?versioning").operation,
            S3Operation::GetBucketVersioning
        );
        assert_eq!(
            route("GET", "/mybucket?acl").operation,
            S3Operation::GetBucketAcl
        );
    }

    #[test]
    fn test_should_route_listings() {
        assert_eq!(route("GET", "/mybucket").operation, S3Operation::ListObjects);
        assert_eq!(
            route("GET", "/mybucket?list-type=2&prefix=a%2F").operation,
            S3Operation::ListObjectsV2
        );
        assert_eq!(
            route("GET", "/mybucket?prefix=logs").operation,
            S3Operation::ListObjects
        );
    }

    #[test]
    fn test_should_route_batch_delete() {
        assert_eq!(
            route("POST", "/mybucket?delete").operation,
            S3Operation::DeleteObjects
        );
    }

    #[test]
    fn test_should_reject_plain_bucket_post() {
        let err = resolve_route(&request("POST", "/mybucket")).expect_err("no sub-resource");
        assert_eq!(err.code, S3ErrorCode::MethodNotAllowed);
    }

    // --- Object level ---

    #[test]
    fn test_should_route_object_crud() {
        assert_eq!(route("PUT", "/b/my/key").operation, S3Operation::PutObject);
        assert_eq!(route("GET", "/b/my/key").operation, S3Operation::GetObject);
        assert_eq!(route("HEAD", "/b/my/key").operation, S3Operation::HeadObject);
        assert_eq!(route("DELETE", "/b/my/key").operation, S3Operation::DeleteObject);
    }

    #[test]
    fn test_should_route_copy_object_by_header() {
        let req = Request::builder()
            .method("PUT")
            .uri("/b/dst")
            .header("x-amz-copy-source", "/src/key")
            .body(())
            .expect("valid request");
        let ctx = resolve_route(&req).expect("should resolve");
        assert_eq!(ctx.operation, S3Operation::CopyObject);
    }

    #[test]
    fn test_should_route_multipart_operations() {
        assert_eq!(
            route("POST", "/b/k?uploads").operation,
            S3Operation::CreateMultipartUpload
        );
        assert_eq!(
            route("PUT", "/b/k?uploadId=u1&partNumber=2").operation,
            S3Operation::UploadPart
        );
        assert_eq!(
            route("POST", "/b/k?uploadId=u1").operation,
            S3Operation::CompleteMultipartUpload
        );
        assert_eq!(route("GET", "/b/k?uploadId=u1").operation, S3Operation::ListParts);
        assert_eq!(
            route("DELETE", "/b/k?uploadId=u1").operation,
            S3Operation::AbortMultipartUpload
        );
    }

    #[test]
    fn test_should_prefer_upload_part_over_copy() {
        // UploadPart needs both uploadId and partNumber even when a copy
        // source header is present.
        let req = Request::builder()
            .method("PUT")
            .uri("/b/k?uploadId=u1&partNumber=1")
            .header("x-amz-copy-source", "/src/key")
            .body(())
            .expect("valid request");
        let ctx = resolve_route(&req).expect("should resolve");
        assert_eq!(ctx.operation, S3Operation::UploadPart);
    }

    // --- Keys and queries ---

    #[test]
    fn test_should_decode_percent_encoded_key() {
        let ctx = route("GET", "/mybucket/my%20key%2Fwith%2Fslashes");
        assert_eq!(ctx.key.as_deref(), Some("my key/with/slashes"));
    }

    #[test]
    fn test_should_keep_greedy_keys_intact() {
        let ctx = route("GET", "/b/a/b/c/d.txt");
        assert_eq!(ctx.bucket.as_deref(), Some("b"));
        assert_eq!(ctx.key.as_deref(), Some("a/b/c/d.txt"));
    }

    #[test]
    fn test_should_treat_trailing_slash_as_bucket_only() {
        let ctx = route("GET", "/mybucket/");
        assert_eq!(ctx.bucket.as_deref(), Some("mybucket"));
        assert!(ctx.key.is_none());
        assert_eq!(ctx.operation, S3Operation::ListObjects);
    }

    #[test]
    fn test_should_parse_bare_query_keys() {
        let ctx = route("GET", "/b/k?uploadId=u1&x");
        assert!(ctx.query_params.contains(&("uploadId".to_owned(), "u1".to_owned())));
        assert!(ctx.query_params.contains(&("x".to_owned(), String::new())));
    }

    // --- Method handling ---

    #[test]
    fn test_should_reject_propfind() {
        let err = resolve_route(&request("PROPFIND", "/b/k")).expect_err("propfind");
        assert_eq!(err.code, S3ErrorCode::MethodNotAllowed);
        assert_eq!(err.status_code, http::StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_should_reject_unknown_methods() {
        let err = resolve_route(&request("PATCH", "/b")).expect_err("patch");
        assert_eq!(err.code, S3ErrorCode::MethodNotAllowed);

        let err = resolve_route(&request("PUT", "/")).expect_err("service put");
        assert_eq!(err.code, S3ErrorCode::MethodNotAllowed);
    }
}
