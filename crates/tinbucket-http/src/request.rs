//! Helpers for extracting typed values from HTTP request parts.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;
use tinbucket_model::S3Error;

/// Extract a header value as a string.
#[must_use]
pub fn header_str(parts: &http::request::Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned)
}

/// Get a query parameter value by name.
#[must_use]
pub fn query_param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// Check whether a query parameter is present (with or without a value).
#[must_use]
pub fn query_has_key(params: &[(String, String)], name: &str) -> bool {
    params.iter().any(|(k, _)| k == name)
}

/// Collect all `x-amz-meta-*` headers into a metadata map.
///
/// Header names match case-insensitively (HTTP lowercases them on the way
/// in); the stored key is the portion after the prefix, the value is kept
/// verbatim.
#[must_use]
pub fn collect_metadata(parts: &http::request::Parts) -> HashMap<String, String> {
    let prefix = "x-amz-meta-";
    parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            let meta_key = name.as_str().strip_prefix(prefix)?;
            let meta_value = value.to_str().ok()?;
            Some((meta_key.to_owned(), meta_value.to_owned()))
        })
        .collect()
}

/// The request's content type, defaulting to `application/octet-stream`.
#[must_use]
pub fn content_type_or_default(parts: &http::request::Parts) -> String {
    header_str(parts, "content-type").unwrap_or_else(|| "application/octet-stream".to_owned())
}

/// Parse a `Range` header (`bytes=start-end`, end optional) against an
/// object of `size` bytes.
///
/// Returns the validated inclusive range with `end` clamped to `size - 1`.
///
/// # Errors
///
/// Returns `InvalidRange` when `start >= size` or `start > end`, and
/// `InvalidArgument` for unparseable headers.
pub fn parse_range(header: &str, size: u64) -> Result<(u64, u64), S3Error> {
    let spec = header
        .strip_prefix("bytes=")
        .ok_or_else(|| S3Error::invalid_argument(format!("unsupported Range unit: {header}")))?;

    let (start_str, end_str) = spec
        .split_once('-')
        .ok_or_else(|| S3Error::invalid_argument(format!("malformed Range: {header}")))?;

    let start: u64 = start_str
        .parse()
        .map_err(|_| S3Error::invalid_argument(format!("malformed Range: {header}")))?;

    let end: u64 = if end_str.is_empty() {
        size.saturating_sub(1)
    } else {
        end_str
            .parse()
            .map_err(|_| S3Error::invalid_argument(format!("malformed Range: {header}")))?
    };

    if start >= size || start > end {
        return Err(S3Error::invalid_range(header));
    }

    Ok((start, end.min(size.saturating_sub(1))))
}

/// Parse an `x-amz-copy-source` header into `(bucket, key)`.
///
/// The format is `[/]sourceBucket/sourceKey`, with the key percent-encoded.
///
/// # Errors
///
/// Returns `InvalidArgument` if the header has no bucket/key separator or
/// either half is empty.
pub fn parse_copy_source(source: &str) -> Result<(String, String), S3Error> {
    let source = source.strip_prefix('/').unwrap_or(source);

    let (bucket, key) = source
        .split_once('/')
        .ok_or_else(|| S3Error::invalid_argument("invalid copy source format"))?;

    if bucket.is_empty() || key.is_empty() {
        return Err(S3Error::invalid_argument(
            "invalid copy source: empty bucket or key",
        ));
    }

    let key = percent_decode_str(key).decode_utf8_lossy().into_owned();
    Ok((bucket.to_owned(), key))
}
