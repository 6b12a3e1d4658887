//! Input validation for bucket names and object keys.

use crate::error::S3Error;

const BUCKET_NAME_MIN_LEN: usize = 3;
const BUCKET_NAME_MAX_LEN: usize = 63;
const OBJECT_KEY_MAX_LEN: usize = 512;

/// Validate a bucket name.
///
/// Names are 3-63 characters of lowercase letters, digits, dots, and
/// hyphens, and must start and end with a letter or digit (the pattern
/// `[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]`).
///
/// # Errors
///
/// Returns an `InvalidBucketName` error describing the violated rule.
pub fn validate_bucket_name(name: &str) -> Result<(), S3Error> {
    let len = name.len();
    if !(BUCKET_NAME_MIN_LEN..=BUCKET_NAME_MAX_LEN).contains(&len) {
        return Err(S3Error::invalid_bucket_name(
            "bucket names must be between 3 and 63 characters",
        ));
    }

    if !name
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-'))
    {
        return Err(S3Error::invalid_bucket_name(
            "bucket names may only contain lowercase letters, digits, dots, and hyphens",
        ));
    }

    let first = name.as_bytes()[0];
    let last = name.as_bytes()[len - 1];
    if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
        return Err(S3Error::invalid_bucket_name(
            "bucket names must start with a lowercase letter or digit",
        ));
    }
    if !last.is_ascii_lowercase() && !last.is_ascii_digit() {
        return Err(S3Error::invalid_bucket_name(
            "bucket names must end with a lowercase letter or digit",
        ));
    }

    Ok(())
}

/// Validate an object key.
///
/// Keys are arbitrary UTF-8 up to 512 characters; `/` is permitted (and
/// meaningful), NUL is not.
///
/// # Errors
///
/// Returns an `InvalidArgument` error for empty, oversized, or NUL-carrying
/// keys.
pub fn validate_object_key(key: &str) -> Result<(), S3Error> {
    if key.is_empty() {
        return Err(S3Error::invalid_argument("object key must not be empty"));
    }
    if key.len() > OBJECT_KEY_MAX_LEN {
        return Err(S3Error::invalid_argument(
            "object key must not exceed 512 characters",
        ));
    }
    if key.bytes().any(|b| b == 0) {
        return Err(S3Error::invalid_argument(
            "object key must not contain NUL bytes",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_accept_valid_bucket_names() {
        for name in ["abc", "test-bucket", "my.bucket.2024", "0numeric0", "a-b"] {
            assert!(validate_bucket_name(name).is_ok(), "rejected {name}");
        }
    }

    #[test]
    fn test_should_reject_invalid_bucket_names() {
        let too_long = "x".repeat(64);
        for name in [
            "ab",            // too short
            "TEST-Bucket",   // uppercase
            "-leading",      // bad first char
            "trailing-",     // bad last char
            ".dot",          // bad first char
            "under_score",   // illegal character
            "has space",     // illegal character
            too_long.as_str(),
        ] {
            assert!(validate_bucket_name(name).is_err(), "accepted {name}");
        }
    }

    #[test]
    fn test_should_accept_slashes_and_unicode_in_keys() {
        assert!(validate_object_key("a/b/c.txt").is_ok());
        assert!(validate_object_key("photos/2024/été.jpg").is_ok());
        assert!(validate_object_key("trailing/").is_ok());
    }

    #[test]
    fn test_should_reject_bad_keys() {
        assert!(validate_object_key("").is_err());
        assert!(validate_object_key(&"k".repeat(513)).is_err());
        assert!(validate_object_key("nul\0byte").is_err());
    }
}
