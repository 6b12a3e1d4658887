//! Request signature verification for TinBucket.
//!
//! Implements the verification side of the three authentication modes S3
//! clients use against a self-hosted endpoint:
//!
//! - **SigV4 header** authentication (the `Authorization` header)
//! - **SigV4 presigned URLs** (`X-Amz-Algorithm` query parameters)
//! - **SigV2 presigned URLs** (`AWSAccessKeyId` query parameters, HMAC-SHA1)
//!
//! All verification functions are pure: they take the request head and the
//! resolved secret key, and return `Ok(())` or a specific [`AuthError`].
//! Looking the key up (and deciding whether it is active) is the HTTP
//! layer's job; that keeps this crate free of I/O and easy to test against
//! the published AWS signing vectors.
//!
//! The crate also computes S3 ETags ([`etag`]) and generates presigned URLs
//! ([`presigned::generate_presigned_url`]) for the admin link endpoint.
//!
//! # Modules
//!
//! - [`canonical`] - canonical request construction per the SigV4 spec
//! - [`sigv4`] - SigV4 header signature verification
//! - [`presigned`] - SigV4 presigned URL verification and generation
//! - [`sigv2`] - SigV2 presigned URL verification (HMAC-SHA1)
//! - [`etag`] - single-part and multipart ETag computation
//! - [`error`] - authentication error types

pub mod canonical;
pub mod error;
pub mod etag;
pub mod presigned;
pub mod sigv2;
pub mod sigv4;

pub use error::AuthError;
pub use etag::{compute_etag, compute_md5, compute_multipart_etag};
pub use presigned::{generate_presigned_url, verify_presigned_v4};
pub use sigv2::verify_presigned_v2;
pub use sigv4::{hash_payload, verify_sigv4};
