//! Shared S3 protocol model for TinBucket.
//!
//! This crate defines the pieces of the S3 wire protocol that the rest of the
//! workspace agrees on:
//!
//! - [`error`] - S3 error codes with their HTTP status and default messages
//! - [`operations`] - the set of S3 operations the router can resolve
//! - [`types`] - plain structs for the XML document components
//! - [`output`] - response document shapes emitted by the XML codec
//! - [`validation`] - bucket name and object key validation
//!
//! Everything here is protocol-facing and carries no I/O.

pub mod error;
pub mod operations;
pub mod output;
pub mod types;
pub mod validation;

pub use error::{S3Error, S3ErrorCode};
pub use operations::S3Operation;
pub use validation::{validate_bucket_name, validate_object_key};
