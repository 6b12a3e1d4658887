//! SQLite-backed metadata store for TinBucket.
//!
//! Holds everything that is not object bytes: access keys, buckets, object
//! rows, and multipart upload state. Object payloads live on the filesystem
//! (`tinbucket-store`); the rows here reference them by a bucket-relative
//! storage handle.
//!
//! The store is a thin typed layer over a `sqlx::SqlitePool`. Statements are
//! short and handlers issue only a few per request; the one multi-statement
//! unit, multipart completion, runs in a single transaction.

pub mod error;
pub mod migrate;
pub mod models;
pub mod store;

pub use error::{MetaError, MetaResult};
pub use migrate::run_migrations;
pub use models::{AccessKey, Bucket, MultipartPart, MultipartUpload, ObjectRecord};
pub use store::{ListPage, MetaStore};
