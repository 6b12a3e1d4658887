//! Metadata store error types.

/// Errors produced by the metadata store.
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    /// The named bucket does not exist.
    #[error("bucket `{0}` not found")]
    BucketNotFound(String),

    /// A bucket with this name already exists.
    #[error("bucket `{0}` already exists")]
    BucketAlreadyExists(String),

    /// The object does not exist.
    #[error("object `{key}` not found in bucket `{bucket}`")]
    ObjectNotFound {
        /// The bucket searched.
        bucket: String,
        /// The missing key.
        key: String,
    },

    /// The multipart upload does not exist.
    #[error("multipart upload `{0}` not found")]
    UploadNotFound(String),

    /// The access key does not exist.
    #[error("access key `{0}` not found")]
    AccessKeyNotFound(String),

    /// An access key with buckets cannot be deleted when no other key can
    /// take over ownership.
    #[error("access key `{0}` owns buckets and no other key exists to reassign them to")]
    NoSurvivingKey(String),

    /// An underlying database error.
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Convenience result type for metadata operations.
pub type MetaResult<T> = Result<T, MetaError>;

/// Return true if a SQLx error indicates a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}
