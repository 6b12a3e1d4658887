//! Filesystem store error types.

use std::io;

/// Errors produced by the filesystem store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The object file is missing.
    #[error("object `{key}` not found in bucket `{bucket}`")]
    NotFound {
        /// The bucket searched.
        bucket: String,
        /// The missing key.
        key: String,
    },

    /// A staged part file is missing.
    #[error("part {part_number} of upload `{upload_id}` not found")]
    PartNotFound {
        /// The upload the part belongs to.
        upload_id: String,
        /// The missing part number.
        part_number: i64,
    },

    /// The joined path would land outside the storage root.
    #[error("key `{0}` escapes the storage root")]
    PathEscapes(String),

    /// An underlying I/O error.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
