//! Filesystem object store for TinBucket.
//!
//! Object bytes live under a configured root directory `D`:
//!
//! - `D/<bucket>/<key>` - object bodies, with `/` in keys preserved as
//!   directory separators
//! - `D/.multipart/<upload_id>/part-<N>` - staged multipart parts
//!
//! Keys ending in `/` are folder markers: an empty directory, size 0, no
//! file body. Some S3 browser tools create these before uploading into the
//! "folder"; when a marker was previously written as a zero-byte *file* (a
//! plain PutObject of an empty body to `a/b`) and a later key needs `a/b` as
//! a directory, the store removes the colliding empty file and creates the
//! directory in its place.
//!
//! Every write path is checked component-by-component to stay inside the
//! root; a key that would escape is refused.

pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::{FsStore, ObjectReader, MULTIPART_DIR};
