//! The filesystem store implementation.

use std::io::SeekFrom;
use std::path::{Component, Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// The staging directory for multipart parts, directly under the root.
pub const MULTIPART_DIR: &str = ".multipart";

/// A positioned, length-capped handle onto an object file, ready to stream
/// out as a response body.
#[derive(Debug)]
pub struct ObjectReader {
    /// The opened file, seeked to the start of the requested window.
    pub file: File,
    /// Number of bytes to deliver from the current position.
    pub len: u64,
}

/// Filesystem object store rooted at a configured directory.
#[derive(Clone, Debug)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `root`. The directory is created on demand
    /// by [`FsStore::ensure_root`].
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The storage root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub async fn ensure_root(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// The directory holding a bucket's objects.
    fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }

    /// The staging directory for one multipart upload.
    fn staging_dir(&self, upload_id: &str) -> PathBuf {
        self.root.join(MULTIPART_DIR).join(upload_id)
    }

    /// Join `key` under the bucket directory, refusing any component that
    /// would walk out of it (`..`, absolute segments).
    fn safe_object_path(&self, bucket: &str, key: &str) -> StoreResult<PathBuf> {
        let mut path = self.bucket_dir(bucket);
        for component in Path::new(key).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(StoreError::PathEscapes(key.to_owned()));
                }
            }
        }
        Ok(path)
    }

    // -----------------------------------------------------------------------
    // Bucket directories
    // -----------------------------------------------------------------------

    /// Create a bucket's directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on filesystem failure.
    pub async fn create_bucket_dir(&self, bucket: &str) -> StoreResult<()> {
        fs::create_dir_all(self.bucket_dir(bucket)).await?;
        Ok(())
    }

    /// Recursively remove a bucket's directory. Missing directories are not
    /// an error (the bucket may never have received a write).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on any other filesystem failure.
    pub async fn remove_bucket_dir(&self, bucket: &str) -> StoreResult<()> {
        match fs::remove_dir_all(self.bucket_dir(bucket)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    /// Persist an object body, returning the written size.
    ///
    /// A key ending in `/` is a folder marker: only the directory is
    /// created. Otherwise the body is written to a temporary file in the
    /// destination directory and renamed into place.
    ///
    /// # Errors
    ///
    /// - [`StoreError::PathEscapes`] if the key leaves the bucket directory.
    /// - [`StoreError::Io`] on filesystem failure.
    pub async fn write_object(&self, bucket: &str, key: &str, data: &[u8]) -> StoreResult<u64> {
        let path = self.safe_object_path(bucket, key)?;

        if key.ends_with('/') {
            self.reshape_marker_collisions(bucket, key).await?;
            fs::create_dir_all(&path).await?;
            trace!(bucket, key, "created folder marker");
            return Ok(0);
        }

        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.bucket_dir(bucket));
        self.reshape_marker_collisions(bucket, key).await?;
        fs::create_dir_all(&parent).await?;

        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;
        if let Err(err) = write_and_sync(&mut file, data).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(err));
        }
        drop(file);

        if let Err(err) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(err));
        }

        trace!(bucket, key, size = data.len(), "wrote object body");
        Ok(data.len() as u64)
    }

    /// Open an object for reading.
    ///
    /// With `range: Some((start, end))` (inclusive, already validated
    /// against the object size) the file is positioned at `start` and
    /// delivery is capped at `end`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the file does not exist.
    /// - [`StoreError::PathEscapes`] if the key leaves the bucket directory.
    /// - [`StoreError::Io`] on filesystem failure.
    pub async fn open_object(
        &self,
        bucket: &str,
        key: &str,
        range: Option<(u64, u64)>,
    ) -> StoreResult<ObjectReader> {
        let path = self.safe_object_path(bucket, key)?;

        let mut file = match File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    bucket: bucket.to_owned(),
                    key: key.to_owned(),
                });
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        let size = file.metadata().await?.len();
        let len = match range {
            Some((start, end)) => {
                file.seek(SeekFrom::Start(start)).await?;
                end - start + 1
            }
            None => size,
        };

        Ok(ObjectReader { file, len })
    }

    /// Copy an object's bytes to a new location, returning the copied size.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the source file does not exist.
    /// - [`StoreError::PathEscapes`] for either key.
    /// - [`StoreError::Io`] on filesystem failure.
    pub async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> StoreResult<u64> {
        let src = self.safe_object_path(src_bucket, src_key)?;
        let dst = self.safe_object_path(dst_bucket, dst_key)?;

        if let Some(parent) = dst.parent() {
            self.reshape_marker_collisions(dst_bucket, dst_key).await?;
            fs::create_dir_all(parent).await?;
        }

        match fs::copy(&src, &dst).await {
            Ok(copied) => {
                debug!(src_bucket, src_key, dst_bucket, dst_key, copied, "copied object");
                Ok(copied)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound {
                bucket: src_bucket.to_owned(),
                key: src_key.to_owned(),
            }),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Remove an object body. Missing files are not an error; folder markers
    /// remove their (empty) directory.
    ///
    /// # Errors
    ///
    /// - [`StoreError::PathEscapes`] if the key leaves the bucket directory.
    /// - [`StoreError::Io`] on filesystem failure.
    pub async fn delete_object(&self, bucket: &str, key: &str) -> StoreResult<()> {
        let path = self.safe_object_path(bucket, key)?;

        let result = if key.ends_with('/') {
            fs::remove_dir_all(&path).await
        } else {
            fs::remove_file(&path).await
        };

        match result {
            Ok(()) => trace!(bucket, key, "removed object body"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!(bucket, key, "object body already absent");
            }
            Err(e) => return Err(StoreError::Io(e)),
        }

        self.prune_empty_dirs(&path, &self.bucket_dir(bucket)).await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Multipart staging
    // -----------------------------------------------------------------------

    /// Stage a part body at `D/.multipart/<upload_id>/part-<N>`, returning
    /// the written size.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on filesystem failure.
    pub async fn write_part(
        &self,
        upload_id: &str,
        part_number: i64,
        data: &[u8],
    ) -> StoreResult<u64> {
        let dir = self.staging_dir(upload_id);
        fs::create_dir_all(&dir).await?;

        let path = dir.join(format!("part-{part_number}"));
        let mut file = File::create(&path).await?;
        write_and_sync(&mut file, data).await?;

        trace!(upload_id, part_number, size = data.len(), "staged part");
        Ok(data.len() as u64)
    }

    /// Assemble staged parts into the destination object, strictly in the
    /// given ascending part-number order, then purge the staging directory.
    ///
    /// Returns the assembled object size.
    ///
    /// # Errors
    ///
    /// - [`StoreError::PartNotFound`] if a named part was never staged.
    /// - [`StoreError::PathEscapes`] if the destination key escapes.
    /// - [`StoreError::Io`] on filesystem failure.
    pub async fn assemble_parts(
        &self,
        upload_id: &str,
        part_numbers: &[i64],
        bucket: &str,
        key: &str,
    ) -> StoreResult<u64> {
        let dst = self.safe_object_path(bucket, key)?;
        if let Some(parent) = dst.parent() {
            self.reshape_marker_collisions(bucket, key).await?;
            fs::create_dir_all(parent).await?;
        }

        let staging = self.staging_dir(upload_id);
        let mut out = File::create(&dst).await?;
        let mut total: u64 = 0;

        for &part_number in part_numbers {
            let part_path = staging.join(format!("part-{part_number}"));
            let mut part = match File::open(&part_path).await {
                Ok(f) => f,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(StoreError::PartNotFound {
                        upload_id: upload_id.to_owned(),
                        part_number,
                    });
                }
                Err(e) => return Err(StoreError::Io(e)),
            };
            total += tokio::io::copy(&mut part, &mut out).await?;
        }

        out.flush().await?;
        out.sync_all().await?;

        self.purge_staging(upload_id).await?;

        debug!(
            upload_id,
            bucket,
            key,
            parts = part_numbers.len(),
            size = total,
            "assembled multipart object"
        );
        Ok(total)
    }

    /// Remove an upload's staging directory and everything in it. Missing
    /// directories are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on any other filesystem failure.
    pub async fn purge_staging(&self, upload_id: &str) -> StoreResult<()> {
        match fs::remove_dir_all(self.staging_dir(upload_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    // -----------------------------------------------------------------------
    // Reporting
    // -----------------------------------------------------------------------

    /// Total bytes stored under the root, excluding multipart staging.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on filesystem failure.
    pub async fn total_size(&self) -> StoreResult<u64> {
        let mut total: u64 = 0;
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StoreError::Io(e)),
            };

            while let Some(entry) = entries.next_entry().await? {
                if entry.file_name() == MULTIPART_DIR && dir == self.root {
                    continue;
                }
                let meta = entry.metadata().await?;
                if meta.is_dir() {
                    pending.push(entry.path());
                } else {
                    total += meta.len();
                }
            }
        }

        Ok(total)
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Replace zero-byte files that collide with directory segments of `key`.
    ///
    /// A prior PutObject of an empty body to `a/b` leaves a zero-byte file;
    /// a later write to `a/b/c` needs `a/b` to be a directory. Runs under
    /// the caller's write with no extra locking; concurrent writers sharing
    /// a path prefix can race here.
    async fn reshape_marker_collisions(&self, bucket: &str, key: &str) -> StoreResult<()> {
        let mut current = self.bucket_dir(bucket);
        let components: Vec<&str> = key.split('/').filter(|c| !c.is_empty()).collect();

        // Only intermediate segments can collide; the final segment is the
        // object itself (or, for folder markers, every segment is a dir).
        let dir_segments = if key.ends_with('/') {
            components.len()
        } else {
            components.len().saturating_sub(1)
        };

        for segment in &components[..dir_segments] {
            current.push(segment);
            match fs::metadata(&current).await {
                Ok(meta) if meta.is_file() && meta.len() == 0 => {
                    warn!(
                        bucket,
                        path = %current.display(),
                        "replacing zero-byte folder marker file with directory"
                    );
                    fs::remove_file(&current).await?;
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Remove empty directories from `start`'s parent up to (not including)
    /// `stop`. Stops at the first non-empty or missing directory.
    async fn prune_empty_dirs(&self, start: &Path, stop: &Path) {
        let Some(parent) = start.parent() else { return };
        let mut current = parent.to_path_buf();

        while current.starts_with(stop) && current != stop {
            match fs::remove_dir(&current).await {
                Ok(()) => {
                    if let Some(parent) = current.parent() {
                        current = parent.to_path_buf();
                    } else {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    }
}

/// Write `data` to `file`, flush, and fsync.
async fn write_and_sync(file: &mut File, data: &[u8]) -> std::io::Result<()> {
    file.write_all(data).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}
