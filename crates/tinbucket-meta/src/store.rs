//! Typed operations over the metadata tables.
//!
//! Every method is a short statement or two; the one multi-statement unit,
//! [`MetaStore::complete_upload`], commits the multipart state transition in
//! a single transaction so a crash can never leave an object row alongside
//! surviving upload state.

use chrono::Utc;
use sqlx::sqlite::Sqlite;
use sqlx::{QueryBuilder, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{MetaError, MetaResult, is_unique_violation};
use crate::models::{AccessKey, Bucket, MultipartPart, MultipartUpload, ObjectRecord};

/// One page of an object listing.
#[derive(Debug)]
pub struct ListPage {
    /// The rows fetched, ordered by key ascending.
    pub objects: Vec<ObjectRecord>,
    /// Whether more keys remain after this page.
    pub is_truncated: bool,
}

/// The metadata store.
#[derive(Clone, Debug)]
pub struct MetaStore {
    pool: SqlitePool,
}

const OBJECT_COLUMNS: &str = "id, bucket_id, key, size, etag, content_type, storage_path, \
                              metadata, last_modified, created_at";

impl MetaStore {
    /// Create a store over the given pool. Run
    /// [`run_migrations`](crate::migrate::run_migrations) first.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for callers that need ad-hoc statistics queries.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // -----------------------------------------------------------------------
    // Access keys
    // -----------------------------------------------------------------------

    /// Insert a new access key.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Sqlx`] on database failure, including unique
    /// violations on `access_key_id` (callers generate random IDs, so a
    /// collision is effectively a bug).
    pub async fn insert_access_key(&self, key: &AccessKey) -> MetaResult<()> {
        sqlx::query(
            "INSERT INTO access_keys \
             (id, access_key_id, secret_access_key, display_name, is_active, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(key.id)
        .bind(&key.access_key_id)
        .bind(&key.secret_access_key)
        .bind(&key.display_name)
        .bind(key.is_active)
        .bind(key.created_at)
        .bind(key.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Look up an access key by its public key ID.
    pub async fn get_access_key(&self, access_key_id: &str) -> MetaResult<Option<AccessKey>> {
        let key = sqlx::query_as::<Sqlite, AccessKey>(
            "SELECT id, access_key_id, secret_access_key, display_name, is_active, \
                    created_at, updated_at \
             FROM access_keys WHERE access_key_id = ?",
        )
        .bind(access_key_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(key)
    }

    /// Look up an access key by its internal UUID.
    pub async fn get_access_key_by_id(&self, id: Uuid) -> MetaResult<Option<AccessKey>> {
        let key = sqlx::query_as::<Sqlite, AccessKey>(
            "SELECT id, access_key_id, secret_access_key, display_name, is_active, \
                    created_at, updated_at \
             FROM access_keys WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(key)
    }

    /// List all access keys, newest first.
    pub async fn list_access_keys(&self) -> MetaResult<Vec<AccessKey>> {
        let keys = sqlx::query_as::<Sqlite, AccessKey>(
            "SELECT id, access_key_id, secret_access_key, display_name, is_active, \
                    created_at, updated_at \
             FROM access_keys ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(keys)
    }

    /// Enable or disable an access key.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::AccessKeyNotFound`] if no key has this ID.
    pub async fn set_access_key_active(&self, id: Uuid, active: bool) -> MetaResult<()> {
        let result =
            sqlx::query("UPDATE access_keys SET is_active = ?, updated_at = ? WHERE id = ?")
                .bind(active)
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(MetaError::AccessKeyNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Delete an access key.
    ///
    /// Buckets owned by the key are reassigned to any surviving key; if the
    /// key owns buckets and no other key exists, the delete fails.
    ///
    /// # Errors
    ///
    /// - [`MetaError::AccessKeyNotFound`] if the key does not exist.
    /// - [`MetaError::NoSurvivingKey`] if ownership cannot be reassigned.
    pub async fn delete_access_key(&self, id: Uuid) -> MetaResult<()> {
        let mut tx = self.pool.begin().await?;

        let owned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM buckets WHERE owner_id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if owned > 0 {
            let survivor: Option<Uuid> =
                sqlx::query_scalar("SELECT id FROM access_keys WHERE id != ? LIMIT 1")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;

            let Some(survivor) = survivor else {
                return Err(MetaError::NoSurvivingKey(id.to_string()));
            };

            sqlx::query("UPDATE buckets SET owner_id = ? WHERE owner_id = ?")
                .bind(survivor)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            debug!(%id, %survivor, buckets = owned, "reassigned bucket ownership");
        }

        let result = sqlx::query("DELETE FROM access_keys WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(MetaError::AccessKeyNotFound(id.to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Buckets
    // -----------------------------------------------------------------------

    /// Insert a bucket row.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::BucketAlreadyExists`] on a name collision.
    pub async fn insert_bucket(
        &self,
        name: &str,
        owner_id: Uuid,
        region: &str,
        acl: &str,
        max_size: i64,
    ) -> MetaResult<Bucket> {
        let bucket = Bucket {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            owner_id,
            region: region.to_owned(),
            acl: acl.to_owned(),
            max_size,
            created_at: Utc::now(),
        };

        let result = sqlx::query(
            "INSERT INTO buckets (id, name, owner_id, region, acl, max_size, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(bucket.id)
        .bind(&bucket.name)
        .bind(bucket.owner_id)
        .bind(&bucket.region)
        .bind(&bucket.acl)
        .bind(bucket.max_size)
        .bind(bucket.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(bucket),
            Err(err) if is_unique_violation(&err) => {
                Err(MetaError::BucketAlreadyExists(name.to_owned()))
            }
            Err(err) => Err(MetaError::Sqlx(err)),
        }
    }

    /// Look up a bucket by name.
    pub async fn get_bucket(&self, name: &str) -> MetaResult<Option<Bucket>> {
        let bucket = sqlx::query_as::<Sqlite, Bucket>(
            "SELECT id, name, owner_id, region, acl, max_size, created_at \
             FROM buckets WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(bucket)
    }

    /// List every bucket, ordered by name.
    pub async fn list_buckets(&self) -> MetaResult<Vec<Bucket>> {
        let buckets = sqlx::query_as::<Sqlite, Bucket>(
            "SELECT id, name, owner_id, region, acl, max_size, created_at \
             FROM buckets ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(buckets)
    }

    /// Delete a bucket row. Object rows cascade.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::BucketNotFound`] if the row does not exist.
    pub async fn delete_bucket(&self, name: &str) -> MetaResult<()> {
        let result = sqlx::query("DELETE FROM buckets WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(MetaError::BucketNotFound(name.to_owned()));
        }
        Ok(())
    }

    /// Count the objects in a bucket.
    pub async fn count_objects(&self, bucket_id: Uuid) -> MetaResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM objects WHERE bucket_id = ?")
            .bind(bucket_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Global counts for the stats endpoint: (buckets, objects).
    pub async fn counts(&self) -> MetaResult<(i64, i64)> {
        let buckets: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM buckets")
            .fetch_one(&self.pool)
            .await?;
        let objects: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM objects")
            .fetch_one(&self.pool)
            .await?;
        Ok((buckets, objects))
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    /// Insert or overwrite the object row for `(bucket_id, key)`.
    pub async fn upsert_object(
        &self,
        bucket_id: Uuid,
        key: &str,
        size: i64,
        etag: &str,
        content_type: &str,
        storage_path: &str,
        metadata_json: &str,
    ) -> MetaResult<ObjectRecord> {
        let now = Utc::now();
        let record = sqlx::query_as::<Sqlite, ObjectRecord>(&format!(
            "INSERT INTO objects \
             (id, bucket_id, key, size, etag, content_type, storage_path, metadata, last_modified, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (bucket_id, key) DO UPDATE SET \
                size = excluded.size, \
                etag = excluded.etag, \
                content_type = excluded.content_type, \
                storage_path = excluded.storage_path, \
                metadata = excluded.metadata, \
                last_modified = excluded.last_modified \
             RETURNING {OBJECT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(bucket_id)
        .bind(key)
        .bind(size)
        .bind(etag)
        .bind(content_type)
        .bind(storage_path)
        .bind(metadata_json)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// Look up an object row.
    pub async fn get_object(&self, bucket_id: Uuid, key: &str) -> MetaResult<Option<ObjectRecord>> {
        let record = sqlx::query_as::<Sqlite, ObjectRecord>(&format!(
            "SELECT {OBJECT_COLUMNS} FROM objects WHERE bucket_id = ? AND key = ?"
        ))
        .bind(bucket_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Delete an object row. Returns whether a row existed.
    pub async fn delete_object(&self, bucket_id: Uuid, key: &str) -> MetaResult<bool> {
        let result = sqlx::query("DELETE FROM objects WHERE bucket_id = ? AND key = ?")
            .bind(bucket_id)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Fetch one listing page: keys matching `prefix`, strictly after
    /// `after` when given, ordered ascending.
    ///
    /// Fetches `max_keys + 1` rows to learn whether the listing is
    /// truncated, then trims to `max_keys`.
    pub async fn list_objects_page(
        &self,
        bucket_id: Uuid,
        prefix: &str,
        after: Option<&str>,
        max_keys: i64,
    ) -> MetaResult<ListPage> {
        let fetch_limit = max_keys + 1;

        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {OBJECT_COLUMNS} FROM objects WHERE bucket_id = "
        ));
        builder.push_bind(bucket_id);

        if !prefix.is_empty() {
            builder.push(" AND key LIKE ");
            builder.push_bind(format!("{}%", escape_like(prefix)));
            builder.push(" ESCAPE '\\'");
        }

        if let Some(after) = after {
            builder.push(" AND key > ");
            builder.push_bind(after);
        }

        builder.push(" ORDER BY key ASC LIMIT ");
        builder.push_bind(fetch_limit);

        let mut objects: Vec<ObjectRecord> =
            builder.build_query_as().fetch_all(&self.pool).await?;

        let is_truncated = objects.len() as i64 > max_keys;
        objects.truncate(usize::try_from(max_keys).unwrap_or(usize::MAX));

        Ok(ListPage {
            objects,
            is_truncated,
        })
    }

    /// List every key in a bucket. Used by the admin purge path.
    pub async fn list_keys(&self, bucket_id: Uuid) -> MetaResult<Vec<String>> {
        let keys =
            sqlx::query_scalar("SELECT key FROM objects WHERE bucket_id = ? ORDER BY key ASC")
                .bind(bucket_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(keys)
    }

    // -----------------------------------------------------------------------
    // Multipart uploads
    // -----------------------------------------------------------------------

    /// Initiate a multipart upload, generating the 128-bit upload ID.
    pub async fn create_upload(
        &self,
        bucket_id: Uuid,
        key: &str,
        content_type: &str,
        metadata_json: &str,
    ) -> MetaResult<MultipartUpload> {
        let upload = MultipartUpload {
            id: Uuid::new_v4(),
            upload_id: Uuid::new_v4().simple().to_string(),
            bucket_id,
            key: key.to_owned(),
            content_type: content_type.to_owned(),
            metadata: metadata_json.to_owned(),
            initiated_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO multipart_uploads \
             (id, upload_id, bucket_id, key, content_type, metadata, initiated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(upload.id)
        .bind(&upload.upload_id)
        .bind(upload.bucket_id)
        .bind(&upload.key)
        .bind(&upload.content_type)
        .bind(&upload.metadata)
        .bind(upload.initiated_at)
        .execute(&self.pool)
        .await?;

        Ok(upload)
    }

    /// Look up an upload by its public upload ID.
    pub async fn get_upload(&self, upload_id: &str) -> MetaResult<Option<MultipartUpload>> {
        let upload = sqlx::query_as::<Sqlite, MultipartUpload>(
            "SELECT id, upload_id, bucket_id, key, content_type, metadata, initiated_at \
             FROM multipart_uploads WHERE upload_id = ?",
        )
        .bind(upload_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(upload)
    }

    /// Insert or overwrite the part row for `(upload_id, part_number)`.
    pub async fn upsert_part(
        &self,
        upload_id: &str,
        part_number: i64,
        size: i64,
        etag: &str,
        storage_path: &str,
    ) -> MetaResult<MultipartPart> {
        let part = sqlx::query_as::<Sqlite, MultipartPart>(
            "INSERT INTO multipart_parts \
             (id, upload_id, part_number, size, etag, storage_path, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (upload_id, part_number) DO UPDATE SET \
                size = excluded.size, \
                etag = excluded.etag, \
                storage_path = excluded.storage_path, \
                created_at = excluded.created_at \
             RETURNING id, upload_id, part_number, size, etag, storage_path, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(upload_id)
        .bind(part_number)
        .bind(size)
        .bind(etag)
        .bind(storage_path)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(part)
    }

    /// List an upload's parts sorted by part number.
    pub async fn list_parts(&self, upload_id: &str) -> MetaResult<Vec<MultipartPart>> {
        let parts = sqlx::query_as::<Sqlite, MultipartPart>(
            "SELECT id, upload_id, part_number, size, etag, storage_path, created_at \
             FROM multipart_parts WHERE upload_id = ? ORDER BY part_number ASC",
        )
        .bind(upload_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(parts)
    }

    /// Drop an upload and (via cascade) its parts. Returns whether the
    /// upload existed.
    pub async fn delete_upload(&self, upload_id: &str) -> MetaResult<bool> {
        let result = sqlx::query("DELETE FROM multipart_uploads WHERE upload_id = ?")
            .bind(upload_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Commit a multipart completion: upsert the assembled object row and
    /// destroy the upload state, all in one transaction.
    pub async fn complete_upload(
        &self,
        upload: &MultipartUpload,
        size: i64,
        etag: &str,
        storage_path: &str,
    ) -> MetaResult<ObjectRecord> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let record = sqlx::query_as::<Sqlite, ObjectRecord>(&format!(
            "INSERT INTO objects \
             (id, bucket_id, key, size, etag, content_type, storage_path, metadata, last_modified, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (bucket_id, key) DO UPDATE SET \
                size = excluded.size, \
                etag = excluded.etag, \
                content_type = excluded.content_type, \
                storage_path = excluded.storage_path, \
                metadata = excluded.metadata, \
                last_modified = excluded.last_modified \
             RETURNING {OBJECT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(upload.bucket_id)
        .bind(&upload.key)
        .bind(size)
        .bind(etag)
        .bind(&upload.content_type)
        .bind(storage_path)
        .bind(&upload.metadata)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM multipart_parts WHERE upload_id = ?")
            .bind(&upload.upload_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM multipart_uploads WHERE upload_id = ?")
            .bind(&upload.upload_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            upload_id = %upload.upload_id,
            key = %upload.key,
            size,
            "multipart completion committed"
        );

        Ok(record)
    }
}

/// Escape `%` and `_` in a LIKE pattern so prefixes match literally.
fn escape_like(prefix: &str) -> String {
    prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::run_migrations;

    async fn store() -> MetaStore {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        run_migrations(&pool).await.expect("migrations");
        MetaStore::new(pool)
    }

    fn test_key(access_key_id: &str) -> AccessKey {
        let now = Utc::now();
        AccessKey {
            id: Uuid::new_v4(),
            access_key_id: access_key_id.to_owned(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY".to_owned(),
            display_name: "test".to_owned(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    async fn store_with_bucket() -> (MetaStore, Bucket) {
        let store = store().await;
        let key = test_key("AKIDTEST000000000001");
        store.insert_access_key(&key).await.expect("insert key");
        let bucket = store
            .insert_bucket("test-bucket", key.id, "us-east-1", "private", 0)
            .await
            .expect("insert bucket");
        (store, bucket)
    }

    // -----------------------------------------------------------------------
    // Access keys
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_should_insert_and_fetch_access_key() {
        let store = store().await;
        let key = test_key("AKIDTEST000000000001");
        store.insert_access_key(&key).await.expect("insert");

        let fetched = store
            .get_access_key("AKIDTEST000000000001")
            .await
            .expect("query")
            .expect("found");
        assert_eq!(fetched.id, key.id);
        assert!(fetched.is_active);
    }

    #[tokio::test]
    async fn test_should_disable_access_key() {
        let store = store().await;
        let key = test_key("AKIDTEST000000000001");
        store.insert_access_key(&key).await.expect("insert");

        store
            .set_access_key_active(key.id, false)
            .await
            .expect("disable");

        let fetched = store
            .get_access_key("AKIDTEST000000000001")
            .await
            .expect("query")
            .expect("found");
        assert!(!fetched.is_active);
    }

    #[tokio::test]
    async fn test_should_reassign_buckets_on_key_delete() {
        let store = store().await;
        let doomed = test_key("AKIDDOOMED0000000001");
        let survivor = test_key("AKIDSURVIVOR00000001");
        store.insert_access_key(&doomed).await.expect("insert");
        store.insert_access_key(&survivor).await.expect("insert");

        store
            .insert_bucket("orphan-bucket", doomed.id, "us-east-1", "private", 0)
            .await
            .expect("insert bucket");

        store.delete_access_key(doomed.id).await.expect("delete");

        let bucket = store
            .get_bucket("orphan-bucket")
            .await
            .expect("query")
            .expect("found");
        assert_eq!(bucket.owner_id, survivor.id);
    }

    #[tokio::test]
    async fn test_should_refuse_key_delete_without_survivor() {
        let store = store().await;
        let only = test_key("AKIDONLY000000000001");
        store.insert_access_key(&only).await.expect("insert");
        store
            .insert_bucket("kept-bucket", only.id, "us-east-1", "private", 0)
            .await
            .expect("insert bucket");

        let result = store.delete_access_key(only.id).await;
        assert!(matches!(result, Err(MetaError::NoSurvivingKey(_))));

        // The key and bucket are untouched.
        assert!(
            store
                .get_access_key("AKIDONLY000000000001")
                .await
                .expect("query")
                .is_some()
        );
    }

    // -----------------------------------------------------------------------
    // Buckets
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_should_reject_duplicate_bucket_name() {
        let (store, bucket) = store_with_bucket().await;

        let result = store
            .insert_bucket(&bucket.name, bucket.owner_id, "us-east-1", "private", 0)
            .await;
        assert!(matches!(result, Err(MetaError::BucketAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_should_delete_bucket_and_cascade_objects() {
        let (store, bucket) = store_with_bucket().await;
        store
            .upsert_object(
                bucket.id,
                "a.txt",
                3,
                "abc",
                "text/plain",
                "test-bucket/a.txt",
                "{}",
            )
            .await
            .expect("upsert");

        store.delete_bucket(&bucket.name).await.expect("delete");

        assert!(store.get_bucket(&bucket.name).await.expect("query").is_none());
        let (_, objects) = store.counts().await.expect("counts");
        assert_eq!(objects, 0, "object rows should cascade");
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_should_overwrite_object_on_upsert() {
        let (store, bucket) = store_with_bucket().await;

        let first = store
            .upsert_object(
                bucket.id,
                "k",
                3,
                "v1",
                "text/plain",
                "test-bucket/k",
                "{}",
            )
            .await
            .expect("first upsert");
        let second = store
            .upsert_object(
                bucket.id,
                "k",
                5,
                "v2",
                "application/json",
                "test-bucket/k",
                "{\"color\":\"blue\"}",
            )
            .await
            .expect("second upsert");

        assert_eq!(first.id, second.id, "row identity survives overwrite");
        assert_eq!(second.size, 5);
        assert_eq!(second.etag, "v2");
        assert_eq!(second.user_metadata().get("color").map(String::as_str), Some("blue"));
        assert_eq!(store.count_objects(bucket.id).await.expect("count"), 1);
    }

    #[tokio::test]
    async fn test_should_paginate_object_listing() {
        let (store, bucket) = store_with_bucket().await;
        for key in ["a", "b", "c", "d", "e"] {
            store
                .upsert_object(bucket.id, key, 1, "e", "text/plain", key, "{}")
                .await
                .expect("upsert");
        }

        let page1 = store
            .list_objects_page(bucket.id, "", None, 2)
            .await
            .expect("page 1");
        assert_eq!(
            page1.objects.iter().map(|o| o.key.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert!(page1.is_truncated);

        let page2 = store
            .list_objects_page(bucket.id, "", Some("b"), 2)
            .await
            .expect("page 2");
        assert_eq!(
            page2.objects.iter().map(|o| o.key.as_str()).collect::<Vec<_>>(),
            vec!["c", "d"]
        );
        assert!(page2.is_truncated);

        let page3 = store
            .list_objects_page(bucket.id, "", Some("d"), 2)
            .await
            .expect("page 3");
        assert_eq!(page3.objects.len(), 1);
        assert!(!page3.is_truncated);
    }

    #[tokio::test]
    async fn test_should_filter_listing_by_prefix() {
        let (store, bucket) = store_with_bucket().await;
        for key in ["logs/1", "logs/2", "data/1"] {
            store
                .upsert_object(bucket.id, key, 1, "e", "text/plain", key, "{}")
                .await
                .expect("upsert");
        }

        let page = store
            .list_objects_page(bucket.id, "logs/", None, 1000)
            .await
            .expect("page");
        assert_eq!(page.objects.len(), 2);
        assert!(page.objects.iter().all(|o| o.key.starts_with("logs/")));
    }

    #[tokio::test]
    async fn test_should_match_like_wildcards_literally() {
        let (store, bucket) = store_with_bucket().await;
        for key in ["a_b", "axb", "100%", "1000"] {
            store
                .upsert_object(bucket.id, key, 1, "e", "text/plain", key, "{}")
                .await
                .expect("upsert");
        }

        let page = store
            .list_objects_page(bucket.id, "a_", None, 1000)
            .await
            .expect("underscore prefix");
        assert_eq!(page.objects.len(), 1);
        assert_eq!(page.objects[0].key, "a_b");

        let page = store
            .list_objects_page(bucket.id, "100%", None, 1000)
            .await
            .expect("percent prefix");
        assert_eq!(page.objects.len(), 1);
        assert_eq!(page.objects[0].key, "100%");
    }

    #[tokio::test]
    async fn test_should_delete_object_idempotently() {
        let (store, bucket) = store_with_bucket().await;
        store
            .upsert_object(bucket.id, "k", 1, "e", "text/plain", "k", "{}")
            .await
            .expect("upsert");

        assert!(store.delete_object(bucket.id, "k").await.expect("first"));
        assert!(!store.delete_object(bucket.id, "k").await.expect("second"));
    }

    // -----------------------------------------------------------------------
    // Multipart
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_should_run_multipart_lifecycle() {
        let (store, bucket) = store_with_bucket().await;

        let upload = store
            .create_upload(bucket.id, "big/file.bin", "application/octet-stream", "{}")
            .await
            .expect("create upload");
        assert_eq!(upload.upload_id.len(), 32, "128-bit hex upload id");

        store
            .upsert_part(&upload.upload_id, 2, 4, "p2", "part-2")
            .await
            .expect("part 2");
        store
            .upsert_part(&upload.upload_id, 1, 4, "p1", "part-1")
            .await
            .expect("part 1");
        // Overwrite part 1.
        store
            .upsert_part(&upload.upload_id, 1, 6, "p1b", "part-1")
            .await
            .expect("part 1 overwrite");

        let parts = store.list_parts(&upload.upload_id).await.expect("list");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].part_number, 1);
        assert_eq!(parts[0].etag, "p1b");
        assert_eq!(parts[1].part_number, 2);

        let record = store
            .complete_upload(&upload, 10, "abc-2", "test-bucket/big/file.bin")
            .await
            .expect("complete");
        assert_eq!(record.key, "big/file.bin");
        assert_eq!(record.etag, "abc-2");

        // Upload state is gone.
        assert!(
            store
                .get_upload(&upload.upload_id)
                .await
                .expect("query")
                .is_none()
        );
        assert!(store.list_parts(&upload.upload_id).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn test_should_cascade_parts_on_upload_delete() {
        let (store, bucket) = store_with_bucket().await;
        let upload = store
            .create_upload(bucket.id, "k", "application/octet-stream", "{}")
            .await
            .expect("create");
        store
            .upsert_part(&upload.upload_id, 1, 1, "e", "part-1")
            .await
            .expect("part");

        assert!(store.delete_upload(&upload.upload_id).await.expect("delete"));
        assert!(store.list_parts(&upload.upload_id).await.expect("list").is_empty());
        assert!(!store.delete_upload(&upload.upload_id).await.expect("again"));
    }
}
