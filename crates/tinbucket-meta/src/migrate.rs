//! Embedded schema migration.
//!
//! The schema is created at startup with idempotent DDL. SQLite enforces the
//! `ON DELETE CASCADE` clauses only when the connection has
//! `PRAGMA foreign_keys = ON`; the server enables it via its connect
//! options, and [`run_migrations`] re-asserts it defensively for ad-hoc
//! pools (tests, tooling).

use sqlx::SqlitePool;
use tracing::info;

/// Idempotent DDL statements, executed in order.
const SCHEMA: &[&str] = &[
    "PRAGMA foreign_keys = ON",
    "CREATE TABLE IF NOT EXISTS access_keys (
        id TEXT PRIMARY KEY,
        access_key_id TEXT NOT NULL UNIQUE,
        secret_access_key TEXT NOT NULL,
        display_name TEXT NOT NULL DEFAULT '',
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS buckets (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        owner_id TEXT NOT NULL REFERENCES access_keys(id),
        region TEXT NOT NULL,
        acl TEXT NOT NULL DEFAULT 'private',
        max_size INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS objects (
        id TEXT PRIMARY KEY,
        bucket_id TEXT NOT NULL REFERENCES buckets(id) ON DELETE CASCADE,
        key TEXT NOT NULL,
        size INTEGER NOT NULL DEFAULT 0,
        etag TEXT NOT NULL,
        content_type TEXT NOT NULL DEFAULT 'application/octet-stream',
        storage_path TEXT NOT NULL,
        metadata TEXT NOT NULL DEFAULT '{}',
        last_modified TEXT NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (bucket_id, key)
    )",
    "CREATE INDEX IF NOT EXISTS idx_objects_bucket_key ON objects (bucket_id, key)",
    "CREATE TABLE IF NOT EXISTS multipart_uploads (
        id TEXT PRIMARY KEY,
        upload_id TEXT NOT NULL UNIQUE,
        bucket_id TEXT NOT NULL REFERENCES buckets(id) ON DELETE CASCADE,
        key TEXT NOT NULL,
        content_type TEXT NOT NULL DEFAULT 'application/octet-stream',
        metadata TEXT NOT NULL DEFAULT '{}',
        initiated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS multipart_parts (
        id TEXT PRIMARY KEY,
        upload_id TEXT NOT NULL REFERENCES multipart_uploads(upload_id) ON DELETE CASCADE,
        part_number INTEGER NOT NULL,
        size INTEGER NOT NULL DEFAULT 0,
        etag TEXT NOT NULL,
        storage_path TEXT NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (upload_id, part_number)
    )",
];

/// Create the schema if it does not exist yet.
///
/// # Errors
///
/// Returns the underlying `sqlx::Error` if any statement fails.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for stmt in SCHEMA {
        sqlx::query(stmt).execute(pool).await?;
    }
    info!("metadata schema is up to date");
    Ok(())
}
