//! The admin HTTP surface.
//!
//! A thin JSON CRUD layer over the same metadata store the S3 surface uses:
//! credential management, bucket administration, stats, and presigned link
//! generation. Everything except `login`/`verify` requires a bearer token
//! minted by [`crate::token`].

use std::net::IpAddr;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use http::{Method, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Deserialize;
use serde_json::json;
use subtle::ConstantTimeEq;
use tinbucket_http::S3ResponseBody;
use tinbucket_meta::{AccessKey, MetaError, MetaStore};
use tinbucket_model::validation::validate_bucket_name;
use tinbucket_store::FsStore;
use tracing::{info, warn};
use uuid::Uuid;

use crate::rate_limit::LoginRateLimiter;
use crate::token;

/// Entropy bytes in a generated secret key.
const SECRET_ENTROPY_BYTES: usize = 30;

/// Shared state for the admin surface.
pub struct AdminState {
    /// Admin username.
    pub username: String,
    /// Admin password.
    pub password: String,
    /// Token signing secret.
    pub secret: String,
    /// Login rate limiter.
    pub limiter: Arc<LoginRateLimiter>,
    /// The metadata store.
    pub meta: MetaStore,
    /// The filesystem store.
    pub store: FsStore,
    /// Region for admin-created buckets.
    pub region: String,
    /// Public host advertised in presigned links.
    pub public_host: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct CreateKeyRequest {
    #[serde(default)]
    display_name: String,
}

#[derive(Deserialize)]
struct UpdateKeyRequest {
    is_active: bool,
}

#[derive(Deserialize)]
struct CreateBucketRequest {
    name: String,
    #[serde(default)]
    owner_access_key_id: Option<String>,
    #[serde(default)]
    acl: Option<String>,
    #[serde(default)]
    max_size: Option<i64>,
}

/// Handle one `/admin/...` request.
pub async fn handle(
    state: &AdminState,
    req: http::Request<Incoming>,
    peer_ip: IpAddr,
) -> http::Response<S3ResponseBody> {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let query = req.uri().query().unwrap_or("").to_owned();

    let (parts, incoming) = req.into_parts();
    let body = match incoming.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => return error_json(StatusCode::BAD_REQUEST, "failed to read request body"),
    };

    let segments: Vec<&str> = path
        .strip_prefix("/admin/")
        .unwrap_or("")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match (&method, segments.as_slice()) {
        (&Method::POST, ["auth", "login"]) => login(state, &body, peer_ip).await,
        (&Method::POST, ["auth", "verify"]) => verify(state, &parts),

        _ => {
            // Everything else requires a valid token.
            if let Some(resp) = require_token(state, &parts) {
                return resp;
            }

            match (&method, segments.as_slice()) {
                (&Method::GET, ["keys"]) => list_keys(state).await,
                (&Method::POST, ["keys"]) => create_key(state, &body).await,
                (&Method::PATCH, ["keys", id]) => update_key(state, id, &body).await,
                (&Method::DELETE, ["keys", id]) => delete_key(state, id).await,
                (&Method::GET, ["buckets"]) => list_buckets(state).await,
                (&Method::POST, ["buckets"]) => create_bucket(state, &body).await,
                (&Method::DELETE, ["buckets", name]) => delete_bucket(state, name).await,
                (&Method::GET, ["buckets", name, "objects"]) => list_objects(state, name).await,
                (&Method::DELETE, ["buckets", name, "objects", rest @ ..]) => {
                    delete_object(state, name, &rest.join("/")).await
                }
                (&Method::GET, ["buckets", name, "link", rest @ ..]) => {
                    presign_link(state, name, &rest.join("/"), &query).await
                }
                (&Method::GET, ["stats"]) => stats(state).await,
                _ => error_json(StatusCode::NOT_FOUND, "unknown admin route"),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

async fn login(state: &AdminState, body: &Bytes, peer_ip: IpAddr) -> http::Response<S3ResponseBody> {
    if !state.limiter.check(peer_ip) {
        warn!(%peer_ip, "admin login rate limited");
        return error_json(StatusCode::TOO_MANY_REQUESTS, "too many login attempts");
    }

    let Ok(request) = serde_json::from_slice::<LoginRequest>(body) else {
        return error_json(StatusCode::BAD_REQUEST, "malformed login body");
    };

    let username_ok: bool = request
        .username
        .as_bytes()
        .ct_eq(state.username.as_bytes())
        .into();
    let password_ok: bool = request
        .password
        .as_bytes()
        .ct_eq(state.password.as_bytes())
        .into();

    if !(username_ok && password_ok) {
        warn!(%peer_ip, "admin login failed");
        return error_json(StatusCode::UNAUTHORIZED, "invalid credentials");
    }

    info!(%peer_ip, "admin login succeeded");
    let token = token::mint(&state.username, &state.secret);
    json_response(StatusCode::OK, &json!({ "token": token }))
}

fn verify(state: &AdminState, parts: &http::request::Parts) -> http::Response<S3ResponseBody> {
    match bearer_token(parts).and_then(|t| token::verify(&t, &state.secret).ok()) {
        Some(payload) => json_response(
            StatusCode::OK,
            &json!({ "valid": true, "sub": payload.sub, "exp": payload.exp }),
        ),
        None => error_json(StatusCode::UNAUTHORIZED, "invalid token"),
    }
}

/// Check the bearer token; `Some(response)` is the rejection to return.
fn require_token(
    state: &AdminState,
    parts: &http::request::Parts,
) -> Option<http::Response<S3ResponseBody>> {
    let valid = bearer_token(parts)
        .and_then(|t| token::verify(&t, &state.secret).ok())
        .is_some();
    if valid {
        None
    } else {
        Some(error_json(StatusCode::UNAUTHORIZED, "missing or invalid token"))
    }
}

fn bearer_token(parts: &http::request::Parts) -> Option<String> {
    parts
        .headers
        .get(http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .map(ToOwned::to_owned)
}

// ---------------------------------------------------------------------------
// Access keys
// ---------------------------------------------------------------------------

async fn list_keys(state: &AdminState) -> http::Response<S3ResponseBody> {
    match state.meta.list_access_keys().await {
        Ok(keys) => json_response(StatusCode::OK, &json!({ "keys": keys })),
        Err(err) => internal(err),
    }
}

async fn create_key(state: &AdminState, body: &Bytes) -> http::Response<S3ResponseBody> {
    let request: CreateKeyRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(_) if body.is_empty() => CreateKeyRequest {
            display_name: String::new(),
        },
        Err(_) => return error_json(StatusCode::BAD_REQUEST, "malformed key body"),
    };

    let now = Utc::now();
    let key = AccessKey {
        id: Uuid::new_v4(),
        access_key_id: generate_access_key_id(),
        secret_access_key: generate_secret_key(),
        display_name: request.display_name,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    if let Err(err) = state.meta.insert_access_key(&key).await {
        return internal(err);
    }

    info!(access_key_id = %key.access_key_id, "created access key");

    // The one and only time the secret leaves the server.
    json_response(
        StatusCode::CREATED,
        &json!({
            "id": key.id,
            "access_key_id": key.access_key_id,
            "secret_access_key": key.secret_access_key,
            "display_name": key.display_name,
            "is_active": key.is_active,
            "created_at": key.created_at,
        }),
    )
}

async fn update_key(state: &AdminState, id: &str, body: &Bytes) -> http::Response<S3ResponseBody> {
    let Ok(id) = Uuid::parse_str(id) else {
        return error_json(StatusCode::BAD_REQUEST, "invalid key id");
    };
    let Ok(request) = serde_json::from_slice::<UpdateKeyRequest>(body) else {
        return error_json(StatusCode::BAD_REQUEST, "malformed key body");
    };

    match state.meta.set_access_key_active(id, request.is_active).await {
        Ok(()) => json_response(StatusCode::OK, &json!({ "id": id, "is_active": request.is_active })),
        Err(MetaError::AccessKeyNotFound(_)) => error_json(StatusCode::NOT_FOUND, "no such key"),
        Err(err) => internal(err),
    }
}

async fn delete_key(state: &AdminState, id: &str) -> http::Response<S3ResponseBody> {
    let Ok(id) = Uuid::parse_str(id) else {
        return error_json(StatusCode::BAD_REQUEST, "invalid key id");
    };

    match state.meta.delete_access_key(id).await {
        Ok(()) => status_only(StatusCode::NO_CONTENT),
        Err(MetaError::AccessKeyNotFound(_)) => error_json(StatusCode::NOT_FOUND, "no such key"),
        Err(MetaError::NoSurvivingKey(_)) => error_json(
            StatusCode::CONFLICT,
            "key owns buckets and no other key exists to take them over",
        ),
        Err(err) => internal(err),
    }
}

// ---------------------------------------------------------------------------
// Buckets and objects
// ---------------------------------------------------------------------------

async fn list_buckets(state: &AdminState) -> http::Response<S3ResponseBody> {
    match state.meta.list_buckets().await {
        Ok(buckets) => json_response(StatusCode::OK, &json!({ "buckets": buckets })),
        Err(err) => internal(err),
    }
}

async fn create_bucket(state: &AdminState, body: &Bytes) -> http::Response<S3ResponseBody> {
    let Ok(request) = serde_json::from_slice::<CreateBucketRequest>(body) else {
        return error_json(StatusCode::BAD_REQUEST, "malformed bucket body");
    };
    if validate_bucket_name(&request.name).is_err() {
        return error_json(StatusCode::BAD_REQUEST, "invalid bucket name");
    }

    // Owner: the named key, or any existing key.
    let owner = match &request.owner_access_key_id {
        Some(akid) => state.meta.get_access_key(akid).await,
        None => state
            .meta
            .list_access_keys()
            .await
            .map(|keys| keys.into_iter().next()),
    };
    let owner = match owner {
        Ok(Some(key)) => key,
        Ok(None) => return error_json(StatusCode::BAD_REQUEST, "no access key to own the bucket"),
        Err(err) => return internal(err),
    };

    let acl = request.acl.as_deref().unwrap_or("private");
    let max_size = request.max_size.unwrap_or(0);

    match state
        .meta
        .insert_bucket(&request.name, owner.id, &state.region, acl, max_size)
        .await
    {
        Ok(bucket) => {
            if let Err(err) = state.store.create_bucket_dir(&bucket.name).await {
                return internal(err);
            }
            info!(bucket = %bucket.name, "admin created bucket");
            json_response(StatusCode::CREATED, &json!({ "bucket": bucket }))
        }
        Err(MetaError::BucketAlreadyExists(_)) => {
            error_json(StatusCode::CONFLICT, "bucket already exists")
        }
        Err(err) => internal(err),
    }
}

/// Admin bucket delete purges all objects first, unlike the S3 surface.
async fn delete_bucket(state: &AdminState, name: &str) -> http::Response<S3ResponseBody> {
    let bucket = match state.meta.get_bucket(name).await {
        Ok(Some(bucket)) => bucket,
        Ok(None) => return error_json(StatusCode::NOT_FOUND, "no such bucket"),
        Err(err) => return internal(err),
    };

    let keys = match state.meta.list_keys(bucket.id).await {
        Ok(keys) => keys,
        Err(err) => return internal(err),
    };
    for key in keys {
        if let Err(err) = state.meta.delete_object(bucket.id, &key).await {
            return internal(err);
        }
    }

    if let Err(err) = state.meta.delete_bucket(name).await {
        return internal(err);
    }
    if let Err(err) = state.store.remove_bucket_dir(name).await {
        return internal(err);
    }

    info!(bucket = %name, "admin purged and deleted bucket");
    status_only(StatusCode::NO_CONTENT)
}

async fn list_objects(state: &AdminState, name: &str) -> http::Response<S3ResponseBody> {
    let bucket = match state.meta.get_bucket(name).await {
        Ok(Some(bucket)) => bucket,
        Ok(None) => return error_json(StatusCode::NOT_FOUND, "no such bucket"),
        Err(err) => return internal(err),
    };

    match state.meta.list_objects_page(bucket.id, "", None, 1000).await {
        Ok(page) => json_response(
            StatusCode::OK,
            &json!({ "objects": page.objects, "truncated": page.is_truncated }),
        ),
        Err(err) => internal(err),
    }
}

async fn delete_object(state: &AdminState, name: &str, key: &str) -> http::Response<S3ResponseBody> {
    let bucket = match state.meta.get_bucket(name).await {
        Ok(Some(bucket)) => bucket,
        Ok(None) => return error_json(StatusCode::NOT_FOUND, "no such bucket"),
        Err(err) => return internal(err),
    };

    if let Err(err) = state.store.delete_object(name, key).await {
        return internal(err);
    }
    match state.meta.delete_object(bucket.id, key).await {
        Ok(_) => status_only(StatusCode::NO_CONTENT),
        Err(err) => internal(err),
    }
}

/// Generate a V4 presigned GET link for an object, signed with the bucket
/// owner's key.
async fn presign_link(
    state: &AdminState,
    name: &str,
    key: &str,
    query: &str,
) -> http::Response<S3ResponseBody> {
    let bucket = match state.meta.get_bucket(name).await {
        Ok(Some(bucket)) => bucket,
        Ok(None) => return error_json(StatusCode::NOT_FOUND, "no such bucket"),
        Err(err) => return internal(err),
    };

    let owner = match state.meta.get_access_key_by_id(bucket.owner_id).await {
        Ok(Some(owner)) => owner,
        Ok(None) => return error_json(StatusCode::CONFLICT, "bucket owner key is gone"),
        Err(err) => return internal(err),
    };

    let expires: u64 = query
        .split('&')
        .find_map(|param| param.strip_prefix("expires="))
        .and_then(|v| v.parse().ok())
        .unwrap_or(3600);

    let url = tinbucket_auth::generate_presigned_url(
        "http",
        &state.public_host,
        name,
        key,
        &owner.access_key_id,
        &owner.secret_access_key,
        &bucket.region,
        expires,
    );

    json_response(StatusCode::OK, &json!({ "url": url, "expires_in": expires }))
}

async fn stats(state: &AdminState) -> http::Response<S3ResponseBody> {
    let (buckets, objects) = match state.meta.counts().await {
        Ok(counts) => counts,
        Err(err) => return internal(err),
    };
    let total_bytes = match state.store.total_size().await {
        Ok(total) => total,
        Err(err) => return internal(err),
    };

    json_response(
        StatusCode::OK,
        &json!({
            "buckets": buckets,
            "objects": objects,
            "total_bytes": total_bytes,
        }),
    )
}

// ---------------------------------------------------------------------------
// Key material and responses
// ---------------------------------------------------------------------------

/// `AK` plus 18 random uppercase alphanumerics: 20 characters total.
fn generate_access_key_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .filter(|b: &u8| b.is_ascii_uppercase() || b.is_ascii_digit())
        .take(18)
        .map(char::from)
        .collect();
    format!("AK{suffix}")
}

/// URL-safe base64 of 30 random bytes: 40 characters of secret material.
fn generate_secret_key() -> String {
    use base64::Engine;
    let mut bytes = [0u8; SECRET_ENTROPY_BYTES];
    rand::rng().fill(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn json_response(status: StatusCode, value: &serde_json::Value) -> http::Response<S3ResponseBody> {
    http::Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(S3ResponseBody::from_string(value.to_string()))
        .unwrap_or_else(|_| status_only(StatusCode::INTERNAL_SERVER_ERROR))
}

fn error_json(status: StatusCode, message: &str) -> http::Response<S3ResponseBody> {
    json_response(status, &json!({ "error": message }))
}

fn status_only(status: StatusCode) -> http::Response<S3ResponseBody> {
    let mut resp = http::Response::new(S3ResponseBody::empty());
    *resp.status_mut() = status;
    resp
}

fn internal(err: impl std::fmt::Display) -> http::Response<S3ResponseBody> {
    warn!(error = %err, "admin operation failed");
    error_json(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}
