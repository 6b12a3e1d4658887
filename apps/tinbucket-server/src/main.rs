//! TinBucket server - self-hosted S3-compatible object storage.
//!
//! Objects live on the local filesystem; buckets, credentials, and multipart
//! state live in SQLite. Clients talk to the S3 surface with SigV4-signed
//! requests (header or presigned), legacy V2 presigned links, or anonymous
//! reads on public buckets. A JSON admin surface under `/admin` manages
//! credentials and buckets.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HOST` / `PORT` | `0.0.0.0` / `3000` | Bind address |
//! | `DATABASE_URL` | `sqlite://data/tinbucket.db?mode=rwc` | Metadata database |
//! | `DB_MAX_CONN` | `10` | Connection pool size |
//! | `STORAGE_PATH` | `./storage` | Object storage root |
//! | `S3_REGION` | `us-east-1` | Default bucket region |
//! | `S3_PUBLIC_HOST` | `127.0.0.1:3000` | Host used in presigned links |
//! | `CORS_ORIGIN` | *(any)* | Comma-separated allowed origins |
//! | `ADMIN_USERNAME` / `ADMIN_PASSWORD` / `JWT_SECRET` | *(unset)* | Enable the admin surface |
//! | `LOG_LEVEL` | `info` | Log filter (overridden by `RUST_LOG`) |

mod admin;
mod config;
mod rate_limit;
mod token;

use std::convert::Infallible;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper::body::Incoming;
use hyper::service::Service;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tinbucket_http::{S3Service, ServiceConfig, TinBucketS3};
use tinbucket_meta::{MetaStore, run_migrations};
use tinbucket_store::FsStore;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::admin::AdminState;
use crate::config::Config;
use crate::rate_limit::LoginRateLimiter;

/// The gateway service for one connection: `/admin` goes to the admin
/// surface, everything else to the S3 service.
#[derive(Clone)]
struct GatewayService {
    s3: S3Service,
    admin: Option<Arc<AdminState>>,
    peer_ip: IpAddr,
}

impl Service<http::Request<Incoming>> for GatewayService {
    type Response = http::Response<tinbucket_http::S3ResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        if req.uri().path().starts_with("/admin") {
            let admin = self.admin.clone();
            let peer_ip = self.peer_ip;
            return Box::pin(async move {
                let response = match admin {
                    Some(state) => admin::handle(&state, req, peer_ip).await,
                    None => {
                        let mut resp =
                            http::Response::new(tinbucket_http::S3ResponseBody::from_string(
                                r#"{"error":"admin surface is not configured"}"#,
                            ));
                        *resp.status_mut() = http::StatusCode::NOT_FOUND;
                        resp
                    }
                };
                Ok(response)
            });
        }

        self.s3.call(req)
    }
}

/// Initialize tracing from `RUST_LOG`, falling back to the configured level.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Ensure the SQLite database's parent directory exists.
async fn prepare_database_dir(database_url: &str) -> Result<()> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    let path = path.split('?').next().unwrap_or(path);

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create database directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Build the admin state when all three admin settings are present.
fn build_admin_state(
    cfg: &Config,
    meta: MetaStore,
    store: FsStore,
) -> Option<Arc<AdminState>> {
    let (Some(username), Some(password), Some(secret)) = (
        cfg.admin_username.clone(),
        cfg.admin_password.clone(),
        cfg.jwt_secret.clone(),
    ) else {
        warn!("ADMIN_USERNAME/ADMIN_PASSWORD/JWT_SECRET not fully set; admin surface disabled");
        return None;
    };

    let limiter = Arc::new(LoginRateLimiter::new());
    LoginRateLimiter::spawn_sweeper(Arc::clone(&limiter));

    Some(Arc::new(AdminState {
        username,
        password,
        secret,
        limiter,
        meta,
        store,
        region: cfg.region.clone(),
        public_host: cfg.public_host.clone(),
    }))
}

/// Run the accept loop until a shutdown signal arrives, then drain.
async fn serve(listener: TcpListener, s3: S3Service, admin: Option<Arc<AdminState>>) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = GatewayService {
                    s3: s3.clone(),
                    admin: admin.clone(),
                    peer_ip: peer_addr.ip(),
                };
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    init_tracing(&cfg.log_level)?;

    info!(
        bind = %cfg.bind_addr(),
        storage = %cfg.storage_path,
        region = %cfg.region,
        version = env!("CARGO_PKG_VERSION"),
        "starting TinBucket server"
    );

    // Metadata store.
    prepare_database_dir(&cfg.database_url).await?;
    let options = SqliteConnectOptions::from_str(&cfg.database_url)
        .with_context(|| format!("invalid DATABASE_URL: {}", cfg.database_url))?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.db_max_conn)
        .connect_with(options)
        .await
        .context("failed to connect to the metadata database")?;
    run_migrations(&pool).await.context("schema migration failed")?;
    let meta = MetaStore::new(pool);

    // Object store.
    let store = FsStore::new(&cfg.storage_path);
    store
        .ensure_root()
        .await
        .context("failed to create the storage root")?;

    // S3 surface.
    let provider = Arc::new(TinBucketS3::new(
        meta.clone(),
        store.clone(),
        ServiceConfig {
            region: cfg.region.clone(),
            cors_origins: cfg.cors_origins.clone(),
        },
    ));
    let s3 = S3Service::new(provider);

    // Admin surface.
    let admin = build_admin_state(&cfg, meta, store);

    let addr: SocketAddr = cfg
        .bind_addr()
        .parse()
        .with_context(|| format!("invalid bind address: {}", cfg.bind_addr()))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, s3, admin).await
}
