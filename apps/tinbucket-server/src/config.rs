//! Configuration for the TinBucket server.
//!
//! All configuration is environment-driven.

/// Server configuration, loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// SQLite database URL.
    pub database_url: String,
    /// Connection pool size.
    pub db_max_conn: u32,
    /// Object storage root directory.
    pub storage_path: String,
    /// Region reported for buckets.
    pub region: String,
    /// Public host advertised in presigned links.
    pub public_host: String,
    /// Allowed CORS origins (comma-separated); `None` allows any origin.
    pub cors_origins: Option<Vec<String>>,
    /// Admin username; the admin surface is disabled when unset.
    pub admin_username: Option<String>,
    /// Admin password.
    pub admin_password: Option<String>,
    /// Secret used to sign admin tokens.
    pub jwt_secret: Option<String>,
    /// Log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 3000,
            database_url: "sqlite://data/tinbucket.db?mode=rwc".to_owned(),
            db_max_conn: 10,
            storage_path: "./storage".to_owned(),
            region: "us-east-1".to_owned(),
            public_host: "127.0.0.1:3000".to_owned(),
            cors_origins: None,
            admin_username: None,
            admin_password: None,
            jwt_secret: None,
            log_level: "info".to_owned(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("HOST") {
            config.host = v;
        }
        if let Ok(v) = std::env::var("PORT") {
            if let Ok(port) = v.parse() {
                config.port = port;
            }
        }
        if let Ok(v) = std::env::var("DATABASE_URL") {
            config.database_url = v;
        }
        if let Ok(v) = std::env::var("DB_MAX_CONN") {
            if let Ok(n) = v.parse() {
                config.db_max_conn = n;
            }
        }
        if let Ok(v) = std::env::var("STORAGE_PATH") {
            config.storage_path = v;
        }
        if let Ok(v) = std::env::var("S3_REGION") {
            config.region = v;
        }
        if let Ok(v) = std::env::var("S3_PUBLIC_HOST") {
            config.public_host = v;
        }
        if let Ok(v) = std::env::var("CORS_ORIGIN") {
            let origins: Vec<String> = v
                .split(',')
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect();
            if !origins.is_empty() {
                config.cors_origins = Some(origins);
            }
        }
        if let Ok(v) = std::env::var("ADMIN_USERNAME") {
            config.admin_username = Some(v);
        }
        if let Ok(v) = std::env::var("ADMIN_PASSWORD") {
            config.admin_password = Some(v);
        }
        if let Ok(v) = std::env::var("JWT_SECRET") {
            config.jwt_secret = Some(v);
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// The socket address string to bind.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
