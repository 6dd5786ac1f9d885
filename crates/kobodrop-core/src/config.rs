//! Configuration module
//!
//! Settings come from the process environment (and a `.env` file when present).
//! Every value has a default suitable for local development except the storage
//! backend settings, which `validate` checks against the selected backend.

use std::env;

use crate::storage_types::StorageBackend;
use crate::validation::{ALLOWED_EXTENSIONS, MAX_FILE_SIZE_BYTES};

// Common constants
const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const HTTP_CONCURRENCY_LIMIT: usize = 512;
const SESSION_TTL_DAYS: i64 = 90;
const MAX_CODE_ATTEMPTS: u32 = 16;
/// 50 MiB
const PROXY_MAX_BYTES: u64 = 52_428_800;
const UPSTREAM_TIMEOUT_SECS: u64 = 300;

/// HTTP server settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub http_concurrency_limit: usize,
    /// Absolute base used when rendering links outside the API, e.g. `https://drop.example.com`
    pub public_base_url: Option<String>,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    /// Postgres connection string. Without it, sessions and files live in process memory.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, R2, ...)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Sessions
    pub session_ttl_days: i64,
    pub max_code_attempts: u32,
    // Uploads
    pub max_file_size_bytes: u64,
    pub allowed_extensions: Vec<String>,
    // Downloads
    pub proxy_max_bytes: u64,
    pub upstream_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins: Vec<String> = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: var("PORT")
                .unwrap_or_else(|| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            http_concurrency_limit: var("HTTP_CONCURRENCY_LIMIT")
                .and_then(|s| s.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(HTTP_CONCURRENCY_LIMIT),
            public_base_url: var("PUBLIC_BASE_URL")
                .filter(|s| !s.is_empty())
                .map(|s| s.trim_end_matches('/').to_string()),
        };

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::Local,
        };

        let allowed_extensions = var("ALLOWED_EXTENSIONS")
            .map(|s| {
                s.split(',')
                    .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect());

        Ok(Config {
            base,
            database_url: var("DATABASE_URL").filter(|s| !s.is_empty()),
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: var("DB_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend,
            s3_bucket: var("S3_BUCKET").filter(|s| !s.is_empty()),
            s3_region: var("S3_REGION").filter(|s| !s.is_empty()),
            s3_endpoint: var("S3_ENDPOINT").filter(|s| !s.is_empty()),
            aws_region: var("AWS_REGION").filter(|s| !s.is_empty()),
            local_storage_path: var("LOCAL_STORAGE_PATH")
                .or_else(|| Some("./data/media".to_string())),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL")
                .or_else(|| Some(format!("http://localhost:{}/media", base_port(&var)))),
            session_ttl_days: var("SESSION_TTL_DAYS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(SESSION_TTL_DAYS),
            max_code_attempts: var("MAX_CODE_ATTEMPTS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CODE_ATTEMPTS),
            max_file_size_bytes: var("MAX_FILE_SIZE_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_FILE_SIZE_BYTES),
            allowed_extensions,
            proxy_max_bytes: var("PROXY_MAX_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(PROXY_MAX_BYTES),
            upstream_timeout_secs: var("UPSTREAM_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(UPSTREAM_TIMEOUT_SECS),
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.base.cors_origins
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session_ttl_days)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.is_production() && self.database_url.is_none() {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be set in production; the in-memory store loses data on restart"
            ));
        }

        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if self.session_ttl_days <= 0 {
            return Err(anyhow::anyhow!("SESSION_TTL_DAYS must be positive"));
        }

        if self.max_code_attempts == 0 {
            return Err(anyhow::anyhow!("MAX_CODE_ATTEMPTS must be at least 1"));
        }

        if self.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_EXTENSIONS must not be empty"));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

fn base_port<F>(var: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    var("PORT").unwrap_or_else(|| SERVER_PORT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server_port(), 4000);
        assert_eq!(config.session_ttl_days, 90);
        assert_eq!(config.proxy_max_bytes, 52_428_800);
        assert_eq!(config.max_file_size_bytes, 5 * 1024 * 1024 * 1024);
        assert_eq!(config.storage_backend, StorageBackend::Local);
        assert_eq!(
            config.local_storage_base_url.as_deref(),
            Some("http://localhost:4000/media")
        );
        assert!(config.database_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_port_is_an_error() {
        assert!(config_from(&[("PORT", "not-a-port")]).is_err());
    }

    #[test]
    fn production_requires_explicit_cors_and_database() {
        let config = config_from(&[("ENVIRONMENT", "production")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[
            ("ENVIRONMENT", "production"),
            ("CORS_ORIGINS", "https://drop.example.com"),
            ("DATABASE_URL", "postgresql://localhost/kobodrop"),
        ])
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn s3_requires_bucket_and_region() {
        let config = config_from(&[("STORAGE_BACKEND", "s3")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[
            ("STORAGE_BACKEND", "s3"),
            ("S3_BUCKET", "books"),
            ("AWS_REGION", "eu-west-1"),
        ])
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn extension_list_is_normalized() {
        let config = config_from(&[("ALLOWED_EXTENSIONS", ".EPUB, pdf ,,")]).unwrap();
        assert_eq!(config.allowed_extensions, vec!["epub", "pdf"]);
    }
}
