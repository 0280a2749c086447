/// Configuration for the directory service
///
/// Loaded from built-in defaults overlaid with environment variables of the
/// form `DALIL__SECTION__KEY` (for example `DALIL__SERVER__PORT=8080`). A
/// `.env` file in the working directory is read first when present.
use anyhow::{bail, Result};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub pagination: PaginationConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Actix worker threads; 0 uses the number of CPU cores
    #[serde(default)]
    pub workers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    #[serde(default)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish()
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// HS256 key shared with the identity provider. Required; there is no
    /// default.
    #[serde(default)]
    pub jwt_secret: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}

/// Page sizes for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

impl PaginationConfig {
    /// Effective page size: absent or zero falls back to the default, larger
    /// requests are clamped to the maximum.
    pub fn resolve(&self, requested: Option<usize>) -> usize {
        match requested {
            None | Some(0) => self.default_limit,
            Some(n) => n.min(self.max_limit),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated origins, or `*` for any
    pub allowed_origins: String,
}

impl CorsConfig {
    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect()
    }
}

/// Shortest accepted HS256 secret.
const MIN_JWT_SECRET_LEN: usize = 32;

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", 0)?
            .set_default("database.backend", "memory")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("pagination.default_limit", 20)?
            .set_default("pagination.max_limit", 100)?
            .set_default("cors.allowed_origins", "*")?
            .add_source(
                config::Environment::with_prefix("DALIL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.backend == StorageBackend::Postgres && self.database.url.is_none() {
            bail!("database.url is required when database.backend is postgres");
        }
        if self.auth.jwt_secret.is_empty() {
            bail!("auth.jwt_secret is required (set DALIL__AUTH__JWT_SECRET)");
        }
        if self.auth.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            bail!(
                "auth.jwt_secret must be at least {} bytes",
                MIN_JWT_SECRET_LEN
            );
        }
        if self.pagination.default_limit == 0
            || self.pagination.default_limit > self.pagination.max_limit
        {
            bail!(
                "pagination.default_limit must be between 1 and pagination.max_limit ({})",
                self.pagination.max_limit
            );
        }
        Ok(())
    }
}
