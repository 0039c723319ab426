//! Server configuration.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! environment variables:
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 3001
//!
//! [database]
//! url = "${DATABASE_URL}"
//! max_connections = 16
//!
//! [auth]
//! secret_key = "${SECRET_KEY}"
//! bcrypt_work_factor = 12
//! token_ttl_secs = 86400
//! ```

use anyhow::Context as _;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "jobly.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub server: HttpConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql:///jobly".to_string(),
            max_connections: jobly::pool::DEFAULT_MAX_SIZE,
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub secret_key: String,
    pub bcrypt_work_factor: u32,
    pub token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: "secret-dev".to_string(),
            bcrypt_work_factor: 12,
            token_ttl_secs: 24 * 60 * 60,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &"<redacted>")
            .field("bcrypt_work_factor", &self.bcrypt_work_factor)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

impl ServerConfig {
    /// Load `.env`, the config file named by `JOBLY_CONFIG` (or `jobly.toml`
    /// when present), and environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let explicit = std::env::var_os("JOBLY_CONFIG").map(PathBuf::from);
        let path = match explicit {
            Some(path) => Some(path),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.is_file().then_some(default)
            }
        };

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Parse TOML and expand `${VAR}` references in string values.
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.expand_env()?;
        Ok(config)
    }

    fn expand_env(&mut self) -> anyhow::Result<()> {
        self.server.host = expand_env_vars(&self.server.host)?;
        self.database.url = expand_env_vars(&self.database.url)?;
        self.auth.secret_key = expand_env_vars(&self.auth.secret_key)?;
        Ok(())
    }

    /// Override fields from environment variables, looked up through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(v) = var("HOST") {
            self.server.host = v;
        }
        if let Some(v) = var("PORT") {
            self.server.port = v.parse().with_context(|| format!("invalid PORT: {v}"))?;
        }
        if let Some(v) = var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v
                .parse()
                .with_context(|| format!("invalid DATABASE_MAX_CONNECTIONS: {v}"))?;
        }
        if let Some(v) = var("SECRET_KEY") {
            self.auth.secret_key = v;
        }
        if let Some(v) = var("BCRYPT_WORK_FACTOR") {
            self.auth.bcrypt_work_factor = v
                .parse()
                .with_context(|| format!("invalid BCRYPT_WORK_FACTOR: {v}"))?;
        }
        if let Some(v) = var("TOKEN_TTL_SECS") {
            self.auth.token_ttl_secs = v
                .parse()
                .with_context(|| format!("invalid TOKEN_TTL_SECS: {v}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.url.trim().is_empty() {
            anyhow::bail!("database.url must not be empty");
        }
        if self.database.max_connections == 0 {
            anyhow::bail!("database.max_connections must be positive");
        }
        if self.auth.secret_key.is_empty() {
            anyhow::bail!("auth.secret_key must not be empty");
        }
        if !(4..=31).contains(&self.auth.bcrypt_work_factor) {
            anyhow::bail!(
                "auth.bcrypt_work_factor must be between 4 and 31, got {}",
                self.auth.bcrypt_work_factor
            );
        }
        if self.auth.token_ttl_secs <= 0 {
            anyhow::bail!("auth.token_ttl_secs must be positive");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Replace each `${VAR}` with its value. A `$` not followed by `{` is literal.
fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some((key, tail)) = after.split_once('}') else {
            anyhow::bail!("unterminated env var reference: ${{{after}");
        };
        anyhow::ensure!(!key.is_empty(), "empty env var reference in {input:?}");
        let value = std::env::var(key)
            .with_context(|| format!("config references unset env var {key}"))?;
        out.push_str(&value);
        rest = tail;
    }

    out.push_str(rest);
    Ok(out)
}
