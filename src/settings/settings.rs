use anyhow::{Result, anyhow};
use chrono::TimeDelta;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    #[serde(default)]
    pub store: Store,
    #[serde(default)]
    pub http: Http,
    #[serde(default)]
    pub log: Log,
}

#[derive(Clone, Deserialize)]
pub struct Auth {
    pub signing_key: String,
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: u64,
    #[serde(default = "default_hasher")]
    pub hasher: String, // "bcrypt" or "argon2"
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    #[serde(default = "default_refresh_generator")]
    pub refresh_generator: String, // "random" or "derived"
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("signing_key", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("hasher", &self.hasher)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("refresh_generator", &self.refresh_generator)
            .finish()
    }
}

impl Auth {
    pub fn access_ttl(&self) -> Result<TimeDelta> {
        ttl("auth.access_ttl_secs", self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Result<TimeDelta> {
        ttl("auth.refresh_ttl_secs", self.refresh_ttl_secs)
    }
}

fn ttl(name: &str, secs: u64) -> Result<TimeDelta> {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(|| anyhow!("{} is out of range: {}", name, secs))
}

#[derive(Debug, Clone, Deserialize)]
pub struct Store {
    #[serde(default = "default_store_backend")]
    pub backend: String, // "memory", "redis" or "mysql"
    pub redis_url: Option<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    pub mysql_url: Option<String>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            redis_url: None,
            key_prefix: default_key_prefix(),
            mysql_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Http {
    #[serde(default = "default_address")]
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

impl Default for Http {
    fn default() -> Self {
        Self {
            address: default_address(),
            cert_path: None,
            key_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_access_ttl_secs() -> u64 {
    60 * 60 // 60 minutes
}

fn default_refresh_ttl_secs() -> u64 {
    30 * 24 * 60 * 60 // 30 days
}

fn default_hasher() -> String {
    "bcrypt".to_string()
}

fn default_bcrypt_cost() -> u32 {
    10
}

fn default_refresh_generator() -> String {
    "random".to_string()
}

fn default_store_backend() -> String {
    "memory".to_string()
}

fn default_key_prefix() -> String {
    "refresh_session".to_string()
}

fn default_address() -> String {
    "127.0.0.1:3333".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Environment overrides look like `ROTATOR_AUTH__SIGNING_KEY=...`.
pub const ENV_PREFIX: &str = "ROTATOR";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    if settings.auth.signing_key.is_empty() {
        return Err(anyhow!("auth.signing_key must not be empty"));
    }
    settings.auth.access_ttl()?;
    settings.auth.refresh_ttl()?;

    Ok(settings)
}
