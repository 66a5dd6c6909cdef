use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    /// Proxy kind name -> URL of its list.
    #[serde(default = "default_sources")]
    pub sources: BTreeMap<String, String>,

    #[serde(default)]
    pub updates: UpdateConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpdateConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_align_to_wall_clock")]
    pub align_to_wall_clock: bool,
    #[serde(default = "default_concurrent_downloads")]
    pub concurrent_downloads: usize,
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    File,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_backend")]
    pub backend: CacheBackend,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default)]
    pub github_client_id: Option<String>,
    #[serde(default)]
    pub github_client_secret: Option<String>,
    #[serde(default = "default_callback_url")]
    pub callback_url: String,
    #[serde(default)]
    pub session_secret: Option<String>,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default)]
    pub require_login: bool,
    #[serde(default = "default_session_max_age_secs")]
    pub session_max_age_secs: u64,
}

// Defaults
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_interval_secs() -> u64 {
    3600
}
fn default_align_to_wall_clock() -> bool {
    true
}
fn default_concurrent_downloads() -> usize {
    3
}
fn default_cache_backend() -> CacheBackend {
    CacheBackend::File
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> LogFormat {
    LogFormat::Text
}
fn default_callback_url() -> String {
    "http://localhost:3000/success".to_string()
}
fn default_database_path() -> PathBuf {
    PathBuf::from("proxy-shelf.db")
}
fn default_session_max_age_secs() -> u64 {
    7 * 24 * 3600
}
fn default_sources() -> BTreeMap<String, String> {
    let base = "https://raw.githubusercontent.com/ALIILAPRO/Proxy/main";
    ["http", "socks4", "socks5"]
        .into_iter()
        .map(|kind| (kind.to_string(), format!("{}/{}.txt", base, kind)))
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            sources: default_sources(),
            updates: UpdateConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            align_to_wall_clock: default_align_to_wall_clock(),
            concurrent_downloads: default_concurrent_downloads(),
            fetch_timeout_secs: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            github_client_id: None,
            github_client_secret: None,
            callback_url: default_callback_url(),
            session_secret: None,
            database_path: default_database_path(),
            require_login: false,
            session_max_age_secs: default_session_max_age_secs(),
        }
    }
}

impl UpdateConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }
}

impl AuthConfig {
    /// GitHub login is available only with both client credentials.
    pub fn github_enabled(&self) -> bool {
        self.github_client_id.is_some() && self.github_client_secret.is_some()
    }

    pub fn session_max_age(&self) -> Duration {
        Duration::from_secs(self.session_max_age_secs)
    }
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Failed to parse config TOML")?;
        Ok(config)
    }

    /// Applies environment overrides; `lookup` is `std::env::var` in production.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        if let Some(id) = lookup("GITHUB_CLIENT_ID") {
            self.auth.github_client_id = Some(id);
        }
        if let Some(secret) = lookup("GITHUB_CLIENT_SECRET") {
            self.auth.github_client_secret = Some(secret);
        }
        if let Some(url) = lookup("GITHUB_CALLBACK_URL") {
            self.auth.callback_url = url;
        }
        if let Some(secret) = lookup("SESSION_SECRET") {
            self.auth.session_secret = Some(secret);
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.host
            .parse::<IpAddr>()
            .with_context(|| format!("Invalid listen host '{}'", self.host))?;
        if self.updates.interval_secs == 0 {
            bail!("updates.interval_secs must be greater than zero");
        }
        if self.updates.concurrent_downloads == 0 {
            bail!("updates.concurrent_downloads must be greater than zero");
        }
        if self.auth.session_max_age_secs == 0 {
            bail!("auth.session_max_age_secs must be greater than zero");
        }
        if self.auth.require_login && !self.auth.github_enabled() {
            bail!("auth.require_login needs GitHub client id and secret");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.updates.interval(), Duration::from_secs(3600));
        assert_eq!(config.cache.backend, CacheBackend::File);
        assert_eq!(
            config.sources.get("socks5").map(String::as_str),
            Some("https://raw.githubusercontent.com/ALIILAPRO/Proxy/main/socks5.txt")
        );
        assert!(!config.auth.github_enabled());
        assert_eq!(config.auth.session_max_age(), Duration::from_secs(604_800));
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_partial_file() {
        let config = Config::parse(
            r#"
            port = 8088

            [sources]
            http = "https://example.com/http.txt"

            [updates]
            interval_secs = 600
            align_to_wall_clock = false

            [cache]
            backend = "memory"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8088);
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.updates.interval_secs, 600);
        assert!(!config.updates.align_to_wall_clock);
        assert_eq!(config.updates.concurrent_downloads, 3);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.data_dir, PathBuf::from("data"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_rejects_unknown_backend() {
        assert!(Config::parse("[cache]\nbackend = \"redis\"").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PORT", "9000"),
            ("GITHUB_CLIENT_ID", "id"),
            ("GITHUB_CLIENT_SECRET", "secret"),
            ("SESSION_SECRET", "s3cr3t"),
        ]);
        let mut config = Config::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.port, 9000);
        assert!(config.auth.github_enabled());
        assert_eq!(config.auth.session_secret.as_deref(), Some("s3cr3t"));
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        config.updates.interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.require_login = true;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.host = "localhost:80".to_string();
        assert!(config.validate().is_err());
    }
}
