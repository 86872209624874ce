//! Application configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: Hardcoded in struct `Default` implementations
//! 2. **Config file**: TOML file specified by `PROTECT_CONFIG` env var
//! 3. **Environment variables**: `PROTECT__*` env vars override specific fields
//!
//! # Configuration Sections
//!
//! - [`ServerConfig`]: HTTP listener, limits and the documentation redirect
//! - [`RelayConfig`]: Proxy and relay endpoints plus the relay signing key
//! - [`AdmissionConfig`]: Origin blacklist
//! - [`DedupConfig`]: Transaction dedup window and sweep cadence
//! - [`LoggingConfig`]: Log level and format
//!
//! # Example
//!
//! ```toml
//! [server]
//! bind_address = "0.0.0.0"
//! bind_port = 9000
//!
//! [relay]
//! proxy_url = "http://127.0.0.1:8545"
//! relay_url = "https://relay.flashbots.net"
//!
//! [admission]
//! blacklist = ["127.0.0.2", "10.13."]
//! ```
//!
//! The signing key is best supplied through `PROTECT__RELAY__SIGNING_KEY`
//! rather than the file.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

pub const DEFAULT_DOCS_URL: &str = "https://docs.flashbots.net/flashbots-protect/rpc/quick-start/";

/// HTTP server configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// IP address to bind the server to. Defaults to `127.0.0.1`.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port number to listen on. Must be greater than 0. Defaults to `9000`.
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// Maximum number of in-flight requests. Defaults to `1000`.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Upper bound on a single delegated request, in seconds. Defaults to `30`.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Largest accepted request body. Defaults to 1 MiB.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Target of the `GET /` redirect.
    #[serde(default = "default_docs_url")]
    pub docs_url: String,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    9000
}

fn default_max_concurrent_requests() -> usize {
    1000
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_docs_url() -> String {
    DEFAULT_DOCS_URL.to_string()
}

/// Downstream endpoints and the key used to authenticate relay submissions.
#[derive(Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Endpoint receiving every non-transaction method.
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,

    /// Endpoint receiving signed `eth_sendPrivateTransaction` submissions.
    #[serde(default = "default_relay_url")]
    pub relay_url: String,

    /// Hex-encoded secp256k1 private key, `0x` prefix optional.
    #[serde(default, skip_serializing)]
    pub signing_key: Option<String>,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("proxy_url", &self.proxy_url)
            .field("relay_url", &self.relay_url)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn default_proxy_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_relay_url() -> String {
    "https://relay.flashbots.net".to_string()
}

/// Admission control applied to `POST /` before any processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Origin prefixes that are refused. Matching is a literal string prefix.
    #[serde(default = "default_blacklist")]
    pub blacklist: Vec<String>,
}

fn default_blacklist() -> Vec<String> {
    vec!["127.0.0.2".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// How long a forwarded transaction suppresses resubmissions. Defaults to `1200`.
    #[serde(default = "default_retention_seconds")]
    pub retention_seconds: u64,

    /// Interval between sweeps of expired entries. Defaults to `60`.
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

fn default_retention_seconds() -> u64 {
    1200
}

fn default_sweep_interval_seconds() -> u64 {
    60
}

/// Application logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "trace", "debug", "info", "warn", "error"). Defaults to `"info"`.
    pub level: String,

    /// Output format: `"json"` or `"pretty"`. Defaults to `"pretty"`.
    pub format: String,
}

/// Root application configuration.
///
/// Loaded with the `PROTECT` prefix for environment overrides using `__` as a
/// separator, e.g. `PROTECT__SERVER__BIND_PORT=8080`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub admission: AdmissionConfig,

    #[serde(default)]
    pub dedup: DedupConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            max_concurrent_requests: default_max_concurrent_requests(),
            request_timeout_seconds: default_request_timeout_seconds(),
            max_body_bytes: default_max_body_bytes(),
            docs_url: default_docs_url(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { proxy_url: default_proxy_url(), relay_url: default_relay_url(), signing_key: None }
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self { blacklist: default_blacklist() }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            retention_seconds: default_retention_seconds(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file with environment variable overrides.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be parsed or deserialized.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_builder = Config::builder()
            .set_default("server.bind_address", "127.0.0.1")?
            .set_default("server.bind_port", 9000)?
            .set_default("server.max_concurrent_requests", 1000)?
            .set_default("server.request_timeout_seconds", 30)?
            .set_default("server.max_body_bytes", 1_048_576)?
            .set_default("server.docs_url", DEFAULT_DOCS_URL)?
            .set_default("relay.proxy_url", default_proxy_url())?
            .set_default("relay.relay_url", default_relay_url())?
            .set_default("dedup.retention_seconds", 1200)?
            .set_default("dedup.sweep_interval_seconds", 60)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(false))
            .add_source(
                Environment::with_prefix("PROTECT")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("admission.blacklist"),
            )
            .build()?;

        config_builder.try_deserialize()
    }

    /// Loads configuration from `config/config.toml` with fallback to defaults.
    ///
    /// The config file path can be overridden using the `PROTECT_CONFIG` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("PROTECT_CONFIG").unwrap_or_else(|_| "config/config.toml".to_string());
        Self::from_file(&config_path)
    }

    /// Returns the parsed socket address for the HTTP server.
    ///
    /// # Errors
    ///
    /// Returns an error string if the address cannot be parsed into a valid [`SocketAddr`].
    ///
    /// [`SocketAddr`]: std::net::SocketAddr
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, String> {
        format!("{}:{}", self.server.bind_address, self.server.bind_port)
            .parse()
            .map_err(|_| {
                format!(
                    "Invalid socket address: {}:{}",
                    self.server.bind_address, self.server.bind_port
                )
            })
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_seconds)
    }

    #[must_use]
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.dedup.retention_seconds)
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.dedup.sweep_interval_seconds)
    }

    /// Validates the configuration for correctness and consistency.
    ///
    /// The signing key is not checked here; it is parsed when the signer is built.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        validate_url("proxy_url", &self.relay.proxy_url)?;
        validate_url("relay_url", &self.relay.relay_url)?;
        validate_url("docs_url", &self.server.docs_url)?;

        if self.server.bind_port == 0 {
            return Err("Bind port must be greater than 0".to_string());
        }

        if self.server.max_concurrent_requests == 0 {
            return Err("Max concurrent requests must be greater than 0".to_string());
        }

        if self.server.request_timeout_seconds == 0 {
            return Err("Request timeout must be greater than 0".to_string());
        }

        if self.server.max_body_bytes == 0 {
            return Err("Max body bytes must be greater than 0".to_string());
        }

        if self.dedup.retention_seconds == 0 {
            return Err("Dedup retention must be greater than 0".to_string());
        }

        if self.dedup.sweep_interval_seconds == 0 {
            return Err("Dedup sweep interval must be greater than 0".to_string());
        }

        // An empty prefix matches every origin.
        if self.admission.blacklist.iter().any(|prefix| prefix.trim().is_empty()) {
            return Err("Blacklist entries must not be empty".to_string());
        }

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err("Logging format must be 'json' or 'pretty'".to_string());
        }

        Ok(())
    }
}

fn validate_url(field: &str, url: &str) -> Result<(), String> {
    if url.is_empty() {
        return Err(format!("Empty URL for {field}"));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(format!("Invalid URL for {field}: {url}"));
    }
    Ok(())
}
