//! Configuration management.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `BOOK_RESOLVER` (nested keys separated
//! by `__`, e.g. `BOOK_RESOLVER_RESOLVER__PROVIDER_TIMEOUT_SECS=5`).
//!
//! # Configuration File Format
//!
//! ```toml
//! [api_keys]
//! google_books = "your-api-key"
//! isbndb = "your-isbndb-key"
//!
//! [resolver]
//! provider_timeout_secs = 8
//! search_limit = 40
//! editions_limit = 30
//! max_results = 50
//!
//! [http]
//! timeout_secs = 30
//! connect_timeout_secs = 10
//!
//! [providers]
//! enabled = "openlibrary,google_books,loc"
//! disabled = "hathitrust"
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment prefix for configuration overrides
pub const ENV_PREFIX: &str = "BOOK_RESOLVER";

/// File name searched for in the working directory
pub const CONFIG_FILE_NAME: &str = "book-resolver.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// API keys for providers that need them
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// Resolution and aggregation tunables
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Runtime provider selection
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// API keys for external services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Google Books API key (optional, raises quota)
    #[serde(default)]
    pub google_books: Option<String>,

    /// ISBNdb API key (required for the ISBNdb provider)
    #[serde(default)]
    pub isbndb: Option<String>,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            google_books: env_key("GOOGLE_BOOKS_API_KEY"),
            isbndb: env_key("ISBNDB_API_KEY"),
        }
    }
}

impl ApiKeys {
    /// Fill keys missing from the file from their conventional env vars
    fn fill_from_env(&mut self) {
        if self.google_books.is_none() {
            self.google_books = env_key("GOOGLE_BOOKS_API_KEY");
        }
        if self.isbndb.is_none() {
            self.isbndb = env_key("ISBNDB_API_KEY");
        }
    }
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Resolution and aggregation tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Per-provider timeout inside a cascade tier
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,

    /// Candidates requested from each bulk-search provider
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Editions fetched during edition expansion
    #[serde(default = "default_editions_limit")]
    pub editions_limit: usize,

    /// Maximum entries returned by a multi-result search
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            provider_timeout_secs: default_provider_timeout(),
            search_limit: default_search_limit(),
            editions_limit: default_editions_limit(),
            max_results: default_max_results(),
        }
    }
}

impl ResolverConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

fn default_provider_timeout() -> u64 {
    8
}

fn default_search_limit() -> usize {
    40
}

fn default_editions_limit() -> usize {
    30
}

fn default_max_results() -> usize {
    50
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Overrides the default `book-resolver/<version>` user agent
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: None,
        }
    }
}

fn default_http_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

/// Runtime provider selection for the cascade
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Comma-separated ids; when set, only these are used
    #[serde(default)]
    pub enabled: Option<String>,

    /// Comma-separated ids that are never used
    #[serde(default)]
    pub disabled: Option<String>,
}

impl ProvidersConfig {
    /// Whether the provider `id` may take part in a cascade
    pub fn is_enabled(&self, id: &str) -> bool {
        if id_list(self.disabled.as_deref()).any(|d| d == id) {
            return false;
        }
        match self.enabled.as_deref() {
            Some(list) if !list.trim().is_empty() => id_list(Some(list)).any(|e| e == id),
            _ => true,
        }
    }
}

fn id_list(list: Option<&str>) -> impl Iterator<Item = &str> {
    list.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from an optional file plus environment overrides
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }
    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut config: Config = settings.try_deserialize()?;
    config.api_keys.fill_from_env();
    Ok(config)
}

/// Find a configuration file in the conventional locations.
///
/// Checks `./book-resolver.toml`, then `<config dir>/book-resolver/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("book-resolver").join("config.toml"))
        .filter(|p| p.is_file())
}
