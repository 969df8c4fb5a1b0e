use serde::{Deserialize, Serialize};

/// Main configuration structure for hubcrawl
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Organization whose repositories are crawled
    #[serde(default)]
    pub org_name: String,

    /// GitHub token sent as a bearer credential
    #[serde(default)]
    pub github_token: String,

    /// Page size for repository and issue listings (1-100)
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// `debug` enables debug logging; anything else means info
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: pretty or json
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Optional directory for a rolling JSON log file
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// GitHub API configuration
    #[serde(default)]
    pub github: GitHubConfig,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

const fn default_per_page() -> u32 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            org_name: String::new(),
            github_token: String::new(),
            per_page: default_per_page(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            log_dir: None,
            database: DatabaseConfig::default(),
            github: GitHubConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Whether finer-grained logging was requested.
    pub fn is_debug(&self) -> bool {
        self.log_level.eq_ignore_ascii_case("debug")
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,
}

fn default_database_path() -> String {
    "github_issues.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl DatabaseConfig {
    /// The sqlx connection URL for the configured path.
    pub fn url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            self.path.clone()
        } else {
            format!("sqlite:{}", self.path)
        }
    }
}

/// GitHub API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GitHubConfig {
    /// Base URL of the REST API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Value of the `X-GitHub-Api-Version` header
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_api_version() -> String {
    "2022-11-28".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Total attempts per request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First exponential backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Cap on the exponential backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Seconds added to every rate-limit wait
    #[serde(default = "default_rate_limit_buffer_secs")]
    pub rate_limit_buffer_secs: u64,

    /// Wait used when a rate-limited response carries no usable headers
    #[serde(default = "default_rate_limit_wait_secs")]
    pub default_rate_limit_wait_secs: u64,
}

const fn default_max_attempts() -> u32 {
    4
}

const fn default_initial_backoff_ms() -> u64 {
    1_000
}

const fn default_max_backoff_ms() -> u64 {
    60_000
}

const fn default_rate_limit_buffer_secs() -> u64 {
    2
}

const fn default_rate_limit_wait_secs() -> u64 {
    60
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            rate_limit_buffer_secs: default_rate_limit_buffer_secs(),
            default_rate_limit_wait_secs: default_rate_limit_wait_secs(),
        }
    }
}
