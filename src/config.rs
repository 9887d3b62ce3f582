//! Configuration types for thread-harvest

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Environment variable holding the OAuth client id
pub const CLIENT_ID_ENV: &str = "REDDIT_CLIENT_ID";

/// Environment variable holding the OAuth client secret
pub const CLIENT_SECRET_ENV: &str = "REDDIT_CLIENT_SECRET";

/// OAuth application credentials
///
/// Loaded once at startup and handed to the session factory; sessions never
/// read credentials from the environment themselves.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Application client id
    pub client_id: String,

    /// Application client secret
    pub client_secret: String,

    /// User-Agent header sent with every request (derived from the client id if None)
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl CredentialsConfig {
    /// User-Agent to present to the API.
    pub fn user_agent(&self) -> String {
        self.user_agent.clone().unwrap_or_else(|| {
            format!(
                "rust:{}:v{} (thread-harvest)",
                self.client_id,
                env!("CARGO_PKG_VERSION")
            )
        })
    }
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Remote API endpoints and request limits
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for token exchange and revocation (default: "https://www.reddit.com")
    #[serde(default = "default_auth_base_url")]
    pub auth_base_url: String,

    /// Base URL for authenticated API calls (default: "https://oauth.reddit.com")
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Upper bound for a single request, including one post fetch (default: 30 seconds)
    ///
    /// A post fetch that exceeds it is recorded as a failed item, same as any
    /// other per-post error.
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            auth_base_url: default_auth_base_url(),
            api_base_url: default_api_base_url(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// What to search for
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search query (required, non-empty)
    pub query: String,

    /// Community to search in (default: "PoliticalDebate")
    #[serde(default = "default_subreddit")]
    pub subreddit: String,

    /// Maximum number of posts to retrieve (default: 50)
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Result ordering (default: relevance)
    #[serde(default)]
    pub sort: SearchSort,
}

impl SearchConfig {
    /// Search with default scope, limit, and ordering.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            subreddit: default_subreddit(),
            limit: default_limit(),
            sort: SearchSort::default(),
        }
    }
}

/// Search result ordering
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSort {
    /// Best textual match first (default)
    #[default]
    Relevance,
    /// Highest score first
    Top,
    /// Newest first
    New,
    /// Most commented first
    Comments,
    /// Currently trending
    Hot,
}

impl SearchSort {
    /// Value of the `sort` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchSort::Relevance => "relevance",
            SearchSort::Top => "top",
            SearchSort::New => "new",
            SearchSort::Comments => "comments",
            SearchSort::Hot => "hot",
        }
    }
}

/// Worker pool size and comment tree limits
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Number of concurrent workers, each with its own session (default: 5)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Deepest reply level retained, top-level comments being depth 0 (default: 2)
    #[serde(default = "default_comment_depth")]
    pub comment_depth: usize,

    /// Replies retained under any single comment (default: 3)
    #[serde(default = "default_replies_per_comment")]
    pub replies_per_comment: usize,

    /// Top-level comments retained per post (default: 10)
    #[serde(default = "default_top_level_comments")]
    pub top_level_comments: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            comment_depth: default_comment_depth(),
            replies_per_comment: default_replies_per_comment(),
            top_level_comments: default_top_level_comments(),
        }
    }
}

impl HarvestConfig {
    /// Tree limits handed to the extractor
    pub fn limits(&self) -> crate::extract::ExtractLimits {
        crate::extract::ExtractLimits {
            depth_limit: self.comment_depth,
            replies_per_comment: self.replies_per_comment,
            top_level_comments: self.top_level_comments,
        }
    }
}

/// Where the harvested collection is written
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: ".")
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,

    /// What to do when the output file already exists
    #[serde(default)]
    pub file_collision: FileCollisionAction,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            file_collision: FileCollisionAction::default(),
        }
    }
}

/// File collision handling strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCollisionAction {
    /// Append (1), (2), etc. to filename (default)
    #[default]
    Rename,
    /// Overwrite existing file
    Overwrite,
    /// Refuse to write, keep existing
    Skip,
}

/// Main configuration for a harvest
///
/// Constructed once at startup and shared read-only (behind an `Arc`) by the
/// harvester, its session factory, and every worker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// OAuth application credentials
    pub credentials: CredentialsConfig,

    /// Endpoints and request timeout
    #[serde(default)]
    pub api: ApiConfig,

    /// Query, scope and result limit
    pub search: SearchConfig,

    /// Worker pool and tree limits
    #[serde(default)]
    pub harvest: HarvestConfig,

    /// Output location
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Build a configuration for `query` with credentials taken from the environment.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if either credential variable is unset.
    pub fn from_env(query: impl Into<String>) -> Result<Self> {
        let client_id = std::env::var(CLIENT_ID_ENV)
            .map_err(|_| Error::config("credentials.client_id", format!("{CLIENT_ID_ENV} is not set")))?;
        let client_secret = std::env::var(CLIENT_SECRET_ENV).map_err(|_| {
            Error::config(
                "credentials.client_secret",
                format!("{CLIENT_SECRET_ENV} is not set"),
            )
        })?;

        Ok(Self {
            credentials: CredentialsConfig {
                client_id,
                client_secret,
                user_agent: None,
            },
            api: ApiConfig::default(),
            search: SearchConfig::new(query),
            harvest: HarvestConfig::default(),
            output: OutputConfig::default(),
        })
    }

    /// Check every setting that would otherwise fail later, mid-harvest.
    ///
    /// # Errors
    /// Returns [`Error::Config`] naming the first invalid key.
    pub fn validate(&self) -> Result<()> {
        if self.credentials.client_id.trim().is_empty() {
            return Err(Error::config(
                "credentials.client_id",
                "client id must not be empty",
            ));
        }
        if self.credentials.client_secret.trim().is_empty() {
            return Err(Error::config(
                "credentials.client_secret",
                "client secret must not be empty",
            ));
        }
        if self.search.query.trim().is_empty() {
            return Err(Error::config("search.query", "search query must not be empty"));
        }
        if self.search.subreddit.trim().is_empty() {
            return Err(Error::config("search.subreddit", "subreddit must not be empty"));
        }
        if self.search.limit == 0 {
            return Err(Error::config("search.limit", "limit must be a positive integer"));
        }
        if self.harvest.workers == 0 {
            return Err(Error::config("harvest.workers", "at least one worker is required"));
        }
        if self.api.request_timeout.is_zero() {
            return Err(Error::config(
                "api.request_timeout",
                "request timeout must be greater than zero",
            ));
        }
        for (key, value) in [
            ("api.auth_base_url", &self.api.auth_base_url),
            ("api.api_base_url", &self.api.api_base_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| Error::config(key, format!("invalid URL {value:?}: {e}")))?;
        }
        Ok(())
    }
}

fn default_auth_base_url() -> String {
    "https://www.reddit.com".to_string()
}

fn default_api_base_url() -> String {
    "https://oauth.reddit.com".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_subreddit() -> String {
    "PoliticalDebate".to_string()
}

fn default_limit() -> usize {
    50
}

fn default_workers() -> usize {
    5
}

fn default_comment_depth() -> usize {
    2
}

fn default_replies_per_comment() -> usize {
    3
}

fn default_top_level_comments() -> usize {
    10
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
