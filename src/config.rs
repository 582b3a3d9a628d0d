use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::mapping::EntityKind;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storygraph: StorygraphConfig,
    pub notion: NotionConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub http_server: HttpServerConfig,
}

/// Storygraph-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorygraphConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for StorygraphConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Notion workspace configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotionConfig {
    #[serde(default = "default_notion_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_notion_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub characters_db: String,
    #[serde(default)]
    pub elements_db: String,
    #[serde(default)]
    pub puzzles_db: String,
    #[serde(default)]
    pub timeline_db: String,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_notion_api_key_env(),
            base_url: default_notion_base_url(),
            characters_db: String::new(),
            elements_db: String::new(),
            puzzles_db: String::new(),
            timeline_db: String::new(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            max_retries: default_max_retries(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl NotionConfig {
    /// Database id that lists entities of `kind`
    pub fn database_id(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Character => &self.characters_db,
            EntityKind::Element => &self.elements_db,
            EntityKind::Puzzle => &self.puzzles_db,
            EntityKind::TimelineEvent => &self.timeline_db,
        }
    }
}

/// Graph traversal configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    /// Timeout for one concurrent fetch group (an enrichment join or a graph level)
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

impl GraphConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

/// Page cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_secs: default_cache_ttl_secs(),
            capacity: default_cache_capacity(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_notion_api_key_env() -> String {
    "NOTION_API_KEY".to_string()
}

fn default_notion_base_url() -> String {
    "https://api.notion.com/v1".to_string()
}

fn default_max_concurrent_fetches() -> usize {
    8
}

fn default_max_retries() -> usize {
    3
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_capacity() -> usize {
    5000
}

fn default_http_port() -> u16 {
    3001
}

fn default_allowed_origins() -> Vec<String> {
    // Empty allows any origin; list the UI origin in production
    vec![]
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in STORYGRAPH_CONFIG environment variable
    /// 2. ./config.toml in current directory
    ///
    /// The Notion API key itself is read when the client is built, not here.
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config_path = std::env::var("STORYGRAPH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::from_toml_str(&config_str)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str).context("Failed to parse config.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.notion.base_url)
            .with_context(|| format!("notion.base_url is not a valid URL: {}", self.notion.base_url))?;

        if self.notion.api_key_env.trim().is_empty() {
            anyhow::bail!("notion.api_key_env must name an environment variable");
        }

        for kind in EntityKind::ALL {
            if self.notion.database_id(kind).trim().is_empty() {
                anyhow::bail!(
                    "notion.{}_db must be set to the {} database id",
                    kind.collection(),
                    kind.display_name().to_lowercase()
                );
            }
        }

        if self.notion.max_concurrent_fetches == 0 {
            anyhow::bail!("notion.max_concurrent_fetches must be greater than 0");
        }

        if self.notion.request_timeout_secs == 0 {
            anyhow::bail!("notion.request_timeout_secs must be greater than 0");
        }

        if self.graph.fetch_timeout_ms == 0 {
            anyhow::bail!("graph.fetch_timeout_ms must be greater than 0");
        }

        if self.cache.enabled && self.cache.capacity == 0 {
            anyhow::bail!("cache.capacity must be greater than 0 when the cache is enabled");
        }

        Ok(())
    }

    /// Database id for the listing of `kind`
    pub fn database_id(&self, kind: EntityKind) -> &str {
        self.notion.database_id(kind)
    }
}
