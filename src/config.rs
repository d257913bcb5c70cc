//! Engine and fetcher configuration
//!
//! Configuration is plain data, loaded once and handed to
//! [`MediaExtractor::new`](crate::extraction::MediaExtractor::new) or
//! [`PageFetcher::new`](crate::fetch::PageFetcher::new). Nothing here is
//! mutated after construction.
//!
//! # Environment Variables
//!
//! - `REASONKIT_MEDIA_DEFAULT_TITLE`: label used when a page has no title
//! - `REASONKIT_MEDIA_TITLE_MAX`: maximum title length in characters (default: 100)
//! - `REASONKIT_MEDIA_MIN_PAGE_LEN`: minimum page text length in bytes (default: 16)
//! - `REASONKIT_MEDIA_MAX_MATCHES`: per-strategy candidate cap (default: 5000)
//! - `REASONKIT_MEDIA_HEURISTICS`: "false" disables keyword heuristics
//! - `REASONKIT_MEDIA_KEYWORDS`: comma-separated heuristic keywords
//! - `REASONKIT_MEDIA_QUERY_PARAMS`: comma-separated corroborating query parameters
//! - `REASONKIT_MEDIA_USER_AGENT`: User-Agent for fetching and request hints
//! - `REASONKIT_MEDIA_TIMEOUT_SECS`: fetch timeout (default: 30)
//! - `REASONKIT_MEDIA_MAX_BODY_BYTES`: fetch body cap (default: 16 MiB)

use crate::error::{Error, Result};
use std::env;
use std::str::FromStr;

/// Browser User-Agent sent when fetching pages
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Label for result sets whose page has no usable title
pub const DEFAULT_TITLE: &str = "Video Resources";

/// Configuration for the extraction engine
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Title used when the page has none (default: "Video Resources")
    pub default_title: String,
    /// Maximum title length in characters (default: 100)
    pub title_max_chars: usize,
    /// Page text shorter than this is rejected as invalid input (default: 16)
    pub min_page_length: usize,
    /// Maximum candidates kept per strategy; the rest are dropped with a warning (default: 5000)
    pub max_matches_per_strategy: usize,
    /// Enable keyword-corroborated URL sniffing in script literals (default: true)
    pub heuristics_enabled: bool,
    /// Keywords suggesting a streaming/playback URL
    pub heuristic_keywords: Vec<String>,
    /// Query parameters that corroborate a keyword match
    pub heuristic_query_params: Vec<String>,
    /// Query parameters consulted when naming an item
    pub name_query_params: Vec<String>,
    /// Script field names whose quoted value is taken as a video URL
    pub script_field_names: Vec<String>,
    /// User-Agent emitted as a request hint (None = no hint)
    pub user_agent: Option<String>,
    /// Disambiguate repeated item names with a numeric suffix (default: true)
    pub unique_names: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            default_title: DEFAULT_TITLE.to_string(),
            title_max_chars: 100,
            min_page_length: 16,
            max_matches_per_strategy: 5000,
            heuristics_enabled: true,
            heuristic_keywords: to_strings(&[
                "video", "stream", "play", "media", "vod", "cdn", "hls", "dash",
            ]),
            heuristic_query_params: to_strings(&["video", "stream", "format", "quality"]),
            name_query_params: to_strings(&["filename", "title", "name", "file"]),
            script_field_names: to_strings(&[
                "videoUrl",
                "video_url",
                "videoSrc",
                "video_src",
                "playUrl",
                "play_url",
                "playAddr",
                "play_addr",
                "streamUrl",
                "stream_url",
                "hlsUrl",
                "hls_url",
                "dashUrl",
                "dash_url",
                "mp4Url",
                "mp4_url",
            ]),
            user_agent: None,
            unique_names: true,
        }
    }
}

impl ExtractorConfig {
    /// Create a new config builder
    pub fn builder() -> ExtractorConfigBuilder {
        ExtractorConfigBuilder::default()
    }

    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(title) = env::var("REASONKIT_MEDIA_DEFAULT_TITLE") {
            if !title.trim().is_empty() {
                config.default_title = title.trim().to_string();
            }
        }
        if let Some(v) = parse_env("REASONKIT_MEDIA_TITLE_MAX")? {
            config.title_max_chars = v;
        }
        if let Some(v) = parse_env("REASONKIT_MEDIA_MIN_PAGE_LEN")? {
            config.min_page_length = v;
        }
        if let Some(v) = parse_env("REASONKIT_MEDIA_MAX_MATCHES")? {
            config.max_matches_per_strategy = v;
        }
        if let Some(v) = parse_env("REASONKIT_MEDIA_HEURISTICS")? {
            config.heuristics_enabled = v;
        }
        if let Some(list) = list_env("REASONKIT_MEDIA_KEYWORDS") {
            config.heuristic_keywords = list;
        }
        if let Some(list) = list_env("REASONKIT_MEDIA_QUERY_PARAMS") {
            config.heuristic_query_params = list;
        }
        if let Ok(ua) = env::var("REASONKIT_MEDIA_USER_AGENT") {
            if !ua.trim().is_empty() {
                config.user_agent = Some(ua.trim().to_string());
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants the engine relies on
    pub fn validate(&self) -> Result<()> {
        if self.default_title.trim().is_empty() {
            return Err(Error::config("default_title must not be empty"));
        }
        if self.title_max_chars == 0 {
            return Err(Error::config("title_max_chars must be at least 1"));
        }
        if self.max_matches_per_strategy == 0 {
            return Err(Error::config("max_matches_per_strategy must be at least 1"));
        }
        Ok(())
    }
}

/// Builder for ExtractorConfig
#[derive(Default)]
pub struct ExtractorConfigBuilder {
    config: ExtractorConfig,
}

impl ExtractorConfigBuilder {
    /// Set the fallback title
    pub fn default_title(mut self, title: impl Into<String>) -> Self {
        self.config.default_title = title.into();
        self
    }

    /// Set the maximum title length
    pub fn title_max_chars(mut self, max: usize) -> Self {
        self.config.title_max_chars = max;
        self
    }

    /// Set the minimum page length
    pub fn min_page_length(mut self, min: usize) -> Self {
        self.config.min_page_length = min;
        self
    }

    /// Set the per-strategy candidate cap
    pub fn max_matches_per_strategy(mut self, max: usize) -> Self {
        self.config.max_matches_per_strategy = max;
        self
    }

    /// Enable or disable keyword heuristics
    pub fn heuristics(mut self, enabled: bool) -> Self {
        self.config.heuristics_enabled = enabled;
        self
    }

    /// Replace the heuristic keyword list
    pub fn heuristic_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.heuristic_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the corroborating query parameter list
    pub fn heuristic_query_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.heuristic_query_params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Set the User-Agent request hint
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = Some(ua.into());
        self
    }

    /// Enable or disable name disambiguation
    pub fn unique_names(mut self, enabled: bool) -> Self {
        self.config.unique_names = enabled;
        self
    }

    /// Build the config
    pub fn build(self) -> ExtractorConfig {
        self.config
    }
}

/// Configuration for the page fetcher
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User-Agent header (default: desktop Chrome)
    pub user_agent: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Maximum body size in bytes (default: 16 MiB)
    pub max_body_bytes: usize,
    /// Maximum redirects followed (default: 10)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            max_body_bytes: 16 * 1024 * 1024,
            max_redirects: 10,
        }
    }
}

impl FetchConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(ua) = env::var("REASONKIT_MEDIA_USER_AGENT") {
            if !ua.trim().is_empty() {
                config.user_agent = ua.trim().to_string();
            }
        }
        if let Some(v) = parse_env("REASONKIT_MEDIA_TIMEOUT_SECS")? {
            config.timeout_secs = v;
        }
        if let Some(v) = parse_env("REASONKIT_MEDIA_MAX_BODY_BYTES")? {
            config.max_body_bytes = v;
        }

        Ok(config)
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::config(format!("{} has an invalid value: {}", name, raw))),
        _ => Ok(None),
    }
}

fn list_env(name: &str) -> Option<Vec<String>> {
    let raw = env::var(name).ok()?;
    let list: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}
