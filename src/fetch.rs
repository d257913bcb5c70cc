//! Page fetching
//!
//! A plain HTTP GET with browser-like headers. The extraction engine never
//! performs I/O itself; this module hands it `(page_text, final_url)`.

use crate::config::FetchConfig;
use crate::error::{FetchError, Result};
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANG: &str = "en-US,en;q=0.9";
const MAX_URL_LEN: usize = 2048;
// <meta charset> must appear within the first 1024 bytes of a document
const META_SNIFF_LEN: usize = 1024;

/// A fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects; use this as the base for resolution
    pub final_url: String,
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

/// URL validation utilities
pub struct UrlValidator;

impl UrlValidator {
    /// Validate a URL before fetching it
    pub fn validate(url: &str) -> std::result::Result<Url, FetchError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(FetchError::InvalidUrl("URL cannot be empty".to_string()));
        }
        if url.len() > MAX_URL_LEN {
            return Err(FetchError::InvalidUrl(format!(
                "URL exceeds maximum length of {} characters",
                MAX_URL_LEN
            )));
        }

        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            _ => Err(FetchError::InvalidUrl(format!(
                "URL must start with http:// or https://: {}",
                url
            ))),
        }
    }

    /// Check if URL points to localhost
    pub fn is_localhost(url: &Url) -> bool {
        matches!(
            url.host_str(),
            Some("localhost") | Some("127.0.0.1") | Some("[::1]") | Some("0.0.0.0")
        )
    }
}

/// HTTP page fetcher
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl PageFetcher {
    /// Create a fetcher
    pub fn new(config: FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANG));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(Policy::limited(config.max_redirects))
            .build()
            .map_err(FetchError::from)?;

        Ok(Self { client, config })
    }

    /// Fetcher with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(FetchConfig::default())
    }

    /// User-Agent sent with every request
    pub fn user_agent(&self) -> &str {
        &self.config.user_agent
    }

    /// GET `url` and return its body and final URL
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let target = UrlValidator::validate(url)?;
        if UrlValidator::is_localhost(&target) {
            debug!("fetching a local address");
        }

        let mut response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        let final_url = response.url().to_string();
        if !status.is_success() {
            warn!(status = status.as_u16(), "non-success response");
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            }
            .into());
        }

        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_param)
            .map(str::to_string);

        let limit = self.config.max_body_bytes;
        if response.content_length().is_some_and(|len| len as usize > limit) {
            return Err(FetchError::BodyTooLarge { limit }.into());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.map_error(e))? {
            if body.len() + chunk.len() > limit {
                return Err(FetchError::BodyTooLarge { limit }.into());
            }
            body.extend_from_slice(&chunk);
        }

        info!(final_url = %final_url, bytes = body.len(), "page fetched");
        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            body: decode_body(&body, charset.as_deref()),
        })
    }

    fn map_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.config.timeout_secs)
        } else {
            FetchError::from(err)
        }
    }
}

/// `charset` parameter of a Content-Type value
fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches(|c: char| c == '"' || c == '\''))
        } else {
            None
        }
    })
}

/// Charset declared by a `<meta>` tag near the start of the document
fn meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(META_SNIFF_LEN)]).to_ascii_lowercase();
    let at = head.find("charset=")?;
    let label: String = head[at + "charset=".len()..]
        .trim_start_matches(|c: char| c == '"' || c == '\'')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(*c, '-' | '_' | ':' | '.'))
        .collect();
    Encoding::for_label(label.as_bytes())
}

/// Decode a page body: header charset, then `<meta>` charset, then UTF-8.
///
/// A byte-order mark overrides all of them.
fn decode_body(bytes: &[u8], declared: Option<&str>) -> String {
    let encoding = declared
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| meta_charset(bytes))
        .unwrap_or(UTF_8);
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        debug!(encoding = used.name(), "page body had malformed sequences");
    }
    text.into_owned()
}
