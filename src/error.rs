//! Error types for ReasonKit Media
//!
//! This module provides the error hierarchy used across the crate, built on
//! `thiserror`. Callers that need to tell "the input was unusable" apart from
//! "nothing was found" should use [`Error::is_invalid_input`]; an empty result
//! set is never an error.

use thiserror::Error;

/// The main error type for ReasonKit Media operations
#[derive(Error, Debug)]
pub enum Error {
    /// Caller supplied an unusable page URL or page text
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    /// Extraction engine errors
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Page fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Reference resolution errors
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// MCP protocol errors
    #[error("MCP error: {0}")]
    Mcp(#[from] McpError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Problems with the `(page_text, page_url)` pair handed to the engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// No page URL supplied
    #[error("page URL is missing")]
    MissingPageUrl,

    /// Page URL could not be parsed as an absolute URL
    #[error("page URL is not a valid absolute URL: {0}")]
    InvalidPageUrl(String),

    /// Page URL uses a scheme other than http/https
    #[error("page URL must use http or https, got: {0}")]
    UnsupportedScheme(String),

    /// Page text is empty
    #[error("page text is empty")]
    EmptyPage,

    /// Page text is too short to contain any markup
    #[error("page text is too short ({len} bytes, minimum {min})")]
    PageTooShort {
        /// Length of the supplied text
        len: usize,
        /// Configured minimum
        min: usize,
    },
}

/// Extraction engine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// A scanning pattern failed to compile
    #[error("Invalid pattern for {context}: {reason}")]
    InvalidPattern {
        /// What the pattern was built for
        context: String,
        /// Compiler message
        reason: String,
    },

    /// A strategy panicked while scanning
    #[error("Strategy {0} panicked")]
    StrategyPanicked(&'static str),
}

/// Per-reference resolution errors. These never abort an extraction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// Reference was empty after cleaning
    #[error("empty reference")]
    Empty,

    /// Reference could not be parsed or joined against the base
    #[error("malformed reference {reference:?}: {reason}")]
    Malformed {
        /// The cleaned reference
        reference: String,
        /// Parser message
        reason: String,
    },

    /// Reference resolved to a scheme we cannot fetch
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
}

/// Page fetch errors
#[derive(Error, Debug)]
pub enum FetchError {
    /// URL failed validation before the request was sent
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Request timed out
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("HTTP error {status}: {message}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Reason phrase
        message: String,
    },

    /// Body exceeded the configured size cap
    #[error("Response body exceeds {limit} bytes")]
    BodyTooLarge {
        /// Configured cap
        limit: usize,
    },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    /// Invalid JSON-RPC request
    #[error("Invalid JSON-RPC request: {0}")]
    InvalidRequest(String),

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Tool not found
    #[error("Tool not found: {0}")]
    ToolNotFound(String),
}

/// Result type alias for ReasonKit Media operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a generic error from a string
    pub fn generic<S: Into<String>>(msg: S) -> Self {
        Error::Generic(msg.into())
    }

    /// Create a configuration error from a string
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Whether this error means the caller's input itself was unusable
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::Input(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_display() {
        let err = Error::Input(InputError::PageTooShort { len: 3, min: 16 });
        assert!(err.to_string().contains("Invalid input"));
        assert!(err.to_string().contains("3 bytes"));
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_extraction_error_not_input() {
        let err = Error::from(ExtractionError::StrategyPanicked("anchor-link"));
        assert!(!err.is_invalid_input());
        assert_eq!(
            err.to_string(),
            "Extraction error: Strategy anchor-link panicked"
        );
    }

    #[test]
    fn test_fetch_http_error() {
        let err = FetchError::HttpStatus {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn test_resolution_error() {
        let err = ResolutionError::UnsupportedScheme("javascript".to_string());
        assert_eq!(err.to_string(), "unsupported scheme: javascript");
    }

    #[test]
    fn test_generic_error() {
        let err = Error::generic("something went wrong");
        assert_eq!(err.to_string(), "something went wrong");
    }
}
