//! ReasonKit Media - Media Resource Sniffing for Web Pages
//!
//! This crate finds the media a web page references (direct video files,
//! HLS/DASH manifests, embedded players, stream segments and browser-held
//! object handles) by scanning its raw markup and script text, and returns a
//! deduplicated, classified and named result set ready for a downloader.
//!
//! # Features
//!
//! - **Extraction Engine**: Seven independent regex strategies, no DOM or JS runtime
//! - **URL Resolution**: Relative, protocol-relative and script-escaped references
//! - **Classification**: Extension, MIME and embedded-player tables plus an optional heuristic
//! - **Page Fetcher**: Browser-like HTTP GET for end-to-end use
//! - **MCP Server**: Stdio server exposing the engine as tools for AI agents
//!
//! # Architecture
//!
//! ```text
//! page text ──▶ Strategies ──▶ Resolver ──▶ Classifier
//!                   │                            │
//!                   ▼                            ▼
//!             ┌────────────┐             ┌─────────────┐
//!             │ Aggregator │◀────────────│ Candidates  │
//!             └─────┬──────┘             └─────────────┘
//!                   │
//!                   ▼
//!        ResultSet { title, items }
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use reasonkit_media::config::ExtractorConfig;
//! use reasonkit_media::extraction::{MediaExtractor, MediaKind};
//!
//! let engine = MediaExtractor::new(ExtractorConfig::default())?;
//! let html = r#"<html><title>Demo</title><video><source src="video.mp4"></video></html>"#;
//! let result = engine.extract(html, "https://example.com/watch")?;
//!
//! assert_eq!(result.title, "Demo");
//! assert_eq!(result.items[0].url, "https://example.com/video.mp4");
//! assert_eq!(result.items[0].kind, MediaKind::DirectFile);
//! # Ok::<(), reasonkit_media::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod extraction;
pub mod fetch;
pub mod mcp;

// Re-exports for convenience
pub use config::{ExtractorConfig, FetchConfig};
pub use error::{Error, Result};
pub use extraction::{MediaExtractor, MediaItem, MediaKind, ResultSet};
pub use fetch::PageFetcher;
pub use mcp::{McpServer, McpTool};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
