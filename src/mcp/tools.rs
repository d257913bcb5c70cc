//! MCP tool definitions and registry
//!
//! Three tools sit on top of the extraction engine: fetch-and-extract,
//! extract from caller-supplied HTML, and classify a single URL.

use crate::error::{Error, McpError};
use crate::extraction::{MediaExtractor, ResultSet};
use crate::fetch::PageFetcher;
use crate::mcp::types::{McpToolDefinition, ToolCallResult};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// A registered MCP tool
pub trait McpTool: Send + Sync {
    /// Tool name
    fn name(&self) -> &str;
    /// Tool description
    fn description(&self) -> &str;
    /// Input schema as JSON
    fn input_schema(&self) -> Value;
    /// Get tool definition
    fn definition(&self) -> McpToolDefinition {
        McpToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Tool registry holding all available tools
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn McpTool>>,
    extractor: Arc<MediaExtractor>,
    fetcher: PageFetcher,
}

impl ToolRegistry {
    /// Create a registry with all built-in tools
    pub fn new(extractor: Arc<MediaExtractor>, fetcher: PageFetcher) -> Self {
        let mut registry = Self {
            tools: BTreeMap::new(),
            extractor,
            fetcher,
        };

        registry.register(Box::new(MediaExtractTool));
        registry.register(Box::new(MediaExtractHtmlTool));
        registry.register(Box::new(MediaClassifyTool));

        registry
    }

    /// Register a tool
    pub fn register(&mut self, tool: Box<dyn McpTool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get all tool definitions, sorted by name
    pub fn definitions(&self) -> Vec<McpToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Execute a tool by name
    #[instrument(skip(self, args))]
    pub async fn execute(&self, name: &str, args: Value) -> ToolCallResult {
        info!("Executing tool: {}", name);

        if !self.tools.contains_key(name) {
            return ToolCallResult::error(McpError::ToolNotFound(name.to_string()).to_string());
        }

        match name {
            "media_extract" => self.execute_extract(args).await,
            "media_extract_html" => self.execute_extract_html(args).await,
            "media_classify" => self.execute_classify(args),
            _ => ToolCallResult::error(format!("Unknown tool: {}", name)),
        }
    }

    async fn execute_extract(&self, args: Value) -> ToolCallResult {
        let url = match required_str(&args, "url") {
            Ok(u) => u.to_string(),
            Err(e) => return ToolCallResult::error(e.to_string()),
        };

        if let Some(mut result) = self.extractor.direct_link(&url) {
            result.suggest_user_agent(self.fetcher.user_agent());
            return ToolCallResult::json(&result);
        }

        let page = match self.fetcher.fetch(&url).await {
            Ok(page) => page,
            Err(e) => {
                error!("Fetch failed: {}", e);
                return ToolCallResult::error(format!("Fetch failed: {}", e));
            }
        };

        let user_agent = self.fetcher.user_agent().to_string();
        self.run_extraction(page.body, page.final_url, Some(user_agent))
            .await
    }

    async fn execute_extract_html(&self, args: Value) -> ToolCallResult {
        let (html, url) = match (required_str(&args, "html"), required_str(&args, "url")) {
            (Ok(h), Ok(u)) => (h.to_string(), u.to_string()),
            (Err(e), _) | (_, Err(e)) => return ToolCallResult::error(e.to_string()),
        };

        self.run_extraction(html, url, None).await
    }

    fn execute_classify(&self, args: Value) -> ToolCallResult {
        let url = match required_str(&args, "url") {
            Ok(u) => u,
            Err(e) => return ToolCallResult::error(e.to_string()),
        };
        let mime = args.get("mimeType").and_then(|v| v.as_str());

        match self.extractor.classify(url, mime) {
            Some(c) => ToolCallResult::json(&json!({
                "url": url,
                "media": true,
                "kind": c.kind,
                "extension": c.extension,
            })),
            None => ToolCallResult::json(&json!({ "url": url, "media": false })),
        }
    }

    /// Extraction is CPU-bound, so it runs off the async workers.
    ///
    /// `user_agent` is the client that fetched the page, if any.
    async fn run_extraction(
        &self,
        html: String,
        url: String,
        user_agent: Option<String>,
    ) -> ToolCallResult {
        let extractor = Arc::clone(&self.extractor);
        let joined =
            tokio::task::spawn_blocking(move || extractor.extract(&html, &url)).await;

        match joined {
            Ok(Ok(mut result)) => {
                if let Some(ua) = &user_agent {
                    result.suggest_user_agent(ua);
                }
                summarize(&result)
            }
            Ok(Err(e)) => {
                error!("Extraction failed: {}", e);
                ToolCallResult::error(format!("Extraction failed: {}", e))
            }
            Err(e) => ToolCallResult::error(format!("Extraction task failed: {}", e)),
        }
    }
}

fn summarize(result: &ResultSet) -> ToolCallResult {
    info!(items = result.len(), "Extraction returned");
    ToolCallResult::json(result)
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, Error> {
    args.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| McpError::InvalidParams(format!("missing required parameter: {}", key)).into())
}

/// Fetch a page and extract its media
struct MediaExtractTool;

impl McpTool for MediaExtractTool {
    fn name(&self) -> &str {
        "media_extract"
    }

    fn description(&self) -> &str {
        "Fetch a web page and list the video files, HLS/DASH manifests, embedded players and segments it references"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The page URL (http or https)"
                }
            },
            "required": ["url"]
        })
    }
}

/// Extract media from HTML the caller already has
struct MediaExtractHtmlTool;

impl McpTool for MediaExtractHtmlTool {
    fn name(&self) -> &str {
        "media_extract_html"
    }

    fn description(&self) -> &str {
        "List media references found in supplied page HTML, resolving relative URLs against the page URL"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "html": {
                    "type": "string",
                    "description": "Raw page markup and script text"
                },
                "url": {
                    "type": "string",
                    "description": "URL the page was loaded from, used as the resolution base"
                }
            },
            "required": ["html", "url"]
        })
    }
}

/// Classify a single URL
struct MediaClassifyTool;

impl McpTool for MediaClassifyTool {
    fn name(&self) -> &str {
        "media_classify"
    }

    fn description(&self) -> &str {
        "Decide whether a URL denotes a media resource and of which kind"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL to classify"
                },
                "mimeType": {
                    "type": "string",
                    "description": "Optional MIME type hint, e.g. application/x-mpegURL"
                }
            },
            "required": ["url"]
        })
    }
}

/// List of all available tools (for documentation)
pub const AVAILABLE_TOOLS: &[&str] = &["media_extract", "media_extract_html", "media_classify"];
