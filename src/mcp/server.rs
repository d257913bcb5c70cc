//! MCP stdio server implementation
//!
//! Reads newline-delimited JSON-RPC requests from stdin, dispatches them to
//! the tool registry and writes one response line per request to stdout.
//! Logging goes to stderr so stdout carries protocol traffic only.

use crate::error::{Error, McpError, Result};
use crate::mcp::tools::ToolRegistry;
use crate::mcp::types::{
    JsonRpcRequest, JsonRpcResponse, McpCapabilities, McpServerInfo, ToolCallParams,
    PROTOCOL_VERSION,
};
use serde_json::{json, Value};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

/// MCP server state
pub struct McpServer {
    /// Tool registry
    tools: ToolRegistry,
    /// Server info
    info: McpServerInfo,
    /// Whether the server has been initialized
    initialized: RwLock<bool>,
}

impl McpServer {
    /// Create a new MCP server over a tool registry
    pub fn new(tools: ToolRegistry) -> Self {
        Self {
            tools,
            info: McpServerInfo::default(),
            initialized: RwLock::new(false),
        }
    }

    /// Server name and version
    pub fn info(&self) -> &McpServerInfo {
        &self.info
    }

    /// Whether `initialize` has been received (and no `shutdown` since)
    pub async fn is_initialized(&self) -> bool {
        *self.initialized.read().await
    }

    /// Run the MCP server until stdin closes
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<()> {
        info!(
            "Starting MCP server: {} v{}",
            self.info.name, self.info.version
        );

        let mut lines = BufReader::new(io::stdin()).lines();
        let mut stdout = io::stdout();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            debug!("Received: {}", line);

            if let Some(resp) = self.handle_line(&line).await {
                let json = serde_json::to_string(&resp).unwrap_or_else(|e| {
                    error!("Failed to serialize response: {}", e);
                    r#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"Internal error"}}"#
                        .to_string()
                });

                debug!("Sending: {}", json);

                stdout.write_all(json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }

        info!("MCP server shutting down");
        Ok(())
    }

    /// Handle a single line of input
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to parse request: {}", e);
                return Some(JsonRpcResponse::parse_error());
            }
        };

        let id = value.get("id").cloned();
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) if request.jsonrpc == "2.0" => self.handle_request(request).await,
            Ok(_) | Err(_) => {
                warn!("Rejecting malformed JSON-RPC envelope");
                Some(JsonRpcResponse::invalid_request(id))
            }
        }
    }

    /// Handle a JSON-RPC request
    #[instrument(skip(self, request), fields(method = %request.method))]
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone();
        let method = request.method.as_str();

        info!("Handling method: {}", method);

        let result = match method {
            "initialize" => self.handle_initialize(request.params).await,
            "initialized" | "notifications/initialized" => return None,
            "shutdown" => self.handle_shutdown().await,
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(request.params).await,
            "ping" => Ok(json!({})),
            _ => {
                warn!("Unknown method: {}", method);
                if request.is_notification() {
                    return None;
                }
                return Some(JsonRpcResponse::method_not_found(id, method));
            }
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(Error::Mcp(McpError::InvalidParams(msg))) => {
                JsonRpcResponse::invalid_params(id, &msg)
            }
            Err(e) => JsonRpcResponse::internal_error(id, &e.to_string()),
        })
    }

    async fn handle_initialize(&self, params: Option<Value>) -> Result<Value> {
        if let Some(version) = params
            .as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .and_then(|v| v.as_str())
        {
            debug!("Client protocol version: {}", version);
        }

        *self.initialized.write().await = true;

        Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": McpCapabilities::default(),
            "serverInfo": self.info
        }))
    }

    async fn handle_shutdown(&self) -> Result<Value> {
        info!("Handling shutdown");
        *self.initialized.write().await = false;
        Ok(json!(null))
    }

    fn handle_tools_list(&self) -> Result<Value> {
        Ok(json!({
            "tools": self.tools.definitions()
        }))
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> Result<Value> {
        let params = params.ok_or_else(|| McpError::InvalidParams("missing params".to_string()))?;

        let tool_params: ToolCallParams = serde_json::from_value(params)
            .map_err(|e| McpError::InvalidParams(e.to_string()))?;

        let result = self
            .tools
            .execute(&tool_params.name, tool_params.arguments)
            .await;

        Ok(serde_json::to_value(result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractorConfig;
    use crate::extraction::MediaExtractor;
    use crate::fetch::PageFetcher;
    use std::sync::Arc;

    fn server() -> McpServer {
        let extractor = Arc::new(MediaExtractor::new(ExtractorConfig::default()).unwrap());
        McpServer::new(ToolRegistry::new(
            extractor,
            PageFetcher::with_defaults().unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_initialize_and_shutdown() {
        let server = server();
        let response = server
            .handle_request(JsonRpcRequest::new(
                "initialize",
                Some(json!({ "protocolVersion": PROTOCOL_VERSION })),
                Some(json!(1)),
            ))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "reasonkit-media");
        assert!(server.is_initialized().await);

        server
            .handle_request(JsonRpcRequest::new("shutdown", None, Some(json!(2))))
            .await
            .unwrap();
        assert!(!server.is_initialized().await);
    }

    #[tokio::test]
    async fn test_notification_has_no_response() {
        let response = server()
            .handle_request(JsonRpcRequest::new("initialized", None, None))
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_parse_and_envelope_errors() {
        let server = server();
        let response = server.handle_line("{not json").await.unwrap();
        assert_eq!(response.error.unwrap().code, -32700);

        let response = server
            .handle_line(r#"{"jsonrpc":"1.0","method":"ping","id":5}"#)
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32600);
        assert_eq!(response.id, Some(json!(5)));
    }

    #[tokio::test]
    async fn test_tools_call_without_params() {
        let response = server()
            .handle_request(JsonRpcRequest::new("tools/call", None, Some(json!(3))))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = server()
            .handle_request(JsonRpcRequest::new("resources/list", None, Some(json!(4))))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[test]
    fn test_ping_outside_runtime() {
        let response = tokio_test::block_on(
            server().handle_line(r#"{"jsonrpc":"2.0","method":"ping","id":"p"}"#),
        )
        .unwrap();
        assert_eq!(response.result, Some(json!({})));
    }
}
