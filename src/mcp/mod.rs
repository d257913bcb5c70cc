//! Model Context Protocol (MCP) server module
//!
//! This module exposes the media extraction engine to AI agents as MCP
//! tools over a stdio JSON-RPC transport.

mod server;
mod tools;
/// MCP protocol types
pub mod types;

pub use server::McpServer;
pub use tools::{McpTool, ToolRegistry, AVAILABLE_TOOLS};
pub use types::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpCapabilities, McpServerInfo,
    McpToolDefinition, ToolCallParams, ToolCallResult, ToolContent, PROTOCOL_VERSION,
};
