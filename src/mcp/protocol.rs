//! MCP wire protocol types
//!
//! Based on the Model Context Protocol specification (JSON-RPC 2.0).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Protocol revision sent in the `initialize` handshake
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC request to an MCP server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl McpRequest {
    /// Create a new MCP request
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        McpRequest {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.into(),
            params,
        }
    }

    /// Create an initialize request
    pub fn initialize(id: u64) -> Self {
        Self::new(id, "initialize", Some(serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": crate::NAME,
                "version": crate::VERSION
            }
        })))
    }

    /// Create a tools/list request, continuing from `cursor` when paging
    pub fn list_tools(id: u64, cursor: Option<&str>) -> Self {
        let params = cursor.map(|c| serde_json::json!({ "cursor": c }));
        Self::new(id, "tools/list", params)
    }

    /// Create a tools/call request
    pub fn call_tool(id: u64, name: impl Into<String>, arguments: Value) -> Self {
        Self::new(id, "tools/call", Some(serde_json::json!({
            "name": name.into(),
            "arguments": arguments
        })))
    }
}

/// JSON-RPC notification (no id, no response)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl McpNotification {
    /// Sent once the initialize response has been received
    pub fn initialized() -> Self {
        McpNotification {
            jsonrpc: "2.0".to_string(),
            method: "notifications/initialized".to_string(),
            params: None,
        }
    }
}

/// JSON-RPC response from an MCP server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

impl McpResponse {
    /// Successful response carrying `result`
    pub fn success(id: u64, result: Value) -> Self {
        McpResponse {
            jsonrpc: "2.0".to_string(),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// Unwrap the result, turning a JSON-RPC error into `Error::Mcp`
    pub fn into_result(self, server: &str) -> Result<Value> {
        if let Some(err) = self.error {
            return Err(Error::Mcp(format!(
                "{}: {} (code {})",
                server, err.message, err.code
            )));
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// MCP error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Tool definition from an MCP server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpTool {
    /// Tool name
    pub name: String,
    /// Tool description
    #[serde(default)]
    pub description: String,
    /// Input schema (JSON Schema), passed to the LLM unchanged
    #[serde(rename = "inputSchema", default = "empty_object_schema")]
    pub input_schema: Value,
}

fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

/// One page of a tools/list response
#[derive(Debug, Clone, Deserialize)]
pub struct McpToolList {
    #[serde(default)]
    pub tools: Vec<McpTool>,
    #[serde(rename = "nextCursor", default)]
    pub next_cursor: Option<String>,
}

/// Content block returned by a tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpContent {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(rename = "mimeType", default)]
    pub mime_type: Option<String>,
}

/// Result of a tools/call response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolResult {
    #[serde(default)]
    pub content: Vec<McpContent>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl McpToolResult {
    /// Join the text blocks; non-text blocks are summarised by type
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|c| match (&c.text, &c.mime_type) {
                (Some(text), _) => text.clone(),
                (None, Some(mime)) => format!("[{} content: {}]", c.content_type, mime),
                (None, None) => format!("[{} content]", c.content_type),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_request_shape() {
        let value = serde_json::to_value(McpRequest::initialize(1)).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["method"], "initialize");
        assert_eq!(value["params"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(value["params"]["clientInfo"]["name"], "mcp-chat");
    }

    #[test]
    fn test_list_tools_without_cursor_has_no_params() {
        let value = serde_json::to_value(McpRequest::list_tools(2, None)).unwrap();
        assert!(value.get("params").is_none());
        let value = serde_json::to_value(McpRequest::list_tools(3, Some("abc"))).unwrap();
        assert_eq!(value["params"]["cursor"], "abc");
    }

    #[test]
    fn test_error_response_becomes_mcp_error() {
        let raw = r#"{"jsonrpc":"2.0","id":4,"error":{"code":-32601,"message":"Method not found"}}"#;
        let response: McpResponse = serde_json::from_str(raw).unwrap();
        let err = response.into_result("playwright").unwrap_err();
        assert!(matches!(err, Error::Mcp(_)));
        assert_eq!(
            err.to_string(),
            "MCP error: playwright: Method not found (code -32601)"
        );
    }

    #[test]
    fn test_tool_without_schema_gets_object_schema() {
        let tool: McpTool = serde_json::from_str(r#"{"name":"browser_snapshot"}"#).unwrap();
        assert_eq!(tool.input_schema["type"], "object");
        assert_eq!(tool.description, "");
    }

    #[test]
    fn test_tool_result_text_joins_blocks() {
        let raw = r#"{"content":[
            {"type":"text","text":"Page title: Example"},
            {"type":"image","data":"AAAA","mimeType":"image/png"}
        ]}"#;
        let result: McpToolResult = serde_json::from_str(raw).unwrap();
        assert!(!result.is_error);
        assert_eq!(result.text(), "Page title: Example\n[image content: image/png]");
    }
}
