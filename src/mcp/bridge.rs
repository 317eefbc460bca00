//! MCP-to-Tool bridge
//!
//! Adapts MCP server tools into the crate's `Tool` trait so they can be
//! registered in a `ToolRegistry`.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::protocol::McpTool;
use super::session::McpSession;
use crate::error::Result;
use crate::tools::{Tool, ToolResult};

/// Bridge that wraps an MCP tool as a `Tool`
pub struct McpToolBridge {
    /// Session the tool lives on
    session: Arc<McpSession>,
    /// The MCP tool definition
    tool: McpTool,
}

impl McpToolBridge {
    /// Create a new bridge for a specific MCP tool
    pub fn new(session: Arc<McpSession>, tool: McpTool) -> Self {
        McpToolBridge { session, tool }
    }

    /// Create bridges for all tools from an MCP session
    pub async fn from_session(session: Arc<McpSession>) -> Result<Vec<Self>> {
        let tools = session.list_tools().await?;
        Ok(tools
            .into_iter()
            .map(|tool| McpToolBridge::new(Arc::clone(&session), tool))
            .collect())
    }

    /// Name of the server providing this tool
    pub fn server(&self) -> &str {
        self.session.name()
    }
}

#[async_trait]
impl Tool for McpToolBridge {
    fn name(&self) -> &str {
        &self.tool.name
    }

    fn description(&self) -> &str {
        &self.tool.description
    }

    fn parameters_schema(&self) -> Value {
        self.tool.input_schema.clone()
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        match self.session.call_tool(&self.tool.name, args).await {
            Ok(result) if result.is_error => Ok(ToolResult::failure(result.text())),
            Ok(result) => Ok(ToolResult::success(result.text())),
            Err(e) => Ok(ToolResult::failure(format!(
                "MCP tool '{}' failed: {}",
                self.tool.name, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::session::testing::FakeTransport;
    use serde_json::json;

    #[tokio::test]
    async fn test_bridges_expose_server_tools() {
        let fake = FakeTransport::with_tools(json!([
            {"name": "browser_navigate", "description": "Go to a URL",
             "inputSchema": {"type": "object", "properties": {"url": {"type": "string"}}, "required": ["url"]}}
        ]));
        let session = Arc::new(McpSession::initialize("playwright", Box::new(fake)).await.unwrap());

        let bridges = McpToolBridge::from_session(session).await.unwrap();
        assert_eq!(bridges.len(), 1);

        let bridge = &bridges[0];
        assert_eq!(bridge.server(), "playwright");
        let definition = bridge.to_definition();
        assert_eq!(definition.function.name, "browser_navigate");
        assert_eq!(definition.function.parameters["required"], json!(["url"]));

        let result = bridge.execute(json!({"url": "https://example.com"})).await.unwrap();
        assert!(result.success);
        assert!(result.to_llm_text().contains("https://example.com"));
    }
}
