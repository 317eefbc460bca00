//! One initialized connection to an MCP server

use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use super::config::ServerConfig;
use super::protocol::{McpNotification, McpRequest, McpTool, McpToolList, McpToolResult};
use super::transport::{HttpTransport, StdioTransport, Transport};
use crate::error::{Error, Result};

/// Upper bound on `tools/list` pages fetched from one server
const MAX_TOOL_PAGES: usize = 100;

/// An MCP session: a transport that has completed the initialize handshake
pub struct McpSession {
    /// Server name from the config file
    name: String,
    /// Underlying transport
    transport: Box<dyn Transport>,
    /// Request ID counter
    next_id: AtomicU64,
    /// `serverInfo` reported during initialize
    server_info: Value,
}

impl McpSession {
    /// Open a transport for `server` and initialize it
    pub async fn connect(name: &str, server: &ServerConfig) -> Result<Self> {
        let transport: Box<dyn Transport> = match server {
            ServerConfig::Stdio(stdio) => Box::new(StdioTransport::spawn(name, stdio)?),
            ServerConfig::Http(http) => Box::new(HttpTransport::new(name, http)?),
        };
        Self::initialize(name, transport).await
    }

    /// Run the initialize handshake over an already-open transport
    pub async fn initialize(name: &str, transport: Box<dyn Transport>) -> Result<Self> {
        let mut session = McpSession {
            name: name.to_string(),
            transport,
            next_id: AtomicU64::new(1),
            server_info: Value::Null,
        };

        let id = session.next_id();
        let result = match session.transport.request(McpRequest::initialize(id)).await {
            Ok(response) => response.into_result(&session.name),
            Err(e) => Err(e),
        };
        let result = match result {
            Ok(result) => result,
            Err(e) => {
                // don't leak a spawned process when the handshake fails
                if let Err(close_err) = session.transport.close().await {
                    warn!("Failed to close MCP server {} after init error: {}", name, close_err);
                }
                return Err(e);
            }
        };

        session.server_info = result.get("serverInfo").cloned().unwrap_or(Value::Null);
        session.transport.notify(McpNotification::initialized()).await?;

        let version = result
            .get("protocolVersion")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        info!("MCP server {} initialized (protocol {})", session.name, version);

        Ok(session)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// List available tools from the MCP server, following pagination
    pub async fn list_tools(&self) -> Result<Vec<McpTool>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen_cursors = HashSet::new();

        for _ in 0..MAX_TOOL_PAGES {
            let request = McpRequest::list_tools(self.next_id(), cursor.as_deref());
            let result = self.transport.request(request).await?.into_result(&self.name)?;
            let page: McpToolList = serde_json::from_value(result).map_err(|e| {
                Error::Mcp(format!("{}: invalid tools/list result: {}", self.name, e))
            })?;

            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if !next.is_empty() => {
                    if !seen_cursors.insert(next.clone()) {
                        warn!("MCP server {} repeated tools/list cursor {}", self.name, next);
                        return Err(Error::Mcp(format!(
                            "{}: tools/list cursor {} repeated",
                            self.name, next
                        )));
                    }
                    cursor = Some(next);
                }
                _ => {
                    debug!("MCP server {} has {} tools", self.name, tools.len());
                    return Ok(tools);
                }
            }
        }

        Err(Error::Mcp(format!(
            "{}: tools/list did not finish within {} pages",
            self.name, MAX_TOOL_PAGES
        )))
    }

    /// Call a tool on the MCP server
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<McpToolResult> {
        let request = McpRequest::call_tool(self.next_id(), name, arguments);
        let result = self.transport.request(request).await?.into_result(&self.name)?;

        let tool_result: McpToolResult = serde_json::from_value(result).map_err(|e| {
            Error::Mcp(format!("{}: invalid tools/call result: {}", self.name, e))
        })?;

        if tool_result.is_error {
            warn!("MCP tool {} on {} returned error", name, self.name);
        }

        Ok(tool_result)
    }

    /// Close the transport
    pub async fn close(&self) -> Result<()> {
        debug!("Closing MCP session {}", self.name);
        self.transport.close().await
    }

    /// Get the server name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `serverInfo` from the handshake (`null` when the server sent none)
    pub fn server_info(&self) -> &Value {
        &self.server_info
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport shared by the MCP and agent tests

    use super::*;
    use crate::mcp::protocol::McpResponse;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex};

    /// Answers by method name and records what it was sent
    #[derive(Clone, Default)]
    pub struct FakeTransport {
        pub methods: Arc<Mutex<Vec<String>>>,
        pub closes: Arc<AtomicUsize>,
        pub tool_pages: Arc<Mutex<Vec<Value>>>,
        pub fail_initialize: bool,
        pub fail_close: bool,
    }

    impl FakeTransport {
        pub fn with_tools(tools: Value) -> Self {
            let fake = FakeTransport::default();
            fake.tool_pages.lock().unwrap().push(serde_json::json!({ "tools": tools }));
            fake
        }

        pub fn sent(&self) -> Vec<String> {
            self.methods.lock().unwrap().clone()
        }

        pub fn close_count(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn request(&self, request: McpRequest) -> Result<McpResponse> {
            self.methods.lock().unwrap().push(request.method.clone());
            let result = match request.method.as_str() {
                "initialize" if self.fail_initialize => {
                    return Err(Error::Connection("handshake refused".into()))
                }
                "initialize" => serde_json::json!({
                    "protocolVersion": "2024-11-05",
                    "serverInfo": {"name": "fake", "version": "1"}
                }),
                "tools/list" => {
                    let mut pages = self.tool_pages.lock().unwrap();
                    if pages.is_empty() {
                        serde_json::json!({ "tools": [] })
                    } else {
                        pages.remove(0)
                    }
                }
                "tools/call" => {
                    let params = request.params.unwrap_or_default();
                    serde_json::json!({
                        "content": [{
                            "type": "text",
                            "text": format!("called {} with {}", params["name"].as_str().unwrap_or("?"), params["arguments"])
                        }]
                    })
                }
                other => return Err(Error::Mcp(format!("unexpected method {}", other))),
            };
            Ok(McpResponse::success(request.id, result))
        }

        async fn notify(&self, notification: McpNotification) -> Result<()> {
            self.methods.lock().unwrap().push(notification.method);
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                Err(Error::Connection("already gone".into()))
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeTransport;
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_initialize_sends_handshake_then_notification() {
        let fake = FakeTransport::default();
        let session = McpSession::initialize("fake", Box::new(fake.clone())).await.unwrap();

        assert_eq!(fake.sent(), vec!["initialize", "notifications/initialized"]);
        assert_eq!(session.server_info()["name"], "fake");
        assert_eq!(session.name(), "fake");
    }

    #[tokio::test]
    async fn test_failed_handshake_closes_transport() {
        let fake = FakeTransport {
            fail_initialize: true,
            ..Default::default()
        };
        let result = McpSession::initialize("fake", Box::new(fake.clone())).await;
        assert!(matches!(result, Err(Error::Connection(_))));
        assert_eq!(fake.close_count(), 1);
    }

    #[tokio::test]
    async fn test_list_tools_follows_cursor() {
        let fake = FakeTransport::default();
        {
            let mut pages = fake.tool_pages.lock().unwrap();
            pages.push(json!({"tools": [{"name": "browser_navigate"}], "nextCursor": "p2"}));
            pages.push(json!({"tools": [{"name": "browser_click"}]}));
        }
        let session = McpSession::initialize("fake", Box::new(fake.clone())).await.unwrap();

        let tools = session.list_tools().await.unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["browser_navigate", "browser_click"]);
        assert_eq!(fake.sent().iter().filter(|m| *m == "tools/list").count(), 2);
    }

    #[tokio::test]
    async fn test_list_tools_rejects_repeated_cursor() {
        let fake = FakeTransport::default();
        {
            let mut pages = fake.tool_pages.lock().unwrap();
            for _ in 0..5 {
                pages.push(json!({"tools": [{"name": "browser_navigate"}], "nextCursor": "same"}));
            }
        }
        let session = McpSession::initialize("fake", Box::new(fake.clone())).await.unwrap();

        let err = session.list_tools().await.unwrap_err();
        assert!(matches!(err, Error::Mcp(_)));
        assert!(err.to_string().contains("repeated"));
        assert_eq!(fake.sent().iter().filter(|m| *m == "tools/list").count(), 2);
    }

    #[tokio::test]
    async fn test_list_tools_page_count_is_bounded() {
        let fake = FakeTransport::default();
        {
            let mut pages = fake.tool_pages.lock().unwrap();
            for i in 0..MAX_TOOL_PAGES + 10 {
                pages.push(json!({"tools": [], "nextCursor": format!("page-{}", i)}));
            }
        }
        let session = McpSession::initialize("fake", Box::new(fake.clone())).await.unwrap();

        let err = session.list_tools().await.unwrap_err();
        assert!(err.to_string().contains("did not finish"));
        assert_eq!(
            fake.sent().iter().filter(|m| *m == "tools/list").count(),
            MAX_TOOL_PAGES
        );
    }

    #[tokio::test]
    async fn test_call_tool_returns_text() {
        let fake = FakeTransport::default();
        let session = McpSession::initialize("fake", Box::new(fake)).await.unwrap();

        let result = session
            .call_tool("browser_navigate", json!({"url": "https://example.com"}))
            .await
            .unwrap();
        assert!(!result.is_error);
        assert!(result.text().starts_with("called browser_navigate"));
    }
}
