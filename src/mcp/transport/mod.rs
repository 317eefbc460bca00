//! Transports carrying JSON-RPC between the client and an MCP server

mod http;
mod stdio;

use async_trait::async_trait;

use super::protocol::{McpNotification, McpRequest, McpResponse};
use crate::error::Result;

pub use http::HttpTransport;
pub use stdio::StdioTransport;

/// A bidirectional JSON-RPC channel to one MCP server
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and wait for the response with the same id
    async fn request(&self, request: McpRequest) -> Result<McpResponse>;

    /// Send a notification; no response is expected
    async fn notify(&self, notification: McpNotification) -> Result<()>;

    /// Release the underlying process or HTTP session
    async fn close(&self) -> Result<()>;
}
