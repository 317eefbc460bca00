//! MCP (Model Context Protocol) module
//!
//! Connects the agent to external tool providers such as browser automation
//! servers.
//!
//! ## Architecture
//!
//! - **config**: the `mcpServers` definitions file
//! - **protocol**: wire protocol types (JSON-RPC based)
//! - **transport**: stdio subprocess and streamable HTTP transports
//! - **session**: one initialized server connection
//! - **client**: the set of open sessions and their lifecycle
//! - **bridge**: adapts MCP tools into the crate's `Tool` trait
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mcp_chat::mcp::McpClient;
//!
//! # async fn example() -> mcp_chat::Result<()> {
//! let client = McpClient::from_config_file("browser_mcp.json")?;
//! for session in client.create_all_sessions().await? {
//!     let tools = session.list_tools().await?;
//!     println!("{}: {} tools", session.name(), tools.len());
//! }
//! client.close_all_sessions().await?;
//! # Ok(())
//! # }
//! ```

mod bridge;
mod client;
pub mod config;
pub mod protocol;
mod session;
pub mod transport;

pub use bridge::McpToolBridge;
pub use client::McpClient;
pub use config::{McpConfig, ServerConfig};
pub use protocol::{McpContent, McpRequest, McpResponse, McpTool, McpToolResult};
pub use session::McpSession;

#[cfg(test)]
pub(crate) use session::testing;
