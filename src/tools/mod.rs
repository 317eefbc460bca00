//! Tools module
//!
//! Tools implement the `Tool` trait and are registered into a `ToolRegistry`
//! that the agent exposes to the LLM for function calling. All tools in this
//! crate come from MCP servers through `crate::mcp::McpToolBridge`.

mod registry;
mod traits;

pub use registry::ToolRegistry;
pub use traits::{Tool, ToolCall, ToolResult};
