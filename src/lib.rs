//! # mcp-chat
//!
//! An interactive terminal chat that answers plain questions directly from a
//! hosted language model and hands browsing/search style requests to an agent
//! driving MCP (Model Context Protocol) tool servers.
//!
//! ## Layout
//!
//! - **router**: keyword heuristic deciding whether a line needs tools
//! - **chat**: the read-eval-print session loop and its lifecycle
//! - **agent**: Groq chat-completions client and the MCP tool agent
//! - **mcp**: multi-session MCP client (stdio and streamable HTTP)
//! - **tools**: `Tool` trait and registry the agent calls through
//! - **config**: `.env`/environment/CLI layered configuration

pub mod agent;
pub mod chat;
pub mod config;
pub mod error;
pub mod mcp;
pub mod router;
pub mod tools;

pub use config::Config;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
