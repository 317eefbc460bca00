//! MCP server definitions file
//!
//! Uses the common `mcpServers` layout:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "playwright": { "command": "npx", "args": ["@playwright/mcp@latest"] },
//!     "search": { "url": "http://localhost:8931/mcp" }
//!   }
//! }
//! ```
//!
//! The file is parsed as JSON5, so comments and trailing commas are accepted.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use url::Url;

use crate::error::{Error, Result};

/// How to reach one MCP server
#[derive(Debug, Clone, PartialEq)]
pub enum ServerConfig {
    /// Spawn a local process and speak JSON-RPC over its stdio
    Stdio(StdioServer),
    /// Streamable HTTP endpoint
    Http(HttpServer),
}

/// A server launched as a subprocess
#[derive(Debug, Clone, PartialEq)]
pub struct StdioServer {
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

/// A server reached over HTTP
#[derive(Debug, Clone, PartialEq)]
pub struct HttpServer {
    pub url: Url,
    pub headers: HashMap<String, String>,
}

/// Parsed `mcpServers` file, servers ordered by name
#[derive(Debug, Clone, Default)]
pub struct McpConfig {
    pub servers: BTreeMap<String, ServerConfig>,
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(rename = "mcpServers", default)]
    mcp_servers: BTreeMap<String, RawServer>,
}

#[derive(Deserialize)]
struct RawServer {
    command: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
    url: Option<String>,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    disabled: bool,
}

impl McpConfig {
    /// Read and validate a definitions file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read MCP config {}: {}", path.display(), e))
        })?;
        Self::parse(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parse and validate definitions from a string
    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawConfig = json5::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid MCP config: {}", e)))?;

        let mut servers = BTreeMap::new();
        for (name, server) in raw.mcp_servers {
            if server.disabled {
                continue;
            }
            servers.insert(name.clone(), server.into_config(&name)?);
        }

        if servers.is_empty() {
            return Err(Error::Config(
                "MCP config defines no enabled servers under \"mcpServers\"".to_string(),
            ));
        }

        Ok(McpConfig { servers })
    }

    /// Server names in connection order
    pub fn server_names(&self) -> Vec<&str> {
        self.servers.keys().map(|s| s.as_str()).collect()
    }
}

impl RawServer {
    fn into_config(self, name: &str) -> Result<ServerConfig> {
        match (self.command, self.url) {
            (Some(command), None) if !command.trim().is_empty() => {
                Ok(ServerConfig::Stdio(StdioServer {
                    command,
                    args: self.args,
                    env: self.env,
                }))
            }
            (None, Some(url)) => {
                let url = Url::parse(&url)?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(Error::Config(format!(
                        "server '{}': unsupported URL scheme '{}'",
                        name,
                        url.scheme()
                    )));
                }
                Ok(ServerConfig::Http(HttpServer {
                    url,
                    headers: self.headers,
                }))
            }
            (Some(_), Some(_)) => Err(Error::Config(format!(
                "server '{}': set either \"command\" or \"url\", not both",
                name
            ))),
            _ => Err(Error::Config(format!(
                "server '{}': needs a \"command\" or a \"url\"",
                name
            ))),
        }
    }
}
