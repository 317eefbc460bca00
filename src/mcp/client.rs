//! MCP client owning the set of open server sessions

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::config::McpConfig;
use super::session::McpSession;
use crate::error::{Error, Result};

/// Multi-server MCP client.
///
/// Sessions are opened on demand by [`create_all_sessions`](Self::create_all_sessions)
/// and stay open until [`close_all_sessions`](Self::close_all_sessions).
pub struct McpClient {
    /// Server definitions
    config: McpConfig,
    /// Open sessions by server name
    sessions: Mutex<BTreeMap<String, Arc<McpSession>>>,
}

impl McpClient {
    /// Create a client from parsed definitions
    pub fn new(config: McpConfig) -> Self {
        McpClient {
            config,
            sessions: Mutex::new(BTreeMap::new()),
        }
    }

    /// Create a client from a definitions file; no servers are started yet
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = McpConfig::load(path)?;
        info!(
            "Loaded {} MCP server definition(s) from {}",
            config.servers.len(),
            path.display()
        );
        Ok(Self::new(config))
    }

    /// Server definitions this client was built from
    pub fn config(&self) -> &McpConfig {
        &self.config
    }

    /// Whether any session is currently open
    pub async fn has_sessions(&self) -> bool {
        !self.sessions.lock().await.is_empty()
    }

    /// Names of the open sessions
    pub async fn session_names(&self) -> Vec<String> {
        self.sessions.lock().await.keys().cloned().collect()
    }

    /// Handles to the open sessions, ordered by server name
    pub async fn sessions(&self) -> Vec<Arc<McpSession>> {
        self.sessions.lock().await.values().cloned().collect()
    }

    /// Add an already-initialized session, replacing one with the same name
    pub async fn add_session(&self, session: McpSession) -> Arc<McpSession> {
        let session = Arc::new(session);
        let previous = self
            .sessions
            .lock()
            .await
            .insert(session.name().to_string(), Arc::clone(&session));
        if let Some(previous) = previous {
            if let Err(e) = previous.close().await {
                warn!("Failed to close replaced MCP session {}: {}", previous.name(), e);
            }
        }
        session
    }

    /// Connect every configured server that has no open session.
    ///
    /// All servers are attempted; the first failure is returned after the rest
    /// have been tried. Sessions that did connect stay open.
    pub async fn create_all_sessions(&self) -> Result<Vec<Arc<McpSession>>> {
        let mut first_error: Option<Error> = None;

        for (name, server) in &self.config.servers {
            if self.sessions.lock().await.contains_key(name) {
                continue;
            }
            debug!("Connecting MCP server {}", name);
            match McpSession::connect(name, server).await {
                Ok(session) => {
                    self.add_session(session).await;
                }
                Err(e) => {
                    warn!("Failed to connect MCP server {}: {}", name, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(self.sessions().await),
        }
    }

    /// Close and forget every open session.
    ///
    /// The set is emptied up front, so a second call closes nothing. Every
    /// session is closed even if an earlier one fails; the first failure is
    /// returned.
    pub async fn close_all_sessions(&self) -> Result<()> {
        let sessions = std::mem::take(&mut *self.sessions.lock().await);
        let mut first_error: Option<Error> = None;

        for (name, session) in sessions {
            match session.close().await {
                Ok(()) => info!("Closed MCP session {}", name),
                Err(e) => {
                    warn!("Failed to close MCP session {}: {}", name, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
