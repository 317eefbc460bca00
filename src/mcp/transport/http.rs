//! Streamable HTTP transport.
//!
//! Every message is a POST to the server endpoint. The server answers with
//! either a plain JSON body or an SSE stream whose events carry JSON-RPC
//! messages; the event with the matching id is the response.

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use super::Transport;
use crate::error::{Error, Result};
use crate::mcp::config::HttpServer;
use crate::mcp::protocol::{McpNotification, McpRequest, McpResponse};

/// Header carrying the server-assigned session id
const SESSION_HEADER: &str = "mcp-session-id";

/// JSON-RPC over HTTP POST
pub struct HttpTransport {
    /// Server name
    name: String,
    /// HTTP client with the configured headers
    client: Client,
    /// Server endpoint
    endpoint: Url,
    /// Session id assigned by the server, if any
    session_id: Mutex<Option<String>>,
}

impl HttpTransport {
    /// Create a transport for the given server
    pub fn new(name: &str, server: &HttpServer) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (key, value) in &server.headers {
            let key = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| Error::Config(format!("server '{}': bad header name: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::Config(format!("server '{}': bad header value: {}", name, e)))?;
            headers.insert(key, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(HttpTransport {
            name: name.to_string(),
            client,
            endpoint: server.url.clone(),
            session_id: Mutex::new(None),
        })
    }

    async fn post<T: Serialize + ?Sized>(&self, body: &T) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(header::ACCEPT, "application/json, text/event-stream")
            .json(body);
        if let Some(id) = self.session_id.lock().await.clone() {
            request = request.header(SESSION_HEADER, id);
        }

        let response = request.send().await.map_err(|e| {
            Error::Connection(format!("MCP server {} unreachable: {}", self.name, e))
        })?;

        if let Some(id) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            *self.session_id.lock().await = Some(id.to_string());
        }

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Connection(format!(
                "MCP server {} returned {}: {}",
                self.name, status, text
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, request: McpRequest) -> Result<McpResponse> {
        debug!("MCP request -> {}: {}", self.name, request.method);
        let response = self.post(&request).await?;

        let is_event_stream = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/event-stream"));
        let body = response.text().await?;

        if is_event_stream {
            parse_event_stream(&body, request.id).ok_or_else(|| {
                Error::Mcp(format!(
                    "{}: event stream ended without a response to {}",
                    self.name, request.method
                ))
            })
        } else {
            Ok(serde_json::from_str(&body)?)
        }
    }

    async fn notify(&self, notification: McpNotification) -> Result<()> {
        debug!("MCP notification -> {}: {}", self.name, notification.method);
        self.post(&notification).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let Some(id) = self.session_id.lock().await.take() else {
            return Ok(());
        };

        let response = self
            .client
            .delete(self.endpoint.clone())
            .header(SESSION_HEADER, id)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            // servers may refuse client-initiated termination
            StatusCode::METHOD_NOT_ALLOWED => Ok(()),
            status => {
                warn!("MCP server {} rejected session close: {}", self.name, status);
                Ok(())
            }
        }
    }
}

/// Find the JSON-RPC response with `id` in an SSE body
fn parse_event_stream(body: &str, id: u64) -> Option<McpResponse> {
    let normalized = body.replace("\r\n", "\n");
    normalized.split("\n\n").find_map(|event| {
        let data: Vec<&str> = event
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|d| d.strip_prefix(' ').unwrap_or(d))
            .collect();
        if data.is_empty() {
            return None;
        }
        serde_json::from_str::<McpResponse>(&data.join("\n"))
            .ok()
            .filter(|response| response.id == Some(id))
    })
}
