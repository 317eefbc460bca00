//! Groq chat-completions client

use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::{header, Client, StatusCode};
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::agent::types::*;
use crate::config::GroqConfig;
use crate::error::{Error, Result};

/// A chat model the agent and the direct path can talk to
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier
    fn model(&self) -> &str;

    /// Run one chat completion, optionally offering tools
    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Option<Vec<ToolDefinition>>,
    ) -> Result<ChatCompletionResponse>;

    /// Answer a single prompt without tools or history
    async fn invoke(&self, prompt: &str) -> Result<String> {
        let response = self.chat(vec![Message::user(prompt)], None).await?;
        response
            .first_choice()
            .map(|choice| choice.message.text().to_string())
            .ok_or_else(|| Error::Provider("response contained no choices".to_string()))
    }
}

/// Groq API client (OpenAI-compatible)
#[derive(Clone)]
pub struct GroqClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: GroqConfig,
}

impl GroqClient {
    /// Create a new Groq client
    pub fn new(config: GroqConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();

        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!(
                "Bearer {}",
                config.api_key.expose_secret()
            ))
            .map_err(|e| Error::Config(format!("Invalid API key format: {}", e)))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(GroqClient { client, config })
    }

    /// Configuration this client was built from
    pub fn config(&self) -> &GroqConfig {
        &self.config
    }

    fn build_request(
        &self,
        messages: Vec<Message>,
        tools: Option<Vec<ToolDefinition>>,
        options: GenerationOptions,
    ) -> ChatCompletionRequest {
        let tools = tools.filter(|t| !t.is_empty());
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature.or(Some(self.config.temperature)),
            stream: Some(false),
            tool_choice: tools.as_ref().map(|_| "auto".to_string()),
            tools,
        }
    }

    /// Send a request, retrying transient failures with exponential backoff
    async fn send_with_retry(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let policy = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(self.config.max_retry_elapsed_secs)),
            ..Default::default()
        };
        let this = self;

        retry(policy, || async move {
            this.send_request(request).await.map_err(|e| {
                if e.is_retryable() {
                    warn!("Transient Groq failure, retrying: {}", e);
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        })
        .await
    }

    /// Send a request to the chat-completions endpoint
    async fn send_request(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let url = format!("{}/chat/completions", self.config.base_url);

        debug!(
            "Sending request to Groq: model={}, messages={}, tools={}",
            request.model,
            request.messages.len(),
            request.tools.as_ref().map_or(0, |t| t.len())
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();

        if status.is_success() {
            let body = response
                .json::<ChatCompletionResponse>()
                .await
                .map_err(map_transport_error)?;

            if let Some(ref usage) = body.usage {
                info!("Groq response: model={}, tokens={}", body.model, usage.total_tokens);
            }

            Ok(body)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(map_status_error(status, error_text))
        }
    }
}

#[async_trait]
impl LanguageModel for GroqClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Option<Vec<ToolDefinition>>,
    ) -> Result<ChatCompletionResponse> {
        let request = self.build_request(messages, tools, GenerationOptions::precise());
        self.send_with_retry(&request).await
    }
}

fn map_transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(format!("Groq request timed out: {}", err))
    } else {
        Error::Http(err)
    }
}

fn map_status_error(status: StatusCode, body: String) -> Error {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            warn!("Rate limit exceeded: {}", body);
            Error::RateLimit(body)
        }
        StatusCode::UNAUTHORIZED => Error::Unauthorized("Invalid API key".to_string()),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            Error::Timeout(format!("API error ({}): {}", status, body))
        }
        _ => Error::Provider(format!("API error ({}): {}", status, body)),
    }
}
