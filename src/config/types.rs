//! Configuration types

use secrecy::SecretString;
use std::path::PathBuf;

/// Groq model used when none is configured
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Groq's OpenAI-compatible endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// MCP server definitions file looked up in the working directory
pub const DEFAULT_MCP_CONFIG: &str = "browser_mcp.json";

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Language-model provider configuration
    pub provider: GroqConfig,
    /// Tool agent configuration
    pub agent: AgentConfig,
    /// MCP client configuration
    pub mcp: McpSettings,
}

impl Config {
    /// Build a configuration with defaults around the given API key
    pub fn new(api_key: SecretString) -> Self {
        Config {
            provider: GroqConfig::new(api_key),
            agent: AgentConfig::default(),
            mcp: McpSettings::default(),
        }
    }
}

/// Groq (OpenAI-compatible) provider configuration
#[derive(Debug, Clone)]
pub struct GroqConfig {
    /// API key
    pub api_key: SecretString,
    /// Model identifier
    pub model: String,
    /// Base URL of the chat-completions API
    pub base_url: String,
    /// Sampling temperature; fixed at 0 for deterministic answers
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Upper bound on time spent retrying transient failures
    pub max_retry_elapsed_secs: u64,
}

impl GroqConfig {
    /// Create a provider configuration with default model and endpoint
    pub fn new(api_key: SecretString) -> Self {
        GroqConfig {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.0,
            timeout_secs: 120,
            max_retry_elapsed_secs: 30,
        }
    }
}

/// Tool agent configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum LLM round-trips per agent run
    pub max_steps: u32,
    /// Keep prior turns in the agent's conversation history
    pub memory_enabled: bool,
    /// Override for the agent's system prompt
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            max_steps: 15,
            memory_enabled: true,
            system_prompt: None,
        }
    }
}

/// MCP client configuration
#[derive(Debug, Clone)]
pub struct McpSettings {
    /// Path to the `mcpServers` definitions file
    pub config_path: PathBuf,
    /// Seconds to wait for all sessions to close at shutdown
    pub close_timeout_secs: u64,
}

impl Default for McpSettings {
    fn default() -> Self {
        McpSettings {
            config_path: PathBuf::from(DEFAULT_MCP_CONFIG),
            close_timeout_secs: 10,
        }
    }
}
