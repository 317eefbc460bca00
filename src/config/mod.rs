//! Configuration module
//!
//! - types.rs: configuration types (Config, GroqConfig, AgentConfig, McpSettings)
//! - io.rs: loading from `.env` and the process environment
//! - validation.rs: configuration validation

mod io;
mod types;
mod validation;

pub use types::{AgentConfig, Config, GroqConfig, McpSettings};
pub use types::{DEFAULT_BASE_URL, DEFAULT_MCP_CONFIG, DEFAULT_MODEL};

pub use io::{apply_env_overrides, load_config, load_config_from, API_KEY_VAR};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};
