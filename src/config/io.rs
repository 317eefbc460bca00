//! Configuration I/O - Loading configuration from the environment
//!
//! Precedence: defaults < `.env` < process environment. CLI flags are
//! applied on top by the binary.

use secrecy::SecretString;
use tracing::warn;

use super::types::Config;
use crate::error::{Error, Result};

/// Environment variable holding the Groq credential
pub const API_KEY_VAR: &str = "GROQ_API_KEY";

/// Load configuration from `.env` and the process environment.
///
/// The credential stays inside the returned [`Config`]; nothing is written
/// back into the process environment.
pub fn load_config() -> Result<Config> {
    dotenvy::dotenv().ok();
    load_config_from(|key| std::env::var(key).ok())
}

/// Build configuration from an arbitrary variable lookup
pub fn load_config_from<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let api_key = lookup(API_KEY_VAR)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            Error::Config(format!(
                "{} is not set; add it to your environment or a .env file",
                API_KEY_VAR
            ))
        })?;

    let mut config = Config::new(SecretString::from(api_key));
    apply_env_overrides(&mut config, lookup);
    Ok(config)
}

/// Apply environment variable overrides to an existing config.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(model) = lookup("GROQ_MODEL") {
        config.provider.model = model;
    }
    if let Some(url) = lookup("GROQ_BASE_URL") {
        config.provider.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(timeout) = lookup("GROQ_TIMEOUT") {
        match timeout.parse() {
            Ok(v) => config.provider.timeout_secs = v,
            Err(_) => warn!("Ignoring invalid GROQ_TIMEOUT value: {}", timeout),
        }
    }
    if let Some(path) = lookup("MCP_CONFIG") {
        config.mcp.config_path = path.into();
    }
    if let Some(steps) = lookup("AGENT_MAX_STEPS") {
        match steps.parse() {
            Ok(v) => config.agent.max_steps = v,
            Err(_) => warn!("Ignoring invalid AGENT_MAX_STEPS value: {}", steps),
        }
    }
}
