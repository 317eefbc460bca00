//! Configuration validation
//!
//! Validates configuration and reports issues.

use secrecy::ExposeSecret;

use super::types::Config;
use crate::error::{Error, Result};

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }

    /// Turn the first error into an `Error::Config`
    pub fn into_result(self) -> Result<()> {
        match self.errors.into_iter().next() {
            Some(issue) => Err(Error::Config(issue.to_string())),
            None => Ok(()),
        }
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    if config.provider.api_key.expose_secret().trim().is_empty() {
        result = result.with_error(ValidationIssue::new("provider.api_key", "API key is empty"));
    }
    if config.provider.model.trim().is_empty() {
        result = result.with_error(ValidationIssue::new("provider.model", "model is empty"));
    }
    if url::Url::parse(&config.provider.base_url).is_err() {
        result = result.with_error(ValidationIssue::new(
            "provider.base_url",
            format!("'{}' is not a valid URL", config.provider.base_url),
        ));
    }
    if config.agent.max_steps == 0 {
        result = result.with_error(ValidationIssue::new(
            "agent.max_steps",
            "must be at least 1",
        ));
    }
    if !config.mcp.config_path.exists() {
        result = result.with_warning(ValidationIssue::new(
            "mcp.config_path",
            format!("{} does not exist", config.mcp.config_path.display()),
        ));
    }

    result
}
