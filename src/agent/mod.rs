//! Agent module - LLM client and the MCP tool agent
//!
//! This module handles all AI-related functionality including:
//! - Groq API client (OpenAI-compatible chat completions)
//! - Message types and conversation memory
//! - The tool-calling agent driving MCP sessions

mod client;
mod conversation;
mod mcp_agent;
mod types;

pub use client::{GroqClient, LanguageModel};
pub use conversation::Conversation;
pub use mcp_agent::{max_steps_message, run_tool_loop, AgentOptions, McpAgent};
pub use types::*;

/// System prompt leading every tool-agent run unless overridden
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant that can browse the web \
and operate a browser through the tools provided. Use the tools when a request needs live \
web content or browser actions, and answer directly from what they return. If a tool fails, \
explain what went wrong instead of guessing.";
