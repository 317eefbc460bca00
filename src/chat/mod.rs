//! Interactive chat session
//!
//! Reads one line at a time, routes content to the tool agent or the direct
//! model, and closes open MCP sessions on every way out of the loop.

mod command;
mod input;
mod session;

pub use command::{Command, LoopState};
pub use input::{LineSource, StdinLines};
pub use session::{ChatSession, SessionOwner, ToolAgent};
