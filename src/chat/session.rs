//! The read-route-dispatch loop and its shutdown

use async_trait::async_trait;
use console::style;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::command::{Command, LoopState};
use super::input::{LineSource, StdinLines};
use crate::agent::{LanguageModel, McpAgent};
use crate::error::{Error, Result};
use crate::mcp::McpClient;
use crate::router::{self, RoutingDecision};

/// The tool-using side of the chat
#[async_trait]
pub trait ToolAgent: Send {
    /// Answer an utterance, possibly calling tools
    async fn run(&mut self, utterance: &str) -> Result<String>;

    /// Forget remembered turns
    fn clear_history(&mut self);
}

#[async_trait]
impl<M: LanguageModel + 'static> ToolAgent for McpAgent<M> {
    async fn run(&mut self, utterance: &str) -> Result<String> {
        McpAgent::run(self, utterance).await
    }

    fn clear_history(&mut self) {
        self.clear_conversation_history();
    }
}

/// Whatever holds the open tool sessions
#[async_trait]
pub trait SessionOwner: Send + Sync {
    async fn has_open_sessions(&self) -> bool;

    async fn close_all_sessions(&self) -> Result<()>;
}

#[async_trait]
impl SessionOwner for McpClient {
    async fn has_open_sessions(&self) -> bool {
        self.has_sessions().await
    }

    async fn close_all_sessions(&self) -> Result<()> {
        McpClient::close_all_sessions(self).await
    }
}

/// Default bound on closing sessions at shutdown
const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// One interactive chat from first prompt to shutdown
pub struct ChatSession<L: ?Sized, A, S: ?Sized> {
    llm: Arc<L>,
    agent: A,
    sessions: Arc<S>,
    close_timeout: Duration,
    state: LoopState,
}

impl<L, A, S> ChatSession<L, A, S>
where
    L: LanguageModel + ?Sized,
    A: ToolAgent,
    S: SessionOwner + ?Sized,
{
    /// Bind the collaborators built during initialization
    pub fn new(llm: Arc<L>, agent: A, sessions: Arc<S>) -> Self {
        ChatSession {
            llm,
            agent,
            sessions,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            state: LoopState::Initializing,
        }
    }

    /// Bound the time spent closing sessions at shutdown
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Current loop state
    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    /// Chat on the console until exit, end of input or Ctrl-C
    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = std::io::stdout();
        let interrupt = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Ctrl-C handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        };
        self.run_until(StdinLines::spawn(), &mut stdout, interrupt).await
    }

    /// Drive the loop over `input`, then shut down.
    ///
    /// Shutdown runs whatever way the loop ends, including an input or output
    /// error, which is returned afterwards. Shutdown failures are reported
    /// on `out` but never returned.
    pub async fn run_until<I, W, F>(&mut self, mut input: I, out: &mut W, interrupt: F) -> Result<()>
    where
        I: LineSource,
        W: Write,
        F: Future<Output = ()>,
    {
        let outcome = self.drive(&mut input, out, interrupt).await;
        if let Err(e) = &outcome {
            warn!("Chat loop ended with error: {}", e);
        }
        self.shutdown(out).await;
        self.transition(LoopState::Terminated);
        outcome
    }

    async fn drive<I, W, F>(&mut self, input: &mut I, out: &mut W, interrupt: F) -> Result<()>
    where
        I: LineSource,
        W: Write,
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);

        print_banner(out)?;
        self.transition(LoopState::AwaitingInput);

        loop {
            write!(out, "\nYou: ")?;
            out.flush()?;

            let line = tokio::select! {
                line = input.next_line() => line,
                _ = &mut interrupt => Ok(None),
            };
            let line = match line {
                Ok(line) => line,
                // a garbled line is skipped, the terminal is still usable
                Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::InvalidData => {
                    warn!("Unreadable input line: {}", e);
                    writeln!(out, "\nError: input line is not valid UTF-8")?;
                    continue;
                }
                Err(e) => return Err(e),
            };
            let command = match line {
                Some(line) => Command::parse(&line),
                // end of input and Ctrl-C both end the chat
                None => {
                    writeln!(out)?;
                    Command::Exit
                }
            };

            let utterance = match command {
                Command::Exit => {
                    writeln!(out, "Ending conversation...")?;
                    return Ok(());
                }
                Command::Empty => continue,
                Command::Clear => {
                    self.transition(LoopState::ClearingHistory);
                    self.agent.clear_history();
                    writeln!(out, "Conversation history cleared.")?;
                    self.transition(LoopState::AwaitingInput);
                    continue;
                }
                Command::Content(utterance) => utterance,
            };

            let decision = router::route(&utterance);
            debug!("Routing {:?} to {}", utterance, decision);
            self.transition(match decision {
                RoutingDecision::ToolRequired => LoopState::DispatchingTool,
                RoutingDecision::DirectAnswer => LoopState::DispatchingDirect,
            });

            let reply = tokio::select! {
                reply = dispatch(self.llm.as_ref(), &mut self.agent, decision, &utterance) => Some(reply),
                _ = &mut interrupt => None,
            };
            match reply {
                Some(Ok(text)) => writeln!(out, "\nAssistant: {}", text)?,
                Some(Err(e)) => {
                    warn!("Dispatch failed: {}", e);
                    writeln!(out, "\nError: {}", e)?;
                }
                None => {
                    writeln!(out)?;
                    writeln!(out, "Ending conversation...")?;
                    return Ok(());
                }
            }
            self.transition(LoopState::AwaitingInput);
        }
    }

    /// Close open sessions once, bounded by the close timeout
    async fn shutdown<W: Write>(&mut self, out: &mut W) {
        self.transition(LoopState::ShuttingDown);

        if !self.sessions.has_open_sessions().await {
            debug!("No open MCP sessions to close");
            return;
        }

        let result = match tokio::time::timeout(self.close_timeout, self.sessions.close_all_sessions()).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "closing sessions took longer than {}s",
                self.close_timeout.as_secs()
            ))),
        };

        match result {
            Ok(()) => info!("All MCP sessions closed"),
            Err(e) => {
                warn!("Failed to close MCP sessions: {}", e);
                let _ = writeln!(out, "Warning: failed to close tool sessions: {}", e);
            }
        }
    }

    fn transition(&mut self, next: LoopState) {
        debug!("Chat state {} -> {}", self.state, next);
        self.state = next;
    }
}

async fn dispatch<L, A>(
    llm: &L,
    agent: &mut A,
    decision: RoutingDecision,
    utterance: &str,
) -> Result<String>
where
    L: LanguageModel + ?Sized,
    A: ToolAgent,
{
    match decision {
        RoutingDecision::ToolRequired => agent.run(utterance).await,
        RoutingDecision::DirectAnswer => llm.invoke(utterance).await,
    }
}

fn print_banner<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", style("===== Interactive MCP Chat =====").cyan().bold())?;
    writeln!(
        out,
        "Type {} or {} to end the conversation",
        style("'exit'").yellow(),
        style("'quit'").yellow()
    )?;
    writeln!(out, "Type {} to clear conversation history", style("'clear'").yellow())?;
    writeln!(out, "{}", style("================================").cyan().bold())?;
    Ok(())
}
