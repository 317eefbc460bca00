//! Tool-calling agent over MCP sessions.
//!
//! The agent offers every tool exposed by the open MCP sessions to the
//! language model and runs the call-tool-observe loop until the model answers
//! without requesting tools or the step budget runs out.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::agent::conversation::Conversation;
use crate::agent::types::Message;
use crate::agent::{LanguageModel, DEFAULT_SYSTEM_PROMPT};
use crate::config::AgentConfig;
use crate::error::{Error, Result};
use crate::mcp::{McpClient, McpToolBridge};
use crate::tools::{Tool, ToolCall, ToolRegistry};

/// Limits and behaviour of one agent
#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Maximum LLM round-trips per run
    pub max_steps: u32,
    /// Replay earlier turns into each run
    pub memory_enabled: bool,
    /// System message leading every run
    pub system_prompt: String,
}

impl Default for AgentOptions {
    fn default() -> Self {
        AgentOptions {
            max_steps: 15,
            memory_enabled: true,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl From<&AgentConfig> for AgentOptions {
    fn from(config: &AgentConfig) -> Self {
        AgentOptions {
            max_steps: config.max_steps,
            memory_enabled: config.memory_enabled,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }
}

/// Reply returned when a run hits its step budget
pub fn max_steps_message(max_steps: u32) -> String {
    format!(
        "Agent stopped after reaching the maximum number of steps ({}).",
        max_steps
    )
}

/// Agent bound to a language model and an MCP client
pub struct McpAgent<M: LanguageModel> {
    llm: Arc<M>,
    client: Arc<McpClient>,
    options: AgentOptions,
    /// Tools from every session, built on the first run
    registry: Option<ToolRegistry>,
    conversation: Conversation,
}

impl<M: LanguageModel> McpAgent<M> {
    /// Create an agent; no MCP sessions are opened until the first run
    pub fn new(llm: Arc<M>, client: Arc<McpClient>, options: AgentOptions) -> Self {
        McpAgent {
            llm,
            client,
            options,
            registry: None,
            conversation: Conversation::new(),
        }
    }

    /// The MCP client whose sessions this agent uses
    pub fn client(&self) -> &Arc<McpClient> {
        &self.client
    }

    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    /// Remembered turns
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Forget all remembered turns
    pub fn clear_conversation_history(&mut self) {
        debug!(
            "Clearing conversation {} ({} turns since {})",
            self.conversation.id,
            self.conversation.turn_count(),
            self.conversation.created_at.to_rfc3339()
        );
        self.conversation.clear();
    }

    /// Answer `query`, using MCP tools as the model sees fit.
    ///
    /// The turn is remembered only when the run succeeds.
    pub async fn run(&mut self, query: &str) -> Result<String> {
        let registry = match self.registry.take() {
            Some(registry) => registry,
            None => self.build_registry().await?,
        };

        let mut messages = vec![Message::system(self.options.system_prompt.as_str())];
        if self.options.memory_enabled {
            messages.extend(self.conversation.messages().iter().cloned());
        }
        messages.push(Message::user(query));

        let outcome =
            run_tool_loop(self.llm.as_ref(), &registry, messages, self.options.max_steps).await;
        self.registry = Some(registry);
        let reply = outcome?;

        if self.options.memory_enabled {
            self.conversation.record_turn(query, reply.as_str());
        }
        Ok(reply)
    }

    /// Open missing sessions and collect their tools
    async fn build_registry(&self) -> Result<ToolRegistry> {
        let sessions = self.client.create_all_sessions().await?;

        let mut registry = ToolRegistry::new();
        for session in sessions {
            for bridge in McpToolBridge::from_session(session).await? {
                debug!("Registering MCP tool {} from {}", bridge.name(), bridge.server());
                registry.register(bridge);
            }
        }

        info!("Agent has {} MCP tool(s) available", registry.count());
        Ok(registry)
    }
}

/// Drive the LLM until it answers without tool calls.
///
/// Every tool call is executed in the order requested and its result appended
/// as a `tool` message. After `max_steps` LLM calls the loop gives up with
/// [`max_steps_message`].
pub async fn run_tool_loop<M: LanguageModel + ?Sized>(
    model: &M,
    registry: &ToolRegistry,
    mut messages: Vec<Message>,
    max_steps: u32,
) -> Result<String> {
    let definitions = registry.definitions();
    let started = Instant::now();
    let mut tool_calls_made = 0usize;

    for step in 1..=max_steps {
        debug!("Agent step {}/{}", step, max_steps);

        let response = model.chat(messages.clone(), Some(definitions.clone())).await?;
        let message = response
            .first_choice()
            .map(|choice| choice.message.clone())
            .ok_or_else(|| Error::Provider("response contained no choices".to_string()))?;

        let calls: Vec<ToolCall> = message
            .requested_tool_calls()
            .iter()
            .map(ToolCall::from_assistant)
            .collect();

        if calls.is_empty() {
            info!(
                "Agent finished: steps={}, tool_calls={}, duration={}ms",
                step,
                tool_calls_made,
                started.elapsed().as_millis()
            );
            return Ok(message.text().to_string());
        }

        messages.push(message);
        for call in calls {
            tool_calls_made += 1;
            info!("Executing tool: {}", call.name);
            let result = registry.execute(&call).await?;
            if !result.success {
                warn!("Tool {} failed: {}", call.name, result.to_llm_text());
            }
            messages.push(Message::tool(call.id, result.to_llm_text()));
        }
    }

    warn!("Agent exceeded {} steps without a final answer", max_steps);
    Ok(max_steps_message(max_steps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::types::*;
    use crate::mcp::testing::FakeTransport;
    use crate::mcp::{McpConfig, McpSession};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned assistant messages and records every request
    #[derive(Default)]
    struct ScriptedModel {
        script: Mutex<VecDeque<Message>>,
        /// Returned once the script runs out
        fallback: Option<Message>,
        requests: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedModel {
        fn new(script: Vec<Message>) -> Self {
            ScriptedModel {
                script: Mutex::new(script.into()),
                ..Default::default()
            }
        }

        fn requests(&self) -> Vec<Vec<Message>> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        fn model(&self) -> &str {
            "scripted"
        }

        async fn chat(
            &self,
            messages: Vec<Message>,
            _tools: Option<Vec<ToolDefinition>>,
        ) -> Result<ChatCompletionResponse> {
            self.requests.lock().unwrap().push(messages);
            let next = self.script.lock().unwrap().pop_front();
            let message = next
                .or_else(|| self.fallback.clone())
                .ok_or_else(|| Error::Provider("script exhausted".into()))?;
            Ok(ChatCompletionResponse {
                id: String::new(),
                model: "scripted".into(),
                choices: vec![Choice {
                    index: 0,
                    message,
                    finish_reason: None,
                }],
                usage: None,
            })
        }
    }

    fn tool_call(id: &str, name: &str, arguments: &str) -> Message {
        Message {
            role: Role::Assistant,
            content: None,
            tool_call_id: None,
            tool_calls: Some(vec![AssistantToolCall {
                id: id.into(),
                call_type: "function".into(),
                function: FunctionCall {
                    name: name.into(),
                    arguments: arguments.into(),
                },
            }]),
        }
    }

    async fn client_with_browser() -> Arc<McpClient> {
        let config =
            McpConfig::parse(r#"{"mcpServers": {"playwright": {"command": "fake-mcp"}}}"#).unwrap();
        let client = Arc::new(McpClient::new(config));
        let fake = FakeTransport::with_tools(json!([
            {"name": "browser_navigate", "description": "Go to a URL",
             "inputSchema": {"type": "object", "properties": {"url": {"type": "string"}}}}
        ]));
        let session = McpSession::initialize("playwright", Box::new(fake)).await.unwrap();
        client.add_session(session).await;
        client
    }

    fn last_tool_message(request: &[Message]) -> &str {
        request
            .iter()
            .rev()
            .find(|m| m.role == Role::Tool)
            .map(|m| m.text())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_run_executes_tool_then_answers() {
        let model = Arc::new(ScriptedModel::new(vec![
            tool_call("call_1", "browser_navigate", r#"{"url":"https://example.com"}"#),
            Message::assistant("The page title is Example Domain."),
        ]));
        let mut agent = McpAgent::new(
            Arc::clone(&model),
            client_with_browser().await,
            AgentOptions::default(),
        );

        let reply = agent.run("open example.com").await.unwrap();
        assert_eq!(reply, "The page title is Example Domain.");

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0][0].role, Role::System);
        assert!(last_tool_message(&requests[1]).contains("called browser_navigate"));
        assert_eq!(requests[1][requests[1].len() - 1].tool_call_id.as_deref(), Some("call_1"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_to_model() {
        let model = ScriptedModel::new(vec![
            tool_call("call_1", "browser_teleport", "{}"),
            Message::assistant("I can't do that."),
        ]);
        let registry = ToolRegistry::new();

        let reply = run_tool_loop(&model, &registry, vec![Message::user("teleport")], 5)
            .await
            .unwrap();
        assert_eq!(reply, "I can't do that.");
        assert_eq!(
            last_tool_message(&model.requests()[1]),
            "Error: Unknown tool: browser_teleport"
        );
    }

    #[tokio::test]
    async fn test_loop_stops_at_max_steps() {
        let model = ScriptedModel {
            fallback: Some(tool_call("call_n", "browser_navigate", "not json")),
            ..Default::default()
        };
        let registry = ToolRegistry::new();

        let reply = run_tool_loop(&model, &registry, vec![Message::user("loop")], 3)
            .await
            .unwrap();
        assert_eq!(
            reply,
            "Agent stopped after reaching the maximum number of steps (3)."
        );
        assert_eq!(model.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_memory_replays_turns_until_cleared() {
        let model = Arc::new(ScriptedModel::new(vec![
            Message::assistant("first reply"),
            Message::assistant("second reply"),
            Message::assistant("third reply"),
        ]));
        let mut agent = McpAgent::new(
            Arc::clone(&model),
            client_with_browser().await,
            AgentOptions::default(),
        );

        agent.run("first question").await.unwrap();
        agent.run("second question").await.unwrap();
        assert_eq!(agent.conversation().turn_count(), 2);

        agent.clear_conversation_history();
        assert!(agent.conversation().is_empty());
        agent.run("third question").await.unwrap();

        let requests = model.requests();
        // system + user
        assert_eq!(requests[0].len(), 2);
        // system + first turn + user
        assert_eq!(requests[1].len(), 4);
        assert_eq!(requests[1][1].text(), "first question");
        assert_eq!(requests[1][2].text(), "first reply");
        // history was cleared
        assert_eq!(requests[2].len(), 2);
        assert_eq!(requests[2][1].text(), "third question");
    }

    #[tokio::test]
    async fn test_memory_disabled_keeps_nothing() {
        let model = Arc::new(ScriptedModel::new(vec![
            Message::assistant("one"),
            Message::assistant("two"),
        ]));
        let options = AgentOptions {
            memory_enabled: false,
            ..Default::default()
        };
        let mut agent = McpAgent::new(Arc::clone(&model), client_with_browser().await, options);

        agent.run("a").await.unwrap();
        agent.run("b").await.unwrap();

        assert!(agent.conversation().is_empty());
        assert_eq!(model.requests()[1].len(), 2);
    }

    #[tokio::test]
    async fn test_failed_run_is_not_remembered() {
        let model = Arc::new(ScriptedModel::default());
        let mut agent = McpAgent::new(
            Arc::clone(&model),
            client_with_browser().await,
            AgentOptions::default(),
        );

        let err = agent.run("search for rust").await.unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
        assert!(agent.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_the_run() {
        let config =
            McpConfig::parse(r#"{"mcpServers": {"ghost": {"command": "fake-mcp"}}}"#).unwrap();
        let model = Arc::new(ScriptedModel::new(vec![Message::assistant("unused")]));
        let mut agent = McpAgent::new(
            Arc::clone(&model),
            Arc::new(McpClient::new(config)),
            AgentOptions::default(),
        );

        let err = agent.run("open the browser").await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
        assert!(model.requests().is_empty());
    }

    #[test]
    fn test_options_from_config() {
        let config = AgentConfig {
            max_steps: 4,
            memory_enabled: false,
            system_prompt: None,
        };
        let options = AgentOptions::from(&config);
        assert_eq!(options.max_steps, 4);
        assert!(!options.memory_enabled);
        assert_eq!(options.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }
}
