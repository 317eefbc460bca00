//! mcp-chat CLI
//!
//! Interactive chat that answers directly or through MCP browser tools.

use clap::{ArgAction, Parser};
use console::style;
use mcp_chat::agent::{AgentOptions, GroqClient, LanguageModel, McpAgent};
use mcp_chat::chat::ChatSession;
use mcp_chat::config::{load_config, validate_config, Config};
use mcp_chat::mcp::McpClient;
use mcp_chat::{Result, VERSION};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mcp-chat",
    author = "mcp-chat Contributors",
    version = VERSION,
    about = "Chat with a Groq-hosted model that can drive a browser over MCP",
    long_about = None
)]
struct Cli {
    /// MCP server definitions file (overrides MCP_CONFIG)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Model to use
    #[arg(long, short)]
    model: Option<String>,

    /// Maximum LLM round-trips per tool request
    #[arg(long)]
    max_steps: Option<u32>,

    /// Don't remember earlier turns in tool requests
    #[arg(long)]
    no_memory: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

type Chat = ChatSession<GroqClient, McpAgent<GroqClient>, McpClient>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    println!("{}", style("Initializing chat...").dim());
    let mut chat = match initialize(&cli) {
        Ok(chat) => chat,
        Err(e) => {
            eprintln!("Initialization failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match chat.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Chat ended unexpectedly: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so they never interleave with the transcript
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mcp_chat=warn")),
        1 => EnvFilter::new("mcp_chat=info"),
        _ => EnvFilter::new("mcp_chat=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Flags win over `.env` and the environment
fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(path) = &cli.config {
        config.mcp.config_path = path.clone();
    }
    if let Some(model) = &cli.model {
        config.provider.model = model.clone();
    }
    if let Some(steps) = cli.max_steps {
        config.agent.max_steps = steps;
    }
    if cli.no_memory {
        config.agent.memory_enabled = false;
    }
}

fn initialize(cli: &Cli) -> Result<Chat> {
    let mut config = load_config()?;
    apply_cli_overrides(&mut config, cli);

    let report = validate_config(&config);
    for issue in &report.warnings {
        warn!("{}", issue);
    }
    report.into_result()?;

    let client = Arc::new(McpClient::from_config_file(&config.mcp.config_path)?);
    let llm = Arc::new(GroqClient::new(config.provider.clone())?);
    info!(
        "Using model {} with MCP servers {:?}",
        llm.model(),
        client.config().server_names()
    );

    let agent = McpAgent::new(
        Arc::clone(&llm),
        Arc::clone(&client),
        AgentOptions::from(&config.agent),
    );

    Ok(ChatSession::new(llm, agent, client)
        .with_close_timeout(Duration::from_secs(config.mcp.close_timeout_secs)))
}
