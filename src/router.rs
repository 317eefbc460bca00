//! Keyword router
//!
//! Decides per utterance whether the request needs the tool agent (browser,
//! search, navigation) or can be answered by the model directly.
//!
//! Matching is a plain lowercase substring test, so words that merely contain
//! a keyword ("clicker", "reopened") also route to tools. That coarseness is
//! part of the policy and is covered by tests below.

/// Keywords that send an utterance to the tool agent.
pub const TOOL_KEYWORDS: &[&str] = &[
    "open",
    "browser",
    "website",
    "search",
    "find",
    "navigate",
    "click",
    "go to",
];

/// Outcome of routing one utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Hand the utterance to the MCP tool agent
    ToolRequired,
    /// Ask the language model directly, without tools
    DirectAnswer,
}

impl RoutingDecision {
    /// Whether this decision dispatches to the tool agent
    pub fn requires_tools(self) -> bool {
        self == RoutingDecision::ToolRequired
    }
}

impl std::fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingDecision::ToolRequired => write!(f, "tool"),
            RoutingDecision::DirectAnswer => write!(f, "direct"),
        }
    }
}

/// Classify an utterance against [`TOOL_KEYWORDS`].
pub fn route(utterance: &str) -> RoutingDecision {
    let lowered = utterance.to_lowercase();
    if TOOL_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
        RoutingDecision::ToolRequired
    } else {
        RoutingDecision::DirectAnswer
    }
}

/// Shorthand for `route(utterance).requires_tools()`.
pub fn should_use_tools(utterance: &str) -> bool {
    route(utterance).requires_tools()
}
