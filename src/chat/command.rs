//! Input classification and loop states

/// States of the chat loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Initializing,
    AwaitingInput,
    DispatchingDirect,
    DispatchingTool,
    ClearingHistory,
    ShuttingDown,
    Terminated,
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LoopState::Initializing => "initializing",
            LoopState::AwaitingInput => "awaiting_input",
            LoopState::DispatchingDirect => "dispatching_direct",
            LoopState::DispatchingTool => "dispatching_tool",
            LoopState::ClearingHistory => "clearing_history",
            LoopState::ShuttingDown => "shutting_down",
            LoopState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// One line of user input, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `exit` or `quit`
    Exit,
    /// `clear`
    Clear,
    /// Blank line
    Empty,
    /// Anything else, trimmed
    Content(String),
}

impl Command {
    /// Classify a raw input line.
    ///
    /// Commands match case-insensitively after trimming and only as the whole
    /// line, so `exit now` is content.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Command::Empty;
        }
        match trimmed.to_lowercase().as_str() {
            "exit" | "quit" => Command::Exit,
            "clear" => Command::Clear,
            _ => Command::Content(trimmed.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_commands_any_case() {
        for line in ["exit", "quit", "EXIT", "Quit", "  exit  ", "qUiT\n"] {
            assert_eq!(Command::parse(line), Command::Exit, "input {line:?}");
        }
    }

    #[test]
    fn test_clear_command() {
        assert_eq!(Command::parse("clear"), Command::Clear);
        assert_eq!(Command::parse(" CLEAR "), Command::Clear);
    }

    #[test]
    fn test_commands_must_match_whole_line() {
        assert_eq!(
            Command::parse("exit now"),
            Command::Content("exit now".into())
        );
        assert_eq!(
            Command::parse("clear the cache"),
            Command::Content("clear the cache".into())
        );
    }

    #[test]
    fn test_blank_lines_are_empty() {
        assert_eq!(Command::parse(""), Command::Empty);
        assert_eq!(Command::parse("   \t"), Command::Empty);
    }

    #[test]
    fn test_content_is_trimmed() {
        assert_eq!(Command::parse("  hello \n"), Command::Content("hello".into()));
    }
}
