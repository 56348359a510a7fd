/// A single line of REPL input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A question for the assistant, kept exactly as typed.
    Ask(String),
    Visualize,
    Designer,
    Clear,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Command::Empty;
        }

        if !trimmed.starts_with('/') {
            return Command::Ask(line.to_string());
        }

        match trimmed {
            "/visualize" => Command::Visualize,
            "/designer" => Command::Designer,
            "/clear" => Command::Clear,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        }
    }
}
