use std::path::PathBuf;

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load(PathBuf),
    Ask(String),
    Status,
    Help,
    Quit,
    /// A known command used wrongly; carries the usage line.
    Usage(&'static str),
    Unknown(String),
}

impl Command {
    /// `None` for blank lines. Anything not starting with `/` is a question.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() { return None; }

        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        let command = match head {
            "/load" | "/l" if rest.is_empty() => Command::Usage("/load <path>"),
            "/load" | "/l" => Command::Load(PathBuf::from(rest)),
            "/ask" | "/a" if rest.is_empty() => Command::Usage("/ask <question>"),
            "/ask" | "/a" => Command::Ask(rest.to_string()),
            "/status" | "/s" => Command::Status,
            "/help" | "/h" => Command::Help,
            "/quit" | "/q" | "quit" | "exit" => Command::Quit,
            _ if head.starts_with('/') => Command::Unknown(head.to_string()),
            _ => Command::Ask(line.to_string()),
        };
        Some(command)
    }
}
