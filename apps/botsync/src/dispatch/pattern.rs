use crate::protocol::{IrcLine, Message, Verb};

/// What a registered handler wants to react to
///
/// Line-level variants (`Reply`, `Joined`) look at the parsed IRC line,
/// `Verb` looks at the parsed command of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// IRC command or numeric reply, e.g. `"376"`
    Reply(String),
    /// JOIN echo for the given channel
    Joined(String),
    Verb(Verb),
    AnyOf(Vec<Pattern>),
}

impl Pattern {
    /// End of the server's message of the day (or its absence)
    pub fn end_of_motd() -> Self {
        Pattern::AnyOf(vec![
            Pattern::Reply("376".to_string()),
            Pattern::Reply("422".to_string()),
        ])
    }

    /// Matches an inbound line
    ///
    /// # Example
    /// ```
    /// use botsync::dispatch::Pattern;
    /// use botsync::protocol::IrcLine;
    ///
    /// let line = IrcLine::parse(":me!m@host JOIN :#bottest");
    /// assert!(Pattern::Joined("#bottest".to_string()).matches_line(&line));
    /// assert!(!Pattern::Joined("#other".to_string()).matches_line(&line));
    /// ```
    pub fn matches_line(&self, line: &IrcLine<'_>) -> bool {
        match self {
            Pattern::Reply(code) => line.command == code.as_str(),
            Pattern::Joined(channel) => {
                line.command == "JOIN" && line.param(0) == Some(channel.as_str())
            }
            Pattern::Verb(_) => false,
            Pattern::AnyOf(patterns) => patterns.iter().any(|p| p.matches_line(line)),
        }
    }

    /// Matches a direct message
    pub fn matches_message(&self, message: &Message) -> bool {
        match self {
            Pattern::Reply(_) | Pattern::Joined(_) => false,
            Pattern::Verb(verb) => message.command.as_ref().map(|c| c.verb()) == Some(*verb),
            Pattern::AnyOf(patterns) => patterns.iter().any(|p| p.matches_message(message)),
        }
    }
}
