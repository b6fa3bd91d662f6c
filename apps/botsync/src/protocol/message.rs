use super::command::{Command, CommandError};
use super::line::IrcLine;

/// A direct message, derived from a `PRIVMSG` line
///
/// The body is parsed into a [`Command`] exactly once, when the message is
/// built; `command` is `None` for ordinary chat and malformed commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: String,
    pub sender_host: String,
    pub destination: String,
    pub body: String,
    pub command: Option<Command>,
}

impl Message {
    /// Builds a message from a body, parsing its command
    pub fn new(
        sender: impl Into<String>,
        sender_host: impl Into<String>,
        destination: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let body = body.into();
        let command = match Command::parse(&body) {
            Ok(command) => Some(command),
            Err(CommandError::NotACommand) => None,
            Err(CommandError::Malformed { verb, reason }) => {
                tracing::debug!(%verb, %reason, body = %body, "Dropping malformed command");
                None
            }
        };

        Self {
            sender: sender.into(),
            sender_host: sender_host.into(),
            destination: destination.into(),
            body,
            command,
        }
    }

    /// Extracts a message from a parsed line if it has the direct-message shape
    ///
    /// # Example
    /// ```
    /// use botsync::protocol::{IrcLine, Message};
    ///
    /// let line = IrcLine::parse(":bob!b@host PRIVMSG #bottest :CLAIM:42");
    /// let msg = Message::from_line(&line).expect("direct message");
    /// assert_eq!(msg.sender, "bob");
    /// assert!(msg.command.is_some());
    /// ```
    pub fn from_line(line: &IrcLine<'_>) -> Option<Self> {
        if line.command != "PRIVMSG" || line.params.len() != 2 {
            return None;
        }
        let sender = line.nick()?;
        let sender_host = line.host()?;
        Some(Self::new(sender, sender_host, line.params[0], line.params[1]))
    }

    /// Whether the message was sent to a channel rather than to us alone
    pub fn is_channel_message(&self) -> bool {
        self.destination.starts_with(['#', '&'])
    }

    /// Where replies to this message should go
    pub fn reply_target(&self) -> &str {
        if self.is_channel_message() {
            &self.destination
        } else {
            &self.sender
        }
    }
}
