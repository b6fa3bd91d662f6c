/// A raw IRC line split into its prefix, command and parameters
///
/// The trailing parameter (the one introduced by `" :"`) is included in
/// `params` without its leading colon.
///
/// # Example
/// ```
/// use botsync::protocol::IrcLine;
///
/// let line = IrcLine::parse(":alice!a@host PRIVMSG #bottest :hello there");
/// assert_eq!(line.prefix, Some("alice!a@host"));
/// assert_eq!(line.command, "PRIVMSG");
/// assert_eq!(line.params, vec!["#bottest", "hello there"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcLine<'a> {
    pub raw: &'a str,
    pub prefix: Option<&'a str>,
    pub command: &'a str,
    pub params: Vec<&'a str>,
}

impl<'a> IrcLine<'a> {
    /// Parses a line. Never fails: a line with no recognisable structure
    /// yields an empty command.
    pub fn parse(raw: &'a str) -> Self {
        let mut rest = raw.trim_end_matches(['\r', '\n']);

        let prefix = match rest.strip_prefix(':') {
            Some(stripped) => {
                let (prefix, remainder) = stripped.split_once(' ').unwrap_or((stripped, ""));
                rest = remainder;
                Some(prefix)
            }
            None => None,
        };

        let rest = rest.trim_start();
        let (command, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing);
                break;
            }
            let (param, remainder) = rest.split_once(' ').unwrap_or((rest, ""));
            params.push(param);
            rest = remainder;
        }

        Self {
            raw,
            prefix,
            command,
            params,
        }
    }

    /// Nick part of a `nick!user@host` prefix
    pub fn nick(&self) -> Option<&'a str> {
        self.prefix.map(|p| p.split_once('!').map_or(p, |(nick, _)| nick))
    }

    /// `user@host` part of a `nick!user@host` prefix
    pub fn host(&self) -> Option<&'a str> {
        self.prefix.and_then(|p| p.split_once('!').map(|(_, host)| host))
    }

    pub fn param(&self, index: usize) -> Option<&'a str> {
        self.params.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_reply() {
        let line = IrcLine::parse(":irc.example.net 376 alice :End of /MOTD command.\r\n");

        assert_eq!(line.prefix, Some("irc.example.net"));
        assert_eq!(line.command, "376");
        assert_eq!(line.params, vec!["alice", "End of /MOTD command."]);
        assert_eq!(line.nick(), Some("irc.example.net"));
        assert_eq!(line.host(), None);
    }

    #[test]
    fn parses_line_without_prefix() {
        let line = IrcLine::parse("PING :token123");

        assert_eq!(line.prefix, None);
        assert_eq!(line.command, "PING");
        assert_eq!(line.param(0), Some("token123"));
    }

    #[test]
    fn parses_join_with_and_without_colon() {
        let plain = IrcLine::parse(":bob!b@host JOIN #bottest");
        let colon = IrcLine::parse(":bob!b@host JOIN :#bottest");

        assert_eq!(plain.param(0), Some("#bottest"));
        assert_eq!(colon.param(0), Some("#bottest"));
        assert_eq!(plain.nick(), Some("bob"));
        assert_eq!(plain.host(), Some("b@host"));
    }

    #[test]
    fn trailing_parameter_keeps_colons_and_spaces() {
        let line = IrcLine::parse(":bob!b@host PRIVMSG alice :JOB:42:pow,2,10 extra");
        assert_eq!(line.param(1), Some("JOB:42:pow,2,10 extra"));
    }

    #[test]
    fn empty_line_has_empty_command() {
        let line = IrcLine::parse("");
        assert_eq!(line.command, "");
        assert!(line.params.is_empty());
    }
}
