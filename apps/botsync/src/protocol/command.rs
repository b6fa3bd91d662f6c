// Protocol commands carried in message bodies
//
// Every body is parsed once into a tagged value; handlers match on the tag
// instead of re-testing the text.

use std::fmt;

use super::job_id::JobId;

/// Tag of a protocol command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Adv,
    Bot,
    Job,
    Claim,
    Thanks,
    NoThanks,
    JobResult,
    WhoYouKnow,
    Jobs,
    EmitJob,
    GetResult,
    Result,
    UnknownResult,
    Quit,
}

impl Verb {
    /// Wire keyword of the verb
    pub fn keyword(&self) -> &'static str {
        match self {
            Verb::Adv => "ADV",
            Verb::Bot => "BOT",
            Verb::Job => "JOB",
            Verb::Claim => "CLAIM",
            Verb::Thanks => "THANKS",
            Verb::NoThanks => "NOTHANKS",
            Verb::JobResult => "JOBRESULT",
            Verb::WhoYouKnow => "!whoyouknow",
            Verb::Jobs => "!jobs",
            Verb::EmitJob => "!emitjob",
            Verb::GetResult => "!getresult",
            Verb::Result => "RESULT",
            Verb::UnknownResult => "UNKNOWN_RESULT",
            Verb::Quit => "!quit",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        let verb = match keyword {
            "ADV" => Verb::Adv,
            "BOT" => Verb::Bot,
            "JOB" => Verb::Job,
            "CLAIM" => Verb::Claim,
            "THANKS" => Verb::Thanks,
            "NOTHANKS" => Verb::NoThanks,
            "JOBRESULT" => Verb::JobResult,
            "!whoyouknow" => Verb::WhoYouKnow,
            "!jobs" => Verb::Jobs,
            "!emitjob" => Verb::EmitJob,
            "!getresult" => Verb::GetResult,
            "RESULT" => Verb::Result,
            "UNKNOWN_RESULT" => Verb::UnknownResult,
            "!quit" => Verb::Quit,
            _ => return None,
        };
        Some(verb)
    }

    /// Number of ':'-separated fields after the keyword
    fn field_count(&self) -> usize {
        match self {
            Verb::WhoYouKnow | Verb::Jobs | Verb::Quit => 0,
            Verb::Adv
            | Verb::Bot
            | Verb::Claim
            | Verb::Thanks
            | Verb::NoThanks
            | Verb::GetResult
            | Verb::UnknownResult => 1,
            Verb::Job | Verb::JobResult | Verb::EmitJob | Verb::Result => 2,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A parsed protocol command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Adv { peer_id: String },
    Bot { peer_id: String },
    Job { job_id: JobId, parameters: String },
    Claim { job_id: JobId },
    Thanks { job_id: JobId },
    NoThanks { job_id: JobId },
    JobResult { job_id: JobId, value: String },
    WhoYouKnow,
    Jobs,
    EmitJob { job_id: JobId, parameters: String },
    GetResult { job_id: JobId },
    Result { job_id: JobId, value: String },
    UnknownResult { job_id: JobId },
    Quit,
}

/// Why a body did not parse as a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Ordinary chat
    NotACommand,
    /// A known verb with the wrong shape
    Malformed { verb: Verb, reason: String },
}

impl Command {
    /// Parses a message body
    ///
    /// The last field takes the remainder of the body, so parameters and
    /// values may themselves contain ':'.
    ///
    /// # Example
    /// ```
    /// use botsync::protocol::{Command, JobId};
    ///
    /// let cmd = Command::parse("JOB:42:pow,2,10").unwrap();
    /// assert_eq!(cmd, Command::Job {
    ///     job_id: JobId::new("42").unwrap(),
    ///     parameters: "pow,2,10".to_string(),
    /// });
    /// assert!(Command::parse("hello everyone").is_err());
    /// ```
    pub fn parse(body: &str) -> Result<Self, CommandError> {
        let body = body.trim();
        let (keyword, rest) = match body.find(|c: char| c == ':' || c.is_whitespace()) {
            Some(at) => (&body[..at], Some(&body[at..])),
            None => (body, None),
        };
        let verb = Verb::from_keyword(keyword).ok_or(CommandError::NotACommand)?;

        let malformed = |reason: &str| CommandError::Malformed {
            verb,
            reason: reason.to_string(),
        };

        let fields: Vec<&str> = match (verb.field_count(), rest) {
            // Triggers ignore whatever follows them
            (0, _) => Vec::new(),
            (_, None) => return Err(malformed("missing fields")),
            (count, Some(rest)) => match rest.strip_prefix(':') {
                Some(rest) => rest.splitn(count, ':').collect(),
                None => return Err(CommandError::NotACommand),
            },
        };
        if fields.len() != verb.field_count() {
            return Err(malformed("wrong field count"));
        }

        let job_id = || {
            JobId::new(fields[0]).map_err(|_| malformed("unparseable job id"))
        };
        let peer_id = || {
            let id = fields[0];
            if id.is_empty() || id.contains(char::is_whitespace) {
                Err(malformed("invalid peer id"))
            } else {
                Ok(id.to_string())
            }
        };

        let command = match verb {
            Verb::Adv => Command::Adv { peer_id: peer_id()? },
            Verb::Bot => Command::Bot { peer_id: peer_id()? },
            Verb::Job => Command::Job {
                job_id: job_id()?,
                parameters: fields[1].to_string(),
            },
            Verb::Claim => Command::Claim { job_id: job_id()? },
            Verb::Thanks => Command::Thanks { job_id: job_id()? },
            Verb::NoThanks => Command::NoThanks { job_id: job_id()? },
            Verb::JobResult => Command::JobResult {
                job_id: job_id()?,
                value: fields[1].to_string(),
            },
            Verb::WhoYouKnow => Command::WhoYouKnow,
            Verb::Jobs => Command::Jobs,
            Verb::EmitJob => Command::EmitJob {
                job_id: job_id()?,
                parameters: fields[1].to_string(),
            },
            Verb::GetResult => Command::GetResult { job_id: job_id()? },
            Verb::Result => Command::Result {
                job_id: job_id()?,
                value: fields[1].to_string(),
            },
            Verb::UnknownResult => Command::UnknownResult { job_id: job_id()? },
            Verb::Quit => Command::Quit,
        };
        Ok(command)
    }

    pub fn verb(&self) -> Verb {
        match self {
            Command::Adv { .. } => Verb::Adv,
            Command::Bot { .. } => Verb::Bot,
            Command::Job { .. } => Verb::Job,
            Command::Claim { .. } => Verb::Claim,
            Command::Thanks { .. } => Verb::Thanks,
            Command::NoThanks { .. } => Verb::NoThanks,
            Command::JobResult { .. } => Verb::JobResult,
            Command::WhoYouKnow => Verb::WhoYouKnow,
            Command::Jobs => Verb::Jobs,
            Command::EmitJob { .. } => Verb::EmitJob,
            Command::GetResult { .. } => Verb::GetResult,
            Command::Result { .. } => Verb::Result,
            Command::UnknownResult { .. } => Verb::UnknownResult,
            Command::Quit => Verb::Quit,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = self.verb();
        match self {
            Command::Adv { peer_id } | Command::Bot { peer_id } => {
                write!(f, "{}:{}", verb, peer_id)
            }
            Command::Job { job_id, parameters } | Command::EmitJob { job_id, parameters } => {
                write!(f, "{}:{}:{}", verb, job_id, parameters)
            }
            Command::JobResult { job_id, value } | Command::Result { job_id, value } => {
                write!(f, "{}:{}:{}", verb, job_id, value)
            }
            Command::Claim { job_id }
            | Command::Thanks { job_id }
            | Command::NoThanks { job_id }
            | Command::GetResult { job_id }
            | Command::UnknownResult { job_id } => write!(f, "{}:{}", verb, job_id),
            Command::WhoYouKnow | Command::Jobs | Command::Quit => write!(f, "{}", verb),
        }
    }
}
