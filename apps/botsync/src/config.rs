// Node configuration
// Values come from the environment (optionally seeded from a .env file)

use std::str::FromStr;

use chrono::TimeDelta;
use uuid::Uuid;

use crate::errors::{BotError, BotResult};

/// Default number of proposals a candidate keeps pending at once
pub const DEFAULT_CAPACITY: usize = 3;

/// Default number of jobs executed concurrently
pub const DEFAULT_POOL_WIDTH: usize = 3;

/// Default age after which an unanswered claim is forgotten
pub const DEFAULT_PENDING_TTL_SECS: i64 = 300;

/// Runtime configuration of a botsync node
#[derive(Debug, Clone)]
pub struct Config {
    pub server: String,
    pub port: u16,
    pub nick: String,
    pub realname: String,
    pub channel: String,
    /// Sent to the channel once joined
    pub greeting: Option<String>,
    /// Maximum number of Pending received jobs
    pub capacity: usize,
    /// Maximum number of jobs executed concurrently
    pub pool_width: usize,
    /// `None` keeps Pending entries forever
    pub pending_ttl: Option<TimeDelta>,
    /// Nick allowed to issue `!quit`
    pub owner: Option<String>,
}

impl Config {
    /// Creates a configuration with defaults for everything but identity and channel
    ///
    /// # Example
    /// ```
    /// use botsync::config::Config;
    ///
    /// let config = Config::new("alice", "#bottest");
    /// assert_eq!(config.capacity, 3);
    /// assert_eq!(config.pool_width, 3);
    /// ```
    pub fn new(nick: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            server: "irc.libera.chat".to_string(),
            port: 6667,
            nick: nick.into(),
            realname: "A botsync peer".to_string(),
            channel: channel.into(),
            greeting: Some("Hello, world".to_string()),
            capacity: DEFAULT_CAPACITY,
            pool_width: DEFAULT_POOL_WIDTH,
            pending_ttl: Some(TimeDelta::seconds(DEFAULT_PENDING_TTL_SECS)),
            owner: None,
        }
    }

    /// Loads the configuration from `BOTSYNC_*` environment variables
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> BotResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> BotResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let nick = lookup("BOTSYNC_NICK").unwrap_or_else(default_nick);
        let channel = lookup("BOTSYNC_CHANNEL").unwrap_or_else(|| "#bottest".to_string());
        let mut config = Self::new(nick, channel);

        match lookup("BOTSYNC_SERVER") {
            Some(server) => config.server = server,
            None => tracing::warn!(server = %config.server, "BOTSYNC_SERVER not set, using default"),
        }
        if let Some(realname) = lookup("BOTSYNC_REALNAME") {
            config.realname = realname;
        }
        if let Some(greeting) = lookup("BOTSYNC_GREETING") {
            config.greeting = if greeting.is_empty() { None } else { Some(greeting) };
        }
        config.owner = lookup("BOTSYNC_OWNER").filter(|owner| !owner.is_empty());

        config.port = parse_var(&lookup, "BOTSYNC_PORT", config.port)?;
        config.capacity = parse_var(&lookup, "BOTSYNC_CAPACITY", config.capacity)?;
        config.pool_width = parse_var(&lookup, "BOTSYNC_POOL_WIDTH", config.pool_width)?;

        let ttl_secs: i64 =
            parse_var(&lookup, "BOTSYNC_PENDING_TTL_SECS", DEFAULT_PENDING_TTL_SECS)?;
        config.pending_ttl = match ttl_secs {
            0 => None,
            secs if secs > 0 => Some(TimeDelta::seconds(secs)),
            secs => {
                return Err(BotError::ConfigError(format!(
                    "BOTSYNC_PENDING_TTL_SECS must not be negative (got {})",
                    secs
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the node relies on
    pub fn validate(&self) -> BotResult<()> {
        if self.nick.is_empty() || self.nick.contains(char::is_whitespace) {
            return Err(BotError::ConfigError(format!("Invalid nick: {:?}", self.nick)));
        }
        if !self.channel.starts_with(['#', '&']) {
            return Err(BotError::ConfigError(format!(
                "Channel must start with '#' or '&': {}",
                self.channel
            )));
        }
        if self.capacity == 0 {
            return Err(BotError::ConfigError("Capacity must be at least 1".to_string()));
        }
        if self.pool_width == 0 {
            return Err(BotError::ConfigError("Pool width must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn default_nick() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("botsync-{}", &id[..8])
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> BotResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| BotError::ConfigError(format!("{}={:?}: {}", key, raw, e))),
        None => Ok(default),
    }
}
