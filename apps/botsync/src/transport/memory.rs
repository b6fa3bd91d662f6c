// In-process transports
//
// `MemoryNetwork` behaves like a tiny IRC server shared by several nodes in
// one process; `RecordingSender` only remembers what was sent.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{LineReader, LineSender};
use crate::errors::TransportError;
use crate::protocol::IrcLine;

const SERVER_NAME: &str = "memory.local";

#[derive(Default)]
struct NetworkState {
    members: HashMap<String, mpsc::UnboundedSender<String>>,
    channels: HashMap<String, BTreeSet<String>>,
    sent: Vec<(String, String)>,
}

/// A shared in-process IRC network
#[derive(Default)]
pub struct MemoryNetwork {
    state: Mutex<NetworkState>,
}

impl MemoryNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Connects a member under `nick`, replacing any previous member with that nick
    pub fn connect(self: &Arc<Self>, nick: &str) -> (MemoryReader, MemorySender) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().members.insert(nick.to_string(), tx);

        let reader = MemoryReader { inbound: rx };
        let sender = MemorySender {
            network: Arc::clone(self),
            nick: nick.to_string(),
        };
        (reader, sender)
    }

    /// Drops a member; its reader reports `Closed` once drained
    pub fn disconnect(&self, nick: &str) {
        let mut state = self.state.lock();
        state.members.remove(nick);
        for members in state.channels.values_mut() {
            members.remove(nick);
        }
    }

    /// Delivers a raw line straight to a member
    pub fn inject(&self, nick: &str, line: &str) -> bool {
        let state = self.state.lock();
        match state.members.get(nick) {
            Some(tx) => tx.send(line.to_string()).is_ok(),
            None => false,
        }
    }

    /// Nicks currently in a channel
    pub fn members_of(&self, channel: &str) -> Vec<String> {
        self.state
            .lock()
            .channels
            .get(channel)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every raw line sent by `nick`, in order
    pub fn sent_by(&self, nick: &str) -> Vec<String> {
        self.state
            .lock()
            .sent
            .iter()
            .filter(|(from, _)| from == nick)
            .map(|(_, line)| line.clone())
            .collect()
    }

    fn route(&self, from: &str, raw: &str) {
        let line = IrcLine::parse(raw);
        let mut state = self.state.lock();
        state.sent.push((from.to_string(), raw.to_string()));

        match line.command {
            "USER" => {
                deliver(&state, from, &format!(":{} 001 {} :Welcome", SERVER_NAME, from));
                deliver(
                    &state,
                    from,
                    &format!(":{} 376 {} :End of /MOTD command.", SERVER_NAME, from),
                );
            }
            "JOIN" => {
                let Some(channel) = line.param(0) else {
                    return;
                };
                state
                    .channels
                    .entry(channel.to_string())
                    .or_default()
                    .insert(from.to_string());
                let echo = format!(":{}!{}@memory JOIN {}", from, from, channel);
                if let Some(members) = state.channels.get(channel) {
                    for member in members {
                        deliver(&state, member, &echo);
                    }
                }
            }
            "PRIVMSG" => {
                let (Some(target), Some(text)) = (line.param(0), line.param(1)) else {
                    return;
                };
                let relayed = format!(":{}!{}@memory PRIVMSG {} :{}", from, from, target, text);
                if target.starts_with(['#', '&']) {
                    if let Some(members) = state.channels.get(target) {
                        for member in members.iter().filter(|m| m.as_str() != from) {
                            deliver(&state, member, &relayed);
                        }
                    }
                } else {
                    deliver(&state, target, &relayed);
                }
            }
            "QUIT" => {
                state.members.remove(from);
                for members in state.channels.values_mut() {
                    members.remove(from);
                }
            }
            _ => {}
        }
    }
}

fn deliver(state: &NetworkState, nick: &str, line: &str) {
    if let Some(tx) = state.members.get(nick) {
        let _ = tx.send(line.to_string());
    }
}

/// Reading half of a [`MemoryNetwork`] member
pub struct MemoryReader {
    inbound: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl LineReader for MemoryReader {
    async fn next_line(&mut self) -> Result<String, TransportError> {
        self.inbound.recv().await.ok_or(TransportError::Closed)
    }
}

/// Sending half of a [`MemoryNetwork`] member
#[derive(Clone)]
pub struct MemorySender {
    network: Arc<MemoryNetwork>,
    nick: String,
}

#[async_trait]
impl LineSender for MemorySender {
    async fn send_raw(&self, line: &str) -> Result<(), TransportError> {
        tracing::debug!(nick = %self.nick, line, ">>");
        self.network.route(&self.nick, line);
        Ok(())
    }
}

/// Sender that only records raw lines
#[derive(Default)]
pub struct RecordingSender {
    lines: Mutex<Vec<String>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Bodies of the direct messages sent to `destination`
    pub fn messages_to(&self, destination: &str) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter_map(|raw| {
                let line = IrcLine::parse(raw);
                match (line.command, line.param(0), line.param(1)) {
                    ("PRIVMSG", Some(target), Some(text)) if target == destination => {
                        Some(text.to_string())
                    }
                    _ => None,
                }
            })
            .collect()
    }
}

#[async_trait]
impl LineSender for RecordingSender {
    async fn send_raw(&self, line: &str) -> Result<(), TransportError> {
        self.lines.lock().push(line.to_string());
        Ok(())
    }
}
