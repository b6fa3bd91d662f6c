// Transport adapters
// The node only needs to read one line at a time and to send lines out.

pub mod irc;
pub mod memory;

use async_trait::async_trait;

use crate::errors::TransportError;

/// Source of inbound lines
///
/// Implementations return `TransportError::Closed` once the connection ends;
/// every later call must keep returning an error.
#[async_trait]
pub trait LineReader: Send {
    /// Waits for the next line, without its line terminator
    async fn next_line(&mut self) -> Result<String, TransportError>;
}

/// Sink for outbound lines
#[async_trait]
pub trait LineSender: Send + Sync {
    /// Sends one raw protocol line
    async fn send_raw(&self, line: &str) -> Result<(), TransportError>;

    /// Sends text to a channel or nick, one direct message per line
    async fn send_line(&self, destination: &str, text: &str) -> Result<(), TransportError> {
        for line in text.trim_end().lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            self.send_raw(&format!("PRIVMSG {} :{}", destination, line))
                .await?;
        }
        Ok(())
    }

    /// Leaves the network
    async fn quit(&self, reason: &str) -> Result<(), TransportError> {
        self.send_raw(&format!("QUIT :{}", reason)).await
    }
}
