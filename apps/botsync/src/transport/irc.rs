use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use super::{LineReader, LineSender};
use crate::errors::TransportError;

/// Opens a TCP connection to an IRC server
///
/// Returns the reading half, which answers server `PING`s on its own, and a
/// shareable sending half.
pub async fn connect(
    server: &str,
    port: u16,
) -> Result<(IrcReader, Arc<IrcSender>), TransportError> {
    tracing::info!(server, port, "Connecting to IRC server");
    let stream = TcpStream::connect((server, port)).await?;
    let (read_half, write_half) = stream.into_split();

    let sender = Arc::new(IrcSender {
        writer: Mutex::new(write_half),
    });
    let reader = IrcReader {
        reader: BufReader::new(read_half),
        pong: Arc::clone(&sender),
        closed: false,
    };

    tracing::info!(server, port, "Connected");
    Ok((reader, sender))
}

/// Reading half of an IRC connection
pub struct IrcReader {
    reader: BufReader<OwnedReadHalf>,
    pong: Arc<IrcSender>,
    closed: bool,
}

#[async_trait]
impl LineReader for IrcReader {
    async fn next_line(&mut self) -> Result<String, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match self.reader.read_until(b'\n', &mut buf).await {
                Ok(0) => {
                    self.closed = true;
                    return Err(TransportError::Closed);
                }
                Ok(_) => {}
                Err(e) => {
                    self.closed = true;
                    return Err(e.into());
                }
            }
            // Servers relay whatever bytes members send; undecodable ones become U+FFFD
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\r', '\n']);
            tracing::debug!(line, "<<");

            if let Some(token) = line.strip_prefix("PING ") {
                self.pong.send_raw(&format!("PONG {}", token)).await?;
                continue;
            }
            return Ok(line.to_string());
        }
    }
}

/// Writing half of an IRC connection
pub struct IrcSender {
    writer: Mutex<OwnedWriteHalf>,
}

#[async_trait]
impl LineSender for IrcSender {
    async fn send_raw(&self, line: &str) -> Result<(), TransportError> {
        tracing::debug!(line, ">>");
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\r\n").await?;
        writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn reader_answers_ping_and_reports_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket
                .write_all(b"PING :abc\r\n:srv 001 me :Welcome\r\n")
                .await
                .unwrap();

            let mut lines = BufReader::new(socket).lines();
            lines.next_line().await.unwrap().unwrap()
        });

        let (mut reader, _sender) = connect("127.0.0.1", port).await.unwrap();

        let line = reader.next_line().await.unwrap();
        assert_eq!(line, ":srv 001 me :Welcome");

        let pong = server.await.unwrap();
        assert_eq!(pong, "PONG :abc");

        assert!(matches!(
            reader.next_line().await,
            Err(TransportError::Closed)
        ));
        assert!(matches!(
            reader.next_line().await,
            Err(TransportError::Closed)
        ));
    }

    #[tokio::test]
    async fn undecodable_bytes_do_not_end_the_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket
                .write_all(b":bob!b@h PRIVMSG #bottest :caf\xe9\r\n:bob!b@h PRIVMSG alice :CLAIM:1\r\n")
                .await
                .unwrap();
            socket
        });

        let (mut reader, _sender) = connect("127.0.0.1", port).await.unwrap();

        let latin1 = reader.next_line().await.unwrap();
        assert_eq!(latin1, ":bob!b@h PRIVMSG #bottest :caf\u{FFFD}");

        let claim = reader.next_line().await.unwrap();
        assert_eq!(claim, ":bob!b@h PRIVMSG alice :CLAIM:1");
    }

    #[tokio::test]
    async fn sender_frames_lines_with_crlf() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut lines = BufReader::new(socket).lines();
            let first = lines.next_line().await.unwrap().unwrap();
            let second = lines.next_line().await.unwrap().unwrap();
            (first, second)
        });

        let (_reader, sender) = connect("127.0.0.1", port).await.unwrap();
        sender.send_raw("NICK alice").await.unwrap();
        sender.send_line("#bottest", "ADV:abc").await.unwrap();

        let (first, second) = server.await.unwrap();
        assert_eq!(first, "NICK alice");
        assert_eq!(second, "PRIVMSG #bottest :ADV:abc");
    }
}
