// Botsync node
//
// Wires one connection's dispatch table to the peer directory, the job book
// and the worker pool. Protocol handlers live in the submodules.

mod negotiation;
mod peering;
mod triggers;

use std::future::Future;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::config::Config;
use crate::dispatch::{run_event_loop, CallbackQueue, DispatchTable, LoopExit, Pattern, Runner};
use crate::errors::{BotError, BotResult};
use crate::jobs::JobBook;
use crate::peers::PeerDirectory;
use crate::protocol::{Command, Message, Verb};
use crate::transport::{LineReader, LineSender};
use crate::workers::{WorkExecutor, WorkerPool};

/// A peer taking part in job negotiation
///
/// # Lifecycle
/// `Node::new` builds the node with an idle callback runner; `Node::run`
/// starts the runner, schedules the connection bootstrap and then reads
/// lines until the transport closes. Shutdown stops the runner and aborts
/// every job still executing.
pub struct Node {
    config: Config,
    self_id: Uuid,
    sender: Arc<dyn LineSender>,
    table: DispatchTable,
    peers: PeerDirectory,
    jobs: JobBook,
    pool: WorkerPool,
    shutdown: watch::Sender<bool>,
    runner: Mutex<Option<Runner>>,
    tasks: Mutex<JoinSet<()>>,
}

impl Node {
    pub fn new(
        config: Config,
        sender: Arc<dyn LineSender>,
        executors: Vec<Arc<dyn WorkExecutor>>,
    ) -> Arc<Self> {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (queue, runner) = CallbackQueue::new(shutdown_rx);

        Arc::new(Self {
            jobs: JobBook::new(config.capacity, config.pending_ttl),
            pool: WorkerPool::new(config.pool_width, executors),
            self_id: Uuid::new_v4(),
            sender,
            table: DispatchTable::new(queue),
            peers: PeerDirectory::new(),
            shutdown,
            runner: Mutex::new(Some(runner)),
            tasks: Mutex::new(JoinSet::new()),
            config,
        })
    }

    /// Identifier announced to other peers
    pub fn self_id(&self) -> Uuid {
        self.self_id
    }

    pub fn peers(&self) -> &PeerDirectory {
        &self.peers
    }

    pub fn jobs(&self) -> &JobBook {
        &self.jobs
    }

    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    /// Connects, negotiates and serves until the transport ends
    ///
    /// Returns `Ok` when the connection closed or shutdown was requested,
    /// and the transport error when reading failed. Shutdown has completed
    /// either way by the time this returns.
    pub async fn run(self: &Arc<Self>, reader: &mut dyn LineReader) -> BotResult<LoopExit> {
        let runner = self.runner.lock().take().ok_or(BotError::AlreadyRunning)?;
        let runner = tokio::spawn(runner.run());

        tracing::info!(
            nick = %self.config.nick,
            channel = %self.config.channel,
            self_id = %self.self_id,
            "Starting node"
        );
        let outcome = match self.schedule_identify() {
            Ok(()) => run_event_loop(reader, &self.table, self.shutdown.subscribe())
                .await
                .map_err(BotError::from),
            Err(e) => Err(e),
        };

        self.request_shutdown();
        let mut tasks = std::mem::take(&mut *self.tasks.lock());
        let aborted = tasks.len();
        tasks.shutdown().await;
        let completed = runner.await.unwrap_or_default();
        tracing::info!(completed, aborted, "Node stopped");

        outcome
    }

    /// Asks a running node to stop reading and shut down
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    fn schedule_identify(self: &Arc<Self>) -> BotResult<()> {
        let node = Arc::downgrade(self);
        self.table.register_transient("identify", async move {
            match node.upgrade() {
                Some(node) => node.identify().await,
                None => Ok(()),
            }
        })
    }

    /// Registers the end-of-MOTD step, then introduces ourselves to the server
    async fn identify(self: &Arc<Self>) -> BotResult<()> {
        let node = Arc::downgrade(self);
        self.table
            .register_line_pattern("start", Pattern::end_of_motd(), move || async move {
                match node.upgrade() {
                    Some(node) => node.start().await,
                    None => Ok(()),
                }
            });

        let nick = &self.config.nick;
        self.sender.send_raw(&format!("NICK {}", nick)).await?;
        self.sender
            .send_raw(&format!("USER {} 0 * :{}", nick, self.config.realname))
            .await?;
        Ok(())
    }

    /// Installs the protocol handlers and joins the channel
    async fn start(self: &Arc<Self>) -> BotResult<()> {
        self.install_handlers();

        let channel = self.config.channel.clone();
        let node = Arc::downgrade(self);
        self.table.register_line_pattern(
            "joined",
            Pattern::Joined(channel.clone()),
            move || async move {
                match node.upgrade() {
                    Some(node) => node.on_joined().await,
                    None => Ok(()),
                }
            },
        );

        tracing::info!(channel = %channel, "Server ready, joining channel");
        self.sender.send_raw(&format!("JOIN {}", channel)).await?;
        Ok(())
    }

    async fn on_joined(&self) -> BotResult<()> {
        tracing::info!(channel = %self.config.channel, "Joined channel");
        if let Some(greeting) = &self.config.greeting {
            self.sender.send_line(&self.config.channel, greeting).await?;
        }
        self.advertise().await
    }

    fn install_handlers(self: &Arc<Self>) {
        // peer discovery
        self.on_message("advertisement", Verb::Adv, |node, msg| async move {
            node.handle_advertisement(&msg).await
        });
        self.on_message("announcement", Verb::Bot, |node, msg| async move {
            node.handle_announcement(&msg).await
        });

        // negotiation
        self.on_message("job-proposal", Verb::Job, |node, msg| async move {
            node.handle_job_proposal(&msg).await
        });
        self.on_message("claim", Verb::Claim, |node, msg| async move {
            node.handle_claim(&msg).await
        });
        self.on_message("thanks", Verb::Thanks, |node, msg| async move {
            node.handle_thanks(&msg).await
        });
        self.on_message("nothanks", Verb::NoThanks, |node, msg| async move {
            node.handle_nothanks(&msg).await
        });
        self.on_message("job-result", Verb::JobResult, |node, msg| async move {
            node.handle_job_result(&msg).await
        });

        // triggers
        self.on_message("whoyouknow", Verb::WhoYouKnow, |node, msg| async move {
            node.tell_who_you_know(&msg).await
        });
        self.on_message("jobs", Verb::Jobs, |node, msg| async move {
            node.report_jobs(&msg).await
        });
        self.on_message("emitjob", Verb::EmitJob, |node, msg| async move {
            node.emit_job(&msg).await
        });
        self.on_message("getresult", Verb::GetResult, |node, msg| async move {
            node.get_result(&msg).await
        });
        self.on_message("quit", Verb::Quit, |node, msg| async move {
            node.handle_quit(&msg).await
        });

        tracing::debug!(
            handlers = self.table.message_handler_count(),
            "Installed protocol handlers"
        );
    }

    /// Registers a persistent handler for every message carrying `verb`
    ///
    /// Handlers hold the node weakly so the table never keeps it alive.
    fn on_message<H, F>(self: &Arc<Self>, label: &str, verb: Verb, handler: H)
    where
        H: Fn(Arc<Node>, Message) -> F + Send + Sync + 'static,
        F: Future<Output = BotResult<()>> + Send + 'static,
    {
        let node: Weak<Node> = Arc::downgrade(self);
        self.table
            .register_message_pattern(label, Pattern::Verb(verb), move |msg| {
                let call = node.upgrade().map(|node| handler(node, msg));
                async move {
                    match call {
                        Some(call) => call.await,
                        None => Ok(()),
                    }
                }
            });
    }

    /// Sends a protocol command as a direct message
    async fn send(&self, destination: &str, command: &Command) -> BotResult<()> {
        tracing::debug!(destination, verb = %command.verb(), "Sending command");
        self.sender
            .send_line(destination, &command.to_string())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;
    use crate::transport::memory::{MemoryNetwork, RecordingSender};
    use crate::workers::MathsWorker;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Reader whose connection has been reset by the peer
    struct ResetReader;

    #[async_trait]
    impl LineReader for ResetReader {
        async fn next_line(&mut self) -> Result<String, TransportError> {
            Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )))
        }
    }

    #[tokio::test]
    async fn bootstrap_joins_and_advertises_once() {
        let network = MemoryNetwork::new();
        let (mut reader, sender) = network.connect("alice");
        let node = Node::new(
            Config::new("alice", "#bottest"),
            Arc::new(sender),
            vec![Arc::new(MathsWorker::new()) as Arc<dyn WorkExecutor>],
        );

        let running = {
            let node = Arc::clone(&node);
            tokio::spawn(async move { node.run(&mut reader).await })
        };

        tokio::time::timeout(Duration::from_secs(2), async {
            while network.sent_by("alice").len() < 5 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        let sent = network.sent_by("alice");
        assert!(node.peers().has_advertised());
        assert_eq!(sent[0], "NICK alice");
        assert_eq!(sent[1], "USER alice 0 * :A botsync peer");
        assert_eq!(sent[2], "JOIN #bottest");
        assert_eq!(sent[3], "PRIVMSG #bottest :Hello, world");
        assert_eq!(sent[4], format!("PRIVMSG #bottest :ADV:{}", node.self_id()));
        assert_eq!(network.members_of("#bottest"), vec!["alice"]);
        assert_eq!(node.table().message_handler_count(), 12);

        network.disconnect("alice");
        let exit = tokio::time::timeout(Duration::from_secs(2), running)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(exit, LoopExit::Closed);
    }

    #[tokio::test]
    async fn node_runs_only_once() {
        let network = MemoryNetwork::new();
        let (mut reader, sender) = network.connect("alice");
        let node = Node::new(Config::new("alice", "#bottest"), Arc::new(sender), vec![]);

        node.request_shutdown();
        assert_eq!(node.run(&mut reader).await.unwrap(), LoopExit::Shutdown);
        assert!(matches!(
            node.run(&mut reader).await,
            Err(BotError::AlreadyRunning)
        ));
    }

    #[tokio::test]
    async fn read_failure_is_returned_after_shutdown() {
        let node = Node::new(
            Config::new("alice", "#bottest"),
            Arc::new(RecordingSender::new()),
            vec![],
        );

        let result = node.run(&mut ResetReader).await;
        assert!(matches!(
            result,
            Err(BotError::Transport(TransportError::Io(_)))
        ));

        let late = node.table().queue().enqueue("late", async { Ok(()) });
        assert!(matches!(late, Err(BotError::QueueClosed)));
        assert!(node.tasks.lock().is_empty());
    }
}
