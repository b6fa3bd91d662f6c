use std::future::Future;
use std::pin::Pin;

use tokio::sync::{mpsc, watch};

use crate::errors::{BotError, BotResult};

/// Body of a handler, ready to run
pub type HandlerFuture = Pin<Box<dyn Future<Output = BotResult<()>> + Send + 'static>>;

/// A deferred, already-bound handler call
pub struct Invocation {
    label: String,
    task: HandlerFuture,
}

/// Producer side of the callback queue
///
/// Cheap to clone; safe to use from the event loop and from running
/// invocations alike. Invocations pushed from one caller run in push order.
#[derive(Clone)]
pub struct CallbackQueue {
    tx: mpsc::UnboundedSender<Invocation>,
}

impl CallbackQueue {
    /// Creates a queue and the runner that drains it
    ///
    /// The runner stops once `shutdown` turns `true` (or its sender is dropped).
    pub fn new(shutdown: watch::Receiver<bool>) -> (Self, Runner) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, Runner { rx, shutdown })
    }

    /// Schedules `task` to run on the runner
    pub fn enqueue<F>(&self, label: impl Into<String>, task: F) -> BotResult<()>
    where
        F: Future<Output = BotResult<()>> + Send + 'static,
    {
        let invocation = Invocation {
            label: label.into(),
            task: Box::pin(task),
        };
        self.tx.send(invocation).map_err(|_| BotError::QueueClosed)
    }
}

/// Consumer side of the callback queue
pub struct Runner {
    rx: mpsc::UnboundedReceiver<Invocation>,
    shutdown: watch::Receiver<bool>,
}

impl Runner {
    /// Executes invocations one at a time until shutdown
    ///
    /// Each invocation runs on its own task so a failing or panicking
    /// handler is reported and the runner moves on. Returns the number of
    /// invocations that completed successfully.
    pub async fn run(mut self) -> usize {
        let mut completed = 0;

        loop {
            let invocation = tokio::select! {
                biased;
                _ = shutdown_requested(&mut self.shutdown) => break,
                next = self.rx.recv() => match next {
                    Some(invocation) => invocation,
                    None => break,
                },
            };

            let Invocation { label, task } = invocation;
            let mut handle = tokio::spawn(task);
            let joined = tokio::select! {
                biased;
                joined = &mut handle => joined,
                _ = shutdown_requested(&mut self.shutdown) => {
                    handle.abort();
                    tracing::debug!(handler = %label, "Aborted handler on shutdown");
                    break;
                }
            };

            match joined {
                Ok(Ok(())) => {
                    completed += 1;
                    tracing::trace!(handler = %label, "Handler completed");
                }
                Ok(Err(e)) => tracing::warn!(handler = %label, error = %e, "Handler failed"),
                Err(e) if e.is_panic() => tracing::error!(handler = %label, "Handler panicked"),
                Err(e) => tracing::warn!(handler = %label, error = %e, "Handler cancelled"),
            }
        }

        tracing::debug!(completed, "Callback runner stopped");
        completed
    }
}

async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    // A dropped sender also means shutdown.
    let _ = shutdown.wait_for(|stop| *stop).await;
}
