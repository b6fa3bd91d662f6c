use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;

use super::pattern::Pattern;
use super::queue::{CallbackQueue, HandlerFuture};
use crate::errors::BotResult;
use crate::protocol::{IrcLine, Message};

type LineHandler = Box<dyn FnOnce() -> HandlerFuture + Send>;
type MessageHandler = Arc<dyn Fn(Message) -> HandlerFuture + Send + Sync>;

struct OneShot {
    label: String,
    pattern: Pattern,
    handler: LineHandler,
}

struct Persistent {
    label: String,
    pattern: Pattern,
    handler: MessageHandler,
}

/// What a single inbound line triggered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatched {
    pub line_handlers: usize,
    pub message_handlers: usize,
}

/// Registered handlers of one connection
///
/// Three kinds of handlers are supported:
/// - transient: scheduled immediately, run once
/// - line pattern: run once for the first matching line, then removed
/// - message pattern: run for every matching direct message, never removed
///
/// Handlers may register further handlers (themselves included) while a
/// line is being dispatched; those only see later lines.
pub struct DispatchTable {
    queue: CallbackQueue,
    line_handlers: Mutex<Vec<OneShot>>,
    message_handlers: Mutex<Vec<Arc<Persistent>>>,
}

impl DispatchTable {
    pub fn new(queue: CallbackQueue) -> Self {
        Self {
            queue,
            line_handlers: Mutex::new(Vec::new()),
            message_handlers: Mutex::new(Vec::new()),
        }
    }

    pub fn queue(&self) -> &CallbackQueue {
        &self.queue
    }

    /// Schedules a one-off step, independent of any inbound line
    pub fn register_transient<F>(&self, label: impl Into<String>, task: F) -> BotResult<()>
    where
        F: Future<Output = BotResult<()>> + Send + 'static,
    {
        self.queue.enqueue(label, task)
    }

    /// Runs `handler` once, for the next line matching `pattern`
    pub fn register_line_pattern<H, F>(&self, label: impl Into<String>, pattern: Pattern, handler: H)
    where
        H: FnOnce() -> F + Send + 'static,
        F: Future<Output = BotResult<()>> + Send + 'static,
    {
        let label = label.into();
        tracing::debug!(handler = %label, ?pattern, "Registered line handler");
        self.line_handlers.lock().push(OneShot {
            label,
            pattern,
            handler: Box::new(move || Box::pin(handler()) as HandlerFuture),
        });
    }

    /// Runs `handler` for every direct message matching `pattern`
    pub fn register_message_pattern<H, F>(
        &self,
        label: impl Into<String>,
        pattern: Pattern,
        handler: H,
    ) where
        H: Fn(Message) -> F + Send + Sync + 'static,
        F: Future<Output = BotResult<()>> + Send + 'static,
    {
        let label = label.into();
        tracing::debug!(handler = %label, ?pattern, "Registered message handler");
        self.message_handlers.lock().push(Arc::new(Persistent {
            label,
            pattern,
            handler: Arc::new(move |message| Box::pin(handler(message)) as HandlerFuture),
        }));
    }

    /// Matches one inbound line against the table and queues the resulting invocations
    pub fn dispatch(&self, raw: &str) -> Dispatched {
        let line = IrcLine::parse(raw);
        let mut dispatched = Dispatched::default();

        // Matching one-shots leave the table before anything they run can
        // register replacements.
        let fired: Vec<OneShot> = {
            let mut handlers = self.line_handlers.lock();
            let (fired, kept): (Vec<OneShot>, Vec<OneShot>) = std::mem::take(&mut *handlers)
                .into_iter()
                .partition(|h| h.pattern.matches_line(&line));
            *handlers = kept;
            fired
        };
        for OneShot { label, handler, .. } in fired {
            self.schedule(label, handler());
            dispatched.line_handlers += 1;
        }

        let Some(message) = Message::from_line(&line) else {
            return dispatched;
        };
        let snapshot: Vec<Arc<Persistent>> = self.message_handlers.lock().clone();
        for entry in snapshot
            .iter()
            .filter(|entry| entry.pattern.matches_message(&message))
        {
            self.schedule(entry.label.clone(), (entry.handler)(message.clone()));
            dispatched.message_handlers += 1;
        }

        dispatched
    }

    pub fn line_handler_count(&self) -> usize {
        self.line_handlers.lock().len()
    }

    pub fn message_handler_count(&self) -> usize {
        self.message_handlers.lock().len()
    }

    fn schedule(&self, label: String, task: HandlerFuture) {
        if let Err(e) = self.queue.enqueue(label.clone(), task) {
            tracing::debug!(handler = %label, error = %e, "Dropped invocation");
        }
    }
}
