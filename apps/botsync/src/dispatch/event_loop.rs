use tokio::sync::watch;

use super::table::DispatchTable;
use crate::errors::TransportError;
use crate::transport::LineReader;

/// Why the event loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The transport reported the end of the connection
    Closed,
    /// Shutdown was requested locally
    Shutdown,
}

/// Reads lines until the connection ends and feeds them to the dispatch table
///
/// Only an I/O failure of the transport is returned as an error; a clean
/// close or a local shutdown request both end the loop normally.
pub async fn run_event_loop(
    reader: &mut dyn LineReader,
    table: &DispatchTable,
    mut shutdown: watch::Receiver<bool>,
) -> Result<LoopExit, TransportError> {
    let mut lines = 0usize;

    let exit = loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.wait_for(|stop| *stop) => break LoopExit::Shutdown,
            next = reader.next_line() => next,
        };

        match next {
            Ok(line) => {
                lines += 1;
                let dispatched = table.dispatch(&line);
                tracing::trace!(
                    line = %line,
                    line_handlers = dispatched.line_handlers,
                    message_handlers = dispatched.message_handlers,
                    "Dispatched line"
                );
            }
            Err(TransportError::Closed) => break LoopExit::Closed,
            Err(e) => {
                tracing::error!(error = %e, lines, "Transport failed");
                return Err(e);
            }
        }
    };

    tracing::info!(?exit, lines, "Event loop stopped");
    Ok(exit)
}
