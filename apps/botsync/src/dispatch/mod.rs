// Event dispatch engine
//
// Inbound lines are matched against registered handlers; matches become
// invocations on the callback queue, which a dedicated runner drains.

pub mod event_loop;
pub mod pattern;
pub mod queue;
pub mod table;

pub use event_loop::{run_event_loop, LoopExit};
pub use pattern::Pattern;
pub use queue::{CallbackQueue, HandlerFuture, Invocation, Runner};
pub use table::{DispatchTable, Dispatched};
