// Work executors
//
// A hired job is handed to the first registered executor that accepts its
// parameters. Executors may block; the pool runs them off the async runtime.

pub mod maths;
pub mod pool;

pub use maths::MathsWorker;
pub use pool::WorkerPool;

use crate::errors::BotResult;

/// Capability contract of a job executor
pub trait WorkExecutor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Whether this executor knows how to handle `parameters`
    fn would_accept(&self, parameters: &str) -> bool;

    /// Computes the result for `parameters`; may block
    fn perform(&self, parameters: &str) -> BotResult<String>;
}
