use std::sync::Arc;

use tokio::sync::Semaphore;

use super::WorkExecutor;
use crate::errors::{BotError, BotResult};
use crate::jobs::{Job, JobResult};

/// Bounded-concurrency executor for hired jobs
///
/// At most `width` jobs run at once; further jobs wait for a permit.
#[derive(Clone)]
pub struct WorkerPool {
    executors: Arc<Vec<Arc<dyn WorkExecutor>>>,
    permits: Arc<Semaphore>,
    width: usize,
}

impl WorkerPool {
    pub fn new(width: usize, executors: Vec<Arc<dyn WorkExecutor>>) -> Self {
        let width = width.max(1);
        Self {
            executors: Arc::new(executors),
            permits: Arc::new(Semaphore::new(width)),
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// First registered executor accepting `parameters`
    pub fn executor_for(&self, parameters: &str) -> Option<Arc<dyn WorkExecutor>> {
        self.executors
            .iter()
            .find(|executor| executor.would_accept(parameters))
            .cloned()
    }

    /// Runs a job to completion
    ///
    /// Returns `Ok(None)` when no executor accepts the job.
    pub async fn run(&self, job: Job) -> BotResult<Option<JobResult>> {
        let Some(executor) = self.executor_for(&job.parameters) else {
            return Ok(None);
        };

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| BotError::WorkFailed("worker pool closed".to_string()))?;

        tracing::debug!(job_id = %job.id, executor = executor.name(), "Executing job");
        let parameters = job.parameters.clone();
        let value = tokio::task::spawn_blocking(move || executor.perform(&parameters))
            .await
            .map_err(|e| BotError::WorkFailed(format!("executor task failed: {}", e)))??;

        Ok(Some(JobResult {
            job_id: job.id,
            value,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::JobId;
    use crate::workers::MathsWorker;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Named(&'static str);

    impl WorkExecutor for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn would_accept(&self, _parameters: &str) -> bool {
            true
        }

        fn perform(&self, _parameters: &str) -> BotResult<String> {
            Ok(self.0.to_string())
        }
    }

    /// Tracks how many calls overlap
    struct Gauge {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    impl WorkExecutor for Gauge {
        fn name(&self) -> &str {
            "gauge"
        }

        fn would_accept(&self, _parameters: &str) -> bool {
            true
        }

        fn perform(&self, _parameters: &str) -> BotResult<String> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(30));
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok("done".to_string())
        }
    }

    fn maths_pool() -> WorkerPool {
        WorkerPool::new(3, vec![Arc::new(MathsWorker::new()) as Arc<dyn WorkExecutor>])
    }

    fn job(id: &str, parameters: &str) -> Job {
        Job::new(JobId::new(id).unwrap(), parameters)
    }

    #[tokio::test]
    async fn first_accepting_executor_wins() {
        let executors: Vec<Arc<dyn WorkExecutor>> =
            vec![Arc::new(MathsWorker::new()), Arc::new(Named("fallback"))];
        let pool = WorkerPool::new(3, executors);

        let maths = pool.run(job("1", "pow,2,10")).await.unwrap().unwrap();
        assert_eq!(maths.value, "1024");

        let other = pool.run(job("2", "sqrt,4")).await.unwrap().unwrap();
        assert_eq!(other.value, "fallback");
    }

    #[tokio::test]
    async fn job_without_executor_yields_nothing() {
        let pool = maths_pool();
        assert!(pool.executor_for("sqrt,4").is_none());
        assert_eq!(pool.run(job("1", "sqrt,4")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn executor_failure_is_reported() {
        let pool = maths_pool();
        let err = pool.run(job("1", "pow,10,40")).await.unwrap_err();
        assert!(matches!(err, BotError::WorkFailed(_)));
    }

    #[tokio::test]
    async fn concurrency_is_bounded_by_width() {
        let gauge = Arc::new(Gauge {
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let pool = WorkerPool::new(2, vec![gauge.clone() as Arc<dyn WorkExecutor>]);

        let runs: Vec<_> = (0..6)
            .map(|n| {
                let pool = pool.clone();
                tokio::spawn(async move { pool.run(job(&n.to_string(), "x")).await })
            })
            .collect();
        for run in runs {
            assert!(run.await.unwrap().unwrap().is_some());
        }

        assert!(gauge.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(pool.width(), 2);
    }
}
