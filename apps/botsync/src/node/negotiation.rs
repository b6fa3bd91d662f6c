use std::sync::Arc;

use super::Node;
use crate::errors::BotResult;
use crate::jobs::{Admission, ClaimDecision, Job, JobResult};
use crate::protocol::{Command, Message};

impl Node {
    // ===== Proposer side =====

    /// `!emitjob:<id>:<params>`: offer a job to the channel
    pub async fn emit_job(&self, msg: &Message) -> BotResult<()> {
        let Some(Command::EmitJob { job_id, parameters }) = &msg.command else {
            return Ok(());
        };
        if !self.jobs.propose(job_id) {
            tracing::debug!(job_id = %job_id, "Job already proposed");
            return Ok(());
        }

        tracing::info!(job_id = %job_id, requested_by = %msg.sender, "Proposing job");
        let command = Command::Job {
            job_id: job_id.clone(),
            parameters: parameters.clone(),
        };
        self.send(&self.config.channel, &command).await
    }

    /// `CLAIM:<id>`: the first claimant gets the job, the others are turned down
    pub async fn handle_claim(&self, msg: &Message) -> BotResult<()> {
        let Some(Command::Claim { job_id }) = &msg.command else {
            return Ok(());
        };

        let reply = match self.jobs.arbitrate_claim(job_id, &msg.sender) {
            ClaimDecision::Unknown => {
                tracing::debug!(job_id = %job_id, peer = %msg.sender, "Claim for a job we never proposed");
                return Ok(());
            }
            ClaimDecision::Accepted => {
                tracing::info!(job_id = %job_id, peer = %msg.sender, "Accepted claim");
                Command::Thanks {
                    job_id: job_id.clone(),
                }
            }
            ClaimDecision::Refused { holder } => {
                tracing::debug!(job_id = %job_id, peer = %msg.sender, holder = %holder, "Refused claim");
                Command::NoThanks {
                    job_id: job_id.clone(),
                }
            }
        };
        self.send(&msg.sender, &reply).await
    }

    // ===== Candidate side =====

    /// `JOB:<id>:<params>`: claim the job if there is room for it
    pub async fn handle_job_proposal(&self, msg: &Message) -> BotResult<()> {
        let Some(Command::Job { job_id, parameters }) = &msg.command else {
            return Ok(());
        };

        let job = Job::new(job_id.clone(), parameters.clone());
        match self.jobs.admit(job, &msg.sender) {
            Admission::Admitted => {
                tracing::info!(job_id = %job_id, proposer = %msg.sender, "Claiming job");
                let claim = Command::Claim {
                    job_id: job_id.clone(),
                };
                self.send(&msg.sender, &claim).await
            }
            refused => {
                tracing::debug!(job_id = %job_id, proposer = %msg.sender, ?refused, "Ignoring job proposal");
                Ok(())
            }
        }
    }

    /// `THANKS:<id>`: we are hired, hand the job to the worker pool
    pub async fn handle_thanks(self: &Arc<Self>, msg: &Message) -> BotResult<()> {
        let Some(Command::Thanks { job_id }) = &msg.command else {
            return Ok(());
        };
        let Some(job) = self.jobs.hire(job_id, &msg.sender) else {
            tracing::debug!(job_id = %job_id, peer = %msg.sender, "Unexpected THANKS");
            return Ok(());
        };

        tracing::info!(job_id = %job_id, proposer = %msg.sender, "Hired");
        self.submit(job);
        Ok(())
    }

    /// `NOTHANKS:<id>`: someone else got the job
    pub async fn handle_nothanks(&self, msg: &Message) -> BotResult<()> {
        let Some(Command::NoThanks { job_id }) = &msg.command else {
            return Ok(());
        };
        if self.jobs.refuse(job_id, &msg.sender) {
            tracing::info!(job_id = %job_id, proposer = %msg.sender, "Claim refused");
        } else {
            tracing::debug!(job_id = %job_id, peer = %msg.sender, "Unexpected NOTHANKS");
        }
        Ok(())
    }

    /// `JOBRESULT:<id>:<value>`: cache whatever result is published
    pub async fn handle_job_result(&self, msg: &Message) -> BotResult<()> {
        let Some(Command::JobResult { job_id, value }) = &msg.command else {
            return Ok(());
        };
        let previous = self.jobs.record_result(JobResult {
            job_id: job_id.clone(),
            value: value.clone(),
        });
        tracing::info!(job_id = %job_id, peer = %msg.sender, replaced = previous.is_some(), "Cached job result");
        Ok(())
    }

    // ===== Execution =====

    /// Runs a hired job on its own task, off the callback runner
    fn submit(self: &Arc<Self>, job: Job) {
        let node = Arc::clone(self);
        let mut tasks = self.tasks.lock();
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move { node.execute(job).await });
    }

    async fn execute(&self, job: Job) {
        let job_id = job.id.clone();
        match self.pool.run(job).await {
            Ok(Some(result)) => {
                if let Err(e) = self.publish_result(result).await {
                    tracing::warn!(job_id = %job_id, error = %e, "Failed to publish result");
                }
            }
            Ok(None) => tracing::warn!(job_id = %job_id, "No executor accepts job"),
            Err(e) => tracing::warn!(job_id = %job_id, error = %e, "Job failed"),
        }
    }

    /// Caches a computed result, completes the job and broadcasts the result
    async fn publish_result(&self, result: JobResult) -> BotResult<()> {
        self.jobs.complete(&result)?;
        tracing::info!(job_id = %result.job_id, value = %result.value, "Job completed");
        let command = Command::JobResult {
            job_id: result.job_id,
            value: result.value,
        };
        self.send(&self.config.channel, &command).await
    }
}
