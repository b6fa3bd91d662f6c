use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;

use super::state::{CandidateState, ProposerState};
use super::types::{Job, JobReport, JobResult};
use crate::errors::BotResult;
use crate::protocol::JobId;

/// Proposer's answer to a claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimDecision {
    /// We never proposed this job
    Unknown,
    /// The claimant now owns the job
    Accepted,
    /// Someone else already owns the job
    Refused { holder: String },
}

/// Candidate's verdict on a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// Already pending, hired or completed here
    Duplicate,
    /// Pending set is full; the proposal is ignored
    AtCapacity,
    /// We proposed this id ourselves
    OwnProposal,
}

#[derive(Debug)]
struct ReceivedJob {
    job: Job,
    proposer: String,
    state: CandidateState,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Ledger {
    proposed: BTreeMap<JobId, ProposerState>,
    received: BTreeMap<JobId, ReceivedJob>,
    results: HashMap<JobId, String>,
}

/// Both sides of the negotiation state of one node, plus the result cache
///
/// Every operation holds the lock for its whole read-modify-write, so
/// concurrent handlers never observe or produce a half-applied transition.
#[derive(Debug)]
pub struct JobBook {
    ledger: Mutex<Ledger>,
    capacity: usize,
    pending_ttl: Option<TimeDelta>,
}

impl JobBook {
    /// Creates an empty book
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of Pending received jobs
    /// * `pending_ttl` - Age after which a Pending job is dropped; `None` keeps it forever
    pub fn new(capacity: usize, pending_ttl: Option<TimeDelta>) -> Self {
        Self {
            ledger: Mutex::new(Ledger::default()),
            capacity,
            pending_ttl,
        }
    }

    // ===== Proposer side =====

    /// Records a job id we are about to offer; `false` if it was already proposed
    pub fn propose(&self, id: &JobId) -> bool {
        let mut ledger = self.ledger.lock();
        if ledger.proposed.contains_key(id) {
            return false;
        }
        ledger.proposed.insert(id.clone(), ProposerState::Sentout);
        true
    }

    /// Decides a claim: the first claimant wins, everyone after is refused
    pub fn arbitrate_claim(&self, id: &JobId, claimant: &str) -> ClaimDecision {
        let mut ledger = self.ledger.lock();
        let Some(state) = ledger.proposed.get_mut(id) else {
            return ClaimDecision::Unknown;
        };
        match state {
            ProposerState::Accepted { peer } => ClaimDecision::Refused {
                holder: peer.clone(),
            },
            ProposerState::Sentout => {
                *state = ProposerState::Accepted {
                    peer: claimant.to_string(),
                };
                ClaimDecision::Accepted
            }
        }
    }

    pub fn proposer_state(&self, id: &JobId) -> Option<ProposerState> {
        self.ledger.lock().proposed.get(id).cloned()
    }

    // ===== Candidate side =====

    /// Admits a proposal into the Pending set if there is room for it
    pub fn admit(&self, job: Job, proposer: &str) -> Admission {
        let mut ledger = self.ledger.lock();
        let now = Utc::now();
        self.evict_stale(&mut ledger, now);

        if ledger.proposed.contains_key(&job.id) {
            return Admission::OwnProposal;
        }
        if let Some(existing) = ledger.received.get(&job.id) {
            if existing.state != CandidateState::Dropped {
                return Admission::Duplicate;
            }
        }
        if pending_count(&ledger) >= self.capacity {
            return Admission::AtCapacity;
        }

        ledger.received.insert(
            job.id.clone(),
            ReceivedJob {
                job,
                proposer: proposer.to_string(),
                state: CandidateState::Pending,
                updated_at: now,
            },
        );
        Admission::Admitted
    }

    /// Moves a Pending job to Hired and hands it back for execution
    ///
    /// Returns `None` unless the job is Pending here and `from` is its proposer.
    pub fn hire(&self, id: &JobId, from: &str) -> Option<Job> {
        let mut ledger = self.ledger.lock();
        let received = ledger.received.get_mut(id)?;
        if received.proposer != from {
            return None;
        }
        received.state = received.state.transition_to(CandidateState::Hired).ok()?;
        received.updated_at = Utc::now();
        Some(received.job.clone())
    }

    /// Moves a Pending job to Dropped; `false` if there was nothing to drop
    pub fn refuse(&self, id: &JobId, from: &str) -> bool {
        let mut ledger = self.ledger.lock();
        let Some(received) = ledger.received.get_mut(id) else {
            return false;
        };
        if received.proposer != from {
            return false;
        }
        match received.state.transition_to(CandidateState::Dropped) {
            Ok(next) => {
                received.state = next;
                received.updated_at = Utc::now();
                true
            }
            Err(_) => false,
        }
    }

    /// Marks a Hired job Completed and caches its result
    pub fn complete(&self, result: &JobResult) -> BotResult<()> {
        let mut ledger = self.ledger.lock();
        ledger
            .results
            .insert(result.job_id.clone(), result.value.clone());
        if let Some(received) = ledger.received.get_mut(&result.job_id) {
            received.state = received.state.transition_to(CandidateState::Completed)?;
            received.updated_at = Utc::now();
        }
        Ok(())
    }

    pub fn candidate_state(&self, id: &JobId) -> Option<CandidateState> {
        self.ledger.lock().received.get(id).map(|r| r.state)
    }

    pub fn pending_count(&self) -> usize {
        pending_count(&self.ledger.lock())
    }

    // ===== Results =====

    /// Caches a result, silently replacing any previous value
    pub fn record_result(&self, result: JobResult) -> Option<String> {
        self.ledger.lock().results.insert(result.job_id, result.value)
    }

    pub fn result(&self, id: &JobId) -> Option<String> {
        self.ledger.lock().results.get(id).cloned()
    }

    // ===== Reporting =====

    pub fn report(&self) -> JobReport {
        let mut ledger = self.ledger.lock();
        self.evict_stale(&mut ledger, Utc::now());

        let mut report = JobReport::default();
        for (id, state) in &ledger.proposed {
            report.sentout.push(id.clone());
            if let ProposerState::Accepted { peer } = state {
                report.accepted.push((id.clone(), peer.clone()));
            }
        }
        for (id, received) in &ledger.received {
            match received.state {
                CandidateState::Pending => report.pending.push(id.clone()),
                CandidateState::Hired => report.hired.push(id.clone()),
                CandidateState::Completed | CandidateState::Dropped => {}
            }
        }
        report
    }

    /// Forgets settled entries older than the TTL, then drops stale Pending ones
    ///
    /// Settled entries are pruned before this pass settles anything, so a
    /// freshly dropped job stays visible for one more TTL.
    fn evict_stale(&self, ledger: &mut Ledger, now: DateTime<Utc>) {
        let Some(ttl) = self.pending_ttl else {
            return;
        };
        ledger.received.retain(|_, received| {
            !(received.state.is_terminal() && now - received.updated_at >= ttl)
        });

        for (id, received) in ledger.received.iter_mut() {
            if received.state == CandidateState::Pending && now - received.updated_at >= ttl {
                received.state = CandidateState::Dropped;
                received.updated_at = now;
                tracing::info!(job_id = %id, proposer = %received.proposer, "Dropped unanswered claim");
            }
        }
    }
}

fn pending_count(ledger: &Ledger) -> usize {
    ledger
        .received
        .values()
        .filter(|r| r.state == CandidateState::Pending)
        .count()
}
