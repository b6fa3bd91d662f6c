use std::fmt;

use crate::errors::BotError;

/// Lifecycle of a job on the node that proposed it
///
/// # Status Transitions
/// ```text
/// Sentout -> Accepted(peer)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposerState {
    /// Offered to the group, no claim approved yet
    Sentout,
    /// The given peer's claim was approved; every later claim is refused
    Accepted { peer: String },
}

impl ProposerState {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ProposerState::Accepted { .. })
    }
}

impl fmt::Display for ProposerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposerState::Sentout => write!(f, "sentout"),
            ProposerState::Accepted { peer } => write!(f, "accepted({})", peer),
        }
    }
}

/// Lifecycle of a job on a node that may execute it
///
/// # Status Transitions
/// ```text
/// Pending -> Hired -> Completed
///        \-> Dropped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateState {
    /// Proposal admitted, claim sent, waiting for the proposer's answer
    Pending,
    /// Claim acknowledged; the job is handed to the worker pool
    Hired,
    /// A result was computed and published
    Completed,
    /// Claim refused, or the proposer never answered in time
    Dropped,
}

impl CandidateState {
    /// Checks if a transition from current state to next state is valid
    ///
    /// # Example
    /// ```
    /// use botsync::jobs::CandidateState;
    ///
    /// assert!(CandidateState::Pending.can_transition_to(CandidateState::Hired));
    /// assert!(!CandidateState::Dropped.can_transition_to(CandidateState::Hired));
    /// ```
    pub fn can_transition_to(&self, next: CandidateState) -> bool {
        use CandidateState::*;
        matches!(
            (self, next),
            (Pending, Hired) | (Pending, Dropped) | (Hired, Completed)
        )
    }

    /// Returns `next` if the transition is allowed
    pub fn transition_to(self, next: CandidateState) -> Result<CandidateState, BotError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(BotError::InvalidStateTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CandidateState::Completed | CandidateState::Dropped)
    }
}

impl fmt::Display for CandidateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateState::Pending => write!(f, "pending"),
            CandidateState::Hired => write!(f, "hired"),
            CandidateState::Completed => write!(f, "completed"),
            CandidateState::Dropped => write!(f, "dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transition_pending_to_hired() {
        assert!(CandidateState::Pending.can_transition_to(CandidateState::Hired));
    }

    #[test]
    fn valid_transition_pending_to_dropped() {
        assert!(CandidateState::Pending.can_transition_to(CandidateState::Dropped));
    }

    #[test]
    fn valid_transition_hired_to_completed() {
        assert!(CandidateState::Hired.can_transition_to(CandidateState::Completed));
    }

    #[test]
    fn invalid_transition_pending_to_completed() {
        assert!(!CandidateState::Pending.can_transition_to(CandidateState::Completed));
    }

    #[test]
    fn invalid_transition_hired_to_dropped() {
        assert!(!CandidateState::Hired.can_transition_to(CandidateState::Dropped));
    }

    #[test]
    fn terminal_states_go_nowhere() {
        for next in [
            CandidateState::Pending,
            CandidateState::Hired,
            CandidateState::Completed,
            CandidateState::Dropped,
        ] {
            assert!(!CandidateState::Completed.can_transition_to(next));
            assert!(!CandidateState::Dropped.can_transition_to(next));
        }
    }

    #[test]
    fn transition_to_reports_invalid_move() {
        let err = CandidateState::Dropped
            .transition_to(CandidateState::Hired)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid state transition from dropped to hired"
        );
    }

    #[test]
    fn state_display() {
        assert_eq!(CandidateState::Pending.to_string(), "pending");
        assert_eq!(CandidateState::Hired.to_string(), "hired");
        assert_eq!(CandidateState::Completed.to_string(), "completed");
        assert_eq!(CandidateState::Dropped.to_string(), "dropped");
        assert_eq!(ProposerState::Sentout.to_string(), "sentout");
        assert_eq!(
            ProposerState::Accepted { peer: "bob".to_string() }.to_string(),
            "accepted(bob)"
        );
    }
}
