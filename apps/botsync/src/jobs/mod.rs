// Job negotiation state
//
// A node is proposer for the jobs it emits and candidate for the jobs it
// claims. Both sides live in one JobBook together with the result cache.

pub mod book;
pub mod state;
pub mod types;

pub use book::{Admission, ClaimDecision, JobBook};
pub use state::{CandidateState, ProposerState};
pub use types::{Job, JobReport, JobResult};
