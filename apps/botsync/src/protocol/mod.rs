// Wire protocol
//
// Raw IRC lines, direct messages and the job-negotiation commands they carry.

pub mod command;
pub mod job_id;
pub mod line;
pub mod message;

pub use command::{Command, CommandError, Verb};
pub use job_id::JobId;
pub use line::IrcLine;
pub use message::Message;
