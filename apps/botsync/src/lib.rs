//! Botsync Library
//!
//! This library provides a chat-protocol client that dispatches inbound lines
//! to registered handlers, and the peer-to-peer job negotiation built on top
//! of it: peers advertise themselves, propose jobs, arbitrate claims, run
//! hired jobs on a bounded worker pool and publish the results.

pub mod config;
pub mod dispatch;
pub mod errors;
pub mod jobs;
pub mod node;
pub mod peers;
pub mod protocol;
pub mod transport;
pub mod workers;
