// src/server/mod.rs

//! Supervision of the single external server process.
//!
//! The pid lease is the only state shared across invocations: it lets a
//! cold start detect and reap a server left behind by a crashed run.

pub mod lease;
pub mod supervisor;

pub use lease::{process_alive, request_termination, PidLease, SERVER_PID_FILE};
pub use supervisor::{ServerState, ServerSupervisor};
