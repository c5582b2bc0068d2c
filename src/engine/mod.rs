// src/engine/mod.rs

//! Orchestration engine for devmirror.
//!
//! This module ties together:
//! - the live watch tree over the source directory
//! - hook execution (global and file-bound)
//! - the server supervisor
//! - the main runtime event loop that reacts to:
//!   - file content changes
//!   - ambiguous create/delete events
//!   - dedicated hook-file changes
//!   - interactive reload requests
//!   - shutdown signals

pub mod runtime;

pub use runtime::{Runtime, RuntimeEvent};
