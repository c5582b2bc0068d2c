// src/hooks/mod.rs

//! Post-build hook parsing and execution.
//!
//! Hooks are shell commands declared on the CLI. A hook may be bound to
//! specific trigger files with a `#watch:` suffix; bound hooks get their
//! own dedicated file watches and never fire from the generic build
//! update path.

pub mod parse;
pub mod runner;

pub use parse::{parse_hook, Hook};
pub use runner::HookRunner;
