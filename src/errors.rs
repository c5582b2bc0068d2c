// src/errors.rs

//! Crate-wide error taxonomy.
//!
//! A transpile failure aborts one file, not the scan; a hook failure
//! aborts the remaining hooks for that run reason, not the session.
//! Only orphan-reclamation timeouts and top-level I/O failures on a
//! non-watch initial scan are fatal to the whole invocation.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevmirrorError {
    #[error("transpile failed for {}: {}", file.display(), diagnostics.join("; "))]
    Transpile {
        file: PathBuf,
        diagnostics: Vec<String>,
    },

    #[error("hook `{command}` exited with code {exit_code}")]
    Hook { command: String, exit_code: i32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("failed to spawn server process: {0}")]
    Spawn(String),

    #[error("orphaned server process {pid} still alive after {attempts} termination attempts")]
    OrphanTimeout { pid: u32, attempts: u32 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DevmirrorError>;
