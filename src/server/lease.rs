// src/server/lease.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::errors::Result;

/// Relative path (from the server working directory) of the pid record.
///
/// The effective path on disk is `<root>/.devmirror/server.pid`. Its
/// presence means "a supervised server may be alive"; absence means no
/// tracked server.
pub const SERVER_PID_FILE: &str = ".devmirror/server.pid";

/// Filesystem lease on the one supervised server process.
///
/// Acquire writes the pid, probe checks liveness, release deletes the
/// record. Crash-safety comes from the probe: a record whose pid is
/// dead is stale and can be cleared without waiting.
#[derive(Debug, Clone)]
pub struct PidLease {
    path: PathBuf,
}

impl PidLease {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            path: root.as_ref().join(SERVER_PID_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `pid` as the tracked server process.
    pub fn acquire(&self, pid: u32) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating pid record directory {:?}", parent))?;
        }
        fs::write(&self.path, pid.to_string())
            .with_context(|| format!("writing pid record {:?}", self.path))?;
        debug!(pid, path = ?self.path, "pid lease acquired");
        Ok(())
    }

    /// Read the recorded pid, if any. A malformed record reads as none.
    pub fn read(&self) -> Result<Option<u32>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text.trim().parse().ok()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the record. Releasing an absent lease is a no-op.
    pub fn release(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = ?self.path, "pid lease released");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Zero-effect liveness probe (signal 0).
#[cfg(unix)]
pub fn process_alive(pid: u32) -> bool {
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}

#[cfg(not(unix))]
pub fn process_alive(_pid: u32) -> bool {
    false
}

/// Ask a process to terminate gracefully.
#[cfg(unix)]
pub fn request_termination(pid: u32) {
    unsafe {
        libc::kill(pid as libc::pid_t, libc::SIGTERM);
    }
}

#[cfg(not(unix))]
pub fn request_termination(_pid: u32) {}
