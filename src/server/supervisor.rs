// src/server/supervisor.rs

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use tokio::process::{Child, Command};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::context::RunContext;
use crate::errors::{DevmirrorError, Result};
use crate::server::lease::{process_alive, request_termination, PidLease};

/// How often and how long to poll an orphan after asking it to die.
const RECLAIM_ATTEMPTS: u32 = 50;
const RECLAIM_POLL: Duration = Duration::from_millis(100);

/// Grace period before an unresponsive server is killed outright.
const STOP_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Starts, stops and restarts the one supervised server process.
///
/// The engine loop owns this exclusively, so start/stop transitions are
/// serialized by construction: two rapid rebuilds cannot race into two
/// live server processes.
pub struct ServerSupervisor {
    server_file: Option<PathBuf>,
    cwd: Option<PathBuf>,
    open_url: Option<String>,
    runner: String,
    lease: PidLease,
    child: Option<Child>,
    state: ServerState,
    opened: bool,
}

impl ServerSupervisor {
    pub fn new(
        server_file: Option<PathBuf>,
        cwd: Option<PathBuf>,
        open_url: Option<String>,
    ) -> Self {
        let root = cwd.clone().unwrap_or_else(|| PathBuf::from("."));
        Self {
            server_file,
            cwd,
            open_url,
            runner: "node".to_string(),
            lease: PidLease::new(root),
            child: None,
            state: ServerState::Stopped,
            opened: false,
        }
    }

    pub fn from_context(ctx: &RunContext) -> Self {
        Self::new(
            ctx.server_file.clone(),
            ctx.cwd.clone(),
            ctx.open_url.clone(),
        )
    }

    /// Override the program used to launch the server (defaults to
    /// `node`).
    pub fn set_runner(&mut self, runner: impl Into<String>) {
        self.runner = runner.into();
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn lease(&self) -> &PidLease {
        &self.lease
    }

    pub fn current_pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(|c| c.id())
    }

    /// Detect and reap a server left behind by a previous run.
    ///
    /// A recorded pid that probes dead is a stale record and is cleared
    /// without waiting. A live one gets a termination request and a
    /// bounded poll; if it refuses to die this is a fatal startup
    /// condition, surfaced rather than silently hung on.
    pub async fn reclaim_orphan(&self) -> Result<()> {
        let Some(pid) = self.lease.read()? else {
            return Ok(());
        };

        if !process_alive(pid) {
            info!(pid, "stale pid record; clearing");
            return self.lease.release();
        }

        info!(pid, "reclaiming orphaned server process from a previous run");
        request_termination(pid);

        for _ in 0..RECLAIM_ATTEMPTS {
            if !process_alive(pid) {
                self.lease.release()?;
                info!(pid, "orphaned server reclaimed");
                return Ok(());
            }
            sleep(RECLAIM_POLL).await;
        }

        Err(DevmirrorError::OrphanTimeout {
            pid,
            attempts: RECLAIM_ATTEMPTS,
        })
    }

    /// Start the server. No-op without a configured server file.
    ///
    /// Any currently tracked process is stopped first; the configured
    /// URL is opened only on the very first successful start of this
    /// invocation, not on restarts.
    pub async fn start(&mut self) -> Result<()> {
        let Some(server_file) = self.server_file.clone() else {
            return Ok(());
        };

        self.stop().await?;
        self.state = ServerState::Starting;
        info!(file = ?server_file, "starting server");

        let mut cmd = Command::new(&self.runner);
        cmd.arg(&server_file)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.state = ServerState::Stopped;
                return Err(DevmirrorError::Spawn(format!(
                    "{} {}: {e}",
                    self.runner,
                    server_file.display()
                )));
            }
        };

        let pid = child.id().unwrap_or_default();
        self.lease.acquire(pid)?;
        self.child = Some(child);
        self.state = ServerState::Running;
        info!(pid, "server running");

        if !self.opened {
            self.opened = true;
            if let Some(url) = &self.open_url {
                info!(url = %url, "opening browser");
                if let Err(e) = open::that(url) {
                    warn!(url = %url, error = %e, "failed to open browser");
                }
            }
        }

        Ok(())
    }

    /// Stop the tracked server, if any, and release the pid lease.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        self.state = ServerState::Stopping;

        if let Some(pid) = child.id() {
            info!(pid, "stopping server");
            request_termination(pid);
            #[cfg(not(unix))]
            let _ = child.start_kill();
        }

        match tokio::time::timeout(STOP_GRACE, child.wait()).await {
            Ok(status) => {
                let status = status.context("waiting for server exit")?;
                info!(code = ?status.code(), "server exited");
            }
            Err(_) => {
                warn!("server ignored termination request; killing");
                child.kill().await.context("killing server process")?;
            }
        }

        self.lease.release()?;
        self.state = ServerState::Stopped;
        Ok(())
    }

    /// Stop-then-start, used after every build update and manual reload.
    pub async fn restart(&mut self) -> Result<()> {
        self.stop().await?;
        self.start().await
    }

    /// Wait for the supervised process to exit on its own (serve mode
    /// without watching), then release the lease.
    pub async fn wait(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait().await.context("waiting for server process")?;
        info!(code = ?status.code(), "server exited");
        self.lease.release()?;
        self.state = ServerState::Stopped;
        Ok(())
    }
}
