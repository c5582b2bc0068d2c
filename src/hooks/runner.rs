// src/hooks/runner.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use anyhow::Context;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::context::RunContext;
use crate::engine::RuntimeEvent;
use crate::errors::{DevmirrorError, Result};
use crate::hooks::Hook;

/// Executes post-build hooks.
///
/// Hooks run sequentially in declared order (they often have
/// build-order dependencies), and a nonzero exit aborts the remaining
/// hooks for that run reason. File-bound hooks additionally get a
/// dedicated watcher (separate from the build tree's watches) that
/// re-runs just that hook when one of its trigger files changes.
pub struct HookRunner {
    hooks: Vec<Hook>,
    cwd: Option<PathBuf>,
    _watcher: Option<RecommendedWatcher>,
}

impl HookRunner {
    pub fn new(hooks: Vec<Hook>, cwd: Option<PathBuf>) -> Self {
        Self {
            hooks,
            cwd,
            _watcher: None,
        }
    }

    pub fn from_context(ctx: &RunContext) -> Self {
        Self::new(ctx.hooks.clone(), ctx.cwd.clone())
    }

    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    /// Run every hook once, in declared order.
    pub async fn run_init(&self) -> Result<()> {
        for hook in &self.hooks {
            self.run_command(&hook.command).await?;
        }
        Ok(())
    }

    /// Run the global hooks after a build update.
    ///
    /// File-bound hooks are a no-op here: they are driven by their own
    /// dedicated watch, so an incidental rebuild of the same file never
    /// double-fires them.
    pub async fn run_update(&self, changed: &Path) -> Result<()> {
        for hook in self.hooks.iter().filter(|h| h.is_global()) {
            debug!(command = %hook.command, changed = ?changed, "running global hook");
            self.run_command(&hook.command).await?;
        }
        Ok(())
    }

    /// Global hook pass after a manual full rescan.
    pub async fn run_reload(&self) -> Result<()> {
        for hook in self.hooks.iter().filter(|h| h.is_global()) {
            self.run_command(&hook.command).await?;
        }
        Ok(())
    }

    /// Run a single hook by index (driven by its dedicated watch).
    pub async fn run_hook(&self, index: usize) -> Result<()> {
        match self.hooks.get(index) {
            Some(hook) => self.run_command(&hook.command).await,
            None => {
                warn!(index, "hook index out of range; ignoring");
                Ok(())
            }
        }
    }

    /// Install the dedicated per-file watches for file-bound hooks.
    ///
    /// Trigger paths resolve against the hook working directory. Missing
    /// trigger files are reported and skipped, not fatal.
    pub fn attach_watches(&mut self, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Result<()> {
        let mut by_path: HashMap<PathBuf, Vec<usize>> = HashMap::new();
        for (index, hook) in self.hooks.iter().enumerate() {
            for file in &hook.watch_files {
                let resolved = self.resolve(file);
                let resolved = resolved.canonicalize().unwrap_or(resolved);
                by_path.entry(resolved).or_default().push(index);
            }
        }

        if by_path.is_empty() {
            return Ok(());
        }

        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if let Err(err) = event_tx.send(event) {
                        eprintln!("devmirror: failed to forward hook watch event: {err}");
                    }
                }
                Err(err) => {
                    eprintln!("devmirror: hook file watch error: {err}");
                }
            },
            Config::default(),
        )
        .context("creating hook file watcher")?;

        for path in by_path.keys() {
            match watcher.watch(path, RecursiveMode::NonRecursive) {
                Ok(()) => debug!(path = ?path, "hook trigger file watched"),
                Err(err) => warn!(
                    path = ?path,
                    error = %err,
                    "cannot watch hook trigger file; hook will not auto-rerun"
                ),
            }
        }

        // Seed content hashes so a rewrite with identical bytes (hooks
        // often rewrite their own trigger files) does not re-fire.
        let mut hashes: HashMap<PathBuf, String> = HashMap::new();
        for path in by_path.keys() {
            if let Ok(bytes) = std::fs::read(path) {
                hashes.insert(path.clone(), blake3::hash(&bytes).to_hex().to_string());
            }
        }

        let by_path = Arc::new(by_path);
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                if !matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Any
                ) {
                    continue;
                }
                for path in &event.paths {
                    let Some(indices) = by_path.get(path) else {
                        continue;
                    };

                    match tokio::fs::read(path).await {
                        Ok(bytes) => {
                            let hash = blake3::hash(&bytes).to_hex().to_string();
                            if hashes.get(path) == Some(&hash) {
                                debug!(path = ?path, "hook trigger content unchanged; skipping");
                                continue;
                            }
                            hashes.insert(path.clone(), hash);
                        }
                        Err(e) => {
                            debug!(path = ?path, error = %e, "hook trigger unreadable; skipping");
                            continue;
                        }
                    }

                    for &hook in indices {
                        if runtime_tx
                            .send(RuntimeEvent::HookFileChanged { hook })
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                }
            }
            debug!("hook watch loop ended");
        });

        self._watcher = Some(watcher);
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match &self.cwd {
            Some(cwd) => cwd.join(path),
            None => path.to_path_buf(),
        }
    }

    async fn run_command(&self, command: &str) -> Result<()> {
        info!(command = %command, "running hook");

        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(command);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(command);
            c
        };

        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        let status = cmd
            .status()
            .await
            .with_context(|| format!("spawning hook `{command}`"))?;

        if !status.success() {
            return Err(DevmirrorError::Hook {
                command: command.to_string(),
                exit_code: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }
}
