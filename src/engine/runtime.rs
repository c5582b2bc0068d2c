// src/engine/runtime.rs

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::context::RunContext;
use crate::errors::{DevmirrorError, Result};
use crate::hooks::HookRunner;
use crate::scan::{self, Outcome};
use crate::server::ServerSupervisor;
use crate::watch::{RenameAction, WatchTree};

/// Events sent into the runtime from watchers, the control channel, and
/// signal handlers.
///
/// The idea is that:
/// - the build-tree watcher sends `SourceChanged` / `EntryRenamed`
/// - dedicated hook watches send `HookFileChanged`
/// - the stdin listener sends `ReloadRequested`
/// - Ctrl-C / SIGTERM handling sends `ShutdownRequested`
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    SourceChanged { path: PathBuf },
    EntryRenamed { dir: PathBuf, name: OsString },
    HookFileChanged { hook: usize },
    ReloadRequested,
    ShutdownRequested,
}

/// The main orchestration runtime.
///
/// A single consumer loop over one event channel: every
/// rebuild → hooks → restart sequence runs to completion before the
/// next event is taken, so two rapid edits can never race two server
/// starts.
pub struct Runtime {
    ctx: Arc<RunContext>,
    tree: WatchTree,
    hooks: HookRunner,
    supervisor: ServerSupervisor,
    events_rx: mpsc::Receiver<RuntimeEvent>,
}

impl Runtime {
    pub fn new(
        ctx: Arc<RunContext>,
        tree: WatchTree,
        hooks: HookRunner,
        supervisor: ServerSupervisor,
        events_rx: mpsc::Receiver<RuntimeEvent>,
    ) -> Self {
        Self {
            ctx,
            tree,
            hooks,
            supervisor,
            events_rx,
        }
    }

    /// Main event loop. Returns when a shutdown is requested or every
    /// event producer has gone away.
    pub async fn run(mut self) -> Result<()> {
        info!("devmirror runtime started");

        while let Some(event) = self.events_rx.recv().await {
            debug!(?event, "runtime received event");

            let keep_running = match event {
                RuntimeEvent::SourceChanged { path } => self.handle_source_changed(path).await,
                RuntimeEvent::EntryRenamed { dir, name } => {
                    self.handle_entry_renamed(dir, name).await
                }
                RuntimeEvent::HookFileChanged { hook } => self.handle_hook_file(hook).await,
                RuntimeEvent::ReloadRequested => self.handle_reload().await,
                RuntimeEvent::ShutdownRequested => {
                    info!("shutdown requested, stopping runtime");
                    self.shutdown().await;
                    false
                }
            };

            if !keep_running {
                break;
            }
        }

        info!("devmirror runtime exiting");
        Ok(())
    }

    /// Content change on a watched file: re-transpile, and only when the
    /// output actually changed run hooks and restart the server.
    async fn handle_source_changed(&mut self, path: PathBuf) -> bool {
        match self.tree.process_change(&path, &self.ctx).await {
            Ok(Some(Outcome::Written)) => {
                info!(path = ?path, "rebuilt");
                self.after_build_update(&path).await;
            }
            Ok(Some(Outcome::Unchanged)) => {
                debug!(path = ?path, "no output change; skipping hooks and restart");
            }
            Ok(None) => {}
            Err(DevmirrorError::Transpile { file, diagnostics }) => {
                error!(
                    file = ?file,
                    diagnostics = %diagnostics.join("; "),
                    "transpile failed; keeping previous output"
                );
            }
            Err(e) => {
                error!(path = ?path, error = %e, "failed to process change");
            }
        }
        true
    }

    /// Ambiguous create/delete in a watched directory, resolved by the
    /// tree's listing diff.
    async fn handle_entry_renamed(&mut self, dir: PathBuf, name: OsString) -> bool {
        match self.tree.process_rename(&dir, &name, &self.ctx).await {
            Ok(RenameAction::Created(path)) => {
                info!(path = ?path, "new entry mirrored");
                if let Err(e) = self.hooks.run_update(&path).await {
                    error!(error = %e, "hook run failed");
                }
            }
            Ok(RenameAction::Removed(path)) => {
                debug!(path = ?path, "entry removed");
            }
            Ok(RenameAction::Changed {
                path,
                outcome: Some(Outcome::Written),
            }) => {
                info!(path = ?path, "rebuilt");
                self.after_build_update(&path).await;
            }
            Ok(RenameAction::Changed { .. }) | Ok(RenameAction::Ignored) => {}
            Err(DevmirrorError::Transpile { file, diagnostics }) => {
                error!(
                    file = ?file,
                    diagnostics = %diagnostics.join("; "),
                    "transpile failed; keeping previous output"
                );
            }
            Err(e) => {
                error!(dir = ?dir, error = %e, "failed to process rename event");
            }
        }
        true
    }

    async fn handle_hook_file(&mut self, hook: usize) -> bool {
        if let Err(e) = self.hooks.run_hook(hook).await {
            error!(error = %e, "file-bound hook failed");
        }
        true
    }

    /// Full re-scan cycle: tear down watches, stop the server, rescan,
    /// re-run global hooks, re-attach, restart.
    async fn handle_reload(&mut self) -> bool {
        info!("reload requested; rescanning");

        self.tree.close_all();
        if let Err(e) = self.supervisor.stop().await {
            error!(error = %e, "failed to stop server for reload");
        }

        match scan::mirror(&self.ctx.src_root, &self.ctx.dest_root, &self.ctx).await {
            Ok(stats) => info!(?stats, "rescan complete"),
            Err(e) => error!(error = %e, "rescan failed"),
        }

        if let Err(e) = self.hooks.run_reload().await {
            error!(error = %e, "hook run failed");
        }

        let src_root = self.ctx.src_root.clone();
        if let Err(e) = self.tree.attach(&src_root, &self.ctx).await {
            error!(error = %e, "failed to re-attach watches");
        }

        if let Err(e) = self.supervisor.start().await {
            error!(error = %e, "failed to restart server after reload");
        }

        true
    }

    async fn after_build_update(&mut self, path: &Path) {
        if let Err(e) = self.hooks.run_update(path).await {
            error!(error = %e, "hook run failed");
        }
        if let Err(e) = self.supervisor.restart().await {
            error!(error = %e, "server restart failed");
        }
    }

    async fn shutdown(&mut self) {
        if let Err(e) = self.supervisor.stop().await {
            error!(error = %e, "failed to stop server on shutdown");
        }
        self.tree.close_all();
    }
}
