// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod hooks;
pub mod logging;
pub mod scan;
pub mod server;
pub mod transpile;
pub mod watch;

use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::cli::CliArgs;
use crate::context::RunContext;
use crate::engine::{Runtime, RuntimeEvent};
use crate::errors::Result;
use crate::hooks::HookRunner;
use crate::server::ServerSupervisor;
use crate::watch::WatchTree;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - tsconfig loading
/// - the initial mirror scan
/// - the hook init pass
/// - orphan reclamation + server start
/// - (optional) the watch tree, stdin control channel and signal
///   handling feeding the runtime event loop
pub async fn run(args: CliArgs) -> Result<()> {
    let transpile_config = config::load_transpile_config(&args.project)?;
    let ctx = Arc::new(RunContext::from_args(&args, transpile_config)?);

    let started = Instant::now();
    match scan::mirror(&ctx.src_root, &ctx.dest_root, &ctx).await {
        Ok(stats) => {
            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                ?stats,
                "completed scanning"
            );
        }
        Err(e) if ctx.watch_enabled => {
            // Keep the session alive: the developer can fix the problem
            // and the next change retries.
            error!(error = %e, "initial scan failed; watching anyway");
        }
        Err(e) => return Err(e),
    }

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let mut hooks = HookRunner::from_context(&ctx);
    if let Err(e) = hooks.run_init().await {
        error!(error = %e, "hook init pass failed");
    }

    let tree = if ctx.watch_enabled {
        if hooks.hooks().iter().any(|h| !h.is_global()) {
            if let Err(e) = hooks.attach_watches(rt_tx.clone()) {
                warn!(error = %e, "could not attach hook file watches");
            }
        }

        let mut tree = WatchTree::new(watch::spawn_watcher(rt_tx.clone())?);
        tree.attach(&ctx.src_root, &ctx).await?;
        Some(tree)
    } else {
        None
    };

    let mut supervisor = ServerSupervisor::from_context(&ctx);
    supervisor.reclaim_orphan().await?;

    if let Err(e) = supervisor.start().await {
        if ctx.watch_enabled {
            error!(error = %e, "server start failed");
        } else {
            return Err(e);
        }
    }

    let Some(tree) = tree else {
        // Serve-without-watch: stay attached to the child so the pid
        // record is released when it exits.
        return supervisor.wait().await;
    };

    spawn_control_listener(rt_tx.clone());
    spawn_signal_listener(rt_tx.clone());

    info!("watching for changes...");

    let runtime = Runtime::new(ctx, tree, hooks, supervisor, rt_rx);
    runtime.run().await
}

/// Line-buffered stdin control channel: an empty line, `r` or `reload`
/// triggers a full re-scan cycle.
fn spawn_control_listener(tx: mpsc::Sender<RuntimeEvent>) {
    tokio::spawn(async move {
        let stdin = tokio::io::stdin();
        let mut lines = BufReader::new(stdin).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            match line.trim() {
                "" | "r" | "reload" => {
                    if tx.send(RuntimeEvent::ReloadRequested).await.is_err() {
                        return;
                    }
                }
                other => {
                    info!(input = other, "unrecognized control input (use \"r\" to reload)");
                }
            }
        }
    });
}

/// Ctrl-C (and SIGTERM on Unix) → graceful shutdown.
fn spawn_signal_listener(tx: mpsc::Sender<RuntimeEvent>) {
    {
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        let Ok(mut term) = signal(SignalKind::terminate()) else {
            return;
        };
        term.recv().await;
        let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
    });
}
