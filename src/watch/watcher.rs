// src/watch/watcher.rs

use anyhow::{Context as _, Result};
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, Watcher};
use tokio::sync::mpsc;
use tracing::debug;

use crate::engine::RuntimeEvent;

/// Create the build-tree watcher and spawn the bridge task that
/// translates notify events into engine events.
///
/// The returned watcher carries no registrations yet; [`super::tree::WatchTree`]
/// adds and removes them as the tree changes. Dropping the watcher stops
/// all watching.
///
/// Translation rules:
/// - data modifications on a path become [`RuntimeEvent::SourceChanged`]
///   (the engine ignores paths it does not track);
/// - create/remove/rename kinds become [`RuntimeEvent::EntryRenamed`]
///   addressed to the parent directory, resolved there by listing diff.
pub fn spawn_watcher(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Result<RecommendedWatcher> {
    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if let Err(err) = event_tx.send(event) {
                        // We can't log via tracing here easily, so fallback to stderr.
                        eprintln!("devmirror: failed to forward notify event: {err}");
                    }
                }
                Err(err) => {
                    eprintln!("devmirror: file watch error: {err}");
                }
            }
        },
        Config::default(),
    )
    .context("creating filesystem watcher")?;

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!("received notify event: {:?}", event);

            for path in &event.paths {
                let engine_event = match event.kind {
                    EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
                        Some(RuntimeEvent::SourceChanged { path: path.clone() })
                    }
                    EventKind::Create(_)
                    | EventKind::Remove(_)
                    | EventKind::Modify(ModifyKind::Name(_)) => {
                        match (path.parent(), path.file_name()) {
                            (Some(dir), Some(name)) => Some(RuntimeEvent::EntryRenamed {
                                dir: dir.to_path_buf(),
                                name: name.to_os_string(),
                            }),
                            _ => None,
                        }
                    }
                    _ => None,
                };

                let Some(engine_event) = engine_event else {
                    continue;
                };
                if runtime_tx.send(engine_event).await.is_err() {
                    // Runtime channel closed; nothing left to deliver to.
                    return;
                }
            }
        }

        debug!("file watcher bridge ended");
    });

    Ok(watcher)
}
