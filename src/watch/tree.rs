// src/watch/tree.rs

use std::collections::{BTreeMap, HashMap};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::fs;
use tracing::{debug, warn};

use crate::context::RunContext;
use crate::errors::Result;
use crate::scan::{self, cache, policy, Outcome};

/// Live watch bookkeeping for the mirrored source tree.
///
/// Every directory gets a non-recursive watch plus a last-known child
/// listing; every transpile-eligible file gets its own watch plus a
/// transpile unit. The listing is what disambiguates the platform's
/// create-or-delete "rename" events.
pub struct WatchTree {
    watcher: RecommendedWatcher,
    root: Option<PathBuf>,
    dirs: HashMap<PathBuf, DirectoryNode>,
    files: HashMap<PathBuf, TranspileUnit>,
}

/// Last-known listing of one watched directory.
///
/// Kinds matter only for teardown: `Dir` and `Watched` children carry
/// OS watch handles that must be closed before the parent's.
#[derive(Debug, Default)]
struct DirectoryNode {
    listing: BTreeMap<OsString, EntryKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    /// Transpile-eligible file with its own watch.
    Watched,
    /// Present in the directory but carries no watch of its own.
    Untracked,
}

/// Per-watched-file state for suppressing no-op rebuild cycles.
#[derive(Debug)]
struct TranspileUnit {
    dest: PathBuf,
    last_source_hash: Option<String>,
}

/// What a directory-level rename event turned out to mean.
#[derive(Debug)]
pub enum RenameAction {
    /// New entry: mirrored, watch attached; hooks should run.
    Created(PathBuf),
    /// Entry gone: its watches are closed. Generated output is left in
    /// place (stale-output retention, see DESIGN.md).
    Removed(PathBuf),
    /// Existing tracked file was replaced in place (atomic save).
    Changed {
        path: PathBuf,
        outcome: Option<Outcome>,
    },
    Ignored,
}

impl WatchTree {
    pub fn new(watcher: RecommendedWatcher) -> Self {
        Self {
            watcher,
            root: None,
            dirs: HashMap::new(),
            files: HashMap::new(),
        }
    }

    pub fn watched_dirs(&self) -> usize {
        self.dirs.len()
    }

    pub fn watched_files(&self) -> usize {
        self.files.len()
    }

    /// Attach watches to `root` and, transitively, to every non-excluded
    /// subdirectory and transpile-eligible file.
    ///
    /// A file root degenerates to a single file watch.
    pub async fn attach(&mut self, root: &Path, ctx: &Arc<RunContext>) -> Result<()> {
        self.root = Some(root.to_path_buf());

        let meta = fs::metadata(root)
            .await
            .with_context(|| format!("reading metadata of watch root {:?}", root))?;
        if meta.is_file() {
            self.watch_file(root, ctx);
            return Ok(());
        }

        self.attach_walk(root, ctx).await?;

        debug!(
            dirs = self.dirs.len(),
            files = self.files.len(),
            "watch tree attached"
        );
        Ok(())
    }

    /// Walk a directory, registering watches and listings for it and
    /// every non-excluded descendant.
    async fn attach_walk(&mut self, root: &Path, ctx: &Arc<RunContext>) -> Result<()> {
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let mut listing = BTreeMap::new();

            let mut entries = fs::read_dir(&dir)
                .await
                .with_context(|| format!("listing watched directory {:?}", dir))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .with_context(|| format!("reading entry of {:?}", dir))?
            {
                let path = entry.path();
                if ctx.is_excluded(&path) {
                    continue;
                }

                let file_type = entry.file_type().await?;
                let name = entry.file_name();

                if file_type.is_dir() {
                    if policy::is_skipped_name(&name.to_string_lossy()) {
                        continue;
                    }
                    listing.insert(name, EntryKind::Dir);
                    pending.push(path);
                } else if file_type.is_file() {
                    let kind = if self.watch_file(&path, ctx) {
                        EntryKind::Watched
                    } else {
                        EntryKind::Untracked
                    };
                    listing.insert(name, kind);
                } else {
                    listing.insert(name, EntryKind::Untracked);
                }
            }

            if let Err(err) = self.watcher.watch(&dir, RecursiveMode::NonRecursive) {
                warn!(dir = ?dir, error = %err, "cannot watch directory");
            }
            self.dirs.insert(dir, DirectoryNode { listing });
        }

        Ok(())
    }

    /// Re-process a watched file after a content-change event.
    ///
    /// Returns `None` for paths the tree does not track or files that
    /// vanished mid-event (in-flight I/O on a deleted file is "file
    /// gone", never an error). `Some(Unchanged)` means the event was a
    /// no-op and downstream hooks/restarts must be suppressed.
    pub async fn process_change(
        &mut self,
        path: &Path,
        ctx: &Arc<RunContext>,
    ) -> Result<Option<Outcome>> {
        let Some(unit) = self.files.get(path) else {
            return Ok(None);
        };
        let dest = unit.dest.clone();

        let source = match fs::read_to_string(path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?path, "file gone mid-event");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let source_hash = blake3::hash(source.as_bytes()).to_hex().to_string();
        if self
            .files
            .get(path)
            .and_then(|u| u.last_source_hash.as_deref())
            == Some(source_hash.as_str())
        {
            debug!(path = ?path, "source content unchanged; suppressing rebuild");
            return Ok(Some(Outcome::Unchanged));
        }

        let out = cache::apply(path, &dest, &ctx.transpiler, &ctx.transpile_config).await?;
        if let Some(unit) = self.files.get_mut(path) {
            unit.last_source_hash = Some(out.source_hash);
        }
        Ok(Some(out.outcome))
    }

    /// Resolve an ambiguous rename event on a watched directory.
    ///
    /// The platform does not say whether `name` was created or deleted;
    /// the last-known listing plus a disk probe does:
    /// - known and gone from disk: removal. Close its watches
    ///   (descendants first) and drop it from the listing.
    /// - unknown and present on disk: creation. Mirror just that entry,
    ///   attach watches if eligible, record it in the listing.
    /// - known and still present: an in-place replace of a tracked file
    ///   (editor atomic save). Take the content-change path.
    pub async fn process_rename(
        &mut self,
        dir: &Path,
        name: &OsStr,
        ctx: &Arc<RunContext>,
    ) -> Result<RenameAction> {
        if !self.dirs.contains_key(dir) {
            return Ok(RenameAction::Ignored);
        }

        let path = dir.join(name);
        if ctx.is_excluded(&path) {
            return Ok(RenameAction::Ignored);
        }

        let known = self
            .dirs
            .get(dir)
            .map(|node| node.listing.contains_key(name))
            .unwrap_or(false);
        let on_disk = fs::symlink_metadata(&path).await.is_ok();

        match (known, on_disk) {
            (true, false) => {
                self.close_subtree(&path);
                if let Some(node) = self.dirs.get_mut(dir) {
                    node.listing.remove(name);
                }
                debug!(path = ?path, "entry removed; watches closed");
                Ok(RenameAction::Removed(path))
            }
            (false, true) => {
                let dest = self.dest_for(&path, ctx);
                let stats =
                    scan::process_entry(path.clone(), dest, Arc::clone(ctx)).await?;
                debug!(path = ?path, ?stats, "new entry mirrored");

                let meta = fs::metadata(&path)
                    .await
                    .with_context(|| format!("reading metadata of new entry {:?}", path))?;
                let kind = if meta.is_dir() {
                    self.attach_walk(&path, ctx).await?;
                    EntryKind::Dir
                } else if meta.is_file() && self.watch_file(&path, ctx) {
                    EntryKind::Watched
                } else {
                    EntryKind::Untracked
                };

                if let Some(node) = self.dirs.get_mut(dir) {
                    node.listing.insert(name.to_os_string(), kind);
                }
                Ok(RenameAction::Created(path))
            }
            (true, true) => {
                if self.files.contains_key(&path) {
                    let outcome = self.process_change(&path, ctx).await?;
                    Ok(RenameAction::Changed { path, outcome })
                } else {
                    Ok(RenameAction::Ignored)
                }
            }
            (false, false) => Ok(RenameAction::Ignored),
        }
    }

    /// Close every watch in the tree.
    pub fn close_all(&mut self) {
        if let Some(root) = self.root.take() {
            self.close_subtree(&root);
        }
        // Anything left over (shouldn't happen) is cleared as well.
        let stray_dirs: Vec<PathBuf> = self.dirs.keys().cloned().collect();
        for dir in stray_dirs {
            self.close_subtree(&dir);
        }
        let stray_files: Vec<PathBuf> = self.files.keys().cloned().collect();
        for file in stray_files {
            self.close_subtree(&file);
        }
    }

    /// Recursively close watches under `path`, descendants before the
    /// node itself, so no dangling watch outlives its parent's removal.
    fn close_subtree(&mut self, path: &Path) {
        if let Some(node) = self.dirs.remove(path) {
            for (name, _) in node.listing {
                self.close_subtree(&path.join(name));
            }
            if let Err(err) = self.watcher.unwatch(path) {
                debug!(path = ?path, error = %err, "unwatch failed (already gone?)");
            }
        } else if self.files.remove(path).is_some() {
            if let Err(err) = self.watcher.unwatch(path) {
                debug!(path = ?path, error = %err, "unwatch failed (already gone?)");
            }
        }
    }

    /// Register a per-file watch if the file is transpile-eligible.
    /// Returns whether a watch and unit now exist for it.
    fn watch_file(&mut self, path: &Path, ctx: &Arc<RunContext>) -> bool {
        let file_name = match path.file_name() {
            Some(n) => n.to_string_lossy().into_owned(),
            None => return false,
        };
        if !policy::is_watch_eligible(&file_name) {
            return false;
        }

        if let Err(err) = self.watcher.watch(path, RecursiveMode::NonRecursive) {
            warn!(path = ?path, error = %err, "cannot watch file");
            return false;
        }

        let dest = self.dest_for(path, ctx);
        let dest = policy::map_dest_path(&dest, policy::classify(&file_name));
        self.files.insert(
            path.to_path_buf(),
            TranspileUnit {
                dest,
                last_source_hash: None,
            },
        );
        true
    }

    /// Map a source path to its (extension-unmapped) destination path.
    fn dest_for(&self, src_path: &Path, ctx: &Arc<RunContext>) -> PathBuf {
        match src_path.strip_prefix(&ctx.src_root) {
            Ok(rel) if rel.as_os_str().is_empty() => ctx.dest_root.clone(),
            Ok(rel) => ctx.dest_root.join(rel),
            Err(_) => ctx.dest_root.join(src_path.file_name().unwrap_or_default()),
        }
    }
}
