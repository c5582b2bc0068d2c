// src/scan/scanner.rs

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Context;
use tokio::fs;
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::context::RunContext;
use crate::errors::{DevmirrorError, Result};
use crate::scan::cache;
use crate::scan::policy::{self, PolicyAction};

/// Counters for one mirror pass.
///
/// `written + copied` is the number of destination writes; a second pass
/// over an unchanged tree must report both as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Transpiled files whose output was (re)written.
    pub written: usize,
    /// Verbatim assets whose bytes were (re)copied.
    pub copied: usize,
    /// Entries whose destination was already up to date.
    pub unchanged: usize,
    /// Entries outside the build (policy skip or excluded path).
    pub skipped: usize,
    /// Files whose transpile failed; reported, siblings unaffected.
    pub failed: usize,
}

impl ScanStats {
    pub fn merge(&mut self, other: ScanStats) {
        self.written += other.written;
        self.copied += other.copied;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    pub fn writes(&self) -> usize {
        self.written + self.copied
    }
}

/// Mirror `src` into `dest`.
///
/// `src` is normally a directory; a plain file degenerates to applying
/// the policy to that one file. Unrecoverable I/O errors propagate; a
/// single file's transpile failure is reported and counted instead.
pub async fn mirror(src: &Path, dest: &Path, ctx: &Arc<RunContext>) -> Result<ScanStats> {
    let meta = fs::metadata(src)
        .await
        .with_context(|| format!("reading metadata of {:?}", src))?;

    if meta.is_dir() {
        fs::create_dir_all(dest)
            .await
            .with_context(|| format!("creating destination directory {:?}", dest))?;
        mirror_dir(src.to_path_buf(), dest.to_path_buf(), Arc::clone(ctx)).await
    } else {
        process_entry(src.to_path_buf(), dest.to_path_buf(), Arc::clone(ctx)).await
    }
}

/// Boxing indirection so the recursive call inside the spawned entry
/// task has a sized future.
fn mirror_dir_boxed(
    src: PathBuf,
    dest: PathBuf,
    ctx: Arc<RunContext>,
) -> Pin<Box<dyn Future<Output = Result<ScanStats>> + Send>> {
    Box::pin(mirror_dir(src, dest, ctx))
}

async fn mirror_dir(src: PathBuf, dest: PathBuf, ctx: Arc<RunContext>) -> Result<ScanStats> {
    let mut entries = fs::read_dir(&src)
        .await
        .with_context(|| format!("listing source directory {:?}", src))?;

    // Sibling entries fan out concurrently; destination paths are
    // disjoint so no cross-entry coordination is needed.
    let mut set: JoinSet<Result<ScanStats>> = JoinSet::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("reading entry of {:?}", src))?
    {
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());
        let ctx = Arc::clone(&ctx);
        set.spawn(async move { process_entry(src_path, dest_path, ctx).await });
    }

    let mut stats = ScanStats::default();
    while let Some(joined) = set.join_next().await {
        let result = joined.map_err(|e| anyhow::anyhow!("scan task panicked: {e}"))?;
        stats.merge(result?);
    }
    Ok(stats)
}

/// Process a single source entry (file or directory) into the mirror.
///
/// Shared by the full scan and by the watch loop when a new entry shows
/// up in a watched directory.
pub async fn process_entry(
    src_path: PathBuf,
    dest_path: PathBuf,
    ctx: Arc<RunContext>,
) -> Result<ScanStats> {
    let mut stats = ScanStats::default();

    if ctx.is_excluded(&src_path) {
        debug!(path = ?src_path, "skip (excluded)");
        stats.skipped += 1;
        return Ok(stats);
    }

    let file_name = src_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let meta = fs::metadata(&src_path)
        .await
        .with_context(|| format!("reading metadata of {:?}", src_path))?;

    if meta.is_dir() {
        if policy::is_skipped_name(&file_name) {
            debug!(path = ?src_path, "skip (directory on skip list)");
            stats.skipped += 1;
            return Ok(stats);
        }
        fs::create_dir_all(&dest_path)
            .await
            .with_context(|| format!("creating destination directory {:?}", dest_path))?;
        let sub = mirror_dir_boxed(src_path, dest_path, ctx).await?;
        stats.merge(sub);
        return Ok(stats);
    }

    if !meta.is_file() {
        debug!(path = ?src_path, "skip (not dir nor file)");
        stats.skipped += 1;
        return Ok(stats);
    }

    match policy::classify(&file_name) {
        PolicyAction::Skip => {
            debug!(path = ?src_path, "skip (no policy match)");
            stats.skipped += 1;
        }
        PolicyAction::CopyVerbatim => {
            if copy_if_changed(&src_path, &dest_path).await? {
                stats.copied += 1;
            } else {
                stats.unchanged += 1;
            }
        }
        action @ PolicyAction::Transpile { .. } => {
            let dest_path = policy::map_dest_path(&dest_path, action);
            match cache::apply(&src_path, &dest_path, &ctx.transpiler, &ctx.transpile_config)
                .await
            {
                Ok(out) => match out.outcome {
                    cache::Outcome::Written => stats.written += 1,
                    cache::Outcome::Unchanged => stats.unchanged += 1,
                },
                Err(DevmirrorError::Transpile { file, diagnostics }) => {
                    error!(
                        file = ?file,
                        diagnostics = %diagnostics.join("; "),
                        "transpile failed; continuing with siblings"
                    );
                    stats.failed += 1;
                }
                Err(other) => return Err(other),
            }
        }
    }

    Ok(stats)
}

/// Copy `src` to `dest` unless the destination already has identical
/// bytes. Returns whether a write happened.
async fn copy_if_changed(src: &Path, dest: &Path) -> Result<bool> {
    let source = fs::read(src)
        .await
        .with_context(|| format!("reading asset {:?}", src))?;

    match fs::read(dest).await {
        Ok(existing) if existing == source => {
            debug!(dest = ?dest, "asset up to date");
            return Ok(false);
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(DevmirrorError::Io(e)),
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating destination directory {:?}", parent))?;
    }
    fs::write(dest, &source)
        .await
        .with_context(|| format!("copying asset to {:?}", dest))?;
    debug!(src = ?src, dest = ?dest, "copied");
    Ok(true)
}
