// src/scan/policy.rs

use std::path::{Path, PathBuf};

/// What the scanner does with a single file entry.
///
/// Directories are never classified; they always recurse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyAction {
    /// Not part of the build output (VCS metadata, lockfiles, logs,
    /// certs, media, binary databases, unknown extensions).
    Skip,
    /// Already-runnable asset, copied byte for byte.
    CopyVerbatim,
    /// Build source; destination extension is rewritten.
    Transpile { dest_ext: &'static str },
}

/// Entry names skipped outright, wherever they appear.
const SKIP_NAMES: &[&str] = &[
    "node_modules",
    ".git",
    ".svn",
    ".hg",
    ".DS_Store",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
];

/// Extensions of non-buildable assets.
const SKIP_EXTENSIONS: &[&str] = &[
    "log", "lock", "pem", "key", "crt", "csr", "sqlite", "sqlite3", "db", "mp3", "mp4", "mov",
    "avi", "zip", "gz", "tar",
];

/// Extensions copied verbatim into the mirror.
const COPY_EXTENSIONS: &[&str] = &[
    "js", "mjs", "cjs", "html", "htm", "css", "json", "md", "txt", "svg", "ico", "png", "jpg",
    "jpeg", "gif", "webp", "woff", "woff2",
];

/// Whether an entry name is on the fixed skip list.
///
/// Applies to directories too: node_modules and VCS metadata trees are
/// neither mirrored nor watched.
pub fn is_skipped_name(name: &str) -> bool {
    SKIP_NAMES.contains(&name)
}

/// Decide what to do with a file entry by name.
pub fn classify(file_name: &str) -> PolicyAction {
    if SKIP_NAMES.contains(&file_name) {
        return PolicyAction::Skip;
    }

    // Declaration files carry no runtime code.
    if file_name.ends_with(".d.ts") {
        return PolicyAction::Skip;
    }

    let ext = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext,
        _ => return PolicyAction::Skip,
    };

    match ext {
        "ts" | "tsx" => PolicyAction::Transpile { dest_ext: "js" },
        "mts" => PolicyAction::Transpile { dest_ext: "mjs" },
        "cts" => PolicyAction::Transpile { dest_ext: "cjs" },
        _ if COPY_EXTENSIONS.contains(&ext) => PolicyAction::CopyVerbatim,
        _ if SKIP_EXTENSIONS.contains(&ext) => PolicyAction::Skip,
        _ => PolicyAction::Skip,
    }
}

/// Rewrite the destination path's extension for a transpiled entry;
/// other actions keep the mapped path as-is.
pub fn map_dest_path(dest: &Path, action: PolicyAction) -> PathBuf {
    match action {
        PolicyAction::Transpile { dest_ext } => dest.with_extension(dest_ext),
        _ => dest.to_path_buf(),
    }
}

/// Whether a live watch is installed for this file while watching.
pub fn is_watch_eligible(file_name: &str) -> bool {
    matches!(classify(file_name), PolicyAction::Transpile { .. })
}
