use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use devmirror::config::TranspileConfig;
use devmirror::context::RunContext;
use devmirror::hooks::parse_hook;
use devmirror::transpile::Transpiler;

use crate::fake_transpiler::FakeTranspiler;

/// A temporary project layout for mirror/watch tests.
///
/// `src/` is created immediately; `dist/` is left to the scanner (it is
/// expected to create the destination root itself).
pub struct TempProject {
    root: TempDir,
    pub src: PathBuf,
    pub dest: PathBuf,
}

impl TempProject {
    pub fn new() -> Self {
        let root = TempDir::new().expect("create temp dir");
        // Canonicalize so paths match what file watchers report
        // (macOS tempdirs live behind a /var symlink).
        let base = root.path().canonicalize().expect("canonicalize temp dir");
        let src = base.join("src");
        let dest = base.join("dist");
        fs::create_dir_all(&src).expect("create src dir");
        Self { root, src, dest }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Write a file under `src/`, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.src.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, content).expect("write source file");
        path
    }

    /// Remove a file or directory tree under `src/`.
    pub fn remove(&self, rel: &str) {
        let path = self.src.join(rel);
        if path.is_dir() {
            fs::remove_dir_all(&path).expect("remove source dir");
        } else {
            fs::remove_file(&path).expect("remove source file");
        }
    }

    pub fn read_dest(&self, rel: &str) -> Option<String> {
        fs::read_to_string(self.dest.join(rel)).ok()
    }

    pub fn dest_exists(&self, rel: &str) -> bool {
        self.dest.join(rel).exists()
    }

    /// Start building a [`RunContext`] rooted at this project.
    pub fn ctx(&self) -> ContextBuilder {
        ContextBuilder {
            src_root: self.src.clone(),
            dest_root: self.dest.clone(),
            watch_enabled: false,
            excludes: Vec::new(),
            hooks: Vec::new(),
            transpiler: Arc::new(FakeTranspiler::new()),
        }
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ContextBuilder {
    src_root: PathBuf,
    dest_root: PathBuf,
    watch_enabled: bool,
    excludes: Vec<PathBuf>,
    hooks: Vec<String>,
    transpiler: Arc<dyn Transpiler>,
}

impl ContextBuilder {
    pub fn watch(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    /// Exclude a path relative to the source root.
    pub fn exclude(mut self, rel: &str) -> Self {
        self.excludes.push(self.src_root.join(rel));
        self
    }

    /// Mirror into a destination nested inside the source tree.
    pub fn dest_inside_src(mut self, rel: &str) -> Self {
        self.dest_root = self.src_root.join(rel);
        self
    }

    pub fn hook(mut self, raw: &str) -> Self {
        self.hooks.push(raw.to_string());
        self
    }

    pub fn transpiler(mut self, transpiler: Arc<dyn Transpiler>) -> Self {
        self.transpiler = transpiler;
        self
    }

    pub fn build(self) -> Arc<RunContext> {
        let mut exclude_paths: HashSet<PathBuf> = self.excludes.into_iter().collect();
        exclude_paths.insert(self.dest_root.clone());

        Arc::new(RunContext {
            src_root: self.src_root,
            dest_root: self.dest_root,
            watch_enabled: self.watch_enabled,
            exclude_paths,
            hooks: self.hooks.iter().map(|raw| parse_hook(raw)).collect(),
            transpile_config: TranspileConfig::default(),
            transpiler: self.transpiler,
            server_file: None,
            cwd: None,
            open_url: None,
        })
    }
}
