// src/context.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::cli::CliArgs;
use crate::config::TranspileConfig;
use crate::errors::Result;
use crate::hooks::{parse_hook, Hook};
use crate::transpile::{OxcTranspiler, Transpiler};

/// Process-wide run context, created once per invocation.
///
/// Mutable run state (watch bookkeeping, the supervised child) lives
/// with its single owner in the engine; this struct is the immutable
/// part shared across spawned tasks.
pub struct RunContext {
    pub src_root: PathBuf,
    pub dest_root: PathBuf,
    pub watch_enabled: bool,

    /// Absolute paths never scanned. Always contains `dest_root`, so a
    /// destination nested inside the source tree cannot mirror into
    /// itself.
    pub exclude_paths: HashSet<PathBuf>,

    pub hooks: Vec<Hook>,
    pub transpile_config: TranspileConfig,
    pub transpiler: Arc<dyn Transpiler>,

    pub server_file: Option<PathBuf>,
    pub cwd: Option<PathBuf>,
    pub open_url: Option<String>,
}

impl RunContext {
    pub fn from_args(args: &CliArgs, transpile_config: TranspileConfig) -> Result<Self> {
        let src_root = absolutize(&args.src)
            .with_context(|| format!("resolving --src {:?}", args.src))?;
        let dest_root = absolutize(&args.dest)
            .with_context(|| format!("resolving --dest {:?}", args.dest))?;

        let mut exclude_paths: HashSet<PathBuf> = args
            .exclude
            .iter()
            .map(|p| absolutize(p).unwrap_or_else(|_| p.clone()))
            .collect();
        exclude_paths.insert(dest_root.clone());

        let hooks = args.post_hook.iter().map(|raw| parse_hook(raw)).collect();

        Ok(Self {
            src_root,
            dest_root,
            watch_enabled: args.watch,
            exclude_paths,
            hooks,
            transpile_config,
            transpiler: Arc::new(OxcTranspiler::new()),
            server_file: args.serve.clone(),
            cwd: args.cwd.clone(),
            open_url: args.open.clone(),
        })
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclude_paths.contains(path)
    }
}

/// Resolve a path to an absolute, symlink-free form where possible.
///
/// Falls back to joining onto the current directory when the path does
/// not exist yet (the destination root typically doesn't).
fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    match path.canonicalize() {
        Ok(p) => Ok(p),
        Err(_) => {
            let joined = if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()?.join(path)
            };
            Ok(normalize_components(&joined))
        }
    }
}

/// Drop `.` components and resolve `..` lexically.
fn normalize_components(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
