// src/scan/cache.rs

use std::path::Path;
use std::sync::{Arc, LazyLock};

use anyhow::Context;
use regex::Regex;
use tokio::fs;
use tracing::debug;

use crate::config::TranspileConfig;
use crate::errors::{DevmirrorError, Result};
use crate::transpile::Transpiler;

/// Result of one idempotent transpile-and-write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Written,
    Unchanged,
}

/// Outcome plus the data the watch loop caches per file.
#[derive(Debug)]
pub struct TranspileOutput {
    pub outcome: Outcome,
    /// blake3 of the source text, used to suppress no-op file events.
    pub source_hash: String,
}

/// Tool-emitted annotations with no runtime meaning, stripped before the
/// destination comparison so they never force a rewrite.
static PURE_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\*\s*[@#]__PURE__\s*\*/\s?").expect("static regex"));

/// Transpile `src` and write the result to `dest` only if the normalized
/// output differs from what is already there.
///
/// A missing destination counts as different and forces the write. The
/// raw transpiler output is what lands on disk; normalization is only
/// for the comparison.
pub async fn apply(
    src: &Path,
    dest: &Path,
    transpiler: &Arc<dyn Transpiler>,
    config: &TranspileConfig,
) -> Result<TranspileOutput> {
    let source = fs::read_to_string(src)
        .await
        .with_context(|| format!("reading source file {:?}", src))?;
    let source_hash = blake3::hash(source.as_bytes()).to_hex().to_string();

    let output = {
        let transpiler = Arc::clone(transpiler);
        let config = config.clone();
        let path = src.to_path_buf();
        tokio::task::spawn_blocking(move || transpiler.transform(&source, &path, &config))
            .await
            .map_err(|e| anyhow::anyhow!("transpile task panicked: {e}"))?
    };

    let output = match output {
        Ok(text) => text,
        Err(diagnostics) => {
            return Err(DevmirrorError::Transpile {
                file: src.to_path_buf(),
                diagnostics: diagnostics.iter().map(|d| d.to_string()).collect(),
            });
        }
    };

    let normalized = normalize(&output);

    match fs::read_to_string(dest).await {
        Ok(existing) => {
            if normalize(&existing).trim() == normalized.trim() {
                debug!(dest = ?dest, "destination up to date");
                return Ok(TranspileOutput {
                    outcome: Outcome::Unchanged,
                    source_hash,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(DevmirrorError::Io(e));
        }
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating destination directory {:?}", parent))?;
    }
    fs::write(dest, &output)
        .await
        .with_context(|| format!("writing destination file {:?}", dest))?;
    debug!(src = ?src, dest = ?dest, "transpiled");

    Ok(TranspileOutput {
        outcome: Outcome::Written,
        source_hash,
    })
}

fn normalize(text: &str) -> String {
    PURE_ANNOTATION.replace_all(text, "").into_owned()
}
