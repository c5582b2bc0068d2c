// src/transpile/mod.rs

//! The source-to-output transformation boundary.
//!
//! The engine never parses TypeScript itself; it hands source text plus
//! a path hint and the project's [`TranspileConfig`] to a [`Transpiler`]
//! and gets transformed text or a diagnostic list back. The bundled
//! implementation is [`OxcTranspiler`]; tests substitute their own.

pub mod oxc;

use std::path::Path;

use crate::config::TranspileConfig;

pub use oxc::OxcTranspiler;

/// A single problem reported by a transpiler.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Pluggable source transformer.
///
/// Implementations must be cheap to call repeatedly; the engine invokes
/// `transform` once per changed file per event.
pub trait Transpiler: Send + Sync {
    /// Transform `source` (read from `path`) into runnable output text.
    ///
    /// Fails with the full diagnostic list on syntax or transform
    /// errors; a failed transform must not have side effects.
    fn transform(
        &self,
        source: &str,
        path: &Path,
        config: &TranspileConfig,
    ) -> Result<String, Vec<Diagnostic>>;
}
