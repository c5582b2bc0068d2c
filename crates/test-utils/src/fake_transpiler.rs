use std::path::Path;

use devmirror::config::TranspileConfig;
use devmirror::transpile::{Diagnostic, Transpiler};

/// Source marker that makes [`FakeTranspiler`] fail with a diagnostic,
/// for exercising error paths.
pub const FAIL_MARKER: &str = "@fail-transpile";

/// Deterministic stand-in for the real transpiler.
///
/// Strips the primitive type annotations used in test fixtures
/// (`let x: number = 1` becomes `let x = 1`); no parsing involved, so
/// tests never depend on a real toolchain's output formatting.
#[derive(Debug, Default)]
pub struct FakeTranspiler;

impl FakeTranspiler {
    pub fn new() -> Self {
        Self
    }
}

impl Transpiler for FakeTranspiler {
    fn transform(
        &self,
        source: &str,
        path: &Path,
        _config: &TranspileConfig,
    ) -> Result<String, Vec<Diagnostic>> {
        if source.contains(FAIL_MARKER) {
            return Err(vec![Diagnostic::new(format!(
                "forced failure for {}",
                path.display()
            ))]);
        }

        Ok(source
            .replace(": number", "")
            .replace(": string", "")
            .replace(": boolean", ""))
    }
}
