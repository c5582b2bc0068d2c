// src/transpile/oxc.rs

//! TypeScript/JSX transpilation on the oxc toolchain.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{JsxOptions, JsxRuntime, TransformOptions, Transformer};
use tracing::warn;

use crate::config::{JsxMode, OutputFormat, TranspileConfig};
use crate::transpile::{Diagnostic, Transpiler};

/// [`Transpiler`] backed by oxc: parse, strip types, lower JSX per the
/// project config, and regenerate source text.
#[derive(Debug, Default)]
pub struct OxcTranspiler {
    warned_format: AtomicBool,
}

impl OxcTranspiler {
    pub fn new() -> Self {
        Self::default()
    }

    fn transform_options(&self, config: &TranspileConfig) -> TransformOptions {
        let mut options = TransformOptions::default();

        let mut jsx = JsxOptions::default();
        match config.jsx_mode {
            Some(JsxMode::Preserve) => jsx.jsx_plugin = false,
            Some(JsxMode::Automatic) => jsx.runtime = JsxRuntime::Automatic,
            Some(JsxMode::Transform) | None => jsx.runtime = JsxRuntime::Classic,
        }
        jsx.pragma = config.jsx_factory.clone();
        jsx.pragma_frag = config.jsx_fragment.clone();
        options.jsx = jsx;

        // Module-format lowering is a bundler concern; oxc emits the
        // module syntax it was given. Surface the mismatch once.
        if matches!(
            config.output_format,
            Some(OutputFormat::CommonJs | OutputFormat::Iife)
        ) && !self.warned_format.swap(true, Ordering::Relaxed)
        {
            warn!(
                format = ?config.output_format,
                "requested output format is not lowered by the oxc transpiler; \
                 ES module syntax is preserved"
            );
        }

        options
    }
}

impl Transpiler for OxcTranspiler {
    fn transform(
        &self,
        source: &str,
        path: &Path,
        config: &TranspileConfig,
    ) -> Result<String, Vec<Diagnostic>> {
        let allocator = Allocator::default();

        let source_type = SourceType::from_path(path).unwrap_or_else(|_| SourceType::ts());

        let parsed = Parser::new(&allocator, source, source_type).parse();
        if !parsed.errors.is_empty() {
            return Err(parsed
                .errors
                .iter()
                .map(|e| Diagnostic::new(format!("{e:?}")))
                .collect());
        }

        let mut program = parsed.program;
        let scoping = SemanticBuilder::new()
            .build(&program)
            .semantic
            .into_scoping();

        let options = self.transform_options(config);
        let transformed =
            Transformer::new(&allocator, path, &options).build_with_scoping(scoping, &mut program);
        if !transformed.errors.is_empty() {
            return Err(transformed
                .errors
                .iter()
                .map(|e| Diagnostic::new(format!("{e:?}")))
                .collect());
        }

        Ok(Codegen::new().build(&program).code)
    }
}
