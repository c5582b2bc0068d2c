// src/config/model.rs

use serde::Deserialize;

/// Options handed to the transpiler collaborator for every file.
///
/// All fields are optional; the zero value means "strip types, leave
/// everything else alone".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranspileConfig {
    /// How JSX syntax is lowered, if at all.
    pub jsx_mode: Option<JsxMode>,

    /// Factory identifier for classic-runtime JSX (e.g. `h`, `o`).
    pub jsx_factory: Option<String>,

    /// Fragment identifier for classic-runtime JSX.
    pub jsx_fragment: Option<String>,

    /// Requested module format of the output.
    ///
    /// Recognized and forwarded to the transpiler; the bundled oxc
    /// transpiler preserves ES module syntax regardless (see DESIGN.md).
    pub output_format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsxMode {
    /// Lower JSX to factory calls (classic runtime).
    Transform,
    /// Leave JSX syntax untouched.
    Preserve,
    /// Lower JSX to the automatic runtime (`jsx`/`jsxs` imports).
    Automatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    CommonJs,
    EsModule,
    Iife,
}

/// The subset of a tsconfig file devmirror cares about.
///
/// Unknown fields are ignored so real-world tsconfig files parse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tsconfig {
    #[serde(rename = "compilerOptions", default)]
    pub compiler_options: CompilerOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompilerOptions {
    #[serde(default)]
    pub jsx: Option<String>,

    #[serde(rename = "jsxFactory", default)]
    pub jsx_factory: Option<String>,

    #[serde(rename = "jsxFragmentFactory", default)]
    pub jsx_fragment_factory: Option<String>,

    #[serde(default)]
    pub module: Option<String>,
}

impl Tsconfig {
    /// Map tsconfig compiler options onto [`TranspileConfig`].
    ///
    /// Mirrors the original tool: any non-null `jsx` value other than
    /// `preserve` / the `react-jsx*` runtimes means the classic
    /// transform.
    pub fn to_transpile_config(&self) -> TranspileConfig {
        let opts = &self.compiler_options;

        let jsx_mode = opts.jsx.as_deref().map(|jsx| match jsx {
            "preserve" => JsxMode::Preserve,
            "react-jsx" | "react-jsxdev" => JsxMode::Automatic,
            _ => JsxMode::Transform,
        });

        let output_format = opts.module.as_deref().map(|m| {
            if m.eq_ignore_ascii_case("commonjs") {
                OutputFormat::CommonJs
            } else {
                OutputFormat::EsModule
            }
        });

        TranspileConfig {
            jsx_mode,
            jsx_factory: opts.jsx_factory.clone(),
            jsx_fragment: opts.jsx_fragment_factory.clone(),
            output_format,
        }
    }
}
