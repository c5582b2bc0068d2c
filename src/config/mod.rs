// src/config/mod.rs

pub mod loader;
pub mod model;

pub use loader::{load_transpile_config, read_tsconfig};
pub use model::{JsxMode, OutputFormat, TranspileConfig};
