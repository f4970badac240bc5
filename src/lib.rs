//! Command-line side of dotmark: the compiler configuration and the pipeline driving a document
//! through parsing, expansion, the tree pass and rendering.

pub mod config;
pub mod pipeline;

pub use config::{CompilerConfig, ErrorHandling, CONFIG_FILE};
pub use pipeline::{error_exit_code, exit_code, Compiled, Pipeline, PipelineError};
