//! dotmark compiles Markdown documents extended with function calls. This crate holds the
//! evaluation side: the compilation [context::Context], function libraries and the expansion
//! engine running calls until none are left, followed by the tree pass and renderers.

/// The pass over the expanded tree: page breaks, heading identifiers, the table of contents
/// and references.
pub mod collect;

/// Compilation state shared by every call of a document and its forks.
pub mod context;

/// Error kinds produced while expanding documents.
pub mod error;

/// Binding and execution of function calls, round after round.
pub mod expansion;

pub mod function;

/// Strategies for calls that fail to expand.
pub mod handler;

pub mod lambda;
pub mod library;
pub mod locale;
pub mod media;

/// Numbering formats for headings and other numbered elements.
pub mod numbering;

/// Output formats. Only plain text is built in.
pub mod render;

/// Functions available to every document.
pub mod stdlib;

pub mod toc;
pub mod value;

pub use context::{Context, ContextOptions, DocumentInfo, DocumentType};
pub use error::{Error, ErrorKind};
pub use expansion::expand;
pub use handler::{ErrorHandler, LogErrorHandler, StrictErrorHandler};
pub use value::{Value, ValueType};
