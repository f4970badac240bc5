//! Front end of the dotmark compiler: a regex-driven lexer, the function-call walker and the
//! parser producing the closed [ast::Node] tree.
pub mod ast;
mod common;
mod flavor;
pub mod lexer;
pub mod parser;
pub mod walker;

pub use common::*;
pub use flavor::Flavor;
pub use parser::{
    parse, parse_blocks, parse_expression, parse_inline, ParseContext, ParseError,
    RecordingContext,
};
