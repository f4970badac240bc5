use super::Node;
use crate::common::Span;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Identifies a call node across expansion rounds. Ids are unique within one compilation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallId(pub u64);

impl Display for CallId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Progress of a call node through expansion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallState {
    #[default]
    Pending,
    Resolving,
    Executing,
    Expanded,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallNode {
    pub id: CallId,
    pub name: String,
    pub arguments: Vec<Argument>,
    pub is_block: bool,
    pub span: Span,
    pub state: CallState,
    pub children: Vec<Node>,
}

impl FunctionCallNode {
    pub fn body(&self) -> Option<&Argument> {
        self.arguments.last().filter(|a| a.is_body)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Expression,
    /// Body arguments hold the raw indented block following a call.
    pub is_body: bool,
}

impl Argument {
    pub fn positional(value: Expression) -> Self {
        Argument {
            name: None,
            value,
            is_body: false,
        }
    }

    pub fn named(name: impl Into<String>, value: Expression) -> Self {
        Argument {
            name: Some(name.into()),
            value,
            is_body: false,
        }
    }

    pub fn body(text: impl Into<String>) -> Self {
        Argument {
            name: None,
            value: Expression::Dynamic(text.into()),
            is_body: true,
        }
    }
}

/// A call appearing inside an argument. It isn't a tree node: it's evaluated directly when the
/// enclosing argument is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UncheckedCall {
    pub name: String,
    pub arguments: Vec<Argument>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Raw text whose type is decided by the parameter it binds to.
    Dynamic(String),
    Call(UncheckedCall),
    /// Text and calls to be evaluated and joined in order.
    Composed(Vec<Expression>),
}

impl Expression {
    /// The raw text of a dynamic expression.
    pub fn as_dynamic(&self) -> Option<&str> {
        match self {
            Expression::Dynamic(text) => Some(text),
            _ => None,
        }
    }
}
