//! Nodes produced by library functions rather than by source syntax.
use super::Node;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Start,
    Center,
    End,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aligned {
    pub alignment: Alignment,
    pub children: Vec<Node>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackLayout {
    Row,
    Column,
    Grid { columns: usize },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stacked {
    pub layout: StackLayout,
    pub children: Vec<Node>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxKind {
    Callout,
    Tip,
    Note,
    Warning,
    /// Visible marker left in place of a call that failed to expand.
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxNode {
    pub kind: BoxKind,
    pub title: Option<Vec<Node>>,
    pub children: Vec<Node>,
}

impl BoxNode {
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        BoxNode {
            kind: BoxKind::Error,
            title: Some(vec![Node::Text(title.into())]),
            children: vec![Node::Text(message.into())],
        }
    }
}

/// Placeholder where the document's table of contents is rendered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableOfContentsView {
    pub title: Option<Vec<Node>>,
    pub max_depth: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextSize {
    Tiny,
    Small,
    Normal,
    Medium,
    Larger,
    Large,
    Huge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextWeight {
    Normal,
    Bold,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextStyle {
    Normal,
    Italic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextDecoration {
    None,
    Underline,
    Overline,
    Strikethrough,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextCase {
    None,
    Uppercase,
    Lowercase,
    Capitalize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextTransformData {
    pub size: Option<TextSize>,
    pub weight: Option<TextWeight>,
    pub style: Option<TextStyle>,
    pub decoration: Option<TextDecoration>,
    pub case: Option<TextCase>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextTransform {
    pub data: TextTransformData,
    pub children: Vec<Node>,
}
