//! Values flowing between function calls and the rules converting raw argument text into them.
use crate::context::Context;
use crate::error::Error;
use crate::lambda::Lambda;
use dotmark_parser::ast::Node;
use dotmark_parser::{indentation_width, trim_indent};
use linked_hash_map::LinkedHashMap;
use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Absence of a value, such as an unset optional argument.
    None,
    /// Output of functions that only act on the context.
    Void,
    String(String),
    Number(f64),
    Boolean(bool),
    Markdown(Vec<Node>),
    InlineMarkdown(Vec<Node>),
    Node(Node),
    Iterable(Vec<Value>),
    Dictionary(LinkedHashMap<String, Value>),
    Lambda(Lambda),
    /// A variant name of an enumerated parameter type.
    Enum(String),
    /// Raw text whose type is decided by whoever consumes it.
    Dynamic(String),
}

/// Declared type of a function parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueType {
    Any,
    String,
    Number,
    Integer,
    Boolean,
    Markdown,
    InlineMarkdown,
    Iterable,
    Dictionary,
    Lambda,
    Enum(&'static [&'static str]),
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Any => write!(f, "any value"),
            ValueType::String => write!(f, "string"),
            ValueType::Number => write!(f, "number"),
            ValueType::Integer => write!(f, "integer"),
            ValueType::Boolean => write!(f, "boolean"),
            ValueType::Markdown => write!(f, "markdown"),
            ValueType::InlineMarkdown => write!(f, "inline markdown"),
            ValueType::Iterable => write!(f, "iterable"),
            ValueType::Dictionary => write!(f, "dictionary"),
            ValueType::Lambda => write!(f, "lambda"),
            ValueType::Enum(variants) => write!(f, "one of [{}]", variants.join(", ")),
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Void => "void",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::Markdown(_) => "markdown",
            Value::InlineMarkdown(_) => "inline markdown",
            Value::Node(node) => node.kind(),
            Value::Iterable(_) => "iterable",
            Value::Dictionary(_) => "dictionary",
            Value::Lambda(_) => "lambda",
            Value::Enum(_) => "enum",
            Value::Dynamic(_) => "dynamic",
        }
    }

    /// Textual form of scalar values. Structured values have none.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::String(s) | Value::Dynamic(s) | Value::Enum(s) => Some(s.clone()),
            Value::Number(n) => Some(format_number(*n)),
            Value::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        match self {
            Value::None => true,
            Value::Dynamic(s) => s.trim().eq_ignore_ascii_case("none"),
            _ => false,
        }
    }

    pub fn conforms_to(&self, ty: ValueType) -> bool {
        match (self, ty) {
            (_, ValueType::Any) => true,
            (Value::String(_), ValueType::String)
            | (Value::Number(_), ValueType::Number)
            | (Value::Boolean(_), ValueType::Boolean)
            | (Value::Markdown(_), ValueType::Markdown)
            | (Value::InlineMarkdown(_), ValueType::InlineMarkdown)
            | (Value::Iterable(_), ValueType::Iterable)
            | (Value::Dictionary(_), ValueType::Dictionary)
            | (Value::Lambda(_), ValueType::Lambda) => true,
            (Value::Number(n), ValueType::Integer) => n.fract() == 0.0,
            (Value::Enum(name), ValueType::Enum(variants)) => variants.contains(&name.as_str()),
            _ => false,
        }
    }

    /// Converts this value to `ty`. Scalars go through their textual form, so that
    /// `Number(3)` satisfies a string parameter and `String("4")` a number parameter.
    pub fn convert(self, ty: ValueType, ctx: &mut Context) -> Result<Value, Error> {
        if self.conforms_to(ty) {
            return Ok(self);
        }
        match (self, ty) {
            (Value::Markdown(nodes), ValueType::InlineMarkdown) => {
                Ok(Value::InlineMarkdown(inline_content(nodes)))
            }
            (Value::InlineMarkdown(nodes), ValueType::Markdown) => {
                Ok(Value::Markdown(vec![Node::Paragraph(nodes)]))
            }
            (Value::Node(node), ValueType::Markdown) => Ok(Value::Markdown(vec![node])),
            (Value::Node(node), ValueType::InlineMarkdown) => {
                Ok(Value::InlineMarkdown(vec![node]))
            }
            (value, ty) => match value.as_text() {
                Some(text) => from_dynamic(&text, ty, ctx),
                None => Err(Error::Conversion {
                    value: value.type_name().to_string(),
                    target: ty.to_string(),
                }),
            },
        }
    }
}

/// Formats integral numbers without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Unwraps a lone paragraph so block content can stand where inline content is expected.
fn inline_content(nodes: Vec<Node>) -> Vec<Node> {
    let mut blocks: Vec<Node> = nodes.into_iter().filter(|n| *n != Node::Newline).collect();
    match blocks.as_slice() {
        [Node::Paragraph(_)] => match blocks.pop() {
            Some(Node::Paragraph(children)) => children,
            _ => vec![],
        },
        _ => blocks,
    }
}

fn conversion_error(text: &str, ty: ValueType) -> Error {
    Error::Conversion {
        value: text.to_string(),
        target: ty.to_string(),
    }
}

/// Converts raw argument text into a value of type `ty`. Markdown is parsed in `ctx`, which
/// registers any function call it contains.
pub fn from_dynamic(text: &str, ty: ValueType, ctx: &mut Context) -> Result<Value, Error> {
    let trimmed = text.trim();
    match ty {
        ValueType::Any => Ok(Value::Dynamic(text.to_string())),
        ValueType::String => Ok(Value::String(text.to_string())),
        ValueType::Number => trimmed
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Number)
            .ok_or_else(|| conversion_error(text, ty)),
        ValueType::Integer => trimmed
            .parse::<i64>()
            .map(|n| Value::Number(n as f64))
            .map_err(|_| conversion_error(text, ty)),
        ValueType::Boolean => match trimmed.to_lowercase().as_str() {
            "true" | "yes" => Ok(Value::Boolean(true)),
            "false" | "no" => Ok(Value::Boolean(false)),
            _ => Err(conversion_error(text, ty)),
        },
        ValueType::Markdown => Ok(Value::Markdown(ctx.parse_markdown(text, false)?)),
        ValueType::InlineMarkdown => {
            Ok(Value::InlineMarkdown(ctx.parse_markdown(trimmed, true)?))
        }
        ValueType::Iterable => {
            if trimmed.is_empty() {
                return Ok(Value::Iterable(vec![]));
            }
            let entries = list_entries(text).ok_or_else(|| conversion_error(text, ty))?;
            Ok(Value::Iterable(
                entries
                    .into_iter()
                    .map(|(head, nested)| {
                        Value::Dynamic(match (head.is_empty(), nested.is_empty()) {
                            (_, true) => head,
                            (true, false) => nested,
                            (false, false) => format!("{}\n{}", head, nested),
                        })
                    })
                    .collect(),
            ))
        }
        ValueType::Dictionary => {
            let entries = list_entries(text).ok_or_else(|| conversion_error(text, ty))?;
            let mut dictionary = LinkedHashMap::new();
            for (head, nested) in entries {
                let (key, value) = match head.split_once(':') {
                    Some((key, value)) if !value.trim().is_empty() => (key, value.trim()),
                    Some((key, _)) => (key, nested.as_str()),
                    None => (head.as_str(), nested.as_str()),
                };
                let key = key.trim();
                if key.is_empty() {
                    return Err(conversion_error(text, ty));
                }
                dictionary.insert(key.to_string(), Value::Dynamic(value.to_string()));
            }
            Ok(Value::Dictionary(dictionary))
        }
        ValueType::Lambda => Ok(Value::Lambda(Lambda::parse(text))),
        ValueType::Enum(variants) => variants
            .iter()
            .find(|v| v.eq_ignore_ascii_case(trimmed))
            .map(|v| Value::Enum(v.to_string()))
            .ok_or_else(|| {
                Error::NoSuchElement(format!(
                    "'{}' is not one of [{}]",
                    trimmed,
                    variants.join(", ")
                ))
            }),
    }
}

/// Splits a markdown-style list into its items: the text after each marker and the dedented
/// lines nested below it. Returns `None` when the text isn't a list.
fn list_entries(text: &str) -> Option<Vec<(String, String)>> {
    let mut entries: Vec<(String, Vec<&str>)> = Vec::new();
    let mut base: Option<usize> = None;

    for line in text.lines() {
        if line.trim().is_empty() {
            if let Some((_, nested)) = entries.last_mut() {
                nested.push(line);
            }
            continue;
        }
        let indent = indentation_width(line);
        let item = line
            .trim_start()
            .strip_prefix(['-', '*', '+'])
            .filter(|rest| rest.is_empty() || rest.starts_with([' ', '\t']));

        match item {
            Some(rest) if base.map_or(true, |b| indent <= b) => {
                base.get_or_insert(indent);
                entries.push((rest.trim().to_string(), Vec::new()));
            }
            _ => entries.last_mut()?.1.push(line),
        }
    }

    if entries.is_empty() {
        return None;
    }
    Some(
        entries
            .into_iter()
            .map(|(head, nested)| (head, trim_indent(&nested.join("\n"))))
            .collect(),
    )
}
