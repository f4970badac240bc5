use crate::error::Error;
use crate::function::{Function, Parameter};
use crate::value::{Value, ValueType};
use dotmark_parser::ast::{Aligned, Alignment, BoxKind, BoxNode, Node, StackLayout, Stacked};

const ALIGNMENTS: &[&str] = &["start", "center", "end"];
const BOX_KINDS: &[&str] = &["callout", "tip", "note", "warning", "error"];

fn content() -> Parameter {
    Parameter::new("body", ValueType::Markdown).body()
}

fn stack(name: &str, layout: StackLayout) -> Function {
    Function::new(name, vec![content()], move |inv| {
        Ok(Value::Node(Node::Stacked(Stacked {
            layout,
            children: inv.markdown("body")?,
        })))
    })
}

fn box_kind(name: &str) -> BoxKind {
    match name {
        "tip" => BoxKind::Tip,
        "note" => BoxKind::Note,
        "warning" => BoxKind::Warning,
        "error" => BoxKind::Error,
        _ => BoxKind::Callout,
    }
}

pub(super) fn functions() -> Vec<Function> {
    vec![
        Function::new("center", vec![content()], |inv| {
            Ok(Value::Node(Node::Aligned(Aligned {
                alignment: Alignment::Center,
                children: inv.markdown("body")?,
            })))
        }),
        Function::new(
            "align",
            vec![Parameter::new("alignment", ValueType::Enum(ALIGNMENTS)), content()],
            |inv| {
                let alignment = match inv.enum_value("alignment")?.as_deref() {
                    Some("center") => Alignment::Center,
                    Some("end") => Alignment::End,
                    _ => Alignment::Start,
                };
                Ok(Value::Node(Node::Aligned(Aligned {
                    alignment,
                    children: inv.markdown("body")?,
                })))
            },
        ),
        stack("row", StackLayout::Row),
        stack("column", StackLayout::Column),
        Function::new(
            "grid",
            vec![Parameter::new("columns", ValueType::Integer), content()],
            |inv| {
                let columns = inv.integer("columns")?;
                if columns <= 0 {
                    return Err(Error::runtime(format!(
                        "a grid needs at least one column, found {}",
                        columns
                    )));
                }
                Ok(Value::Node(Node::Stacked(Stacked {
                    layout: StackLayout::Grid {
                        columns: columns as usize,
                    },
                    children: inv.markdown("body")?,
                })))
            },
        ),
        Function::new(
            "box",
            vec![
                Parameter::new("title", ValueType::InlineMarkdown).optional(),
                Parameter::new("type", ValueType::Enum(BOX_KINDS))
                    .with_default(Value::Enum("callout".into())),
                content(),
            ],
            |inv| {
                let kind_name = inv.enum_value("type")?.unwrap_or_default();
                let title = match inv.optional_markdown("title")? {
                    Some(title) => Some(title),
                    None => inv
                        .ctx
                        .localize(super::LOCALIZATION_TABLE, &kind_name)
                        .ok()
                        .map(|title| vec![Node::Text(title)]),
                };
                Ok(Value::Node(Node::Boxed(BoxNode {
                    kind: box_kind(&kind_name),
                    title,
                    children: inv.markdown("body")?,
                })))
            },
        ),
    ]
}
