//! Document metadata and structure: name, type, locale, numbering, page breaks and the table of
//! contents.
use crate::context::DocumentType;
use crate::error::Error;
use crate::function::{Function, Parameter};
use crate::locale::LocalizationError;
use crate::value::{Value, ValueType};
use dotmark_parser::ast::{Node, TableOfContentsView};

pub(super) fn functions() -> Vec<Function> {
    vec![
        Function::new(
            "docname",
            vec![Parameter::new("name", ValueType::String).optional()],
            |inv| match inv.optional_string("name")? {
                Some(name) => {
                    inv.ctx.document.name = Some(name);
                    Ok(Value::Void)
                }
                None => Ok(inv
                    .ctx
                    .document
                    .name
                    .clone()
                    .map(Value::String)
                    .unwrap_or(Value::None)),
            },
        ),
        Function::new(
            "doctype",
            vec![Parameter::new("type", ValueType::Enum(DocumentType::NAMES)).optional()],
            |inv| match inv.enum_value("type")? {
                Some(name) => {
                    if let Some(doc_type) = DocumentType::from_name(&name) {
                        inv.ctx.document.doc_type = doc_type;
                    }
                    Ok(Value::Void)
                }
                None => Ok(Value::Enum(inv.ctx.document.doc_type.name().to_string())),
            },
        ),
        Function::new(
            "doclang",
            vec![Parameter::new("locale", ValueType::String).optional()],
            |inv| match inv.optional_string("locale")? {
                Some(query) => {
                    let locale = inv
                        .ctx
                        .locale_loader()
                        .find(&query)
                        .ok_or(LocalizationError::LocaleNotFound(query))?;
                    inv.ctx.document.locale = Some(locale.tag);
                    Ok(Value::Void)
                }
                None => {
                    let tag = inv.ctx.document.locale.clone();
                    Ok(tag
                        .and_then(|tag| inv.ctx.locale_loader().from_tag(&tag))
                        .map(|locale| Value::String(locale.display_name))
                        .unwrap_or(Value::None))
                }
            },
        ),
        Function::new(
            "numbering",
            vec![Parameter::new("formats", ValueType::Dictionary).body()],
            |inv| {
                for (key, value) in inv.dictionary("formats")? {
                    let format = value.as_text().ok_or_else(|| {
                        Error::invalid_call("numbering", format!("format of '{}' isn't text", key))
                    })?;
                    inv.ctx
                        .document
                        .numbering
                        .insert(key, format.trim().to_string());
                }
                Ok(Value::Void)
            },
        ),
        Function::new(
            "autopagebreak",
            vec![Parameter::new("maxdepth", ValueType::Integer).with_default(Value::Number(1.0))],
            |inv| {
                let depth = inv.integer("maxdepth")?;
                inv.ctx.options.auto_page_break_heading_depth = depth.clamp(0, 6) as u8;
                Ok(Value::Void)
            },
        ),
        Function::new("noautopagebreak", vec![], |inv| {
            inv.ctx.options.auto_page_break_heading_depth = 0;
            Ok(Value::Void)
        }),
        Function::new(
            "tableofcontents",
            vec![
                Parameter::new("title", ValueType::InlineMarkdown).optional(),
                Parameter::new("maxdepth", ValueType::Integer).with_default(Value::Number(3.0)),
            ],
            |inv| {
                let title = match inv.optional_markdown("title")? {
                    Some(title) => Some(title),
                    None => inv
                        .ctx
                        .localize(super::LOCALIZATION_TABLE, "tableofcontents")
                        .ok()
                        .map(|title| vec![Node::Text(title)]),
                };
                let max_depth = inv.integer("maxdepth")?.clamp(1, 6) as u8;
                Ok(Value::Node(Node::TableOfContentsView(TableOfContentsView {
                    title,
                    max_depth,
                })))
            },
        ),
        Function::new("pagebreak", vec![], |_| Ok(Value::Node(Node::PageBreak)))
            .only_in(&[DocumentType::Paged, DocumentType::Slides]),
    ]
}
