use crate::context::{Context, LocalizationEntries, LocalizationTable};
use crate::error::Error;
use crate::function::{Function, Parameter};
use crate::locale::LocalizationError;
use crate::value::{Value, ValueType};
use linked_hash_map::LinkedHashMap;

/// Strings of the standard library, by language.
const STD_STRINGS: &[(&str, &[(&str, &str)])] = &[
    (
        "en",
        &[
            ("tip", "Tip"),
            ("note", "Note"),
            ("warning", "Warning"),
            ("error", "Error"),
            ("tableofcontents", "Table of contents"),
        ],
    ),
    (
        "it",
        &[
            ("tip", "Suggerimento"),
            ("note", "Nota"),
            ("warning", "Attenzione"),
            ("error", "Errore"),
            ("tableofcontents", "Indice"),
        ],
    ),
    (
        "fr",
        &[
            ("tip", "Astuce"),
            ("note", "Note"),
            ("warning", "Avertissement"),
            ("error", "Erreur"),
            ("tableofcontents", "Table des matières"),
        ],
    ),
    (
        "de",
        &[
            ("tip", "Tipp"),
            ("note", "Hinweis"),
            ("warning", "Warnung"),
            ("error", "Fehler"),
            ("tableofcontents", "Inhaltsverzeichnis"),
        ],
    ),
    (
        "es",
        &[
            ("tip", "Consejo"),
            ("note", "Nota"),
            ("warning", "Advertencia"),
            ("error", "Error"),
            ("tableofcontents", "Índice"),
        ],
    ),
];

pub(super) fn register_std_table(ctx: &mut Context) -> Result<(), Error> {
    let table: LocalizationTable = STD_STRINGS
        .iter()
        .map(|(tag, entries)| {
            let entries: LocalizationEntries = entries
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect();
            (tag.to_string(), entries)
        })
        .collect();
    register_table(ctx, super::LOCALIZATION_TABLE, table, true)
}

/// Adds a localization table. An existing table is an error unless `merge` is set, in which
/// case the new entries take priority.
fn register_table(
    ctx: &mut Context,
    name: &str,
    table: LocalizationTable,
    merge: bool,
) -> Result<(), Error> {
    let tables = &mut ctx.attributes.localization_tables;
    match tables.get_mut(name) {
        Some(_) if !merge => Err(Error::runtime(format!(
            "localization table '{}' already exists",
            name
        ))),
        Some(existing) => {
            for (tag, entries) in table {
                match existing.get_mut(&tag) {
                    Some(current) => current.extend(entries),
                    None => {
                        existing.insert(tag, entries);
                    }
                }
            }
            Ok(())
        }
        None => {
            tables.insert(name.to_string(), table);
            Ok(())
        }
    }
}

pub(super) fn functions() -> Vec<Function> {
    vec![
        Function::new(
            "localization",
            vec![
                Parameter::new("name", ValueType::String),
                Parameter::new("merge", ValueType::Boolean).with_default(Value::Boolean(false)),
                Parameter::new("contents", ValueType::Dictionary).body(),
            ],
            |inv| {
                let name = inv.string("name")?.trim().to_string();
                let merge = inv.boolean("merge")?;
                let mut table = LinkedHashMap::new();
                for (locale, entries) in inv.dictionary("contents")? {
                    let tag = inv
                        .ctx
                        .locale_loader()
                        .find(&locale)
                        .map(|l| l.tag)
                        .ok_or(LocalizationError::LocaleNotFound(locale))?;
                    let Value::Dictionary(entries) = entries.convert(ValueType::Dictionary, inv.ctx)?
                    else {
                        return Err(Error::invalid_call("localization", "entries must be a dictionary"));
                    };
                    let mut strings = LocalizationEntries::new();
                    for (key, value) in entries {
                        let text = value.as_text().ok_or_else(|| {
                            Error::invalid_call("localization", format!("entry '{}' isn't text", key))
                        })?;
                        strings.insert(key, text);
                    }
                    table.insert(tag, strings);
                }
                register_table(inv.ctx, &name, table, merge)?;
                Ok(Value::Void)
            },
        ),
        Function::new(
            "localize",
            vec![
                Parameter::new("key", ValueType::String),
                Parameter::new("separator", ValueType::String)
                    .with_default(Value::String(":".into())),
            ],
            |inv| {
                let key = inv.string("key")?;
                let separator = inv.string("separator")?;
                let (table, entry) = key.split_once(separator.as_str()).ok_or_else(|| {
                    Error::invalid_call(
                        "localize",
                        format!("'{}' should be of the form table{}key", key, separator),
                    )
                })?;
                Ok(Value::String(inv.ctx.localize(table.trim(), entry.trim())?))
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::locale::LocalizationError;
    use crate::stdlib::tests::{render, try_compile};

    const TABLE: &str = ".localization {greetings}\n    - English\n        - hello: Hello\n    - it\n        - hello: Ciao\n        - bye: Arrivederci\n\n";

    #[test]
    fn user_tables() {
        let source = format!("{}.doclang {{it}}\n\n.localize {{greetings:hello}}\n", TABLE);
        assert_eq!(render(&source), "Ciao");
    }

    #[test]
    fn fallback_to_the_language() {
        let source = format!("{}.doclang {{en-GB}}\n\n.localize {{greetings:hello}}\n", TABLE);
        assert_eq!(render(&source), "Hello");
        assert_eq!(render(".doclang {en-US}\n\n.localize {std:tip}\n"), "Tip");
    }

    #[test]
    fn custom_separator() {
        let source = format!(
            "{}.doclang {{it}}\n\n.localize {{greetings/bye}} separator:{{/}}\n",
            TABLE
        );
        assert_eq!(render(&source), "Arrivederci");
    }

    #[test]
    fn redefinition_needs_merge() {
        let twice = format!("{}{}", TABLE, TABLE);
        assert!(matches!(try_compile(&twice), Err(Error::Runtime(_))));

        let merged = format!(
            "{}.localization {{greetings}} merge:{{yes}}\n    - it\n        - hello: Salve\n\n.doclang {{it}}\n\nText: .localize {{greetings:hello}} .localize {{greetings:bye}}\n",
            TABLE
        );
        assert_eq!(render(&merged), "Text: Salve Arrivederci");
    }

    #[test]
    fn missing_entries() {
        let source = format!("{}.doclang {{it}}\n\n.localize {{greetings:nothing}}\n", TABLE);
        assert!(matches!(
            try_compile(&source),
            Err(Error::Localization(LocalizationError::KeyNotFound { .. }))
        ));
        assert!(matches!(
            try_compile(".localize {std:tip}\n"),
            Err(Error::Localization(LocalizationError::LocaleUnset))
        ));
        assert!(matches!(
            try_compile(".localization {x}\n    - Klingon\n        - a: b\n"),
            Err(Error::Localization(LocalizationError::LocaleNotFound(_)))
        ));
    }
}
