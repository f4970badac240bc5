use crate::toc::TableOfContents;
use dotmark_parser::ast::{CallId, LinkDefinition};
use linked_hash_map::LinkedHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Strings of one locale, by key.
pub type LocalizationEntries = LinkedHashMap<String, String>;

/// Entries of a localization table, by locale tag.
pub type LocalizationTable = LinkedHashMap<String, LocalizationEntries>;

/// Everything collected about a document while it's compiled.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Attributes {
    /// Link definitions by normalized label. The first definition of a label wins.
    pub link_definitions: LinkedHashMap<String, LinkDefinition>,
    /// Calls waiting to be expanded, in registration order.
    #[serde(skip)]
    pub queue: VecDeque<CallId>,
    pub table_of_contents: Option<TableOfContents>,
    pub localization_tables: LinkedHashMap<String, LocalizationTable>,
    /// Heading identifiers by preorder node index.
    pub identifiers: BTreeMap<usize, String>,
    /// Section location of each heading, by preorder node index.
    pub locations: BTreeMap<usize, Vec<usize>>,
    /// Media locations by reference.
    pub media: LinkedHashMap<String, String>,
}

impl Attributes {
    /// A copy for a forked context. The fork starts with an empty queue.
    pub fn fork(&self) -> Self {
        Attributes {
            link_definitions: self.link_definitions.clone(),
            queue: VecDeque::new(),
            table_of_contents: self.table_of_contents.clone(),
            localization_tables: self.localization_tables.clone(),
            identifiers: self.identifiers.clone(),
            locations: self.locations.clone(),
            media: self.media.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextOptions {
    /// Headings up to this depth start a new page in paged documents. 0 disables it.
    pub auto_page_break_heading_depth: u8,
    pub enable_automatic_identifiers: bool,
    pub enable_local_media_storage: bool,
    pub enable_remote_media_storage: bool,
    pub max_expansion_rounds: usize,
    pub max_fork_depth: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        ContextOptions {
            auto_page_break_heading_depth: 1,
            enable_automatic_identifiers: true,
            enable_local_media_storage: false,
            enable_remote_media_storage: false,
            max_expansion_rounds: 100,
            max_fork_depth: 64,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    #[default]
    Plain,
    Paged,
    Slides,
}

impl DocumentType {
    pub const NAMES: &'static [&'static str] = &["plain", "paged", "slides"];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "plain" => Some(DocumentType::Plain),
            "paged" => Some(DocumentType::Paged),
            "slides" => Some(DocumentType::Slides),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DocumentType::Plain => "plain",
            DocumentType::Paged => "paged",
            DocumentType::Slides => "slides",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentInfo {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    /// Tag of the document locale.
    pub locale: Option<String>,
    /// Numbering formats by what they number, such as `headings`.
    pub numbering: LinkedHashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forks_start_with_an_empty_queue() {
        let mut attributes = Attributes::default();
        attributes.queue.push_back(CallId(1));
        attributes.identifiers.insert(3, "intro".into());
        let fork = attributes.fork();
        assert!(fork.queue.is_empty());
        assert_eq!(fork.identifiers, attributes.identifiers);
        assert_eq!(attributes.queue.len(), 1);
    }

    #[test]
    fn option_defaults() {
        let options = ContextOptions::default();
        assert_eq!(options.max_expansion_rounds, 100);
        assert_eq!(options.max_fork_depth, 64);
        assert!(options.enable_automatic_identifiers);
    }

    #[test]
    fn document_types_by_name() {
        assert_eq!(DocumentType::from_name("Paged"), Some(DocumentType::Paged));
        assert_eq!(DocumentType::from_name("book"), None);
        assert_eq!(DocumentType::Slides.name(), "slides");
    }
}
