use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use std::fmt;

/// Dense document id, assigned at indexing time in insertion order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u32);

impl DocId {
    pub fn new(id: u32) -> Self {
        DocId(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for DocId {
    fn from(id: u32) -> Self {
        DocId(id)
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "doc{}", self.0)
    }
}

/// Ordinal of a field inside one built index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldId(pub u32);

impl FieldId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A document as supplied by the caller: field name -> text.
///
/// Documents carry no id of their own; the index assigns one when the
/// document is committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub fields: BTreeMap<String, String>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            fields: BTreeMap::new(),
        }
    }

    pub fn add_field(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.fields.insert(name.into(), text.into());
    }

    pub fn with_field(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.add_field(name, text);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Title/content pair as read from a corpus directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    pub title: String,
    pub content: String,
}

impl RawDocument {
    pub const TITLE_FIELD: &'static str = "title";
    pub const CONTENT_FIELD: &'static str = "content";

    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        RawDocument {
            title: title.into(),
            content: content.into(),
        }
    }
}

impl From<RawDocument> for Document {
    fn from(raw: RawDocument) -> Self {
        Document::new()
            .with_field(RawDocument::TITLE_FIELD, raw.title)
            .with_field(RawDocument::CONTENT_FIELD, raw.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_document_maps_to_title_and_content() {
        let doc: Document = RawDocument::new("Curriculum", "Ingegneria dei Dati").into();
        assert_eq!(doc.get_field("title"), Some("Curriculum"));
        assert_eq!(doc.get_field("content"), Some("Ingegneria dei Dati"));
        assert_eq!(doc.fields.len(), 2);
    }
}
