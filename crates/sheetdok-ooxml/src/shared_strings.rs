//! Shared string table (`xl/sharedStrings.xml`)

use crate::error::Result;
use crate::xml::{XmlDocument, XmlElement};

/// Resolved shared strings, indexed by `<v>` of `t="s"` cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedStrings {
    values: Vec<String>,
}

impl SharedStrings {
    /// Parse the shared strings part
    ///
    /// Rich-text runs are concatenated; phonetic guide runs (`rPh`) are
    /// excluded since they are reading aids, not cell content.
    pub fn parse(part: &str, source: String) -> Result<Self> {
        let doc = XmlDocument::parse(part, source)?;
        let values = doc.root.children_named("si").map(item_text).collect();
        Ok(Self { values })
    }

    /// Look up an entry
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<String> for SharedStrings {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Text of an `<si>` or `<is>` element
pub fn item_text(item: &XmlElement) -> String {
    let mut text = String::new();
    for child in item.elements() {
        match child.local.as_str() {
            "t" => text.push_str(&child.text()),
            "r" => {
                for t in child.children_named("t") {
                    text.push_str(&t.text());
                }
            }
            _ => {}
        }
    }
    text
}
