//! Relationship parts (`_rels/*.rels`)
//!
//! Every part that points at another part (workbook to sheets, sheet to
//! drawing, drawing to media) does so through a relationship id. The type
//! URI differs between transitional and strict packages, so types are
//! matched by their final path segment.
//!
//! # Example
//!
//! ```
//! use sheetdok_ooxml::relationships::Relationships;
//!
//! let xml = br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
//!   <Relationship Id="rId1"
//!     Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet"
//!     Target="worksheets/sheet1.xml"/>
//! </Relationships>"#;
//!
//! let rels = Relationships::parse(xml).unwrap();
//! assert_eq!(rels.get("rId1").unwrap().target, "worksheets/sheet1.xml");
//! assert_eq!(rels.of_type(Relationships::WORKSHEET).count(), 1);
//! ```

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{PackageError, Result};

/// Parsed relationships from a .rels part, in declaration order
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    order: Vec<String>,
    map: HashMap<String, RelationshipTarget>,
}

/// A relationship target with its type and mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipTarget {
    pub id: String,
    /// The target path (relative to the source part) or URL
    pub target: String,
    /// The relationship type URI
    pub rel_type: String,
    /// `External` for URLs, `None` for package parts
    pub target_mode: Option<String>,
}

impl RelationshipTarget {
    /// Check the type by its last segment (`worksheet`, `drawing`, ...)
    pub fn is_type(&self, kind: &str) -> bool {
        self.rel_type
            .rsplit('/')
            .next()
            .is_some_and(|last| last == kind)
    }

    pub fn is_external(&self) -> bool {
        self.target_mode.as_deref() == Some("External")
    }
}

impl Relationships {
    pub const OFFICE_DOCUMENT: &'static str = "officeDocument";
    pub const WORKSHEET: &'static str = "worksheet";
    pub const CHARTSHEET: &'static str = "chartsheet";
    pub const DIALOGSHEET: &'static str = "dialogsheet";
    pub const MACROSHEET: &'static str = "xlMacrosheet";
    pub const SHARED_STRINGS: &'static str = "sharedStrings";
    pub const STYLES: &'static str = "styles";
    pub const DRAWING: &'static str = "drawing";
    pub const IMAGE: &'static str = "image";
    pub const CORE_PROPERTIES: &'static str = "core-properties";
    pub const EXTENDED_PROPERTIES: &'static str = "extended-properties";

    /// Create an empty relationships map
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse relationships from XML bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut rels = Self::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    if e.local_name().as_ref() == b"Relationship" {
                        let mut id = None;
                        let mut target = None;
                        let mut rel_type = None;
                        let mut target_mode = None;

                        for attr in e.attributes().filter_map(|a| a.ok()) {
                            let value = attr.unescape_value().ok().map(|s| s.to_string());
                            match attr.key.as_ref() {
                                b"Id" => id = value,
                                b"Target" => target = value,
                                b"Type" => rel_type = value,
                                b"TargetMode" => target_mode = value,
                                _ => {}
                            }
                        }

                        if let (Some(id), Some(target)) = (id, target) {
                            rels.insert(RelationshipTarget {
                                id,
                                target,
                                rel_type: rel_type.unwrap_or_default(),
                                target_mode,
                            });
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(PackageError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    fn insert(&mut self, rel: RelationshipTarget) {
        // First declaration of an id wins
        if !self.map.contains_key(&rel.id) {
            self.order.push(rel.id.clone());
            self.map.insert(rel.id.clone(), rel);
        }
    }

    /// Look up a relationship by id
    pub fn get(&self, id: &str) -> Option<&RelationshipTarget> {
        self.map.get(id)
    }

    /// All relationships in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &RelationshipTarget> {
        self.order.iter().filter_map(|id| self.map.get(id))
    }

    /// Relationships of one type, in declaration order
    pub fn of_type<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a RelationshipTarget> {
        self.iter().filter(move |r| r.is_type(kind))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
