//! Minimal XML element tree over quick-xml
//!
//! SpreadsheetML parts are small enough to hold as a tree, and several
//! consumers need to walk siblings out of order or re-serialize a fragment
//! verbatim. Each element records its byte span in the decoded source so the
//! raw XML can be sliced back out for unsupported-element warnings.
//!
//! Elements and attributes are matched by local name; namespace prefixes are
//! kept in [`XmlElement::name`] but otherwise ignored.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use sheetdok_model::XmlNode;

use crate::error::{PackageError, Result};

/// A child node: element or character data
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(XmlElement),
    Text(String),
}

/// A parsed element
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Qualified name as written (`xdr:sp`)
    pub name: String,
    /// Name without prefix (`sp`)
    pub local: String,
    /// Attributes in document order, qualified keys
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
    /// Byte range of the element in the document source
    pub span: (usize, usize),
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>, offset: usize) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let local = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            local,
            attributes,
            children: Vec::new(),
            span: (offset, offset),
        })
    }

    /// Attribute value by local name (`r:id` matches `id` only if no
    /// unprefixed `id` exists)
    pub fn attr(&self, local: &str) -> Option<&str> {
        let mut prefixed = None;
        for (key, value) in &self.attributes {
            match key.split_once(':') {
                None if key == local => return Some(value.as_str()),
                Some((prefix, name)) if name == local && prefix != "xmlns" => {
                    prefixed.get_or_insert(value.as_str());
                }
                _ => {}
            }
        }
        prefixed
    }

    /// Attribute value by exact qualified name
    pub fn attr_qualified(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute parsed into any `FromStr` type
    pub fn attr_parse<T: std::str::FromStr>(&self, local: &str) -> Option<T> {
        self.attr(local).and_then(|v| v.trim().parse().ok())
    }

    /// OOXML boolean attribute (`1`/`true`), with a default when absent
    pub fn attr_bool(&self, local: &str, default: bool) -> bool {
        match self.attr(local) {
            Some(v) => matches!(v.trim(), "1" | "true" | "TRUE" | "on"),
            None => default,
        }
    }

    /// Attributes (without namespace declarations) as a sorted map
    pub fn attr_map(&self) -> BTreeMap<String, String> {
        self.attributes
            .iter()
            .filter(|(k, _)| k != "xmlns" && !k.starts_with("xmlns:"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Child elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First child element with the given local name
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.local == local)
    }

    /// All child elements with the given local name
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.local == local)
    }

    /// Follow a chain of local names (`child_path(&["nvSpPr", "cNvPr"])`)
    pub fn child_path(&self, path: &[&str]) -> Option<&XmlElement> {
        path.iter().try_fold(self, |elem, name| elem.child(name))
    }

    /// First descendant (depth-first, excluding self) with the local name
    pub fn descendant(&self, local: &str) -> Option<&XmlElement> {
        for child in self.elements() {
            if child.local == local {
                return Some(child);
            }
            if let Some(found) = child.descendant(local) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants with the local name, depth-first
    pub fn descendants<'a>(&'a self, local: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        self.collect_descendants(local, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, local: &str, found: &mut Vec<&'a XmlElement>) {
        for child in self.elements() {
            if child.local == local {
                found.push(child);
            }
            child.collect_descendants(local, found);
        }
    }

    /// Concatenated character data of this element's direct text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Text of the first child element with the local name
    pub fn child_text(&self, local: &str) -> Option<String> {
        self.child(local).map(|e| e.text())
    }

    /// Convert to the serializable tree used for audit output
    ///
    /// Whitespace-only text is dropped and attributes are sorted.
    pub fn to_tree(&self) -> XmlNode {
        let text = self.text();
        let text = text.trim();
        XmlNode {
            tag: self.local.clone(),
            attributes: self.attr_map(),
            text: (!text.is_empty()).then(|| text.to_string()),
            children: self.elements().map(|e| e.to_tree()).collect(),
        }
    }
}

/// A parsed XML part
#[derive(Debug, Clone)]
pub struct XmlDocument {
    /// Part path, used in error messages and warnings
    pub part: String,
    source: String,
    pub root: XmlElement,
}

impl XmlDocument {
    /// Parse a part's decoded text
    pub fn parse(part: impl Into<String>, source: String) -> Result<Self> {
        let part = part.into();
        let root = parse_root(&part, &source)?;
        Ok(Self { part, source, root })
    }

    /// The verbatim XML of an element from this document
    pub fn raw(&self, element: &XmlElement) -> &str {
        let (start, end) = element.span;
        self.source.get(start..end).unwrap_or_default()
    }
}

fn parse_root(part: &str, source: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let offset = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(ref e) => {
                stack.push(XmlElement::from_start(e, offset)?);
            }
            Event::Empty(ref e) => {
                let mut elem = XmlElement::from_start(e, offset)?;
                elem.span.1 = reader.buffer_position() as usize;
                attach(&mut stack, &mut root, elem);
            }
            Event::End(_) => {
                let mut elem = stack
                    .pop()
                    .ok_or_else(|| PackageError::malformed(part, "unbalanced closing tag"))?;
                elem.span.1 = reader.buffer_position() as usize;
                attach(&mut stack, &mut root, elem);
            }
            Event::Text(ref t) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(t.unescape()?.into_owned()));
                }
            }
            Event::CData(ref c) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(c).into_owned();
                    parent.children.push(Node::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(PackageError::malformed(part, "unexpected end of document"));
    }
    root.ok_or_else(|| PackageError::malformed(part, "document has no root element"))
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, elem: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(elem)),
        None => {
            if root.is_none() {
                *root = Some(elem);
            }
        }
    }
}
