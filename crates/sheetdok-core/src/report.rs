//! Output document tree
//!
//! Every render strategy builds a [`Report`]: a flat, ordered list of
//! headed sections made of blocks. Writers ([`crate::markdown`],
//! [`crate::html`]) turn the same tree into text, so section order is decided
//! in one place.

/// Rendered document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub title: String,
    pub sections: Vec<Section>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sections: Vec::new(),
        }
    }

    /// Start a new section and return it for filling
    pub fn section(&mut self, level: u8, heading: impl Into<String>) -> &mut Section {
        self.sections.push(Section::new(level, heading));
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }

    /// Headings in document order
    pub fn headings(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.heading.as_str())
    }
}

/// A heading followed by its blocks
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Heading level; the report title is level 1
    pub level: u8,
    pub heading: String,
    pub blocks: Vec<Block>,
}

impl Section {
    pub fn new(level: u8, heading: impl Into<String>) -> Self {
        Self {
            level,
            heading: heading.into(),
            blocks: Vec::new(),
        }
    }

    pub fn push(&mut self, block: Block) -> &mut Self {
        self.blocks.push(block);
        self
    }

    /// Push `block`, or the empty marker when `is_empty`
    pub fn push_or_none(&mut self, is_empty: bool, block: impl FnOnce() -> Block) -> &mut Self {
        if is_empty {
            self.push(Block::none())
        } else {
            self.push(block())
        }
    }
}

/// Column alignment of a table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Right,
}

/// A rectangular table with a header row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub align: Vec<Align>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let align = vec![Align::Left; headers.len()];
        Self {
            headers,
            align,
            rows: Vec::new(),
        }
    }

    /// Right-align a column by index
    pub fn right(mut self, column: usize) -> Self {
        if let Some(a) = self.align.get_mut(column) {
            *a = Align::Right;
        }
        self
    }

    pub fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Content block
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(String),
    /// Two-column `key | value` table
    KeyValue(Vec<(String, String)>),
    Table(Table),
    List(Vec<String>),
    Code { language: String, text: String },
    /// Markup passed through unchanged
    Html(String),
    Image { alt: String, uri: String },
}

impl Block {
    /// Placeholder for an empty section
    pub fn none() -> Self {
        Block::Paragraph("(none)".to_string())
    }

    pub fn code(language: &str, text: impl Into<String>) -> Self {
        Block::Code {
            language: language.to_string(),
            text: text.into(),
        }
    }
}

/// Builder for `key | value` blocks
#[derive(Debug, Clone, Default)]
pub struct KeyValues(Vec<(String, String)>);

impl KeyValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, key: &str, value: impl ToString) -> Self {
        self.0.push((key.to_string(), value.to_string()));
        self
    }

    /// Add an optional value, rendering `None` as an empty string
    pub fn opt(self, key: &str, value: Option<impl ToString>) -> Self {
        let value = value.map(|v| v.to_string()).unwrap_or_default();
        self.add(key, value)
    }

    pub fn build(self) -> Block {
        Block::KeyValue(self.0)
    }
}
