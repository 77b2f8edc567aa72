//! Normalized cell styles
//!
//! A [`StyleRecord`] is the flattened view of one `cellXfs` entry: the
//! number format, font, fill, border and alignment it points at are resolved
//! and copied in so that renderers never chase indices.

use std::collections::BTreeMap;

use serde::Serialize;

/// Number format applied to a cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NumberFormat {
    /// Format id (`numFmtId`)
    pub id: u32,
    /// Format code, either custom or the built-in code for the id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Font properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Font {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Size in points, kept as written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub bold: bool,
    pub italic: bool,
    /// Underline style (`single`, `double`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<String>,
    /// Color as `rgb`, `theme:N` or `indexed:N`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Fill properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Fill {
    /// Pattern type (`solid`, `gray125`, `none`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fg_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
}

impl Fill {
    /// CSS-ready colour for a solid fill, if any
    pub fn solid_rgb(&self) -> Option<String> {
        if self.pattern.as_deref() != Some("solid") {
            return None;
        }
        self.fg_color.as_deref().and_then(css_rgb)
    }
}

/// Border line styles per edge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Border {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<String>,
}

impl Border {
    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.right.is_none() && self.top.is_none() && self.bottom.is_none()
    }
}

/// Cell alignment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Alignment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical: Option<String>,
    pub wrap_text: bool,
}

/// One resolved `cellXfs` entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StyleRecord {
    /// Index into `cellXfs`
    pub id: u32,
    pub number_format: NumberFormat,
    pub font: Font,
    pub fill: Fill,
    pub border: Border,
    pub alignment: Alignment,
}

impl StyleRecord {
    /// The record used when a workbook declares no styles at all
    pub fn default_record() -> Self {
        Self {
            id: 0,
            number_format: NumberFormat {
                id: 0,
                code: Some("General".to_string()),
            },
            ..Default::default()
        }
    }

    /// Compact one-line description (`font=Calibri 11 bold; fill=solid FFFF00`)
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if let Some(ref code) = self.number_format.code {
            if code != "General" {
                parts.push(format!("numFmt={}", code));
            }
        }

        let mut font = Vec::new();
        if let Some(ref name) = self.font.name {
            font.push(name.clone());
        }
        if let Some(ref size) = self.font.size {
            font.push(size.clone());
        }
        if self.font.bold {
            font.push("bold".to_string());
        }
        if self.font.italic {
            font.push("italic".to_string());
        }
        if let Some(ref u) = self.font.underline {
            font.push(format!("underline:{}", u));
        }
        if let Some(ref color) = self.font.color {
            font.push(color.clone());
        }
        if !font.is_empty() {
            parts.push(format!("font={}", font.join(" ")));
        }

        if let Some(ref pattern) = self.fill.pattern {
            if pattern != "none" {
                let mut fill = pattern.clone();
                if let Some(ref fg) = self.fill.fg_color {
                    fill.push(' ');
                    fill.push_str(fg);
                }
                parts.push(format!("fill={}", fill));
            }
        }

        if !self.border.is_empty() {
            let edges: Vec<String> = [
                ("l", &self.border.left),
                ("r", &self.border.right),
                ("t", &self.border.top),
                ("b", &self.border.bottom),
            ]
            .iter()
            .filter_map(|(edge, style)| style.as_ref().map(|s| format!("{}:{}", edge, s)))
            .collect();
            parts.push(format!("border={}", edges.join(",")));
        }

        let mut align = Vec::new();
        if let Some(ref h) = self.alignment.horizontal {
            align.push(format!("h:{}", h));
        }
        if let Some(ref v) = self.alignment.vertical {
            align.push(format!("v:{}", v));
        }
        if self.alignment.wrap_text {
            align.push("wrap".to_string());
        }
        if !align.is_empty() {
            parts.push(format!("align={}", align.join(",")));
        }

        if parts.is_empty() {
            "default".to_string()
        } else {
            parts.join("; ")
        }
    }
}

/// Generic XML element tree, used to keep an audit copy of a part
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct XmlNode {
    pub tag: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<XmlNode>,
}

/// All styles of a workbook, keyed by `cellXfs` index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleTable {
    records: BTreeMap<u32, StyleRecord>,
    /// XML-equivalent tree of `styles.xml`, when the part exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<XmlNode>,
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleTable {
    /// Create a table holding only the default record
    pub fn new() -> Self {
        let mut records = BTreeMap::new();
        records.insert(0, StyleRecord::default_record());
        Self { records, tree: None }
    }

    /// Insert a record; id 0 replaces the built-in default
    pub fn insert(&mut self, record: StyleRecord) {
        self.records.insert(record.id, record);
    }

    /// Look up a record by id
    pub fn get(&self, id: u32) -> Option<&StyleRecord> {
        self.records.get(&id)
    }

    /// Whether a record exists for the id
    pub fn contains(&self, id: u32) -> bool {
        self.records.contains_key(&id)
    }

    /// Resolve a cell's style id; cells without one use record 0
    pub fn resolve(&self, id: Option<u32>) -> Option<&StyleRecord> {
        self.records.get(&id.unwrap_or(0))
    }

    /// Records in id order
    pub fn iter(&self) -> impl Iterator<Item = &StyleRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Convert an `ARGB`/`RGB` hex colour to `#RRGGBB`
pub fn css_rgb(color: &str) -> Option<String> {
    let hex = color.trim_start_matches('#');
    let rgb = match hex.len() {
        8 => &hex[2..],
        6 => hex,
        _ => return None,
    };
    rgb.bytes()
        .all(|b| b.is_ascii_hexdigit())
        .then(|| format!("#{}", rgb.to_ascii_uppercase()))
}

/// Built-in number format codes for the common ids
pub fn builtin_number_format(id: u32) -> Option<&'static str> {
    let code = match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(code)
}
