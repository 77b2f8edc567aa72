//! Cell style parsing (`xl/styles.xml`)
//!
//! Each `cellXfs/xf` entry points at a font, fill, border and number format
//! by index. Those indices are resolved here so every [`StyleRecord`] is a
//! self-contained property bag. The verbatim element tree of the part is kept
//! on the [`StyleTable`] for audit output.

use std::collections::HashMap;

use sheetdok_model::style::builtin_number_format;
use sheetdok_model::{
    Alignment, Border, Fill, Font, NumberFormat, StyleRecord, StyleTable,
};

use crate::error::Result;
use crate::xml::{XmlDocument, XmlElement};

/// Parse `styles.xml` into a style table
///
/// A missing `cellXfs` leaves only the built-in default record.
pub fn parse_styles(part: &str, source: String) -> Result<StyleTable> {
    let doc = XmlDocument::parse(part, source)?;
    let root = &doc.root;

    let number_formats: HashMap<u32, String> = root
        .child("numFmts")
        .map(|n| {
            n.children_named("numFmt")
                .filter_map(|f| Some((f.attr_parse::<u32>("numFmtId")?, f.attr("formatCode")?.to_string())))
                .collect()
        })
        .unwrap_or_default();

    let fonts: Vec<Font> = collection(root, "fonts", "font", parse_font);
    let fills: Vec<Fill> = collection(root, "fills", "fill", parse_fill);
    let borders: Vec<Border> = collection(root, "borders", "border", parse_border);

    let mut table = StyleTable::new();
    if let Some(xfs) = root.child("cellXfs") {
        for (idx, xf) in xfs.children_named("xf").enumerate() {
            let num_fmt_id = xf.attr_parse::<u32>("numFmtId").unwrap_or(0);
            let code = number_formats
                .get(&num_fmt_id)
                .cloned()
                .or_else(|| builtin_number_format(num_fmt_id).map(str::to_string));

            let record = StyleRecord {
                id: idx as u32,
                number_format: NumberFormat {
                    id: num_fmt_id,
                    code,
                },
                font: pick(&fonts, xf.attr_parse("fontId")),
                fill: pick(&fills, xf.attr_parse("fillId")),
                border: pick(&borders, xf.attr_parse("borderId")),
                alignment: xf.child("alignment").map(parse_alignment).unwrap_or_default(),
            };
            table.insert(record);
        }
    }

    log::debug!("{}: {} cell styles", part, table.len());
    table.tree = Some(root.to_tree());
    Ok(table)
}

fn collection<T>(
    root: &XmlElement,
    container: &str,
    item: &str,
    parse: fn(&XmlElement) -> T,
) -> Vec<T> {
    root.child(container)
        .map(|c| c.children_named(item).map(parse).collect())
        .unwrap_or_default()
}

fn pick<T: Clone + Default>(items: &[T], index: Option<usize>) -> T {
    index
        .and_then(|i| items.get(i))
        .cloned()
        .unwrap_or_default()
}

fn parse_font(font: &XmlElement) -> Font {
    Font {
        name: font.child("name").and_then(|n| n.attr("val")).map(str::to_string),
        size: font.child("sz").and_then(|n| n.attr("val")).map(str::to_string),
        bold: flag(font, "b"),
        italic: flag(font, "i"),
        underline: font
            .child("u")
            .map(|u| u.attr("val").unwrap_or("single").to_string())
            .filter(|u| u != "none"),
        color: font.child("color").and_then(parse_color),
    }
}

/// `<b/>` and `<b val="1"/>` are on; `<b val="0"/>` is off
fn flag(parent: &XmlElement, local: &str) -> bool {
    parent
        .child(local)
        .is_some_and(|e| e.attr_bool("val", true))
}

fn parse_fill(fill: &XmlElement) -> Fill {
    if let Some(pattern) = fill.child("patternFill") {
        return Fill {
            pattern: pattern.attr("patternType").map(str::to_string),
            fg_color: pattern.child("fgColor").and_then(parse_color),
            bg_color: pattern.child("bgColor").and_then(parse_color),
        };
    }
    if let Some(gradient) = fill.child("gradientFill") {
        let stops: Vec<_> = gradient
            .children_named("stop")
            .filter_map(|s| s.child("color").and_then(parse_color))
            .collect();
        return Fill {
            pattern: Some("gradient".to_string()),
            fg_color: stops.first().cloned(),
            bg_color: stops.last().cloned(),
        };
    }
    Fill::default()
}

fn parse_border(border: &XmlElement) -> Border {
    let edge = |name: &str| {
        border
            .child(name)
            .and_then(|e| e.attr("style"))
            .map(str::to_string)
    };
    Border {
        left: edge("left").or_else(|| edge("start")),
        right: edge("right").or_else(|| edge("end")),
        top: edge("top"),
        bottom: edge("bottom"),
    }
}

fn parse_alignment(alignment: &XmlElement) -> Alignment {
    Alignment {
        horizontal: alignment.attr("horizontal").map(str::to_string),
        vertical: alignment.attr("vertical").map(str::to_string),
        wrap_text: alignment.attr_bool("wrapText", false),
    }
}

/// Colour as `rgb` hex, `theme:N` or `indexed:N`
fn parse_color(color: &XmlElement) -> Option<String> {
    if let Some(rgb) = color.attr("rgb") {
        return Some(rgb.to_ascii_uppercase());
    }
    if let Some(theme) = color.attr("theme") {
        return Some(format!("theme:{}", theme));
    }
    if let Some(indexed) = color.attr("indexed") {
        return Some(format!("indexed:{}", indexed));
    }
    color.attr_bool("auto", false).then(|| "auto".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="0.000"/></numFmts>
  <fonts count="2">
    <font><sz val="11"/><name val="Calibri"/></font>
    <font><b/><i val="0"/><u/><sz val="14"/><color rgb="ff112233"/><name val="Arial"/></font>
  </fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/></border>
    <border><left style="thin"/><right style="thin"/><top/><bottom style="double"/></border>
  </borders>
  <cellXfs count="3">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
    <xf numFmtId="164" fontId="1" fillId="2" borderId="1" applyFont="1">
      <alignment horizontal="center" vertical="top" wrapText="1"/>
    </xf>
    <xf numFmtId="14" fontId="9" fillId="0" borderId="0"/>
  </cellXfs>
</styleSheet>"#;

    #[test]
    fn test_parse_cell_xfs() {
        let table = parse_styles("xl/styles.xml", STYLES.to_string()).unwrap();
        assert_eq!(table.len(), 3);

        let plain = table.get(0).unwrap();
        assert_eq!(plain.font.name.as_deref(), Some("Calibri"));
        assert_eq!(plain.number_format.code.as_deref(), Some("General"));

        let fancy = table.get(1).unwrap();
        assert!(fancy.font.bold);
        assert!(!fancy.font.italic);
        assert_eq!(fancy.font.underline.as_deref(), Some("single"));
        assert_eq!(fancy.font.color.as_deref(), Some("FF112233"));
        assert_eq!(fancy.number_format.code.as_deref(), Some("0.000"));
        assert_eq!(fancy.fill.solid_rgb().as_deref(), Some("#FFFF00"));
        assert_eq!(fancy.fill.bg_color.as_deref(), Some("indexed:64"));
        assert_eq!(fancy.border.left.as_deref(), Some("thin"));
        assert_eq!(fancy.border.top, None);
        assert_eq!(fancy.alignment.horizontal.as_deref(), Some("center"));
        assert!(fancy.alignment.wrap_text);
    }

    #[test]
    fn test_out_of_range_font_falls_back() {
        let table = parse_styles("xl/styles.xml", STYLES.to_string()).unwrap();
        let dated = table.get(2).unwrap();
        assert_eq!(dated.font, Font::default());
        assert_eq!(dated.number_format.code.as_deref(), Some("mm-dd-yy"));
    }

    #[test]
    fn test_tree_is_kept() {
        let table = parse_styles("xl/styles.xml", STYLES.to_string()).unwrap();
        let tree = table.tree.as_ref().unwrap();
        assert_eq!(tree.tag, "styleSheet");
        assert_eq!(tree.children.len(), 5);
    }

    #[test]
    fn test_empty_stylesheet_keeps_default() {
        let table = parse_styles("xl/styles.xml", "<styleSheet/>".to_string()).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.contains(0));
    }
}
