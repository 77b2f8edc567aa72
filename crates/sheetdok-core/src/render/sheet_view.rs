//! Sheet view: HTML grids that keep the visual layout
//!
//! Each rendered range becomes a `table.sv-grid` with column letters and row
//! numbers as headers. Merges span their visible rows and columns; a merged
//! block is emitted once, keyed by its anchor coordinate, and no other cell of
//! the block appears. Shapes, pictures and connectors are drawn in an
//! absolutely positioned overlay using the same pixel metrics the drawing
//! parser used.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use sheetdok_diagrams::GridMetrics;
use sheetdok_model::{column_letters, CellRef, MergeRegion, RangeRef, Sheet, StyleRecord};

use super::images::data_uri;
use super::{RenderContext, RenderMode, RenderStrategy};
use crate::html::escape_html;
use crate::report::{Block, Report, Section, Table};

/// Width of the row-number column
const ROW_HEAD_PX: f64 = 56.0;

/// Height of the column-letter row
const COL_HEAD_PX: f64 = 24.0;

/// Visual-fidelity mode
#[derive(Debug, Clone, Copy, Default)]
pub struct SheetView;

impl RenderStrategy for SheetView {
    fn mode(&self) -> RenderMode {
        RenderMode::Sheet
    }

    fn styles(&self, ctx: &RenderContext<'_>, section: &mut Section) {
        let mut usage: BTreeMap<u32, usize> = BTreeMap::new();
        for (sheet, _) in ctx.sheets() {
            for cell in &sheet.cells {
                *usage.entry(cell.style()).or_default() += 1;
            }
        }

        section.push_or_none(usage.is_empty(), || {
            let mut table = Table::new(["style", "cells", "css"]).right(1);
            for (id, count) in &usage {
                let css = ctx
                    .workbook
                    .styles
                    .get(*id)
                    .map(cell_css)
                    .unwrap_or_default();
                table.row([id.to_string(), count.to_string(), css]);
            }
            Block::Table(table)
        });
    }

    fn cells(&self, ctx: &RenderContext<'_>, sheet: &Sheet, report: &mut Report) {
        let ranges = sheet.base_ranges();
        report
            .section(3, "Sheet View")
            .push_or_none(ranges.is_empty(), || {
                let list: Vec<String> = ranges.iter().map(|r| r.to_string()).collect();
                Block::Paragraph(format!("Ranges: {}", list.join(", ")))
            });

        let grid = GridBuilder::new(ctx, sheet);
        for (n, range) in ranges.iter().enumerate() {
            let section = report.section(4, format!("Range {}: {}", n + 1, range));
            match grid.build(*range, n) {
                Some(html) => section.push(Block::Html(html)),
                None => section.push(Block::Paragraph(
                    "(all rows or columns of this range are hidden)".to_string(),
                )),
            };

            let formulas = formula_table(sheet, range);
            if !formulas.is_empty() {
                section
                    .push(Block::Paragraph("Formulas:".to_string()))
                    .push(Block::Table(formulas));
            }
        }
    }
}

fn formula_table(sheet: &Sheet, range: &RangeRef) -> Table {
    let mut table = Table::new(["coord", "formula", "cached_value"]);
    for cell in sheet.formula_cells() {
        if !range.contains(cell.coord) {
            continue;
        }
        if sheet.merge_at(cell.coord).is_some_and(|m| m.is_interior(cell.coord)) {
            continue;
        }
        table.row([
            cell.coord.to_string(),
            format!("={}", cell.formula.as_deref().unwrap_or_default()),
            cell.cached_value.clone().unwrap_or_default(),
        ]);
    }
    table
}

/// Inline CSS for a style record
pub(crate) fn cell_css(style: &StyleRecord) -> String {
    let mut css = Vec::new();

    let horizontal = style.alignment.horizontal.as_deref().and_then(|h| match h {
        "left" => Some("left"),
        "center" | "centerContinuous" => Some("center"),
        "right" => Some("right"),
        "justify" | "distributed" => Some("justify"),
        _ => None,
    });
    if let Some(align) = horizontal {
        css.push(format!("text-align:{}", align));
    }

    let vertical = style.alignment.vertical.as_deref().and_then(|v| match v {
        "top" => Some("top"),
        "center" => Some("middle"),
        "bottom" => Some("bottom"),
        _ => None,
    });
    if let Some(align) = vertical {
        css.push(format!("vertical-align:{}", align));
    }

    if style.font.bold {
        css.push("font-weight:bold".to_string());
    }
    if style.font.italic {
        css.push("font-style:italic".to_string());
    }
    if let Some(color) = style.font.color.as_deref().and_then(sheetdok_model::style::css_rgb) {
        css.push(format!("color:{}", color));
    }
    if let Some(fill) = style.fill.solid_rgb() {
        css.push(format!("background-color:{}", fill));
    }
    if style.alignment.wrap_text {
        css.push("white-space:pre-wrap".to_string());
    }
    css.join(";")
}

/// Where a merge is drawn within one rendered range
struct MergeSpan {
    region: MergeRegion,
    /// First visible cell of the merge inside the range
    origin: CellRef,
    rowspan: usize,
    colspan: usize,
}

struct GridBuilder<'a> {
    ctx: &'a RenderContext<'a>,
    sheet: &'a Sheet,
    metrics: GridMetrics,
}

impl<'a> GridBuilder<'a> {
    fn new(ctx: &'a RenderContext<'a>, sheet: &'a Sheet) -> Self {
        Self {
            ctx,
            sheet,
            metrics: GridMetrics::from_layout(&sheet.layout),
        }
    }

    /// HTML of one range; `None` when nothing in it is visible
    fn build(&self, range: RangeRef, n: usize) -> Option<String> {
        let rows: Vec<u32> = (range.start.row..=range.end.row)
            .filter(|r| !self.sheet.is_row_hidden(*r))
            .collect();
        let cols: Vec<u32> = (range.start.col..=range.end.col)
            .filter(|c| !self.sheet.is_col_hidden(*c))
            .collect();
        if rows.is_empty() || cols.is_empty() {
            return None;
        }

        let spans = self.merge_spans(&range, &rows, &cols);
        let mut html = String::new();
        html.push_str(r#"<div class="sv-range"><div class="sv-wrap"><div class="sv-canvas">"#);
        html.push('\n');
        html.push_str(r#"<table class="sv-grid">"#);
        html.push('\n');

        html.push_str("<colgroup>");
        let _ = write!(html, r#"<col style="width:{}px">"#, px(ROW_HEAD_PX));
        for &col in &cols {
            let _ = write!(html, r#"<col style="width:{}px">"#, px(self.metrics.col_width(col)));
        }
        html.push_str("</colgroup>\n");

        let _ = write!(
            html,
            r#"<thead><tr style="height:{}px"><th class="sv-corner"></th>"#,
            px(COL_HEAD_PX)
        );
        for &col in &cols {
            let _ = write!(html, r#"<th class="sv-col-head">{}</th>"#, column_letters(col));
        }
        html.push_str("</tr></thead>\n<tbody>\n");

        for &row in &rows {
            let _ = write!(
                html,
                r#"<tr style="height:{}px"><th class="sv-row-head">{}</th>"#,
                px(self.metrics.row_height(row)),
                row
            );
            for &col in &cols {
                let coord = CellRef::new(row, col);
                match spans.iter().find(|s| s.region.range.contains(coord)) {
                    Some(span) if span.origin == coord => self.merged_cell(&mut html, span),
                    Some(_) => {}
                    None => self.cell(&mut html, coord, ""),
                }
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>\n");

        self.overlay(&mut html, &range, n);
        html.push_str("</div></div></div>");
        Some(html)
    }

    fn merge_spans(&self, range: &RangeRef, rows: &[u32], cols: &[u32]) -> Vec<MergeSpan> {
        self.sheet
            .merges
            .iter()
            .filter(|m| m.range.intersects(range))
            .filter_map(|m| {
                let span_rows: Vec<u32> = rows
                    .iter()
                    .copied()
                    .filter(|r| (m.range.start.row..=m.range.end.row).contains(r))
                    .collect();
                let span_cols: Vec<u32> = cols
                    .iter()
                    .copied()
                    .filter(|c| (m.range.start.col..=m.range.end.col).contains(c))
                    .collect();
                let origin = CellRef::new(*span_rows.first()?, *span_cols.first()?);
                Some(MergeSpan {
                    region: *m,
                    origin,
                    rowspan: span_rows.len(),
                    colspan: span_cols.len(),
                })
            })
            .collect()
    }

    fn merged_cell(&self, html: &mut String, span: &MergeSpan) {
        let mut attrs = String::new();
        if span.rowspan > 1 {
            let _ = write!(attrs, r#" rowspan="{}""#, span.rowspan);
        }
        if span.colspan > 1 {
            let _ = write!(attrs, r#" colspan="{}""#, span.colspan);
        }
        let _ = write!(attrs, r#" data-merge="{}""#, span.region.range);
        self.cell(html, span.region.anchor(), &attrs);
    }

    fn cell(&self, html: &mut String, coord: CellRef, attrs: &str) {
        let cell = self.sheet.cell(coord);
        let text = cell.map(|c| c.display_value()).unwrap_or("");
        let class = if text.is_empty() {
            "sv-cell sv-empty"
        } else {
            "sv-cell"
        };

        let _ = write!(html, r#"<td class="{}" data-coord="{}"{}"#, class, coord, attrs);
        if let Some(cell) = cell {
            if let Some(ref formula) = cell.formula {
                let _ = write!(html, r#" title="={}""#, escape_html(formula));
            }
            let css = self
                .ctx
                .workbook
                .styles
                .get(cell.style())
                .map(cell_css)
                .unwrap_or_default();
            if !css.is_empty() {
                let _ = write!(html, r#" style="{}""#, css);
            }
        }
        let _ = write!(html, ">{}</td>", escape_html(text));
    }

    /// Shapes, pictures, connectors and freeze lines on top of the grid
    fn overlay(&self, html: &mut String, range: &RangeRef, n: usize) {
        let x0 = self.metrics.x_offset(range.start.col - 1);
        let y0 = self.metrics.y_offset(range.start.row - 1);
        let width = self.metrics.x_offset(range.end.col) - x0;
        let height = self.metrics.y_offset(range.end.row) - y0;
        let inside = |x: f64, y: f64, w: f64, h: f64| {
            x < x0 + width && x + w > x0 && y < y0 + height && y + h > y0
        };

        let shapes: Vec<_> = self
            .sheet
            .shapes
            .iter()
            .filter(|s| !s.is_group())
            .filter(|s| inside(s.bbox.x, s.bbox.y, s.bbox.width, s.bbox.height))
            .collect();
        let connectors: Vec<_> = self
            .sheet
            .connectors
            .iter()
            .filter(|c| {
                let x = c.start.x.min(c.end.x);
                let y = c.start.y.min(c.end.y);
                inside(x, y, (c.start.x - c.end.x).abs(), (c.start.y - c.end.y).abs())
            })
            .collect();
        let freeze = self.sheet.layout.freeze.as_ref();
        if shapes.is_empty() && connectors.is_empty() && freeze.is_none() {
            return;
        }

        html.push_str(r#"<div class="sv-overlay">"#);
        html.push('\n');
        for shape in &shapes {
            let class = if shape.image.is_some() {
                "sv-shape pic"
            } else {
                "sv-shape"
            };
            let _ = write!(
                html,
                r#"<div class="{}" data-uid="{}" style="left:{}px;top:{}px;width:{}px;height:{}px"#,
                class,
                escape_html(&shape.uid),
                px(shape.bbox.x - x0),
                px(shape.bbox.y - y0),
                px(shape.bbox.width),
                px(shape.bbox.height)
            );
            if shape.rotation != 0.0 {
                let _ = write!(html, ";transform:rotate({}deg)", px(shape.rotation));
            }
            if let Some(fill) = shape.fill_color.as_deref().and_then(sheetdok_model::style::css_rgb) {
                let _ = write!(html, ";background-color:{}", fill);
            }
            html.push_str(r#"">"#);
            match shape.image {
                Some(ref image) => {
                    let _ = write!(
                        html,
                        r#"<img src="{}" alt="{}" style="width:100%;height:100%">"#,
                        data_uri(image),
                        escape_html(shape.label())
                    );
                }
                None => html.push_str(&escape_html(shape.text.as_deref().unwrap_or_default())),
            }
            html.push_str("</div>\n");
        }

        let marker = format!("sv-arrow-{}-{}", self.sheet.index, n + 1);
        let _ = write!(
            html,
            r#"<svg class="sv-lines" width="{}" height="{}">"#,
            px(width),
            px(height)
        );
        let _ = write!(
            html,
            r##"<defs><marker id="{}" markerWidth="8" markerHeight="8" refX="7" refY="4" orient="auto-start-reverse"><path d="M0,0 L8,4 L0,8 z" fill="#475569"/></marker></defs>"##,
            marker
        );
        for connector in &connectors {
            let _ = write!(
                html,
                r##"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="#475569" stroke-width="1.5" data-uid="{}""##,
                px(connector.start.x - x0),
                px(connector.start.y - y0),
                px(connector.end.x - x0),
                px(connector.end.y - y0),
                escape_html(&connector.uid)
            );
            if is_arrow(&connector.tail_arrow) {
                let _ = write!(html, r#" marker-end="url(#{})""#, marker);
            }
            if is_arrow(&connector.head_arrow) {
                let _ = write!(html, r#" marker-start="url(#{})""#, marker);
            }
            html.push_str("/>");
        }
        if let Some(pane) = freeze {
            if pane.x_split > 0 {
                let x = self.metrics.x_offset(pane.x_split) - x0;
                let _ = write!(
                    html,
                    r#"<line class="sv-freeze" x1="{0}" y1="0" x2="{0}" y2="{1}"/>"#,
                    px(x),
                    px(height)
                );
            }
            if pane.y_split > 0 {
                let y = self.metrics.y_offset(pane.y_split) - y0;
                let _ = write!(
                    html,
                    r#"<line class="sv-freeze" x1="0" y1="{0}" x2="{1}" y2="{0}"/>"#,
                    px(y),
                    px(width)
                );
            }
        }
        html.push_str("</svg>\n</div>\n");
    }
}

fn is_arrow(end: &Option<String>) -> bool {
    end.as_deref().is_some_and(|kind| kind != "none")
}

/// Pixel value without trailing zeros
fn px(value: f64) -> String {
    let text = format!("{:.2}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
