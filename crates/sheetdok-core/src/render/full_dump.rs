//! Full dump: every materialized cell and every raw fragment

use sheetdok_model::{build_regions, Cell, Sheet};

use super::{RenderContext, RenderMode, RenderStrategy};
use crate::report::{Block, Report, Section, Table};

/// Exhaustive mode; hidden sheets are always included
#[derive(Debug, Clone, Copy, Default)]
pub struct FullDump;

impl RenderStrategy for FullDump {
    fn mode(&self) -> RenderMode {
        RenderMode::Full
    }

    fn styles(&self, ctx: &RenderContext<'_>, section: &mut Section) {
        let styles = &ctx.workbook.styles;
        let records: Vec<_> = styles.iter().collect();
        section
            .push(Block::Paragraph(format!("{} style record(s)", records.len())))
            .push(Block::code("json", to_json(&records)));

        match styles.tree {
            Some(ref tree) => {
                section
                    .push(Block::Paragraph("styles.xml tree:".to_string()))
                    .push(Block::code("json", to_json(tree)));
            }
            None => {
                section.push(Block::Paragraph("styles.xml tree: (none)".to_string()));
            }
        }
    }

    fn cells(&self, _ctx: &RenderContext<'_>, sheet: &Sheet, report: &mut Report) {
        report
            .section(3, "Cells (Full Dump)")
            .push_or_none(sheet.cells.is_empty(), || cell_table(sheet));

        let regions = build_regions(sheet);
        if !regions.is_empty() {
            let mut index = Table::new(["region", "bounds", "cells", "virtual"])
                .right(2)
                .right(3);
            for region in &regions {
                index.row([
                    region.id.to_string(),
                    region.bounds.to_string(),
                    region.cells.len().to_string(),
                    region.virtual_count().to_string(),
                ]);
            }
            report.section(4, "Cell Regions").push(Block::Table(index));
        }

        let layout = &sheet.layout;
        if layout.col_widths.is_empty() && layout.row_heights.is_empty() {
            return;
        }
        let mut table = Table::new(["axis", "index", "size", "hidden"]).right(1).right(2);
        for (col, width) in &layout.col_widths {
            table.row([
                "col".to_string(),
                sheetdok_model::column_letters(*col),
                format!("{:.2}", width),
                sheet.is_col_hidden(*col).to_string(),
            ]);
        }
        for (row, height) in &layout.row_heights {
            table.row([
                "row".to_string(),
                row.to_string(),
                format!("{:.2}", height),
                sheet.is_row_hidden(*row).to_string(),
            ]);
        }
        report.section(4, "Grid Layout").push(Block::Table(table));
    }

    fn raw_fragments(&self) -> bool {
        true
    }
}

fn cell_table(sheet: &Sheet) -> Block {
    let mut table = Table::new([
        "coord",
        "kind",
        "value",
        "formula",
        "cached_value",
        "style_id",
        "merge",
        "flags",
    ])
    .right(5);

    for cell in &sheet.cells {
        let merge = sheet.merge_at(cell.coord);
        table.row([
            cell.coord.to_string(),
            cell.kind.to_string(),
            cell.value.clone().unwrap_or_default(),
            cell.formula
                .as_ref()
                .map(|f| format!("={}", f))
                .unwrap_or_default(),
            cell.cached_value.clone().unwrap_or_default(),
            cell.style().to_string(),
            merge.map(|m| m.range.to_string()).unwrap_or_default(),
            flags(sheet, cell).join(","),
        ]);
    }
    Block::Table(table)
}

fn flags(sheet: &Sheet, cell: &Cell) -> Vec<&'static str> {
    let mut flags = Vec::new();
    if let Some(merge) = sheet.merge_at(cell.coord) {
        if merge.is_interior(cell.coord) {
            flags.push("merge_interior");
        } else {
            flags.push("merge_anchor");
        }
    }
    if sheet.is_row_hidden(cell.coord.row) {
        flags.push("hidden_row");
    }
    if sheet.is_col_hidden(cell.coord.col) {
        flags.push("hidden_col");
    }
    if !cell.has_content() {
        flags.push("style_only");
    }
    flags
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::render;
    use sheetdok_model::{CellKind, CellRef, MergeRegion, Visibility, Workbook};

    fn cell(a1: &str, kind: CellKind, value: Option<&str>, style: Option<u32>) -> Cell {
        let coord: CellRef = a1.parse().unwrap();
        let mut cell = Cell::new(coord, kind, value.map(str::to_string));
        cell.style_id = style;
        cell
    }

    fn revenue_workbook() -> Workbook {
        let mut formula = cell("C1", CellKind::Number, None, Some(1));
        formula.formula = Some("B1*2".into());
        formula.cached_value = Some("200".into());

        Workbook {
            title: "book".into(),
            sheets: vec![Sheet {
                name: "Sheet1".into(),
                cells: vec![
                    cell("A1", CellKind::SharedString, Some("Revenue"), Some(0)),
                    cell("B1", CellKind::Number, Some("100"), Some(1)),
                    formula,
                    cell("D1", CellKind::Number, None, Some(2)),
                ],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_every_cell_with_style_ids() {
        let text = render(&revenue_workbook(), RenderMode::Full, false).unwrap();

        assert!(text.contains("### Cells (Full Dump)"));
        assert!(text.contains("| A1 | shared_string | Revenue |  |  | 0 |  |  |"));
        assert!(text.contains("| B1 | number | 100 |  |  | 1 |  |  |"));
        assert!(text.contains("| C1 | number |  | =B1*2 | 200 | 1 |  |  |"));
        assert!(text.contains("| D1 | number |  |  |  | 2 |  | style_only |"));
    }

    #[test]
    fn test_region_index() {
        let mut workbook = revenue_workbook();
        let sheet = &mut workbook.sheets[0];
        sheet.cells.push(cell("A3", CellKind::Number, Some("7"), None));
        sheet.merges.push(MergeRegion::new("A3:B4".parse().unwrap()));
        let text = render(&workbook, RenderMode::Full, false).unwrap();

        assert!(text.contains("#### Cell Regions"));
        assert!(text.contains("| 1 | A1:D1 | 4 | 0 |"));
        assert!(text.contains("| 2 | A3:B4 | 4 | 3 |"));
    }

    #[test]
    fn test_merge_flags() {
        let sheet = Sheet {
            cells: vec![
                cell("A1", CellKind::Number, Some("1"), None),
                cell("B1", CellKind::Number, None, Some(3)),
            ],
            merges: vec![MergeRegion::new("A1:B1".parse().unwrap())],
            ..Default::default()
        };
        assert_eq!(flags(&sheet, &sheet.cells[0]), vec!["merge_anchor"]);
        assert_eq!(flags(&sheet, &sheet.cells[1]), vec!["merge_interior", "style_only"]);
    }

    #[test]
    fn test_style_table_json() {
        let text = render(&revenue_workbook(), RenderMode::Full, false).unwrap();
        assert!(text.contains("1 style record(s)"));
        assert!(text.contains("```json"));
        assert!(text.contains("styles.xml tree: (none)"));
    }

    #[test]
    fn test_hidden_sheets_always_dumped() {
        let mut workbook = revenue_workbook();
        workbook.sheets.push(Sheet {
            index: 1,
            name: "Secret".into(),
            visibility: Visibility::VeryHidden,
            ..Default::default()
        });
        let text = crate::convert::render_with_options(
            &workbook,
            &super::super::RenderOptions {
                mode: RenderMode::Full,
                include_hidden_sheets: false,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(text.contains("## Sheet: Secret [veryHidden]"));
    }
}
