//! Work view: compact, row-oriented cell listing

use std::collections::BTreeMap;

use sheetdok_model::{build_regions, Cell, CellRegion, RangeRef, Sheet};

use super::{RenderContext, RenderMode, RenderStrategy};
use crate::report::{Block, Report, Section, Table};

/// Default mode: only rows with content, cells grouped into style runs
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkView;

impl RenderStrategy for WorkView {
    fn mode(&self) -> RenderMode {
        RenderMode::Work
    }

    fn styles(&self, ctx: &RenderContext<'_>, section: &mut Section) {
        let mut usage: BTreeMap<u32, usize> = BTreeMap::new();
        for (sheet, _) in ctx.sheets() {
            for cell in sheet.cells.iter().filter(|c| c.has_content()) {
                *usage.entry(cell.style()).or_default() += 1;
            }
        }

        section.push_or_none(usage.is_empty(), || {
            let mut table = Table::new(["style", "cells", "format"]).right(1);
            for (id, count) in &usage {
                let format = ctx
                    .workbook
                    .styles
                    .get(*id)
                    .map(|s| s.summary())
                    .unwrap_or_else(|| "unresolved".to_string());
                table.row([id.to_string(), count.to_string(), format]);
            }
            Block::Table(table)
        });
    }

    fn cells(&self, _ctx: &RenderContext<'_>, sheet: &Sheet, report: &mut Report) {
        let runs = style_runs(sheet);
        report.section(3, "Cells").push_or_none(runs.is_empty(), || {
            let mut table = Table::new(["row", "run", "content"]).right(0);
            for run in &runs {
                table.row([run.range.start.row.to_string(), run.label(), run.content()]);
            }
            Block::Table(table)
        });

        for region in build_regions(sheet) {
            report
                .section(4, format!("Region {}: {}", region.id, region.bounds))
                .push(Block::Table(region_table(&region)));
        }
    }
}

/// Every coordinate of a region, virtual cells included
pub(super) fn region_table(region: &CellRegion<'_>) -> Table {
    let mut table = Table::new([
        "coord",
        "value",
        "formula",
        "cached_value",
        "type",
        "style_id",
        "merge_ref",
        "flags",
    ])
    .right(5);
    for entry in &region.cells {
        let cell = entry.cell;
        table.row([
            entry.coord.to_string(),
            cell.and_then(|c| c.value.clone()).unwrap_or_default(),
            cell.and_then(|c| c.formula.as_ref())
                .map(|f| format!("={}", f))
                .unwrap_or_default(),
            cell.and_then(|c| c.cached_value.clone()).unwrap_or_default(),
            entry.kind().to_string(),
            cell.map(|c| c.style().to_string()).unwrap_or_default(),
            entry.merge.map(|m| m.to_string()).unwrap_or_default(),
            entry.flags_text(),
        ]);
    }
    table
}

/// Consecutive non-empty cells of one row sharing a style
#[derive(Debug, Clone, PartialEq)]
struct StyleRun<'a> {
    range: RangeRef,
    style: u32,
    cells: Vec<&'a Cell>,
}

impl StyleRun<'_> {
    fn label(&self) -> String {
        format!("{} · style {}", self.range, self.style)
    }

    fn content(&self) -> String {
        self.cells
            .iter()
            .map(|c| format!("{}: {}", c.coord, cell_text(c)))
            .collect::<Vec<_>>()
            .join(" · ")
    }
}

fn cell_text(cell: &Cell) -> String {
    match (&cell.formula, &cell.cached_value) {
        (Some(formula), Some(cached)) => format!("={} = {}", formula, cached),
        (Some(formula), None) => format!("={}", formula),
        _ => cell.value.clone().unwrap_or_default(),
    }
}

/// Group the content cells of a sheet into runs, row by row
///
/// A merge anchor stretches its run over the whole merge so the next cell
/// only joins the run if it sits right of the merged block. Merge interiors
/// never appear.
fn style_runs(sheet: &Sheet) -> Vec<StyleRun<'_>> {
    let mut runs: Vec<StyleRun<'_>> = Vec::new();

    for cell in sheet.cells.iter().filter(|c| c.has_content()) {
        let merge = sheet.merge_at(cell.coord);
        if merge.is_some_and(|m| m.is_interior(cell.coord)) {
            continue;
        }
        let extent = merge
            .map(|m| m.range)
            .unwrap_or_else(|| RangeRef::single(cell.coord));

        if let Some(run) = runs.last_mut() {
            let adjacent = run.range.start.row == cell.coord.row
                && run.range.end.col + 1 == cell.coord.col
                && run.style == cell.style();
            if adjacent {
                run.range = run.range.union(&extent);
                run.cells.push(cell);
                continue;
            }
        }

        runs.push(StyleRun {
            range: extent,
            style: cell.style(),
            cells: vec![cell],
        });
    }
    runs
}
