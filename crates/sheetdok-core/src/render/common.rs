//! Sections shared by every render mode
//!
//! Section order is fixed here: workbook title, source metadata, styles,
//! defined names, then per sheet (metadata, print, validations, cells,
//! drawing objects, connectors, diagram, images, unsupported elements), then
//! the extraction summary and warnings.

use sheetdok_diagrams::{Endpoint, Flowchart};
use sheetdok_model::{AnchorMarker, CellAnchor, Sheet, Workbook};

use super::images::{data_uri, pictures};
use super::{RenderContext, RenderStrategy};
use crate::convert::SheetAnalysis;
use crate::diagnostics::counts_by_kind;
use crate::report::{Block, KeyValues, Report, Table};

pub(super) fn build_report<S>(strategy: &S, ctx: &RenderContext<'_>) -> Report
where
    S: RenderStrategy + ?Sized,
{
    let workbook = ctx.workbook;
    let mut report = Report::new(format!("Workbook: {}", display_name(workbook)));

    report
        .section(2, "Source Metadata")
        .push(source_metadata(workbook));
    strategy.styles(ctx, report.section(2, "Styles"));
    report
        .section(2, "Defined Names")
        .push_or_none(workbook.defined_names.is_empty(), || {
            defined_names(workbook)
        });

    for (sheet, analysis) in ctx.sheets() {
        report.section(
            2,
            format!("Sheet: {} [{}]", sheet.name, sheet.visibility),
        );
        report.section(3, "Sheet Metadata").push(sheet_metadata(sheet));
        report.section(3, "Print Metadata").push(print_metadata(sheet));
        report
            .section(3, "Data Validations")
            .push_or_none(sheet.validations.is_empty(), || validations(sheet));

        strategy.cells(ctx, sheet, &mut report);

        drawing_objects(&mut report, sheet, strategy.raw_fragments());
        connectors(&mut report, sheet, analysis, strategy.raw_fragments());
        report.section(3, "Diagram").push(diagram(&analysis.flowchart));
        embedded_images(&mut report, sheet);
        unsupported_elements(&mut report, sheet);
    }

    report
        .section(2, "Extraction Summary")
        .push(summary(ctx));
    warnings(&mut report, ctx, strategy.raw_fragments());
    report
}

/// File name if known, otherwise the workbook title
pub(super) fn display_name(workbook: &Workbook) -> &str {
    if workbook.metadata.file_name.is_empty() {
        &workbook.title
    } else {
        &workbook.metadata.file_name
    }
}

fn source_metadata(workbook: &Workbook) -> Block {
    let meta = &workbook.metadata;
    KeyValues::new()
        .add("file_name", &meta.file_name)
        .add("file_size", meta.file_size)
        .add("sha256", &meta.sha256)
        .add("zip_entries", meta.zip_entries)
        .add("sheet_count", workbook.sheets.len())
        .opt("creator", meta.creator.as_ref())
        .opt("last_modified_by", meta.last_modified_by.as_ref())
        .opt("created", meta.created.as_ref())
        .opt("modified", meta.modified.as_ref())
        .opt("application", meta.application.as_ref())
        .opt("calc_mode", meta.calc_mode.as_ref())
        .opt("calc_id", meta.calc_id.as_ref())
        .build()
}

fn defined_names(workbook: &Workbook) -> Block {
    let mut table = Table::new(["name", "scope", "value", "hidden"]);
    for name in &workbook.defined_names {
        let scope = match name.local_sheet {
            Some(idx) => workbook
                .sheets
                .iter()
                .find(|s| s.index == idx)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| format!("#{}", idx)),
            None => "workbook".to_string(),
        };
        table.row([
            name.name.clone(),
            scope,
            name.value.clone(),
            name.hidden.to_string(),
        ]);
    }
    Block::Table(table)
}

fn sheet_metadata(sheet: &Sheet) -> Block {
    let layout = &sheet.layout;
    let freeze = layout.freeze.as_ref().map(|f| {
        let mut text = format!("x_split={} y_split={}", f.x_split, f.y_split);
        if let Some(cell) = f.top_left_cell {
            text.push_str(&format!(" top_left={}", cell));
        }
        text
    });
    KeyValues::new()
        .add("sheet_index", sheet.index)
        .add("path", &sheet.path)
        .opt("dimension", sheet.dimension)
        .opt("used_range", sheet.used_range())
        .add("cell_count", sheet.cells.len())
        .add("merge_count", sheet.merges.len())
        .add("data_validation_count", sheet.validations.len())
        .add("shape_count", sheet.shapes.len())
        .add("connector_count", sheet.connectors.len())
        .add("hidden_rows", join_numbers(layout.hidden_rows.iter()))
        .add("hidden_cols", join_numbers(layout.hidden_cols.iter()))
        .opt("freeze_pane", freeze)
        .add("warning_count", sheet.warnings.len())
        .build()
}

fn print_metadata(sheet: &Sheet) -> Block {
    let print = &sheet.print;
    let areas: Vec<String> = print.print_areas.iter().map(|r| r.to_string()).collect();
    let json = |map: &std::collections::BTreeMap<String, String>| {
        serde_json::to_string(map).unwrap_or_default()
    };
    Block::List(vec![
        format!("print_areas: {}", or_none(&areas.join(", "))),
        format!("print_titles: {}", or_none(print.print_titles.as_deref().unwrap_or(""))),
        format!("page_setup: `{}`", json(&print.page_setup)),
        format!("page_margins: `{}`", json(&print.margins)),
        format!("print_options: `{}`", json(&print.options)),
        format!("header: {}", or_none(print.header.as_deref().unwrap_or(""))),
        format!("footer: {}", or_none(print.footer.as_deref().unwrap_or(""))),
        format!("row_breaks: {}", or_none(&join_numbers(print.row_breaks.iter()))),
        format!("col_breaks: {}", or_none(&join_numbers(print.col_breaks.iter()))),
    ])
}

fn validations(sheet: &Sheet) -> Block {
    let mut table = Table::new([
        "type",
        "sqref",
        "operator",
        "formula1",
        "formula2",
        "list_source",
        "allow_blank",
        "show_error_message",
        "prompt",
        "error",
    ]);
    for rule in &sheet.validations {
        let sqref: Vec<String> = rule.ranges.iter().map(|r| r.to_string()).collect();
        table.row([
            rule.kind.as_str().to_string(),
            sqref.join(" "),
            opt(&rule.operator),
            opt(&rule.formula1),
            opt(&rule.formula2),
            opt(&rule.list_source),
            rule.allow_blank.to_string(),
            rule.show_error_message.to_string(),
            titled(&rule.prompt_title, &rule.prompt),
            titled(&rule.error_title, &rule.error),
        ]);
    }
    Block::Table(table)
}

fn drawing_objects(report: &mut Report, sheet: &Sheet, raw: bool) {
    let section = report.section(3, "Drawing Objects");
    if sheet.shapes.is_empty() && sheet.connectors.is_empty() {
        section.push(Block::none());
        return;
    }

    let mut table = Table::new([
        "uid", "id", "kind", "name", "text", "anchor", "bbox", "rotation", "z", "parent", "image",
    ])
    .right(7)
    .right(8);
    for shape in &sheet.shapes {
        let parent = shape
            .parent
            .and_then(|idx| sheet.shapes.get(idx))
            .map(|p| p.uid.clone())
            .unwrap_or_default();
        table.row([
            shape.uid.clone(),
            shape.id.to_string(),
            shape.kind.to_string(),
            shape.name.clone(),
            opt(&shape.text),
            anchor_text(shape.anchor.as_ref()),
            shape.bbox.to_string(),
            format!("{:.1}", shape.rotation),
            shape.z_order.to_string(),
            parent,
            shape
                .image
                .as_ref()
                .map(|i| i.path.clone())
                .unwrap_or_default(),
        ]);
    }
    section.push(Block::Table(table));

    if raw {
        for shape in &sheet.shapes {
            section
                .push(Block::Paragraph(format!("Raw XML of `{}`:", shape.uid)))
                .push(Block::code("xml", shape.raw_xml.clone()));
        }
        for connector in &sheet.connectors {
            section
                .push(Block::Paragraph(format!("Raw XML of `{}`:", connector.uid)))
                .push(Block::code("xml", connector.raw_xml.clone()));
        }
    }
}

fn connectors(report: &mut Report, sheet: &Sheet, analysis: &SheetAnalysis, raw: bool) {
    let section = report.section(3, "Connectors (Raw + Inferred)");
    if sheet.connectors.is_empty() {
        section.push(Block::none());
        return;
    }

    let mut table = Table::new([
        "uid",
        "id",
        "name",
        "kind",
        "start",
        "end",
        "direction",
        "source",
        "target",
        "confidence",
        "distance_source",
        "distance_target",
        "arrow_head",
        "arrow_tail",
        "text",
    ])
    .right(10)
    .right(11);

    for (idx, connector) in sheet.connectors.iter().enumerate() {
        let edge = analysis.graph.edge_for(idx);
        let source = edge.map(|e| &e.source);
        let target = edge.map(|e| &e.target);
        let confidence = match (source, target) {
            (Some(s), Some(t)) => format!("{}/{}", s.confidence, t.confidence),
            _ => String::new(),
        };

        table.row([
            connector.uid.clone(),
            connector.id.to_string(),
            connector.name.clone(),
            connector.kind.to_string(),
            connector.start.to_string(),
            connector.end.to_string(),
            edge.map(|e| e.direction.to_string()).unwrap_or_default(),
            endpoint_shape(sheet, source),
            endpoint_shape(sheet, target),
            confidence,
            endpoint_distance(source),
            endpoint_distance(target),
            opt(&connector.head_arrow),
            opt(&connector.tail_arrow),
            opt(&connector.text),
        ]);
    }
    section.push(Block::Table(table));

    if raw {
        let edges = serde_json::to_string_pretty(&analysis.graph).unwrap_or_default();
        section
            .push(Block::Paragraph("Inferred graph:".to_string()))
            .push(Block::code("json", edges));
    }
}

fn endpoint_shape(sheet: &Sheet, endpoint: Option<&Endpoint>) -> String {
    endpoint
        .and_then(|e| e.shape)
        .and_then(|idx| sheet.shapes.get(idx))
        .map(|shape| format!("{} ({})", shape.uid, shape.id))
        .unwrap_or_default()
}

fn endpoint_distance(endpoint: Option<&Endpoint>) -> String {
    endpoint
        .and_then(|e| e.distance)
        .map(|d| format!("{:.2}", d))
        .unwrap_or_default()
}

fn diagram(flowchart: &Flowchart) -> Block {
    if flowchart.is_empty() {
        Block::none()
    } else {
        Block::code("mermaid", flowchart.to_mermaid())
    }
}

fn embedded_images(report: &mut Report, sheet: &Sheet) {
    let images: Vec<_> = pictures(&sheet.shapes).collect();
    report
        .section(3, "Embedded Images")
        .push_or_none(images.is_empty(), || Block::Paragraph(format!("{} image(s)", images.len())));

    for (n, (shape, image)) in images.iter().enumerate() {
        report
            .section(4, format!("Image {}: {}", n + 1, shape.uid))
            .push(Block::List(vec![
                format!("target: `{}`", image.path),
                format!("content_type: `{}`", image.content_type),
            ]))
            .push(Block::Image {
                alt: shape.label().to_string(),
                uri: data_uri(image),
            });
    }
}

fn unsupported_elements(report: &mut Report, sheet: &Sheet) {
    let unsupported: Vec<_> = sheet.warnings.unsupported().collect();
    let section = report.section(3, "Unsupported Elements");
    if unsupported.is_empty() {
        section.push(Block::none());
        return;
    }

    let mut table = Table::new(["scope", "location", "element", "reason"]);
    for warning in &unsupported {
        table.row([
            opt(&warning.scope),
            opt(&warning.location),
            opt(&warning.element),
            warning.reason.clone(),
        ]);
    }
    section.push(Block::Table(table));

    for (n, warning) in unsupported.iter().enumerate() {
        let Some(raw) = warning.raw.as_ref() else {
            continue;
        };
        let element = warning.element.as_deref().unwrap_or("element");
        report
            .section(4, format!("Unsupported {}: {}", n + 1, element))
            .push(Block::code("xml", raw.clone()));
    }
}

fn summary(ctx: &RenderContext<'_>) -> Block {
    let workbook = ctx.workbook;
    let sheets = &workbook.sheets;
    let edges = ctx.analysis.sheets.iter().flat_map(|a| a.graph.edges.iter());
    let (resolved, partial): (Vec<_>, Vec<_>) = edges.partition(|e| e.is_resolved());

    let mut kv = KeyValues::new()
        .add("mode", ctx.options.mode)
        .add("strict", ctx.options.strict)
        .add("sheet_count", sheets.len())
        .add("rendered_sheet_count", ctx.sheets().count())
        .add(
            "hidden_sheet_count",
            sheets.iter().filter(|s| s.visibility.is_hidden()).count(),
        )
        .add("cell_count", sheets.iter().map(|s| s.cells.len()).sum::<usize>())
        .add(
            "formula_count",
            sheets.iter().map(|s| s.formula_cells().count()).sum::<usize>(),
        )
        .add("merge_count", sheets.iter().map(|s| s.merges.len()).sum::<usize>())
        .add(
            "data_validation_count",
            sheets.iter().map(|s| s.validations.len()).sum::<usize>(),
        )
        .add("defined_name_count", workbook.defined_names.len())
        .add("style_count", workbook.styles.len())
        .add("shape_count", sheets.iter().map(|s| s.shapes.len()).sum::<usize>())
        .add(
            "connector_count",
            sheets.iter().map(|s| s.connectors.len()).sum::<usize>(),
        )
        .add("resolved_edge_count", resolved.len())
        .add("dangling_edge_count", partial.len())
        .add(
            "image_count",
            sheets.iter().map(|s| pictures(&s.shapes).count()).sum::<usize>(),
        )
        .add("warning_count", ctx.warnings.len());
    for (kind, count) in counts_by_kind(ctx.warnings) {
        kv = kv.add(&format!("warnings.{}", kind), count);
    }
    kv.build()
}

fn warnings(report: &mut Report, ctx: &RenderContext<'_>, raw: bool) {
    let items: Vec<String> = ctx.warnings.iter().map(|w| w.to_string()).collect();
    report
        .section(2, "Warnings")
        .push_or_none(items.is_empty(), || Block::List(items.clone()));

    if raw {
        for (n, warning) in ctx.warnings.iter().enumerate() {
            if let Some(ref fragment) = warning.raw {
                report
                    .section(4, format!("Warning {}: {}", n + 1, warning.kind))
                    .push(Block::Paragraph(warning.to_string()))
                    .push(Block::code("xml", fragment.clone()));
            }
        }
    }
}

fn anchor_text(anchor: Option<&CellAnchor>) -> String {
    let Some(anchor) = anchor else {
        return String::new();
    };
    let marker = |m: &Option<AnchorMarker>| {
        m.map(|m| format!("({},{},{},{})", m.col, m.row, m.col_off, m.row_off))
    };
    match (marker(&anchor.from), marker(&anchor.to)) {
        (Some(from), Some(to)) => format!("{} {}-{}", anchor.kind.as_str(), from, to),
        (Some(from), None) => format!("{} {}", anchor.kind.as_str(), from),
        _ => anchor.kind.as_str().to_string(),
    }
}

pub(super) fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn titled(title: &Option<String>, text: &Option<String>) -> String {
    match (title, text) {
        (Some(t), Some(x)) => format!("{}: {}", t, x),
        (Some(t), None) => t.clone(),
        (None, Some(x)) => x.clone(),
        (None, None) => String::new(),
    }
}

fn or_none(text: &str) -> String {
    if text.is_empty() {
        "(none)".to_string()
    } else {
        text.to_string()
    }
}

fn join_numbers<'a>(numbers: impl Iterator<Item = &'a u32>) -> String {
    numbers
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetdok_model::AnchorKind;

    #[test]
    fn test_anchor_text() {
        let anchor = CellAnchor {
            kind: AnchorKind::TwoCell,
            from: Some(AnchorMarker {
                col: 1,
                col_off: 0,
                row: 2,
                row_off: 9525,
            }),
            to: Some(AnchorMarker::default()),
        };
        assert_eq!(anchor_text(Some(&anchor)), "twoCellAnchor (1,2,0,9525)-(0,0,0,0)");
        assert_eq!(anchor_text(None), "");
    }

    #[test]
    fn test_helpers() {
        assert_eq!(or_none(""), "(none)");
        assert_eq!(join_numbers([3u32, 7].iter()), "3,7");
        assert_eq!(
            titled(&Some("Pick".into()), &Some("one of the list".into())),
            "Pick: one of the list"
        );
    }
}
