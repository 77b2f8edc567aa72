//! Standalone HTML writer
//!
//! Used for the sheet view when a self-contained document is requested. The
//! same [`Report`] that feeds the Markdown writer is serialized here; HTML
//! blocks (the sheet grids) are embedded as-is and everything else is
//! escaped.

use crate::report::{Align, Block, Report, Section, Table};

const STYLESHEET: &str = r#"<style>
:root { --line: #d0d7de; --line-head: #bcc6d4; --bg-soft: #f6f8fa; --bg-head: #edf2f7; --text: #111827; }
* { box-sizing: border-box; }
body { margin: 0; color: var(--text); font: 14px/1.5 -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; }
.page { max-width: 99vw; margin: 0 auto; padding: 18px 14px 80px; }
h1 { font-size: 24px; } h2 { margin-top: 28px; font-size: 18px; } h3 { margin-top: 22px; font-size: 14px; }
.simple { border-collapse: collapse; max-width: 1400px; }
.simple th, .simple td { border: 1px solid var(--line); padding: 4px 8px; font-size: 12px; vertical-align: top; }
.simple th { background: var(--bg-soft); text-align: left; }
.simple .num { text-align: right; }
pre { background: var(--bg-soft); padding: 8px; overflow: auto; }
.sv-wrap { border: 1px solid var(--line); overflow: auto; }
.sv-canvas { position: relative; display: inline-block; }
.sv-grid { border-collapse: collapse; table-layout: fixed; font: 11px/1.25 sans-serif; }
.sv-grid th, .sv-grid td { border: 1px solid var(--line); }
.sv-grid .sv-col-head, .sv-grid .sv-row-head, .sv-grid .sv-corner { background: var(--bg-head); border-color: var(--line-head); font: 11px/1.2 monospace; text-align: center; }
.sv-grid td { padding: 2px 4px; overflow: hidden; vertical-align: top; white-space: pre-wrap; }
.sv-overlay { position: absolute; left: 56px; top: 24px; right: 0; bottom: 0; pointer-events: none; }
.sv-shape { position: absolute; border: 1px solid #fb7185; background: rgba(251, 113, 133, 0.08); font: 10px/1.2 sans-serif; padding: 2px; overflow: hidden; }
.sv-shape.pic { border-color: #3b82f6; background: rgba(59, 130, 246, 0.06); }
.sv-lines { position: absolute; left: 0; top: 0; overflow: visible; }
.sv-freeze { stroke: #2563eb; stroke-width: 1.3; stroke-dasharray: 5 3; }
</style>"#;

/// HTML serializer for reports
#[derive(Debug, Default)]
pub struct HtmlWriter {
    output: String,
}

impl HtmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize a report as a complete HTML document
    pub fn write(mut self, report: &Report) -> String {
        let title = escape_html(&report.title);
        self.line("<!doctype html>");
        self.line("<html>");
        self.line("<head>");
        self.line(r#"<meta charset="utf-8">"#);
        self.line(&format!("<title>{}</title>", title));
        self.line(STYLESHEET);
        self.line("</head>");
        self.line("<body>");
        self.line(r#"<main class="page">"#);
        self.line(&format!("<h1>{}</h1>", title));
        for section in &report.sections {
            self.write_section(section);
        }
        self.line("</main>");
        self.line("</body>");
        self.line("</html>");
        self.output
    }

    fn write_section(&mut self, section: &Section) {
        let level = section.level.clamp(2, 6);
        self.line(&format!(
            "<h{level}>{}</h{level}>",
            escape_html(&section.heading)
        ));
        for block in &section.blocks {
            self.write_block(block);
        }
    }

    fn write_block(&mut self, block: &Block) {
        match block {
            Block::Paragraph(text) => self.line(&format!("<p>{}</p>", escape_html(text))),
            Block::KeyValue(pairs) => {
                let mut table = Table::new(["key", "value"]);
                for (key, value) in pairs {
                    table.row([key.as_str(), value.as_str()]);
                }
                self.write_table(&table);
            }
            Block::Table(table) => self.write_table(table),
            Block::List(items) => {
                self.line("<ul>");
                for item in items {
                    self.line(&format!("<li>{}</li>", escape_html(item)));
                }
                self.line("</ul>");
            }
            Block::Code { language, text } => {
                self.line(&format!(
                    r#"<pre><code class="language-{}">{}</code></pre>"#,
                    escape_html(language),
                    escape_html(text.trim_end_matches('\n'))
                ));
            }
            Block::Html(html) => self.line(html.trim_end()),
            Block::Image { alt, uri } => {
                self.line(&format!(
                    r#"<p><img src="{}" alt="{}"></p>"#,
                    escape_html(uri),
                    escape_html(alt)
                ));
            }
        }
    }

    fn write_table(&mut self, table: &Table) {
        self.line(r#"<table class="simple">"#);
        let head: String = table
            .headers
            .iter()
            .map(|h| format!("<th>{}</th>", escape_html(h)))
            .collect();
        self.line(&format!("<thead><tr>{}</tr></thead>", head));
        self.line("<tbody>");
        for row in &table.rows {
            let cells: String = row
                .iter()
                .enumerate()
                .map(|(i, c)| match table.align.get(i) {
                    Some(Align::Right) => format!(r#"<td class="num">{}</td>"#, escape_html(c)),
                    _ => format!("<td>{}</td>", escape_html(c)),
                })
                .collect();
            self.line(&format!("<tr>{}</tr>", cells));
        }
        self.line("</tbody></table>");
    }

    fn line(&mut self, text: &str) {
        self.output.push_str(text);
        self.output.push('\n');
    }
}

/// Render a report as a standalone HTML document
pub fn to_html(report: &Report) -> String {
    HtmlWriter::new().write(report)
}

/// Escape text for HTML content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
