//! Markdown writer
//!
//! Serializes a [`Report`] as GitHub-flavored Markdown. Tables use pipe
//! syntax with `|` escaped and newlines turned into `<br>`; code and HTML
//! blocks pass through untouched.

use crate::report::{Align, Block, Report, Section, Table};

/// Markdown serializer for reports
#[derive(Debug, Default)]
pub struct MarkdownWriter {
    output: String,
}

impl MarkdownWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize a report; the result ends with exactly one newline
    pub fn write(mut self, report: &Report) -> String {
        self.line(&format!("# {}", report.title));
        for section in &report.sections {
            self.write_section(section);
        }
        let mut text = self.output.trim_end().to_string();
        text.push('\n');
        text
    }

    fn write_section(&mut self, section: &Section) {
        let level = usize::from(section.level.clamp(2, 6));
        self.blank();
        self.line(&format!("{} {}", "#".repeat(level), section.heading));
        for block in &section.blocks {
            self.blank();
            self.write_block(block);
        }
    }

    fn write_block(&mut self, block: &Block) {
        match block {
            Block::Paragraph(text) => self.line(text),
            Block::KeyValue(pairs) => {
                self.line("| key | value |");
                self.line("|---|---|");
                for (key, value) in pairs {
                    self.line(&format!("| {} | {} |", escape_cell(key), escape_cell(value)));
                }
            }
            Block::Table(table) => self.write_table(table),
            Block::List(items) => {
                for item in items {
                    self.line(&format!("- {}", item.replace('\n', " ")));
                }
            }
            Block::Code { language, text } => {
                let fence = code_fence(text);
                self.line(&format!("{}{}", fence, language));
                self.line(text.trim_end_matches('\n'));
                self.line(&fence);
            }
            Block::Html(html) => self.line(html.trim_end()),
            Block::Image { alt, uri } => {
                self.line(&format!("![{}]({})", escape_alt(alt), uri));
            }
        }
    }

    fn write_table(&mut self, table: &Table) {
        let header: Vec<String> = table.headers.iter().map(|h| escape_cell(h)).collect();
        self.line(&format!("| {} |", header.join(" | ")));

        let rule: Vec<&str> = table
            .align
            .iter()
            .map(|a| match a {
                Align::Left => "---",
                Align::Right => "---:",
            })
            .collect();
        self.line(&format!("|{}|", rule.join("|")));

        for row in &table.rows {
            let cells: Vec<String> = row.iter().map(|c| escape_cell(c)).collect();
            self.line(&format!("| {} |", cells.join(" | ")));
        }
    }

    fn line(&mut self, text: &str) {
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn blank(&mut self) {
        self.output.push('\n');
    }
}

/// Render a report as Markdown
pub fn to_markdown(report: &Report) -> String {
    MarkdownWriter::new().write(report)
}

/// Escape text for a pipe-table cell
pub fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}

/// A backtick fence longer than any backtick run inside `text`
fn code_fence(text: &str) -> String {
    let longest = text
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

fn escape_alt(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}
