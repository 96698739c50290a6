//! Markdown rendering

use super::{ChunkFrame, OutputFormat, Renderer};
use crate::assets::SharedAssets;
use crate::table::{DataRow, NormalizedTable, RowCell};

const SHEET_SEPARATOR: &str = "\n\n---\n\n";

/// Renders tables as pipe tables with HTML-comment metadata
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

/// Escape text for a pipe-table cell
///
/// Backslashes go first so the escapes added after them survive.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '|' | '*' | '_' | '`' | '[' | ']' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push(' '),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Keep text from closing an HTML comment early
fn comment_safe(text: &str) -> String {
    text.replace("-->", "- ->").replace(['\n', '\r'], " ")
}

impl MarkdownRenderer {
    fn metadata(assets: &SharedAssets, notes: &[&str]) -> String {
        let banner = &assets.banner;
        let mut context = format!("RAG Context: {} | Sheet: {}", banner.source, banner.sheet);
        if let Some(ts) = banner.generated_at {
            context.push_str(&format!(" | Generated: {}", ts.format("%Y-%m-%d %H:%M:%S")));
        }

        let mut lines = vec![format!("<!-- {} -->", comment_safe(&context))];
        if let Some(caption) = &assets.caption {
            lines.push(format!(
                "<!-- Keywords: {} -->",
                comment_safe(&caption.keywords.join(", "))
            ));
        }
        if !notes.is_empty() {
            lines.push(format!("<!-- Notes: {} -->", comment_safe(&notes.join(" | "))));
        }
        lines.join("\n")
    }

    fn header(columns: &[String]) -> String {
        let labels: Vec<String> = columns.iter().map(|c| escape_markdown(c)).collect();
        let separator = vec!["---"; columns.len()];
        format!("| {} |\n| {} |", labels.join(" | "), separator.join(" | "))
    }
}

impl Renderer for MarkdownRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }

    fn render_table(&self, table: &NormalizedTable, assets: &SharedAssets) -> String {
        let notes: Vec<&str> = table.notes.iter().map(|n| n.text.as_str()).collect();
        let mut out = self.chunk_frame(assets, &notes).head;
        for row in &table.rows {
            out.push_str(&self.render_row(row));
        }
        out
    }

    fn join_tables(&self, tables: &[String]) -> String {
        tables.join(SHEET_SEPARATOR)
    }

    fn chunk_frame(&self, assets: &SharedAssets, notes: &[&str]) -> ChunkFrame {
        ChunkFrame {
            head: format!(
                "{}\n\n{}",
                Self::metadata(assets, notes),
                Self::header(&assets.columns)
            ),
            tail: String::new(),
        }
    }

    fn render_row(&self, row: &DataRow) -> String {
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell| escape_markdown(RowCell::text(cell)))
            .collect();
        format!("\n| {} |", cells.join(" | "))
    }
}
