//! HTML rendering

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use super::{ChunkFrame, OutputFormat, Renderer};
use crate::assets::SharedAssets;
use crate::notes::{NoteScope, TableNote};
use crate::table::{DataRow, NormalizedTable, RowCell};

const ROW_INDENT: &str = "        ";
const CELL_INDENT: &str = "            ";

/// Renders tables as indented HTML
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

#[derive(Serialize)]
struct NotesMeta<'a> {
    header_notes: BTreeMap<&'a str, &'a str>,
    conditional_notes: BTreeMap<&'a str, &'a str>,
}

/// Escape text for element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

impl HtmlRenderer {
    fn context_div(assets: &SharedAssets, notes: &[&str]) -> String {
        let mut text = assets.banner.text();
        if !notes.is_empty() {
            text.push_str(" 【表格注释】");
            text.push_str(&notes.join(" | "));
        }
        format!("<div class=\"rag-context\">{}</div>", escape_html(&text))
    }

    fn notes_meta(notes: &[TableNote]) -> String {
        let mut meta = NotesMeta {
            header_notes: BTreeMap::new(),
            conditional_notes: BTreeMap::new(),
        };
        for note in notes {
            let target = match note.scope {
                NoteScope::Header => &mut meta.header_notes,
                NoteScope::Conditional => &mut meta.conditional_notes,
            };
            for key in &note.keys {
                target.insert(key.as_str(), note.text.as_str());
            }
        }
        // Serializing string maps cannot fail
        let json = serde_json::to_string(&meta).unwrap_or_default();
        format!(
            "<script type=\"application/json\" class=\"table-notes-meta\">{}</script>",
            json.replace("</", "<\\/")
        )
    }

    /// Table open tag through the opening `<tbody>`
    fn table_head(assets: &SharedAssets) -> String {
        let mut out = format!(
            "<table border=\"1\" style=\"border-collapse:collapse\" data-source=\"{}\" data-sheet=\"{}\">",
            escape_html(&assets.banner.source),
            escape_html(&assets.banner.sheet)
        );
        if let Some(caption) = &assets.caption {
            let _ = write!(out, "\n    <caption>{}</caption>", escape_html(&caption.text()));
        }
        out.push_str("\n    <thead>\n");
        out.push_str(ROW_INDENT);
        out.push_str("<tr>");
        for label in &assets.columns {
            let _ = write!(out, "\n{CELL_INDENT}<th>{}</th>", escape_html(label));
        }
        let _ = write!(out, "\n{ROW_INDENT}</tr>\n    </thead>\n    <tbody>");
        out
    }

    /// A row with merged cells as spans and covered cells left out
    fn span_row(row: &DataRow, class: Option<&str>) -> String {
        let mut out = match class {
            Some(class) => format!("\n{ROW_INDENT}<tr class=\"{class}\">"),
            None => format!("\n{ROW_INDENT}<tr>"),
        };
        for cell in &row.cells {
            match cell {
                RowCell::Covered { .. } => {}
                RowCell::Plain(text) => {
                    let _ = write!(out, "\n{CELL_INDENT}<td>{}</td>", escape_html(text));
                }
                RowCell::Merged {
                    text,
                    row_span,
                    col_span,
                } => {
                    let mut attrs = String::new();
                    if *row_span > 1 {
                        let _ = write!(attrs, " rowspan=\"{row_span}\"");
                    }
                    if *col_span > 1 {
                        let _ = write!(attrs, " colspan=\"{col_span}\"");
                    }
                    let _ = write!(out, "\n{CELL_INDENT}<td{attrs}>{}</td>", escape_html(text));
                }
            }
        }
        let _ = write!(out, "\n{ROW_INDENT}</tr>");
        out
    }
}

impl Renderer for HtmlRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Html
    }

    fn render_table(&self, table: &NormalizedTable, assets: &SharedAssets) -> String {
        let mut out = Self::context_div(assets, &[]);
        if !table.notes.is_empty() {
            out.push('\n');
            out.push_str(&Self::notes_meta(&table.notes));
        }
        out.push('\n');
        out.push_str(&Self::table_head(assets));
        for row in &table.rows {
            out.push_str(&Self::span_row(row, None));
        }
        for row in &table.note_rows {
            out.push_str(&Self::span_row(row, Some("table-note-row")));
        }
        out.push_str("\n    </tbody>\n</table>");
        out
    }

    fn join_tables(&self, tables: &[String]) -> String {
        tables.join("\n")
    }

    fn chunk_frame(&self, assets: &SharedAssets, notes: &[&str]) -> ChunkFrame {
        ChunkFrame {
            head: format!(
                "<div>\n{}\n{}",
                Self::context_div(assets, notes),
                Self::table_head(assets)
            ),
            tail: "\n    </tbody>\n</table>\n</div>".to_string(),
        }
    }

    fn render_row(&self, row: &DataRow) -> String {
        let mut out = format!("\n{ROW_INDENT}<tr>");
        for cell in &row.cells {
            let text = escape_html(cell.text());
            if cell.is_covered() {
                let _ = write!(out, "\n{CELL_INDENT}<td class=\"span-fill\">{text}</td>");
            } else {
                let _ = write!(out, "\n{CELL_INDENT}<td>{text}</td>");
            }
        }
        let _ = write!(out, "\n{ROW_INDENT}</tr>");
        out
    }
}
