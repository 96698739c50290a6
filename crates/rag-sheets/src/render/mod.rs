//! Output rendering
//!
//! The core decides *what* is said (banner, caption, labels, cell text);
//! a [`Renderer`] decides the markup around it.

mod html;
mod markdown;

use std::fmt;
use std::str::FromStr;

pub use html::HtmlRenderer;
pub use markdown::MarkdownRenderer;

use crate::assets::SharedAssets;
use crate::chunk::Chunk;
use crate::error::Error;
use crate::table::{DataRow, NormalizedTable};

/// Markup surrounding a chunk's rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkFrame {
    /// Everything before the first row
    pub head: String,
    /// Everything after the last row
    pub tail: String,
}

impl ChunkFrame {
    /// The frame with no rows in it; what the asset overhead measures
    pub fn text(&self) -> String {
        format!("{}{}", self.head, self.tail)
    }
}

/// Turns normalized tables and chunks into text
pub trait Renderer: Send + Sync {
    /// Format produced by this renderer
    fn format(&self) -> OutputFormat;

    /// Whole-sheet artifact, merged cells kept as spans
    fn render_table(&self, table: &NormalizedTable, assets: &SharedAssets) -> String;

    /// Join per-sheet artifacts into one document
    fn join_tables(&self, tables: &[String]) -> String;

    /// Head and tail of a chunk carrying `notes`
    fn chunk_frame(&self, assets: &SharedAssets, notes: &[&str]) -> ChunkFrame;

    /// One data row as it appears inside a chunk (merged values repeated)
    fn render_row(&self, row: &DataRow) -> String;

    /// A complete chunk: frame around its rows
    fn render_chunk(&self, chunk: &Chunk) -> String {
        let notes: Vec<&str> = chunk.notes.iter().map(String::as_str).collect();
        let frame = self.chunk_frame(&chunk.assets, &notes);

        let mut out = frame.head;
        for row in &chunk.rows {
            out.push_str(&self.render_row(row));
        }
        out.push_str(&frame.tail);
        out
    }
}

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Html,
    Markdown,
}

impl OutputFormat {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "md",
        }
    }

    /// Renderer for this format
    pub fn renderer(&self) -> Box<dyn Renderer> {
        match self {
            OutputFormat::Html => Box::new(HtmlRenderer),
            OutputFormat::Markdown => Box::new(MarkdownRenderer),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Html => f.write_str("html"),
            OutputFormat::Markdown => f.write_str("markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "html" | "htm" => Ok(OutputFormat::Html),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(Error::invalid_config(
                "format",
                format!("unknown output format '{other}' (expected html or markdown)"),
            )),
        }
    }
}
