//! # rag-sheets
//!
//! Turns spreadsheets into retrieval-ready text.
//!
//! A sheet is read into a [`Workbook`], normalized into a single-header
//! table (merged cells resolved, multi-level headers flattened, footer notes
//! lifted out) and split into chunks that each carry enough context to be
//! understood alone: source banner, retrieval keywords, the header row and
//! the notes its rows reference.
//!
//! ## Features
//!
//! - `xlsx` (default): read `.xlsx`/`.xlsm` files
//! - `csv` (default): read `.csv` files
//! - `tiktoken`: BPE token counting via `tiktoken-rs`
//!
//! ## Example
//!
//! ```rust
//! use rag_sheets::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", "Region").unwrap();
//! sheet.set_cell_value("B1", "Revenue").unwrap();
//! sheet.set_cell_value("A2", "North").unwrap();
//! sheet.set_cell_value("B2", 1200.0).unwrap();
//!
//! let pipeline = Pipeline::new(ChunkOptions::rows(8))
//!     .unwrap()
//!     .with_format(OutputFormat::Markdown);
//! let context = ConversionContext::new("sales.xlsx").with_keywords(["营收"]);
//! let output = pipeline.run(&workbook, &context);
//!
//! let chunk = output.chunks().next().unwrap();
//! assert!(chunk.contains("| Region | Revenue |"));
//! assert!(chunk.ends_with("| North | 1200 |"));
//! ```

pub mod assets;
pub mod chunk;
pub mod error;
pub mod format;
pub mod grid;
pub mod header;
pub mod merge;
pub mod notes;
pub mod options;
pub mod pipeline;
pub mod prelude;
pub mod render;
pub mod table;
pub mod token;

pub use assets::{AssetExtractor, Caption, ContextBanner, ConversionContext, SharedAssets};
pub use chunk::{Chunk, ChunkResult, ChunkSplitter, ChunkStats, ChunkWarning};
pub use error::{Error, Result};
pub use format::format_cell;
pub use header::{HeaderDepthDetector, HeaderFlattener};
pub use merge::{MergedRegionMap, SpanInfo};
pub use notes::{NoteExtractor, NoteScope, TableNote};
pub use options::{ChunkBudget, ChunkOptions, TokenStrategy};
pub use pipeline::{Pipeline, PipelineOutput, RunSummary, SheetFailure, SheetOutput};
pub use render::{HtmlRenderer, MarkdownRenderer, OutputFormat, Renderer};
pub use table::{DataRow, NormalizedTable, RowCell, TableAssembler};
pub use token::{CharRatioEstimator, TokenEstimator};

#[cfg(feature = "tiktoken")]
pub use token::TiktokenEstimator;

// Re-export the workbook model
pub use rag_sheets_core::{CellRange, CellValue, NumberFormat, Workbook, Worksheet};

#[cfg(feature = "csv")]
pub use rag_sheets_csv::{CsvReadOptions, CsvReader};
#[cfg(feature = "xlsx")]
pub use rag_sheets_xlsx::XlsxReader;

use std::path::Path;

/// Extension trait for Workbook to add file input
pub trait WorkbookExt {
    /// Open a workbook, picking the reader from the file extension
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook>;
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            #[cfg(feature = "xlsx")]
            Some("xlsx") | Some("xlsm") => Ok(XlsxReader::read_file(path)?),
            #[cfg(feature = "csv")]
            Some("csv") => Ok(CsvReader::read_file(path, &CsvReadOptions::default())?),
            _ => Err(Error::UnsupportedFormat(path.display().to_string())),
        }
    }
}
