//! Workbook-level driver: normalize, extract assets, chunk, render

use log::{debug, info, warn};
use rag_sheets_core::{Workbook, Worksheet};
use serde::Serialize;

use crate::assets::{AssetExtractor, ConversionContext};
use crate::chunk::{ChunkSplitter, ChunkStats, ChunkWarning};
use crate::error::Result;
use crate::options::{ChunkBudget, ChunkOptions};
use crate::render::{OutputFormat, Renderer};
use crate::table::{NormalizedTable, TableAssembler};
use crate::token::{CharRatioEstimator, TokenEstimator};

/// Everything produced for one sheet
#[derive(Debug, Clone, PartialEq)]
pub struct SheetOutput {
    pub sheet_name: String,
    /// The normalized table model
    pub table: NormalizedTable,
    /// Whole-sheet rendering
    pub normalized: String,
    /// Rendered chunks, in order
    pub chunks: Vec<String>,
    pub stats: ChunkStats,
    pub warnings: Vec<ChunkWarning>,
}

/// A sheet the pipeline could not process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetFailure {
    pub sheet_name: String,
    pub reason: String,
}

/// Aggregate counts over a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub sheets: usize,
    pub failed_sheets: usize,
    pub data_rows: usize,
    pub notes: usize,
    pub chunks: usize,
    pub oversized_chunks: usize,
    pub max_token_count: usize,
}

/// Result of running a workbook through the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub format: OutputFormat,
    /// Non-empty sheets, in workbook order
    pub sheets: Vec<SheetOutput>,
    /// Sheets that failed; the rest of the workbook is still processed
    pub failures: Vec<SheetFailure>,
}

impl PipelineOutput {
    /// All sheets' normalized renderings as one document
    pub fn normalized_text(&self) -> String {
        let tables: Vec<String> = self.sheets.iter().map(|s| s.normalized.clone()).collect();
        self.format.renderer().join_tables(&tables)
    }

    /// Every chunk of every sheet, in order
    pub fn chunks(&self) -> impl Iterator<Item = &str> {
        self.sheets
            .iter()
            .flat_map(|s| s.chunks.iter().map(String::as_str))
    }

    /// Chunks joined with `separator` padded by blank lines
    pub fn joined_chunks(&self, separator: &str) -> String {
        let glue = format!("\n\n{separator}\n\n");
        self.chunks().collect::<Vec<_>>().join(&glue)
    }

    /// Counts across all sheets
    pub fn summary(&self) -> RunSummary {
        self.sheets.iter().fold(
            RunSummary {
                sheets: self.sheets.len(),
                failed_sheets: self.failures.len(),
                ..Default::default()
            },
            |mut acc, sheet| {
                acc.data_rows += sheet.table.rows.len();
                acc.notes += sheet.table.notes.len();
                acc.chunks += sheet.stats.total_chunks;
                acc.oversized_chunks += sheet.stats.oversized_chunks;
                acc.max_token_count = acc.max_token_count.max(sheet.stats.max_token_count);
                acc
            },
        )
    }
}

/// Configured conversion pipeline
///
/// Options are validated when the pipeline is built, so a misconfigured
/// budget is rejected before any sheet is touched.
///
/// ```
/// use rag_sheets::prelude::*;
///
/// let mut workbook = Workbook::new();
/// let sheet = workbook.worksheet_mut(0).unwrap();
/// sheet.set_cell_value("A1", "Name").unwrap();
/// sheet.set_cell_value("A2", "Ada").unwrap();
///
/// let pipeline = Pipeline::new(ChunkOptions::rows(8)).unwrap();
/// let output = pipeline.run(&workbook, &ConversionContext::new("people.xlsx"));
/// assert_eq!(output.chunks().count(), 1);
///
/// assert!(Pipeline::new(ChunkOptions::rows(0)).is_err());
/// ```
pub struct Pipeline {
    options: ChunkOptions,
    budget: ChunkBudget,
    assembler: TableAssembler,
    renderer: Box<dyn Renderer>,
    estimator: Box<dyn TokenEstimator>,
}

impl Pipeline {
    /// Validate options and build an HTML pipeline with the ratio estimator
    pub fn new(options: ChunkOptions) -> Result<Self> {
        let budget = options.budget()?;
        let estimator = CharRatioEstimator::new(options.token_ratio)?;
        Ok(Self {
            assembler: TableAssembler::new(options.max_header_scan_rows),
            budget,
            options,
            renderer: OutputFormat::default().renderer(),
            estimator: Box::new(estimator),
        })
    }

    /// Render in another format
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.renderer = format.renderer();
        self
    }

    /// Replace the token estimator
    pub fn with_estimator<E: TokenEstimator + 'static>(mut self, estimator: E) -> Self {
        self.estimator = Box::new(estimator);
        self
    }

    pub fn options(&self) -> &ChunkOptions {
        &self.options
    }

    pub fn budget(&self) -> ChunkBudget {
        self.budget
    }

    pub fn format(&self) -> OutputFormat {
        self.renderer.format()
    }

    /// Process one sheet; `None` when the sheet has no cells
    pub fn process_sheet(
        &self,
        sheet: &Worksheet,
        context: &ConversionContext,
    ) -> Result<Option<SheetOutput>> {
        let Some(table) = self.assembler.assemble(sheet)? else {
            return Ok(None);
        };
        let (assets, rows) = AssetExtractor::new(context).extract(&table);

        let normalized = self.renderer.render_table(&table, &assets);
        let splitter =
            ChunkSplitter::new(self.budget, self.estimator.as_ref(), self.renderer.as_ref());
        let result = splitter.split(rows, &assets);
        let chunks = result
            .chunks
            .iter()
            .map(|chunk| self.renderer.render_chunk(chunk))
            .collect();

        Ok(Some(SheetOutput {
            sheet_name: table.sheet_name.clone(),
            table,
            normalized,
            chunks,
            stats: result.stats,
            warnings: result.warnings,
        }))
    }

    /// Process every sheet of a workbook, skipping empty ones
    ///
    /// A sheet that fails is recorded in [`PipelineOutput::failures`] and the
    /// run moves on to the next one.
    pub fn run(&self, workbook: &Workbook, context: &ConversionContext) -> PipelineOutput {
        let mut sheets = Vec::with_capacity(workbook.sheet_count());
        let mut failures = Vec::new();
        for sheet in workbook.worksheets() {
            match self.process_sheet(sheet, context) {
                Ok(Some(output)) => sheets.push(output),
                Ok(None) => debug!("Skipped empty sheet '{}'", sheet.name()),
                Err(err) => {
                    warn!("Failed to process sheet '{}': {}", sheet.name(), err);
                    failures.push(SheetFailure {
                        sheet_name: sheet.name().to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        let output = PipelineOutput {
            format: self.format(),
            sheets,
            failures,
        };
        let summary = output.summary();
        info!(
            "{}: {} sheets, {} data rows, {} chunks ({} oversized)",
            context.source_name,
            summary.sheets,
            summary.data_rows,
            summary.chunks,
            summary.oversized_chunks
        );
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DEFAULT_SEPARATOR;
    use pretty_assertions::assert_eq;

    fn workbook() -> Workbook {
        let mut workbook = Workbook::new();
        let sheet = workbook.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", "Item").unwrap();
        sheet.set_cell_value("B1", "Qty").unwrap();
        for i in 0..5u32 {
            sheet.set_cell_value_at(i + 1, 0, format!("item{i}")).unwrap();
            sheet.set_cell_value_at(i + 1, 1, i as f64).unwrap();
        }
        workbook.add_worksheet_with_name("Empty").unwrap();
        workbook
    }

    #[test]
    fn test_run_skips_empty_sheets() {
        let pipeline = Pipeline::new(ChunkOptions::rows(2)).unwrap();
        let output = pipeline.run(&workbook(), &ConversionContext::new("w.xlsx"));

        assert_eq!(output.sheets.len(), 1);
        assert_eq!(output.sheets[0].chunks.len(), 3);
        assert_eq!(
            output.summary(),
            RunSummary {
                sheets: 1,
                failed_sheets: 0,
                data_rows: 5,
                notes: 0,
                chunks: 3,
                oversized_chunks: 0,
                max_token_count: output.sheets[0].stats.max_token_count,
            }
        );
    }

    #[test]
    fn test_joined_chunks() {
        let pipeline = Pipeline::new(ChunkOptions::rows(2))
            .unwrap()
            .with_format(OutputFormat::Markdown);
        let output = pipeline.run(&workbook(), &ConversionContext::new("w.xlsx"));

        let joined = output.joined_chunks(DEFAULT_SEPARATOR);
        assert_eq!(joined.matches("\n\n!!!_CHUNK_BREAK_!!!\n\n").count(), 2);
        assert!(joined.starts_with("<!-- RAG Context: w.xlsx | Sheet: Sheet1 -->"));
    }

    #[test]
    fn test_custom_estimator() {
        let pipeline = Pipeline::new(ChunkOptions::tokens(10))
            .unwrap()
            .with_estimator(|_: &str| 4usize);
        let output = pipeline.run(&workbook(), &ConversionContext::new("w.xlsx"));
        // 4 overhead + 4 per row: one row per chunk
        assert_eq!(output.sheets[0].stats.total_chunks, 5);
        assert_eq!(output.sheets[0].stats.token_counts, vec![8; 5]);
    }

    #[test]
    fn test_failed_sheet_does_not_stop_the_run() {
        let mut workbook = workbook();
        let idx = workbook.add_worksheet_with_name("Sparse").unwrap();
        let sparse = workbook.worksheet_mut(idx).unwrap();
        sparse.set_cell_value("A1", "Name").unwrap();
        sparse.set_cell_value("XFD1048576", "x").unwrap();

        let pipeline = Pipeline::new(ChunkOptions::rows(2)).unwrap();
        let output = pipeline.run(&workbook, &ConversionContext::new("w.xlsx"));

        assert_eq!(output.sheets.len(), 1);
        assert_eq!(output.failures.len(), 1);
        assert_eq!(output.failures[0].sheet_name, "Sparse");
        assert_eq!(output.summary().failed_sheets, 1);
    }

    #[test]
    fn test_rejects_bad_options() {
        let options = ChunkOptions {
            max_rows: Some(1),
            max_tokens: Some(1),
            ..Default::default()
        };
        assert!(Pipeline::new(options).is_err());
    }
}
