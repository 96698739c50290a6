//! Dense, formatted view of a worksheet

use rag_sheets_core::Worksheet;

use crate::error::{Error, Result};
use crate::format::format_cell;
use crate::merge::MergedRegionMap;

/// Largest grid (rows x columns) a sheet may span
pub const MAX_GRID_CELLS: usize = 5_000_000;

/// Every cell of a sheet rendered to text, indexed by 0-based row and column
///
/// The grid spans from A1 to the bottom-right corner of the used range, merge
/// regions included.
#[derive(Debug, Clone, Default)]
pub struct SheetGrid {
    rows: usize,
    cols: usize,
    cells: Vec<String>,
}

impl SheetGrid {
    /// Format every stored cell of a worksheet
    ///
    /// Fails with [`Error::SheetTooLarge`] when the used range spans more than
    /// [`MAX_GRID_CELLS`] cells, as a lone value far from the data does.
    pub fn from_worksheet(sheet: &Worksheet) -> Result<Self> {
        let (rows, cols) = sheet.dimensions();
        let (rows, cols) = (rows as usize, cols as usize);
        let size = rows
            .checked_mul(cols)
            .filter(|&size| size <= MAX_GRID_CELLS)
            .ok_or_else(|| Error::SheetTooLarge {
                sheet: sheet.name().to_string(),
                rows,
                cols,
                limit: MAX_GRID_CELLS,
            })?;
        let mut cells = vec![String::new(); size];

        for (row, col, data) in sheet.iter_cells() {
            let (row, col) = (row as usize, col as usize);
            if row < rows && col < cols {
                let format = sheet.formats().resolve(data.format_index);
                cells[row * cols + col] = format_cell(&data.value, format);
            }
        }

        Ok(Self { rows, cols, cells })
    }

    /// Build a grid from already rendered rows; short rows are padded
    pub fn from_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let row_count = rows.len();
        let mut cells = Vec::with_capacity(row_count * cols);
        for mut row in rows {
            row.resize(cols, String::new());
            cells.extend(row);
        }
        Self {
            rows: row_count,
            cols,
            cells,
        }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether the grid has no rows or no columns
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Rendered text of one cell (empty outside the grid)
    pub fn text(&self, row: usize, col: usize) -> &str {
        if row < self.rows && col < self.cols {
            &self.cells[row * self.cols + col]
        } else {
            ""
        }
    }

    /// Cell text as a reader sees it: merged cells show their origin's value
    pub fn resolved<'a>(&'a self, spans: &'a MergedRegionMap, row: usize, col: usize) -> &'a str {
        match spans.get(row, col) {
            Some(info) => info.value(),
            None => self.text(row, col),
        }
    }
}
