//! Worksheet type

use crate::cell::{CellAddress, CellData, CellRange, CellStorage, CellValue};
use crate::error::{Error, Result};
use crate::format::{FormatPool, NumberFormat};
use crate::{MAX_COLS, MAX_ROWS};

static EMPTY: CellValue = CellValue::Empty;

/// A worksheet: a sparse cell grid, its number formats and merge regions
#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    cells: CellStorage,
    formats: FormatPool,
    merged_regions: Vec<CellRange>,
}

impl Worksheet {
    /// Create a new empty worksheet
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: CellStorage::new(),
            formats: FormatPool::new(),
            merged_regions: Vec::new(),
        }
    }

    /// Get the worksheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    // === Cell access ===

    /// Get a cell by A1 address
    pub fn cell(&self, address: &str) -> Result<Option<&CellData>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_at(addr.row, addr.col))
    }

    /// Get a cell by 0-based row/column
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellData> {
        self.cells.get(row, col)
    }

    /// Get a cell value by 0-based row/column (`Empty` if unset)
    pub fn value_at(&self, row: u32, col: u16) -> &CellValue {
        self.cells.get(row, col).map(|c| &c.value).unwrap_or(&EMPTY)
    }

    /// Get the number format of a cell (`General` if unset)
    pub fn number_format_at(&self, row: u32, col: u16) -> &NumberFormat {
        let index = self.cells.get(row, col).map(|c| c.format_index).unwrap_or(0);
        self.formats.resolve(index)
    }

    /// Set a cell value by A1 address, keeping its number format
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Set a cell value by 0-based row/column, keeping its number format
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        self.validate_cell_position(row, col)?;
        self.cells.get_or_create(row, col).value = value.into();
        Ok(())
    }

    /// Set a cell's number format by A1 address
    pub fn set_number_format(&mut self, address: &str, format: NumberFormat) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_number_format_at(addr.row, addr.col, format)
    }

    /// Set a cell's number format by 0-based row/column
    pub fn set_number_format_at(&mut self, row: u32, col: u16, format: NumberFormat) -> Result<()> {
        self.validate_cell_position(row, col)?;
        let index = self.formats.get_or_insert(format);
        self.cells.get_or_create(row, col).format_index = index;
        Ok(())
    }

    /// Set value and number format together
    pub fn set_cell_with_format_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
        format: NumberFormat,
    ) -> Result<()> {
        self.validate_cell_position(row, col)?;
        let index = self.formats.get_or_insert(format);
        self.cells
            .set(row, col, CellData::with_format(value.into(), index));
        Ok(())
    }

    /// The sheet's number format pool
    pub fn formats(&self) -> &FormatPool {
        &self.formats
    }

    // === Merged cells ===

    /// Get all merged regions in registration order
    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merged_regions
    }

    /// Register a merged region
    ///
    /// Single-cell ranges are accepted and ignored. A range overlapping an
    /// existing region is rejected, so registered regions never overlap.
    pub fn merge_cells(&mut self, range: &CellRange) -> Result<()> {
        if range.is_single_cell() {
            return Ok(());
        }
        self.validate_cell_position(range.end.row, range.end.col)?;
        if let Some(existing) = self.merged_regions.iter().find(|r| r.overlaps(range)) {
            return Err(Error::MergedCellConflict {
                new: range.to_string(),
                existing: existing.to_string(),
            });
        }
        self.merged_regions.push(*range);
        Ok(())
    }

    /// Find the merged region containing a cell
    pub fn merged_region_at(&self, row: u32, col: u16) -> Option<&CellRange> {
        self.merged_regions.iter().find(|r| r.contains(row, col))
    }

    // === Dimensions ===

    /// Bounding range of stored cells and merge regions
    pub fn used_range(&self) -> Option<CellRange> {
        let cell_bounds = self
            .cells
            .used_bounds()
            .map(|(r0, c0, r1, c1)| CellRange::from_indices(r0, c0, r1, c1));

        self.merged_regions
            .iter()
            .copied()
            .chain(cell_bounds)
            .reduce(|a, b| {
                CellRange::from_indices(
                    a.start.row.min(b.start.row),
                    a.start.col.min(b.start.col),
                    a.end.row.max(b.end.row),
                    a.end.col.max(b.end.col),
                )
            })
    }

    /// Grid extent measured from A1, as `(row_count, col_count)`
    ///
    /// An empty sheet is `(0, 0)`.
    pub fn dimensions(&self) -> (u32, u16) {
        match self.used_range() {
            Some(range) => (range.end.row + 1, range.end.col + 1),
            None => (0, 0),
        }
    }

    /// Number of stored cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Whether the sheet has neither cells nor merge regions
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.merged_regions.is_empty()
    }

    /// Iterate over stored cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.cells.iter()
    }

    fn validate_cell_position(&self, row: u32, col: u16) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
        }
        Ok(())
    }
}
