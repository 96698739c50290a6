//! Sparse cell storage
//!
//! Only cells that were actually written are stored, in row-major order, so
//! iteration walks the grid top-to-bottom, left-to-right.

use std::collections::BTreeMap;

use super::CellValue;

/// A stored cell: its value and the pool index of its number format
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellData {
    /// The cell's value
    pub value: CellValue,
    /// Index into the worksheet's format pool (0 = General)
    pub format_index: u32,
}

impl CellData {
    /// Create a new cell with a value and the General format
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            format_index: 0,
        }
    }

    /// Create a new cell with a value and format index
    pub fn with_format(value: CellValue, format_index: u32) -> Self {
        Self {
            value,
            format_index,
        }
    }
}

/// Row-major sparse cell map
#[derive(Debug, Clone, Default)]
pub struct CellStorage {
    rows: BTreeMap<u32, BTreeMap<u16, CellData>>,
    count: usize,
}

impl CellStorage {
    /// Create empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cell
    pub fn get(&self, row: u32, col: u16) -> Option<&CellData> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    /// Get a cell mutably, creating an empty one if absent
    pub fn get_or_create(&mut self, row: u32, col: u16) -> &mut CellData {
        let cells = self.rows.entry(row).or_default();
        if !cells.contains_key(&col) {
            self.count += 1;
        }
        cells.entry(col).or_default()
    }

    /// Insert or replace a cell
    pub fn set(&mut self, row: u32, col: u16, data: CellData) {
        if self.rows.entry(row).or_default().insert(col, data).is_none() {
            self.count += 1;
        }
    }

    /// Number of stored cells
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether no cells are stored
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Bounds of the stored cells as `(min_row, min_col, max_row, max_col)`
    pub fn used_bounds(&self) -> Option<(u32, u16, u32, u16)> {
        let min_row = *self.rows.keys().next()?;
        let max_row = *self.rows.keys().next_back()?;
        let (min_col, max_col) = self
            .rows
            .values()
            .filter_map(|cells| {
                let first = *cells.keys().next()?;
                let last = *cells.keys().next_back()?;
                Some((first, last))
            })
            .fold((u16::MAX, 0u16), |(lo, hi), (first, last)| {
                (lo.min(first), hi.max(last))
            });
        Some((min_row, min_col, max_row, max_col))
    }

    /// Iterate over stored cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.rows
            .iter()
            .flat_map(|(&row, cells)| cells.iter().map(move |(&col, data)| (row, col, data)))
    }
}
