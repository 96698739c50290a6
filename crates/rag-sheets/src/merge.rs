//! Merge region lookup
//!
//! [`MergedRegionMap`] resolves every merge region of a sheet once, so the
//! rest of the engine asks "what is at (row, col)" instead of re-deriving
//! merge semantics from ranges.

use std::collections::BTreeMap;

use log::warn;
use rag_sheets_core::{CellRange, SharedString};

/// Merge information for one cell
#[derive(Debug, Clone, PartialEq)]
pub enum SpanInfo {
    /// Top-left cell of a region; the only cell that carries the spans
    Origin {
        value: SharedString,
        row_span: usize,
        col_span: usize,
    },
    /// Any other cell of a region; rendered by its origin
    Covered {
        value: SharedString,
        origin_row: usize,
        origin_col: usize,
    },
}

impl SpanInfo {
    /// The origin's resolved value
    pub fn value(&self) -> &str {
        match self {
            SpanInfo::Origin { value, .. } | SpanInfo::Covered { value, .. } => value,
        }
    }

    /// Whether this is the region's origin cell
    pub fn is_origin(&self) -> bool {
        matches!(self, SpanInfo::Origin { .. })
    }

    /// Whether the cell must be left out of span-aware output
    pub fn skip(&self) -> bool {
        matches!(self, SpanInfo::Covered { .. })
    }

    /// Rows spanned (0 for covered cells)
    pub fn row_span(&self) -> usize {
        match self {
            SpanInfo::Origin { row_span, .. } => *row_span,
            SpanInfo::Covered { .. } => 0,
        }
    }

    /// Columns spanned (0 for covered cells)
    pub fn col_span(&self) -> usize {
        match self {
            SpanInfo::Origin { col_span, .. } => *col_span,
            SpanInfo::Covered { .. } => 0,
        }
    }
}

/// Row/column to [`SpanInfo`] lookup over a fixed grid
///
/// Only merged cells are stored; every other cell is absent.
#[derive(Debug, Clone, Default)]
pub struct MergedRegionMap {
    cells: BTreeMap<(usize, usize), SpanInfo>,
    regions: usize,
}

impl MergedRegionMap {
    /// Resolve merge regions over a `rows` x `cols` grid
    ///
    /// `cell_text` is asked once per region, for the origin cell. Regions are
    /// clipped to the grid. Single-cell regions are ignored, and a region
    /// overlapping one already mapped is dropped with a warning.
    pub fn build<F>(rows: usize, cols: usize, regions: &[CellRange], mut cell_text: F) -> Self
    where
        F: FnMut(usize, usize) -> String,
    {
        let mut map = Self::default();

        for range in regions {
            let top = range.start.row as usize;
            let left = range.start.col as usize;
            if top >= rows || left >= cols {
                continue;
            }
            let bottom = (range.end.row as usize).min(rows - 1);
            let right = (range.end.col as usize).min(cols - 1);
            if top == bottom && left == right {
                continue;
            }

            let claimed = map
                .cells
                .range((top, 0)..=(bottom, usize::MAX))
                .any(|(&(_, c), _)| (left..=right).contains(&c));
            if claimed {
                warn!("Skipping merge region {} overlapping an earlier region", range);
                continue;
            }

            let value = SharedString::new(cell_text(top, left));
            for r in top..=bottom {
                for c in left..=right {
                    let info = if r == top && c == left {
                        SpanInfo::Origin {
                            value: value.clone(),
                            row_span: bottom - top + 1,
                            col_span: right - left + 1,
                        }
                    } else {
                        SpanInfo::Covered {
                            value: value.clone(),
                            origin_row: top,
                            origin_col: left,
                        }
                    };
                    map.cells.insert((r, c), info);
                }
            }
            map.regions += 1;
        }

        map
    }

    /// Span info at a cell, `None` when the cell is not merged
    pub fn get(&self, row: usize, col: usize) -> Option<&SpanInfo> {
        self.cells.get(&(row, col))
    }

    /// Whether the cell is covered by another cell's region
    pub fn is_covered(&self, row: usize, col: usize) -> bool {
        self.get(row, col).is_some_and(SpanInfo::skip)
    }

    /// Number of regions mapped
    pub fn region_count(&self) -> usize {
        self.regions
    }

    /// Whether no region was mapped
    pub fn is_empty(&self) -> bool {
        self.regions == 0
    }

    /// Origin cells in row-major order
    pub fn origins(&self) -> impl Iterator<Item = (usize, usize, &SpanInfo)> {
        self.cells
            .iter()
            .filter(|(_, info)| info.is_origin())
            .map(|(&(row, col), info)| (row, col, info))
    }
}
