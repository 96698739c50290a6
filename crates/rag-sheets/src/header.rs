//! Header depth inference and flattening

use crate::grid::SheetGrid;
use crate::merge::MergedRegionMap;
use crate::options::DEFAULT_HEADER_SCAN_ROWS;

/// Positional label for a column with no header text (0-based index in,
/// 1-based label out)
pub fn column_placeholder(col: usize) -> String {
    format!("Column{}", col + 1)
}

/// Infers how many leading rows form the header
///
/// A row holding a horizontally merged cell is a parent header row: the row
/// below it is still part of the header. Content alone cannot tell header
/// text from data text, so nothing else is considered.
#[derive(Debug, Clone, Copy)]
pub struct HeaderDepthDetector {
    max_scan_rows: usize,
}

impl Default for HeaderDepthDetector {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER_SCAN_ROWS)
    }
}

impl HeaderDepthDetector {
    /// Detector inspecting at most `max_scan_rows` leading rows
    pub fn new(max_scan_rows: usize) -> Self {
        Self { max_scan_rows }
    }

    /// Number of header rows, between 1 and the grid's row count
    ///
    /// An empty grid has no header (0).
    pub fn detect(&self, grid: &SheetGrid, spans: &MergedRegionMap) -> usize {
        let total = grid.rows();
        if total == 0 {
            return 0;
        }

        let scan = self.max_scan_rows.min(total);
        let mut depth = 1;
        for row in 0..scan {
            let is_parent = (0..grid.cols())
                .filter_map(|col| spans.get(row, col))
                .any(|info| info.col_span() > 1);
            if is_parent {
                depth = depth.max(row + 2);
            }
        }
        depth.min(total)
    }
}

/// Collapses a multi-row header into one label per column
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderFlattener;

impl HeaderFlattener {
    /// Flatten the first `header_rows` rows into column labels
    ///
    /// Labels are never empty: a column without header text gets
    /// [`column_placeholder`]. With several header rows the non-empty values
    /// are joined with `-`, skipping a value equal to the one kept before it,
    /// so a parent spanning its children appears once.
    pub fn flatten(grid: &SheetGrid, spans: &MergedRegionMap, header_rows: usize) -> Vec<String> {
        (0..grid.cols())
            .map(|col| {
                let mut parts: Vec<&str> = Vec::with_capacity(header_rows);
                for row in 0..header_rows.min(grid.rows()) {
                    let value = grid.resolved(spans, row, col).trim();
                    if value.is_empty() || parts.last() == Some(&value) {
                        continue;
                    }
                    parts.push(value);
                }

                if parts.is_empty() {
                    column_placeholder(col)
                } else {
                    parts.join("-")
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rag_sheets_core::CellRange;

    fn spans(grid: &SheetGrid, ranges: &[&str]) -> MergedRegionMap {
        let ranges: Vec<CellRange> = ranges.iter().map(|r| CellRange::parse(r).unwrap()).collect();
        MergedRegionMap::build(grid.rows(), grid.cols(), &ranges, |r, c| {
            grid.text(r, c).to_string()
        })
    }

    #[test]
    fn test_two_level_header() {
        let grid = SheetGrid::from_rows(vec![
            vec!["Finance", "", "HR"],
            vec!["Revenue", "Expense", "Active"],
            vec!["1", "2", "3"],
        ]);
        let map = spans(&grid, &["A1:B1"]);

        let depth = HeaderDepthDetector::default().detect(&grid, &map);
        assert_eq!(depth, 2);
        assert_eq!(
            HeaderFlattener::flatten(&grid, &map, depth),
            vec!["Finance-Revenue", "Finance-Expense", "HR-Active"]
        );
    }

    #[test]
    fn test_repeated_values_without_merge() {
        let grid = SheetGrid::from_rows(vec![
            vec!["Finance", "Finance", "HR"],
            vec!["Revenue", "Expense", "Active"],
        ]);
        assert_eq!(
            HeaderFlattener::flatten(&grid, &MergedRegionMap::default(), 2),
            vec!["Finance-Revenue", "Finance-Expense", "HR-Active"]
        );
    }

    #[test]
    fn test_vertical_merge_not_repeated() {
        let grid = SheetGrid::from_rows(vec![
            vec!["Name", "Score", ""],
            vec!["", "Math", "Art"],
        ]);
        let map = spans(&grid, &["A1:A2", "B1:C1"]);
        assert_eq!(
            HeaderFlattener::flatten(&grid, &map, 2),
            vec!["Name", "Score-Math", "Score-Art"]
        );
    }

    #[test]
    fn test_single_row_placeholders() {
        let grid = SheetGrid::from_rows(vec![vec![" id ", "", "  "], vec!["1", "2", "3"]]);
        let map = MergedRegionMap::default();
        assert_eq!(HeaderDepthDetector::default().detect(&grid, &map), 1);
        assert_eq!(
            HeaderFlattener::flatten(&grid, &map, 1),
            vec!["id", "Column2", "Column3"]
        );
    }

    #[test]
    fn test_depth_clamped_to_rows() {
        let grid = SheetGrid::from_rows(vec![vec!["Title", ""]]);
        let map = spans(&grid, &["A1:B1"]);
        assert_eq!(HeaderDepthDetector::default().detect(&grid, &map), 1);
    }

    #[test]
    fn test_scan_limit() {
        let mut rows = vec![vec!["a", "b"]; 8];
        rows[6] = vec!["Group", ""];
        let grid = SheetGrid::from_rows(rows);
        let map = spans(&grid, &["A7:B7"]);
        assert_eq!(HeaderDepthDetector::default().detect(&grid, &map), 1);
        assert_eq!(HeaderDepthDetector::new(8).detect(&grid, &map), 8);
    }

    #[test]
    fn test_empty_grid() {
        let grid = SheetGrid::default();
        assert_eq!(
            HeaderDepthDetector::default().detect(&grid, &MergedRegionMap::default()),
            0
        );
    }
}
