//! Normalized table model and its assembly from a worksheet

use log::debug;
use rag_sheets_core::{CellRange, Worksheet};

use crate::error::Result;
use crate::grid::SheetGrid;
use crate::header::{HeaderDepthDetector, HeaderFlattener};
use crate::merge::{MergedRegionMap, SpanInfo};
use crate::notes::{NoteExtractor, NoteScope, TableNote};

/// One cell of a data row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowCell {
    /// Unmerged cell
    Plain(String),
    /// Origin of a merge region
    Merged {
        text: String,
        row_span: usize,
        col_span: usize,
    },
    /// Cell hidden under a merge origin; `text` repeats the origin's value
    Covered { text: String },
}

impl RowCell {
    /// Text a reader sees in this cell
    pub fn text(&self) -> &str {
        match self {
            RowCell::Plain(text) | RowCell::Merged { text, .. } | RowCell::Covered { text } => text,
        }
    }

    /// Whether span-aware output leaves this cell out
    pub fn is_covered(&self) -> bool {
        matches!(self, RowCell::Covered { .. })
    }
}

/// A data row: one [`RowCell`] per column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRow {
    /// 0-based row index in the source sheet
    pub row: usize,
    /// Cells in column order
    pub cells: Vec<RowCell>,
}

impl DataRow {
    /// Cell texts joined with a space
    pub fn text(&self) -> String {
        self.cells
            .iter()
            .map(RowCell::text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A sheet reduced to one header row, data rows and footer notes
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    /// Source sheet name
    pub sheet_name: String,
    /// Number of sheet rows that formed the header
    pub header_row_count: usize,
    /// Flattened column labels, never empty
    pub columns: Vec<String>,
    /// Data rows in sheet order
    pub rows: Vec<DataRow>,
    /// Rows recognized as footer notes
    pub note_rows: Vec<DataRow>,
    /// Notes parsed from `note_rows`
    pub notes: Vec<TableNote>,
}

impl NormalizedTable {
    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Labels joined with a space, as matched against note references
    pub fn header_text(&self) -> String {
        self.columns.join(" ")
    }

    /// Notes attached to every chunk
    pub fn header_notes(&self) -> impl Iterator<Item = &TableNote> {
        self.notes.iter().filter(|n| n.scope == NoteScope::Header)
    }

    /// Notes attached only where referenced
    pub fn conditional_notes(&self) -> impl Iterator<Item = &TableNote> {
        self.notes
            .iter()
            .filter(|n| n.scope == NoteScope::Conditional)
    }
}

/// Builds a [`NormalizedTable`] from a sheet
#[derive(Debug, Clone, Copy, Default)]
pub struct TableAssembler {
    detector: HeaderDepthDetector,
}

impl TableAssembler {
    /// Assembler inspecting `max_header_scan_rows` rows for header depth
    pub fn new(max_header_scan_rows: usize) -> Self {
        Self {
            detector: HeaderDepthDetector::new(max_header_scan_rows),
        }
    }

    /// Normalize a worksheet; `None` when it has no rows or no columns
    ///
    /// Fails with [`Error::SheetTooLarge`](crate::Error::SheetTooLarge) when
    /// the used range cannot be laid out as a grid.
    pub fn assemble(&self, sheet: &Worksheet) -> Result<Option<NormalizedTable>> {
        let grid = SheetGrid::from_worksheet(sheet)?;
        Ok(self.assemble_grid(sheet.name(), &grid, sheet.merged_regions()))
    }

    /// Normalize an already formatted grid
    pub fn assemble_grid(
        &self,
        sheet_name: &str,
        grid: &SheetGrid,
        regions: &[CellRange],
    ) -> Option<NormalizedTable> {
        if grid.is_empty() {
            debug!("Sheet '{}' is empty, skipping", sheet_name);
            return None;
        }

        let spans = MergedRegionMap::build(grid.rows(), grid.cols(), regions, |r, c| {
            grid.text(r, c).to_string()
        });
        let header_row_count = self.detector.detect(grid, &spans);
        let columns = HeaderFlattener::flatten(grid, &spans, header_row_count);
        let footer = NoteExtractor::detect(grid, &spans, header_row_count);
        let notes = NoteExtractor::parse(&footer.texts, &columns);

        let mut rows = Vec::new();
        let mut note_rows = Vec::new();
        for row in header_row_count..grid.rows() {
            let data_row = build_row(grid, &spans, row, header_row_count);
            if footer.rows.contains(&row) {
                note_rows.push(data_row);
            } else {
                rows.push(data_row);
            }
        }

        debug!(
            "Sheet '{}': {}x{} grid, {} merge regions, {} header rows, {} data rows, {} notes",
            sheet_name,
            grid.rows(),
            grid.cols(),
            spans.region_count(),
            header_row_count,
            rows.len(),
            notes.len()
        );

        Some(NormalizedTable {
            sheet_name: sheet_name.to_string(),
            header_row_count,
            columns,
            rows,
            note_rows,
            notes,
        })
    }
}

fn build_row(
    grid: &SheetGrid,
    spans: &MergedRegionMap,
    row: usize,
    header_rows: usize,
) -> DataRow {
    let cells = (0..grid.cols())
        .map(|col| match spans.get(row, col) {
            Some(SpanInfo::Origin {
                value,
                row_span,
                col_span,
            }) => RowCell::Merged {
                text: value.to_string(),
                row_span: *row_span,
                col_span: *col_span,
            },
            // The origin sits in the header, so nothing in the body renders it
            Some(SpanInfo::Covered {
                value, origin_row, ..
            }) if *origin_row < header_rows => RowCell::Plain(value.to_string()),
            Some(SpanInfo::Covered { value, .. }) => RowCell::Covered {
                text: value.to_string(),
            },
            None => RowCell::Plain(grid.text(row, col).to_string()),
        })
        .collect();
    DataRow { row, cells }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rag_sheets_core::NumberFormat;

    fn sample_sheet() -> Worksheet {
        let mut sheet = Worksheet::new("Budget");
        for (addr, value) in [
            ("A1", "Dept"),
            ("B1", "Finance"),
            ("D1", "HR"),
            ("B2", "Revenue"),
            ("C2", "Expense"),
            ("D2", "Active"),
            ("A3", "North"),
            ("A5", "South"),
            ("A7", "注1：单位万元"),
        ] {
            sheet.set_cell_value(addr, value).unwrap();
        }
        sheet
            .set_cell_with_format_at(2, 1, 1200.0, NumberFormat::from_string("#,##0"))
            .unwrap();
        sheet.set_cell_value("C3", 0.5).unwrap();
        sheet.set_cell_value("D3", 7).unwrap();
        sheet.set_cell_value("B4", 3).unwrap();
        sheet.set_cell_value("B5", 4).unwrap();
        for range in ["A1:A2", "B1:C1", "A3:A4"] {
            sheet.merge_cells(&CellRange::parse(range).unwrap()).unwrap();
        }
        sheet
    }

    #[test]
    fn test_assemble() {
        let table = TableAssembler::default()
            .assemble(&sample_sheet())
            .unwrap()
            .unwrap();

        assert_eq!(table.sheet_name, "Budget");
        assert_eq!(table.header_row_count, 2);
        assert_eq!(
            table.columns,
            vec!["Dept", "Finance-Revenue", "Finance-Expense", "HR-Active"]
        );

        let texts: Vec<Vec<&str>> = table
            .rows
            .iter()
            .map(|r| r.cells.iter().map(RowCell::text).collect())
            .collect();
        assert_eq!(
            texts,
            vec![
                vec!["North", "1,200", "0.5", "7"],
                vec!["North", "3", "", ""],
                vec!["South", "4", "", ""],
                vec!["", "", "", ""],
            ]
        );

        assert_eq!(
            table.rows[0].cells[0],
            RowCell::Merged {
                text: "North".into(),
                row_span: 2,
                col_span: 1
            }
        );
        assert!(table.rows[1].cells[0].is_covered());
        assert_eq!(table.rows.iter().map(|r| r.row).collect::<Vec<_>>(), vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_notes_lifted_out() {
        let table = TableAssembler::default()
            .assemble(&sample_sheet())
            .unwrap()
            .unwrap();
        assert_eq!(table.note_rows.len(), 1);
        assert_eq!(table.note_rows[0].row, 6);
        assert_eq!(table.notes.len(), 1);
        assert_eq!(table.notes[0].keys, vec!["注1"]);
        assert_eq!(table.conditional_notes().count(), 1);
        assert_eq!(table.header_notes().count(), 0);
    }

    #[test]
    fn test_covered_by_header_origin_is_plain() {
        let grid = SheetGrid::from_rows(vec![vec!["Region", "Q1"], vec!["", "10"]]);
        let regions = vec![CellRange::parse("A1:A2").unwrap()];
        let table = TableAssembler::default()
            .assemble_grid("S", &grid, &regions)
            .unwrap();
        assert_eq!(table.header_row_count, 1);
        assert_eq!(table.rows[0].cells[0], RowCell::Plain("Region".into()));
    }

    #[test]
    fn test_empty_sheet_is_skipped() {
        assert!(TableAssembler::default()
            .assemble(&Worksheet::new("Empty"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_blank_row_between_data_is_kept() {
        let grid = SheetGrid::from_rows(vec![
            vec!["Name", "Score"],
            vec!["Ada", "90"],
            vec!["", ""],
            vec!["Bob", "85"],
        ]);
        let table = TableAssembler::default().assemble_grid("S", &grid, &[]).unwrap();

        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1].text(), " ");
        assert_eq!(table.rows.iter().map(|r| r.row).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_too_large_sheet_is_an_error() {
        let mut sheet = Worksheet::new("Sparse");
        sheet.set_cell_value("A1", "Name").unwrap();
        sheet.set_cell_value("XFD1048576", "x").unwrap();
        assert!(matches!(
            TableAssembler::default().assemble(&sheet),
            Err(crate::Error::SheetTooLarge { .. })
        ));
    }

    #[test]
    fn test_header_only_sheet() {
        let grid = SheetGrid::from_rows(vec![vec!["a", "b"]]);
        let table = TableAssembler::default().assemble_grid("S", &grid, &[]).unwrap();
        assert_eq!(table.columns, vec!["a", "b"]);
        assert!(table.rows.is_empty());
    }
}
