//! # rag-sheets-core
//!
//! Workbook model shared by the rag-sheets readers and the normalization engine.
//!
//! - [`CellValue`] - A cell's value (text, number, date/time, boolean, error)
//! - [`CellAddress`] and [`CellRange`] - A1 addressing and merge ranges
//! - [`NumberFormat`] - The display pattern attached to a cell
//! - [`Workbook`], [`Worksheet`] - The parsed document
//!
//! ## Example
//!
//! ```rust
//! use rag_sheets_core::{CellRange, NumberFormat, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_cell_value("A1", "Finance").unwrap();
//! sheet.merge_cells(&CellRange::parse("A1:B1").unwrap()).unwrap();
//! sheet.set_cell_value("A2", 0.1234).unwrap();
//! sheet.set_number_format("A2", NumberFormat::from_string("0.00%")).unwrap();
//!
//! assert_eq!(sheet.dimensions(), (2, 2));
//! ```

pub mod cell;
pub mod date;
pub mod error;
pub mod format;
pub mod workbook;
pub mod worksheet;

pub use cell::{CellAddress, CellData, CellError, CellRange, CellValue, SharedString};
pub use date::{serial_to_datetime, DateSystem};
pub use error::{Error, Result};
pub use format::{FormatPool, NumberFormat};
pub use workbook::{Workbook, WorkbookSettings};
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name, in characters
pub const MAX_SHEET_NAME_LEN: usize = 31;
