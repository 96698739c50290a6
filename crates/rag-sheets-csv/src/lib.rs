//! # rag-sheets-csv
//!
//! CSV reader producing a single-sheet [`rag_sheets_core::Workbook`].

mod error;
mod options;
mod reader;

pub use error::{CsvError, CsvResult};
pub use options::CsvReadOptions;
pub use reader::CsvReader;
