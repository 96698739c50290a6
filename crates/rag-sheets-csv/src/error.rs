//! CSV error types

use thiserror::Error;

/// Result type for CSV operations
pub type CsvResult<T> = std::result::Result<T, CsvError>;

/// Errors that can occur while reading CSV input
#[derive(Debug, Error)]
pub enum CsvError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV library error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// More columns than a worksheet can hold
    #[error("Row {row} has {columns} columns, more than a worksheet allows")]
    TooManyColumns { row: usize, columns: usize },

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] rag_sheets_core::Error),
}
