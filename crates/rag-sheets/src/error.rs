//! Error types for the normalization engine

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the engine and its readers
#[derive(Debug, Error)]
pub enum Error {
    /// A chunking option was rejected before any work started
    #[error("Invalid option `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },

    /// A sheet's used range is too large to lay out as a grid
    #[error("Sheet '{sheet}' spans {rows} rows x {cols} columns, more than {limit} cells")]
    SheetTooLarge {
        sheet: String,
        rows: usize,
        cols: usize,
        limit: usize,
    },

    /// Workbook model error
    #[error(transparent)]
    Core(#[from] rag_sheets_core::Error),

    /// XLSX read error
    #[cfg(feature = "xlsx")]
    #[error("XLSX error: {0}")]
    Xlsx(#[from] rag_sheets_xlsx::XlsxError),

    /// CSV read error
    #[cfg(feature = "csv")]
    #[error("CSV error: {0}")]
    Csv(#[from] rag_sheets_csv::CsvError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File extension with no reader behind it
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Tokenizer backend failed to initialize
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),
}

impl Error {
    pub(crate) fn invalid_config<S: Into<String>>(field: &'static str, reason: S) -> Self {
        Error::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
