//! # rag-sheets-xlsx
//!
//! XLSX (Office Open XML) reader producing a [`rag_sheets_core::Workbook`].

pub mod error;
pub mod reader;

mod styles;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
