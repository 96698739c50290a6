//! Prelude module - common imports for rag-sheets users
//!
//! ```rust
//! use rag_sheets::prelude::*;
//! ```

pub use crate::{
    CellValue,
    ChunkOptions,
    ChunkStats,
    ConversionContext,
    // Error types
    Error,
    NumberFormat,
    OutputFormat,
    // Pipeline
    Pipeline,
    PipelineOutput,
    Result,
    TokenEstimator,
    TokenStrategy,
    // Main types
    Workbook,
    // Extension traits
    WorkbookExt,
    Worksheet,
};
