//! Cell-related types
//!
//! - [`CellValue`] - The value stored in a cell
//! - [`CellAddress`] / [`CellRange`] - Locations in A1 notation
//! - [`CellData`] - Value plus number format index

mod address;
mod storage;
mod value;

pub use address::{CellAddress, CellRange};
pub use storage::{CellData, CellStorage};
pub use value::{CellError, CellValue, SharedString};
