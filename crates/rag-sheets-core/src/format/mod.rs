//! Number formats and their per-worksheet pool

mod number_format;
mod pool;

pub use number_format::NumberFormat;
pub use pool::FormatPool;
