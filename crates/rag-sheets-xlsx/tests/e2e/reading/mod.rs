//! Reading tests - verify the reader's interpretation of hand-built packages.

mod data_types;
mod merged_cells;
mod number_formats;
