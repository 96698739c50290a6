//! Number format pool for deduplication

use super::NumberFormat;
use ahash::AHashMap;

/// Pool of distinct number formats referenced by cells
///
/// Most cells of a sheet share a handful of formats. Cells store a `u32`
/// index into the pool; index 0 is always [`NumberFormat::General`].
#[derive(Debug, Clone)]
pub struct FormatPool {
    formats: Vec<NumberFormat>,
    index_map: AHashMap<NumberFormat, u32>,
}

impl FormatPool {
    /// Create a new pool with `General` at index 0
    pub fn new() -> Self {
        let mut pool = Self {
            formats: Vec::with_capacity(16),
            index_map: AHashMap::with_capacity(16),
        };
        pool.formats.push(NumberFormat::General);
        pool.index_map.insert(NumberFormat::General, 0);
        pool
    }

    /// Get or create a format, returning its index
    pub fn get_or_insert(&mut self, format: NumberFormat) -> u32 {
        if let Some(&idx) = self.index_map.get(&format) {
            return idx;
        }

        let idx = self.formats.len() as u32;
        self.index_map.insert(format.clone(), idx);
        self.formats.push(format);
        idx
    }

    /// Get a format by index
    pub fn get(&self, index: u32) -> Option<&NumberFormat> {
        self.formats.get(index as usize)
    }

    /// Get a format by index, falling back to `General` for unknown indices
    pub fn resolve(&self, index: u32) -> &NumberFormat {
        self.get(index).unwrap_or(&self.formats[0])
    }

    /// Number of distinct formats
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    /// The pool always holds `General`, so it is never empty
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for FormatPool {
    fn default() -> Self {
        Self::new()
    }
}
