//! CSV options

/// Options for reading CSV files
#[derive(Debug, Clone)]
pub struct CsvReadOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quote character (default: double quote)
    pub quote: u8,
    /// Parse numeric-looking fields as numbers
    pub auto_detect_types: bool,
    /// Sheet name; `read_file` defaults it to the file stem
    pub sheet_name: Option<String>,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            auto_detect_types: true,
            sheet_name: None,
        }
    }
}
