//! CSV reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;
use rag_sheets_core::workbook::INVALID_SHEET_CHARS;
use rag_sheets_core::{CellValue, Workbook, Worksheet, MAX_COLS, MAX_SHEET_NAME_LEN};

const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// CSV file reader
///
/// Every record, including the first, becomes a worksheet row; header
/// detection happens downstream on the grid.
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into a workbook whose only sheet is named after the file stem
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<Workbook> {
        let path = path.as_ref();
        let file = File::open(path)?;

        let mut options = options.clone();
        if options.sheet_name.is_none() {
            options.sheet_name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
        }
        Self::read(file, &options)
    }

    /// Read CSV from a reader into a single-sheet workbook
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<Workbook> {
        let name = options
            .sheet_name
            .as_deref()
            .map(sanitize_sheet_name)
            .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string());

        let worksheet = Self::read_worksheet(reader, options, &name)?;
        let mut workbook = Workbook::empty();
        workbook.add_existing_worksheet(worksheet)?;
        Ok(workbook)
    }

    fn read_worksheet<R: Read>(
        reader: R,
        options: &CsvReadOptions,
        name: &str,
    ) -> CsvResult<Worksheet> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut worksheet = Worksheet::new(name);

        for (row_idx, result) in csv_reader.records().enumerate() {
            let record = result?;
            if record.len() > MAX_COLS as usize {
                return Err(CsvError::TooManyColumns {
                    row: row_idx + 1,
                    columns: record.len(),
                });
            }

            for (col, field) in record.iter().enumerate() {
                let value = if options.auto_detect_types {
                    Self::detect_type(field)
                } else if field.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::string(field)
                };

                if !matches!(value, CellValue::Empty) {
                    worksheet.set_cell_value_at(row_idx as u32, col as u16, value)?;
                }
            }
        }

        log::debug!(
            "read csv sheet '{}': {} cells",
            worksheet.name(),
            worksheet.cell_count()
        );
        Ok(worksheet)
    }

    /// Detect the type of a field value
    ///
    /// Identifiers with leading zeros (`007`, `0123`) stay text.
    fn detect_type(field: &str) -> CellValue {
        let trimmed = field.trim();

        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        let digits = trimmed.trim_start_matches(['-', '+']);
        let leading_zero_id = digits.len() > 1
            && digits.starts_with('0')
            && !digits.starts_with("0.")
            && digits.chars().all(|c| c.is_ascii_digit());

        if !leading_zero_id {
            if let Ok(n) = trimmed.parse::<f64>() {
                if n.is_finite() {
                    return CellValue::Number(n);
                }
            }
        }

        CellValue::string(field)
    }
}

/// Make an arbitrary file stem acceptable as a sheet name
fn sanitize_sheet_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() {
        DEFAULT_SHEET_NAME.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_read_keeps_first_row_in_grid() {
        let data = "Name,Score\nAlice,90\nBob,\n";
        let workbook = CsvReader::read(data.as_bytes(), &CsvReadOptions::default()).unwrap();
        let sheet = workbook.worksheet(0).unwrap();

        assert_eq!(sheet.name(), "Sheet1");
        assert_eq!(sheet.value_at(0, 0), &CellValue::string("Name"));
        assert_eq!(sheet.value_at(1, 1), &CellValue::Number(90.0));
        assert_eq!(sheet.value_at(2, 1), &CellValue::Empty);
        assert_eq!(sheet.dimensions(), (3, 2));
    }

    #[test]
    fn test_detect_type() {
        assert_eq!(CsvReader::detect_type("3.5"), CellValue::Number(3.5));
        assert_eq!(CsvReader::detect_type("-12"), CellValue::Number(-12.0));
        assert_eq!(CsvReader::detect_type("0.5"), CellValue::Number(0.5));
        assert_eq!(CsvReader::detect_type("0"), CellValue::Number(0.0));
        assert_eq!(CsvReader::detect_type("007"), CellValue::string("007"));
        assert_eq!(CsvReader::detect_type("inf"), CellValue::string("inf"));
        assert_eq!(CsvReader::detect_type("  "), CellValue::Empty);
        assert_eq!(CsvReader::detect_type("备注"), CellValue::string("备注"));
    }

    #[test]
    fn test_semicolon_delimiter_and_ragged_rows() {
        let options = CsvReadOptions {
            delimiter: b';',
            ..Default::default()
        };
        let workbook = CsvReader::read("a;b;c\n1\n".as_bytes(), &options).unwrap();
        let sheet = workbook.worksheet(0).unwrap();
        assert_eq!(sheet.value_at(0, 2), &CellValue::string("c"));
        assert_eq!(sheet.value_at(1, 0), &CellValue::Number(1.0));
    }

    #[test]
    fn test_read_file_names_sheet_after_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales[2024].csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "region,amount").unwrap();
        writeln!(file, "north,10").unwrap();
        drop(file);

        let workbook = CsvReader::read_file(&path, &CsvReadOptions::default()).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["sales_2024_"]);
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("a/b"), "a_b");
        assert_eq!(sanitize_sheet_name("   "), "Sheet1");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40)).len(), MAX_SHEET_NAME_LEN);
    }
}
