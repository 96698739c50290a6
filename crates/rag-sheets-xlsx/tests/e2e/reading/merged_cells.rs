//! Tests for reading merge ranges.

use crate::XlsxFixture;
use pretty_assertions::assert_eq;
use rag_sheets_core::{CellRange, CellValue};
use rag_sheets_xlsx::XlsxReader;

#[test]
fn test_merged_regions_present() {
    let package = XlsxFixture::new()
        .shared_strings(&["<t>Finance</t>", "<t>HR</t>"])
        .sheet(
            "Budget",
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="C1" t="s"><v>1</v></c></row>"#,
        )
        .merge("A1:B1")
        .merge("C1:C2")
        .build();

    let workbook = XlsxReader::read(package).unwrap();
    let sheet = workbook.worksheet(0).unwrap();

    assert_eq!(
        sheet.merged_regions(),
        &[
            CellRange::parse("A1:B1").unwrap(),
            CellRange::parse("C1:C2").unwrap()
        ]
    );
    assert_eq!(sheet.value_at(0, 0), &CellValue::string("Finance"));
    // Covered cells hold no value of their own
    assert_eq!(sheet.value_at(0, 1), &CellValue::Empty);
    assert_eq!(sheet.dimensions(), (2, 3));
}

#[test]
fn test_overlapping_merge_is_dropped() {
    let package = XlsxFixture::new()
        .sheet("S", r#"<row r="1"><c r="A1"><v>1</v></c></row>"#)
        .merge("A1:B2")
        .merge("B2:C3")
        .build();

    let workbook = XlsxReader::read(package).unwrap();
    let sheet = workbook.worksheet(0).unwrap();
    assert_eq!(sheet.merged_regions().len(), 1);
}

#[test]
fn test_single_cell_merge_ignored() {
    let package = XlsxFixture::new()
        .sheet("S", r#"<row r="1"><c r="A1"><v>1</v></c></row>"#)
        .merge("A1")
        .build();

    let workbook = XlsxReader::read(package).unwrap();
    assert!(workbook.worksheet(0).unwrap().merged_regions().is_empty());
}
