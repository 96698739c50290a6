//! Tests for resolving cell number formats through styles.xml.

use crate::{styles_with_formats, XlsxFixture};
use pretty_assertions::assert_eq;
use rag_sheets_core::{CellValue, NumberFormat};
use rag_sheets_xlsx::XlsxReader;

#[test]
fn test_builtin_and_custom_formats() {
    let styles = styles_with_formats(&[(164, "¥#,##0"), (165, "0.000E+00")], &[0, 10, 164, 165]);
    let package = XlsxFixture::new()
        .styles(&styles)
        .sheet(
            "Formats",
            r#"<row r="1">
                 <c r="A1"><v>42</v></c>
                 <c r="B1" s="1"><v>0.1234</v></c>
                 <c r="C1" s="2"><v>1000000</v></c>
                 <c r="D1" s="3"><v>12345.678</v></c>
               </row>"#,
        )
        .build();

    let workbook = XlsxReader::read(package).unwrap();
    let sheet = workbook.worksheet(0).unwrap();

    assert_eq!(sheet.number_format_at(0, 0), &NumberFormat::General);
    assert_eq!(sheet.number_format_at(0, 1).format_string(), "0.00%");
    assert_eq!(sheet.number_format_at(0, 2).format_string(), "¥#,##0");
    assert_eq!(sheet.number_format_at(0, 3).format_string(), "0.000E+00");
    assert_eq!(sheet.value_at(0, 1), &CellValue::Number(0.1234));
}

#[test]
fn test_unknown_style_index_falls_back_to_general() {
    let styles = styles_with_formats(&[], &[0]);
    let package = XlsxFixture::new()
        .styles(&styles)
        .sheet("S", r#"<row r="1"><c r="A1" s="9"><v>5</v></c></row>"#)
        .build();

    let workbook = XlsxReader::read(package).unwrap();
    assert_eq!(
        workbook.worksheet(0).unwrap().number_format_at(0, 0),
        &NumberFormat::General
    );
}
