//! Tests for cell value types: strings, numbers, dates, booleans, errors, formulas.

use crate::{styles_with_formats, XlsxFixture};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rag_sheets_core::{CellError, CellValue, DateSystem};
use rag_sheets_xlsx::XlsxReader;

#[test]
fn test_scalar_types() {
    let package = XlsxFixture::new()
        .shared_strings(&["<t>plain</t>", "<r><t>rich </t></r><r><rPr><b/></rPr><t>text</t></r>"])
        .sheet(
            "Types",
            r#"<row r="1">
                 <c r="A1" t="s"><v>0</v></c>
                 <c r="B1" t="s"><v>1</v></c>
                 <c r="C1" t="b"><v>1</v></c>
                 <c r="D1" t="e"><v>#DIV/0!</v></c>
                 <c r="E1" t="inlineStr"><is><t>inline</t></is></c>
                 <c r="F1"><v>3.5</v></c>
               </row>"#,
        )
        .build();

    let workbook = XlsxReader::read(package).unwrap();
    let sheet = workbook.worksheet(0).unwrap();

    assert_eq!(sheet.value_at(0, 0), &CellValue::string("plain"));
    assert_eq!(sheet.value_at(0, 1), &CellValue::string("rich text"));
    assert_eq!(sheet.value_at(0, 2), &CellValue::Boolean(true));
    assert_eq!(sheet.value_at(0, 3), &CellValue::Error(CellError::Div0));
    assert_eq!(sheet.value_at(0, 4), &CellValue::string("inline"));
    assert_eq!(sheet.value_at(0, 5), &CellValue::Number(3.5));
}

#[test]
fn test_phonetic_runs_ignored() {
    let package = XlsxFixture::new()
        .shared_strings(&["<t>東京</t><rPh sb=\"0\" eb=\"2\"><t>トウキョウ</t></rPh>"])
        .sheet("S", r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>"#)
        .build();

    let workbook = XlsxReader::read(package).unwrap();
    assert_eq!(
        workbook.worksheet(0).unwrap().value_at(0, 0),
        &CellValue::string("東京")
    );
}

#[test]
fn test_formula_uses_cached_value() {
    let package = XlsxFixture::new()
        .sheet(
            "Calc",
            r#"<row r="1">
                 <c r="A1"><f>1+1</f><v>2</v></c>
                 <c r="B1" t="str"><f>"a"&amp;"b"</f><v>ab</v></c>
                 <c r="C1"><f>NOW()</f></c>
               </row>"#,
        )
        .build();

    let workbook = XlsxReader::read(package).unwrap();
    let sheet = workbook.worksheet(0).unwrap();

    assert_eq!(sheet.value_at(0, 0), &CellValue::Number(2.0));
    assert_eq!(sheet.value_at(0, 1), &CellValue::string("ab"));
    assert_eq!(sheet.value_at(0, 2), &CellValue::Empty);
}

#[test]
fn test_date_formatted_numbers_become_datetimes() {
    let styles = styles_with_formats(&[(164, "yyyy-mm-dd hh:mm")], &[0, 14, 164]);
    let package = XlsxFixture::new()
        .styles(&styles)
        .sheet(
            "Dates",
            r#"<row r="1">
                 <c r="A1" s="1"><v>45292</v></c>
                 <c r="B1" s="2"><v>45292.75</v></c>
                 <c r="C1"><v>45292</v></c>
               </row>"#,
        )
        .build();

    let workbook = XlsxReader::read(package).unwrap();
    let sheet = workbook.worksheet(0).unwrap();
    let jan1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    assert_eq!(
        sheet.value_at(0, 0),
        &CellValue::DateTime(jan1.and_hms_opt(0, 0, 0).unwrap())
    );
    assert_eq!(
        sheet.value_at(0, 1),
        &CellValue::DateTime(jan1.and_hms_opt(18, 0, 0).unwrap())
    );
    assert_eq!(sheet.value_at(0, 2), &CellValue::Number(45292.0));
}

#[test]
fn test_date1904_workbook() {
    let styles = styles_with_formats(&[], &[0, 14]);
    let package = XlsxFixture::new()
        .date1904()
        .styles(&styles)
        .sheet("S", r#"<row r="1"><c r="A1" s="1"><v>0</v></c></row>"#)
        .build();

    let workbook = XlsxReader::read(package).unwrap();
    assert_eq!(workbook.settings().date_system, DateSystem::Excel1904);
    assert_eq!(
        workbook.worksheet(0).unwrap().value_at(0, 0),
        &CellValue::DateTime(
            NaiveDate::from_ymd_opt(1904, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        )
    );
}

#[test]
fn test_cells_without_references_are_placed_sequentially() {
    let package = XlsxFixture::new()
        .sheet(
            "S",
            r#"<row><c><v>1</v></c><c><v>2</v></c></row><row><c><v>3</v></c></row>"#,
        )
        .build();

    let workbook = XlsxReader::read(package).unwrap();
    let sheet = workbook.worksheet(0).unwrap();
    assert_eq!(sheet.value_at(0, 1), &CellValue::Number(2.0));
    assert_eq!(sheet.value_at(1, 0), &CellValue::Number(3.0));
}

#[test]
fn test_multiple_sheets_keep_order() {
    let package = XlsxFixture::new()
        .sheet("第一", r#"<row r="1"><c r="A1"><v>1</v></c></row>"#)
        .sheet("Second", r#"<row r="1"><c r="A1"><v>2</v></c></row>"#)
        .build();

    let workbook = XlsxReader::read(package).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["第一", "Second"]);
}
