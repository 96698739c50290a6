//! XLSX reader
//!
//! Reads the parts of an Office Open XML package that carry table content:
//! shared strings, number formats, the sheet list and each worksheet's cells
//! and merge ranges. Formula cells keep their cached result; the formula text
//! itself is never surfaced.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::styles::{read_styles_xml, CellFormats};
use rag_sheets_core::{
    serial_to_datetime, CellAddress, CellError, CellRange, CellValue, DateSystem, NumberFormat,
    Workbook, Worksheet,
};

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// `_x000d_` is a carriage return, `_x000a_` a line feed, `_x005f_` a literal
/// underscore. Anything that is not a complete sequence is left untouched.
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find("_x") {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                result.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }

    result.push_str(rest);
    result
}

/// A sheet entry from workbook.xml
#[derive(Debug, Clone)]
struct SheetEntry {
    name: String,
    r_id: String,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let formats = Self::read_styles(&mut archive)?;
        let (sheets, date_system) = Self::read_workbook_xml(&mut archive)?;
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let mut workbook = Workbook::empty();
        workbook.settings_mut().date_system = date_system;

        for entry in &sheets {
            let Some(path) = sheet_paths.get(&entry.r_id) else {
                log::warn!(
                    "sheet '{}' has no worksheet relationship ({}), skipping",
                    entry.name,
                    entry.r_id
                );
                continue;
            };

            let mut worksheet = Worksheet::new(entry.name.as_str());
            Self::read_worksheet(
                &mut archive,
                path,
                &mut worksheet,
                &shared_strings,
                &formats,
                date_system,
            )?;
            log::debug!(
                "read sheet '{}': {} cells, {} merged regions",
                entry.name,
                worksheet.cell_count(),
                worksheet.merged_regions().len()
            );
            workbook.add_existing_worksheet(worksheet)?;
        }

        if workbook.is_empty() {
            return Err(XlsxError::InvalidFormat(
                "workbook contains no worksheets".into(),
            ));
        }

        Ok(workbook)
    }

    /// Read the shared strings table
    ///
    /// Rich-text runs are concatenated; phonetic runs (`rPh`) are dropped.
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings),
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => strings.push(String::new()),
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current));
                        current.clear();
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    if let Ok(text) = e.unescape() {
                        current.push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    fn read_styles<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> XlsxResult<CellFormats> {
        match archive.by_name("xl/styles.xml") {
            Ok(file) => read_styles_xml(file),
            Err(_) => Ok(CellFormats::general_only()),
        }
    }

    /// Read workbook.xml: sheet names with their relationship ids, and the date system
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<(Vec<SheetEntry>, DateSystem)> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();
        let mut date_system = DateSystem::Excel1900;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"sheet" => {
                        let name = attr_value(&e, b"name");
                        let r_id = attr_value(&e, b"r:id");
                        if let (Some(name), Some(r_id)) = (name, r_id) {
                            sheets.push(SheetEntry { name, r_id });
                        }
                    }
                    b"workbookPr" => {
                        if attr_value(&e, b"date1904").is_some_and(|v| is_truthy(&v)) {
                            date_system = DateSystem::Excel1904;
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok((sheets, date_system))
    }

    /// Read workbook.xml.rels to get worksheet part paths by relationship id
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let id = attr_value(&e, b"Id");
                    let target = attr_value(&e, b"Target");
                    let rel_type = attr_value(&e, b"Type");

                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            let full_path = match target.strip_prefix('/') {
                                Some(absolute) => absolute.to_string(),
                                None => format!("xl/{}", target),
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Read one worksheet part: cell values with their number formats, and merge ranges
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        worksheet: &mut Worksheet,
        shared_strings: &[String],
        formats: &CellFormats,
        date_system: DateSystem,
    ) -> XlsxResult<()> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut cell = PendingCell::default();
        let mut current_row: u32 = 0;
        let mut next_col: u16 = 0;
        let mut in_cell = false;
        let mut in_value = false;
        let mut in_inline_text = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"row" => {
                        if let Some(r) = attr_value(&e, b"r").and_then(|s| s.parse::<u32>().ok())
                        {
                            current_row = r.saturating_sub(1);
                        }
                        next_col = 0;
                    }
                    b"c" => {
                        in_cell = true;
                        cell = PendingCell::from_attrs(&e, current_row, next_col)?;
                        next_col = cell.address.col.saturating_add(1);
                    }
                    b"v" if in_cell => in_value = true,
                    b"t" if in_cell => in_inline_text = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"row" => {
                        if let Some(r) = attr_value(&e, b"r").and_then(|s| s.parse::<u32>().ok())
                        {
                            current_row = r.saturating_sub(1) + 1;
                        } else {
                            current_row += 1;
                        }
                        next_col = 0;
                    }
                    b"c" => {
                        let empty = PendingCell::from_attrs(&e, current_row, next_col)?;
                        next_col = empty.address.col.saturating_add(1);
                    }
                    b"mergeCell" => {
                        if let Some(reference) = attr_value(&e, b"ref") {
                            match CellRange::parse(&reference) {
                                Ok(range) => {
                                    if let Err(err) = worksheet.merge_cells(&range) {
                                        log::warn!("{}: ignoring merge {}: {}", path, range, err);
                                    }
                                }
                                Err(err) => {
                                    log::warn!("{}: bad merge ref '{}': {}", path, reference, err)
                                }
                            }
                        }
                    }
                    _ => {}
                },
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"row" => {
                        current_row += 1;
                        next_col = 0;
                    }
                    b"c" => {
                        let pending = std::mem::take(&mut cell);
                        pending.store(worksheet, shared_strings, formats, date_system)?;
                        in_cell = false;
                    }
                    b"v" => in_value = false,
                    b"t" => in_inline_text = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_value || in_inline_text => {
                    if let Ok(text) = e.unescape() {
                        if in_inline_text {
                            cell.inline.get_or_insert_with(String::new).push_str(&text);
                        } else {
                            cell.raw.get_or_insert_with(String::new).push_str(&text);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }
}

/// A `<c>` element being accumulated
#[derive(Debug, Default)]
struct PendingCell {
    address: CellAddress,
    cell_type: Option<String>,
    style_index: u32,
    /// Text of `<v>` (cached value for formula cells)
    raw: Option<String>,
    /// Text of `<is><t>` runs
    inline: Option<String>,
}

impl PendingCell {
    fn from_attrs(e: &BytesStart<'_>, row: u32, col: u16) -> XlsxResult<Self> {
        let address = match attr_value(e, b"r") {
            Some(reference) => CellAddress::parse(&reference).map_err(|err| {
                XlsxError::Parse(format!("Invalid cell reference '{}': {}", reference, err))
            })?,
            None => CellAddress::new(row, col),
        };

        Ok(Self {
            address,
            cell_type: attr_value(e, b"t"),
            style_index: attr_value(e, b"s")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            raw: None,
            inline: None,
        })
    }

    /// Convert and write the cell into the worksheet
    fn store(
        self,
        worksheet: &mut Worksheet,
        shared_strings: &[String],
        formats: &CellFormats,
        date_system: DateSystem,
    ) -> XlsxResult<()> {
        let format = formats.get(self.style_index);
        let value = match self.resolve_value(shared_strings, &format, date_system) {
            Some(value) => value,
            None => return Ok(()),
        };

        worksheet.set_cell_with_format_at(self.address.row, self.address.col, value, format)?;
        Ok(())
    }

    fn resolve_value(
        &self,
        shared_strings: &[String],
        format: &NumberFormat,
        date_system: DateSystem,
    ) -> Option<CellValue> {
        if let Some(text) = &self.inline {
            return Some(CellValue::string(decode_excel_escapes(text)));
        }

        let raw = self.raw.as_deref()?;
        let value = match self.cell_type.as_deref() {
            Some("s") => {
                let text = raw
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|idx| shared_strings.get(idx));
                match text {
                    Some(text) => CellValue::string(text.as_str()),
                    None => {
                        log::warn!(
                            "cell {}: shared string index '{}' out of range, skipping",
                            self.address,
                            raw
                        );
                        return None;
                    }
                }
            }
            Some("b") => CellValue::Boolean(is_truthy(raw)),
            Some("e") => CellError::parse(raw)
                .map(CellValue::Error)
                .unwrap_or_else(|| CellValue::string(raw)),
            Some("str") | Some("inlineStr") => CellValue::string(decode_excel_escapes(raw)),
            Some("d") => {
                let iso = raw.trim();
                match chrono::NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S").or_else(|_| {
                    chrono::NaiveDate::parse_from_str(iso, "%Y-%m-%d")
                        .map(|d| d.and_time(chrono::NaiveTime::MIN))
                }) {
                    Ok(dt) => CellValue::DateTime(dt),
                    Err(_) => CellValue::string(raw),
                }
            }
            None | Some("n") => match raw.trim().parse::<f64>() {
                Ok(n) if format.is_date_format() => serial_to_datetime(n, date_system)
                    .map(CellValue::DateTime)
                    .unwrap_or(CellValue::Number(n)),
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::string(raw),
            },
            Some(_) => CellValue::string(raw),
        };
        Some(value)
    }
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|s| s.to_string()))
}

fn is_truthy(s: &str) -> bool {
    matches!(s.trim(), "1" | "true" | "TRUE" | "True")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    #[test]
    fn test_decode_excel_escapes() {
        assert_eq!(decode_excel_escapes("hello_x000d_world"), "hello\rworld");
        assert_eq!(decode_excel_escapes("a_x000A__x0009_b"), "a\n\tb");
        assert_eq!(decode_excel_escapes("under_x005f_score"), "under_score");
        assert_eq!(decode_excel_escapes("plain text"), "plain text");
    }

    #[test]
    fn test_decode_excel_escapes_partial_sequence() {
        assert_eq!(decode_excel_escapes("_x00"), "_x00");
        assert_eq!(decode_excel_escapes("_x000d"), "_x000d");
        assert_eq!(decode_excel_escapes("_xZZZZ_"), "_xZZZZ_");
        assert_eq!(decode_excel_escapes("单价_x000a_元"), "单价\n元");
    }

    #[test]
    fn test_read_rejects_non_xlsx_zip() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            zip.start_file("hello.txt", SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"hi").unwrap();
            zip.finish().unwrap();
        }
        buf.set_position(0);

        let err = XlsxReader::read(buf).unwrap_err();
        assert!(matches!(err, XlsxError::InvalidFormat(_)));
    }

    #[test]
    fn test_read_rejects_garbage() {
        let err = XlsxReader::read(Cursor::new(b"not a zip".to_vec())).unwrap_err();
        assert!(matches!(err, XlsxError::Zip(_)));
    }
}
