//! styles.xml reading: number formats per cell style
//!
//! Cells reference a `cellXfs` entry by index (`s` attribute); each entry
//! names a `numFmtId` that is either built in or declared under `numFmts`.

use std::collections::HashMap;
use std::io::{BufReader, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use rag_sheets_core::NumberFormat;

/// Number formats indexed by cell style (`cellXfs`) position
#[derive(Debug, Clone)]
pub(crate) struct CellFormats {
    formats: Vec<NumberFormat>,
}

impl CellFormats {
    /// Formats used when a package has no styles part
    pub(crate) fn general_only() -> Self {
        Self {
            formats: vec![NumberFormat::General],
        }
    }

    /// Number format for a cell style index, `General` when out of range
    pub(crate) fn get(&self, style_index: u32) -> NumberFormat {
        self.formats
            .get(style_index as usize)
            .cloned()
            .unwrap_or_default()
    }
}

pub(crate) fn read_styles_xml<R: Read>(reader: R) -> XlsxResult<CellFormats> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut custom: HashMap<u32, String> = HashMap::new();
    let mut xf_ids: Vec<u32> = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => xf_ids.push(num_fmt_id(&e)),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"numFmt" => {
                    let mut id = None;
                    let mut code = None;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"numFmtId" => {
                                id = attr.unescape_value().ok().and_then(|s| s.parse().ok())
                            }
                            b"formatCode" => {
                                code = attr.unescape_value().ok().map(|s| s.to_string())
                            }
                            _ => {}
                        }
                    }
                    if let (Some(id), Some(code)) = (id, code) {
                        custom.insert(id, code);
                    }
                }
                b"xf" if in_cell_xfs => xf_ids.push(num_fmt_id(&e)),
                _ => {}
            },
            Ok(Event::End(e)) if e.name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    let formats: Vec<NumberFormat> = xf_ids
        .into_iter()
        .map(|id| match custom.get(&id) {
            Some(code) => NumberFormat::from_string(code.clone()),
            None => NumberFormat::from_id(id),
        })
        .collect();

    if formats.is_empty() {
        return Ok(CellFormats::general_only());
    }

    log::debug!(
        "styles.xml: {} cell styles, {} custom number formats",
        formats.len(),
        custom.len()
    );
    Ok(CellFormats { formats })
}

fn num_fmt_id(e: &BytesStart<'_>) -> u32 {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"numFmtId")
        .and_then(|attr| attr.unescape_value().ok().and_then(|s| s.parse().ok()))
        .unwrap_or(0)
}
