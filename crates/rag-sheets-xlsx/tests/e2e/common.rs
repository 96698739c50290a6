//! Common utilities for E2E tests.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

/// A worksheet part: `<sheetData>` rows and optional `<mergeCells>`
pub struct FixtureSheet {
    pub name: String,
    pub rows_xml: String,
    pub merges: Vec<String>,
}

/// Builder for a minimal XLSX package held in memory
#[derive(Default)]
pub struct XlsxFixture {
    sheets: Vec<FixtureSheet>,
    shared_strings: Vec<String>,
    styles_xml: Option<String>,
    date1904: bool,
}

impl XlsxFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet whose `<sheetData>` body is `rows_xml`
    pub fn sheet(mut self, name: &str, rows_xml: &str) -> Self {
        self.sheets.push(FixtureSheet {
            name: name.to_string(),
            rows_xml: rows_xml.to_string(),
            merges: Vec::new(),
        });
        self
    }

    /// Add a merge range to the most recently added sheet
    pub fn merge(mut self, range: &str) -> Self {
        if let Some(sheet) = self.sheets.last_mut() {
            sheet.merges.push(range.to_string());
        }
        self
    }

    /// Set the shared strings table (`<si>` bodies, already escaped)
    pub fn shared_strings(mut self, strings: &[&str]) -> Self {
        self.shared_strings = strings.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Set the full styles.xml content
    pub fn styles(mut self, xml: &str) -> Self {
        self.styles_xml = Some(xml.to_string());
        self
    }

    pub fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    /// Zip everything into an in-memory package
    pub fn build(&self) -> Cursor<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let options = SimpleFileOptions::default();

            let mut put = |name: &str, body: &str| {
                zip.start_file(name, options).unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            };

            put("[Content_Types].xml", CONTENT_TYPES);
            put("_rels/.rels", ROOT_RELS);
            put("xl/workbook.xml", &self.workbook_xml());
            put("xl/_rels/workbook.xml.rels", &self.workbook_rels());

            if !self.shared_strings.is_empty() {
                let items: String = self
                    .shared_strings
                    .iter()
                    .map(|s| format!("<si>{}</si>", s))
                    .collect();
                put(
                    "xl/sharedStrings.xml",
                    &format!(
                        r#"<?xml version="1.0" encoding="UTF-8"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">{1}</sst>"#,
                        self.shared_strings.len(),
                        items
                    ),
                );
            }

            if let Some(styles) = &self.styles_xml {
                put("xl/styles.xml", styles);
            }

            for (i, sheet) in self.sheets.iter().enumerate() {
                put(&format!("xl/worksheets/sheet{}.xml", i + 1), &sheet_xml(sheet));
            }

            zip.finish().unwrap();
        }
        buf.set_position(0);
        buf
    }

    fn workbook_xml(&self) -> String {
        let sheets: String = self
            .sheets
            .iter()
            .enumerate()
            .map(|(i, s)| {
                format!(
                    r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                    s.name,
                    i + 1,
                    i + 1
                )
            })
            .collect();
        let pr = if self.date1904 {
            r#"<workbookPr date1904="1"/>"#
        } else {
            "<workbookPr/>"
        };
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">{}<sheets>{}</sheets></workbook>"#,
            pr, sheets
        )
    }

    fn workbook_rels(&self) -> String {
        let rels: String = (0..self.sheets.len())
            .map(|i| {
                format!(
                    r#"<Relationship Id="rId{0}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{0}.xml"/>"#,
                    i + 1
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
            rels
        )
    }
}

fn sheet_xml(sheet: &FixtureSheet) -> String {
    let merges = if sheet.merges.is_empty() {
        String::new()
    } else {
        let cells: String = sheet
            .merges
            .iter()
            .map(|m| format!(r#"<mergeCell ref="{}"/>"#, m))
            .collect();
        format!(
            r#"<mergeCells count="{}">{}</mergeCells>"#,
            sheet.merges.len(),
            cells
        )
    };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData>{}</worksheet>"#,
        sheet.rows_xml, merges
    )
}

/// styles.xml with the given custom formats and one `cellXfs` entry per id
pub fn styles_with_formats(custom: &[(u32, &str)], xf_format_ids: &[u32]) -> String {
    let num_fmts: String = custom
        .iter()
        .map(|(id, code)| {
            format!(
                r#"<numFmt numFmtId="{}" formatCode="{}"/>"#,
                id,
                code.replace('&', "&amp;").replace('"', "&quot;")
            )
        })
        .collect();
    let xfs: String = xf_format_ids
        .iter()
        .map(|id| format!(r#"<xf numFmtId="{}" fontId="0" fillId="0" borderId="0"/>"#, id))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><numFmts count="{}">{}</numFmts><cellXfs count="{}">{}</cellXfs></styleSheet>"#,
        custom.len(),
        num_fmts,
        xf_format_ids.len(),
        xfs
    )
}
