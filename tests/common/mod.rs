//! Synthetic workbook packages for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Builds a minimal XLSX package part by part.
pub struct WorkbookBuilder {
    sheets: Vec<(String, String)>,
    styles: Option<String>,
    shared_strings: Option<String>,
}

impl WorkbookBuilder {
    pub fn new() -> Self {
        Self {
            sheets: Vec::new(),
            styles: None,
            shared_strings: None,
        }
    }

    /// Add a worksheet whose `<worksheet>` body is `body`.
    pub fn sheet(mut self, name: &str, body: &str) -> Self {
        self.sheets.push((name.to_string(), body.to_string()));
        self
    }

    /// Set the `<dxfs>` entries of styles.xml.
    pub fn dxfs<S: AsRef<str>>(mut self, dxfs: &[S]) -> Self {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );
        xml.push_str(&format!("<dxfs count=\"{}\">", dxfs.len()));
        for dxf in dxfs {
            xml.push_str(dxf.as_ref());
        }
        xml.push_str("</dxfs></styleSheet>");
        self.styles = Some(xml);
        self
    }

    pub fn shared_strings(mut self, strings: &[&str]) -> Self {
        let mut xml = String::from(
            r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );
        for s in strings {
            xml.push_str(&format!("<si><t>{}</t></si>", s));
        }
        xml.push_str("</sst>");
        self.shared_strings = Some(xml);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        let mut workbook = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
        );
        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (i, (name, _)) in self.sheets.iter().enumerate() {
            workbook.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                name,
                i + 1,
                i + 1
            ));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }
        workbook.push_str("</sheets></workbook>");
        rels.push_str("</Relationships>");

        zip.start_file("xl/workbook.xml", options).unwrap();
        zip.write_all(workbook.as_bytes()).unwrap();
        zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
        zip.write_all(rels.as_bytes()).unwrap();

        for (i, (_, body)) in self.sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)
                .unwrap();
            zip.write_all(
                format!(
                    r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">{}</worksheet>"#,
                    body
                )
                .as_bytes(),
            )
            .unwrap();
        }

        if let Some(styles) = &self.styles {
            zip.start_file("xl/styles.xml", options).unwrap();
            zip.write_all(styles.as_bytes()).unwrap();
        }
        if let Some(strings) = &self.shared_strings {
            zip.start_file("xl/sharedStrings.xml", options).unwrap();
            zip.write_all(strings.as_bytes()).unwrap();
        }

        zip.finish().unwrap().into_inner()
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.build()).unwrap();
    }
}

/// A `<dxf>` with a solid background fill.
pub fn fill_dxf(argb: &str) -> String {
    format!(
        r#"<dxf><fill><patternFill><bgColor rgb="{}"/></patternFill></fill></dxf>"#,
        argb
    )
}

/// A `<sheetData>` of inline-string cells, one `<row>` per slice.
pub fn sheet_data(rows: &[&[&str]]) -> String {
    let mut xml = String::from("<sheetData>");
    for (r, row) in rows.iter().enumerate() {
        xml.push_str(&format!("<row r=\"{}\">", r + 1));
        for value in row.iter() {
            xml.push_str(&format!(
                "<c t=\"inlineStr\"><is><t>{}</t></is></c>",
                value
            ));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");
    xml
}
