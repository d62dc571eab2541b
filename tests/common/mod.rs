//! Workbook fixtures built in memory for integration tests.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
</Types>"#;

struct SheetPart {
    name: String,
    relationship_id: String,
    xml: Option<String>,
}

/// Builder for a minimal `.xlsx` package.
pub struct WorkbookBuilder {
    sheets: Vec<SheetPart>,
    shared_strings: Option<Vec<String>>,
    relationships: bool,
    manifest: bool,
    compression: CompressionMethod,
}

impl WorkbookBuilder {
    pub fn new() -> Self {
        Self {
            sheets: Vec::new(),
            shared_strings: None,
            relationships: true,
            manifest: true,
            compression: CompressionMethod::Deflated,
        }
    }

    /// Add a sheet with a declared relationship and a part holding `xml`.
    pub fn sheet(mut self, name: &str, xml: impl Into<String>) -> Self {
        let id = format!("rId{}", self.sheets.len() + 1);
        self.sheets.push(SheetPart {
            name: name.to_string(),
            relationship_id: id,
            xml: Some(xml.into()),
        });
        self
    }

    /// Add a sheet whose relationship id is not declared anywhere.
    pub fn dangling_sheet(mut self, name: &str, relationship_id: &str) -> Self {
        self.sheets.push(SheetPart {
            name: name.to_string(),
            relationship_id: relationship_id.to_string(),
            xml: None,
        });
        self
    }

    pub fn shared_strings<S: Into<String>>(mut self, strings: impl IntoIterator<Item = S>) -> Self {
        self.shared_strings = Some(strings.into_iter().map(Into::into).collect());
        self
    }

    pub fn without_relationships(mut self) -> Self {
        self.relationships = false;
        self
    }

    pub fn without_manifest(mut self) -> Self {
        self.manifest = false;
        self
    }

    /// Store parts uncompressed; keeps large fixtures fast to build.
    pub fn stored(mut self) -> Self {
        self.compression = CompressionMethod::Stored;
        self
    }

    /// Write the package to `dir/name` and return its path.
    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        let options = SimpleFileOptions::default().compression_method(self.compression);

        let mut put = |part: &str, content: &str| {
            zip.start_file(part, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        };

        put("[Content_Types].xml", CONTENT_TYPES);
        if self.manifest {
            put("xl/workbook.xml", &self.manifest_xml());
        }
        if self.relationships {
            put("xl/_rels/workbook.xml.rels", &self.relationships_xml());
        }
        if let Some(strings) = &self.shared_strings {
            put("xl/sharedStrings.xml", &shared_strings_xml(strings));
        }
        for (idx, sheet) in self.sheets.iter().enumerate() {
            if let Some(xml) = &sheet.xml {
                put(&format!("xl/worksheets/sheet{}.xml", idx + 1), xml);
            }
        }

        zip.finish().unwrap();
        path
    }

    fn manifest_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
        );
        for (idx, sheet) in self.sheets.iter().enumerate() {
            xml.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="{}"/>"#,
                escape(&sheet.name),
                idx + 1,
                sheet.relationship_id
            ));
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn relationships_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (idx, sheet) in self.sheets.iter().enumerate() {
            if sheet.xml.is_some() {
                xml.push_str(&format!(
                    r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                    sheet.relationship_id,
                    idx + 1
                ));
            }
        }
        xml.push_str(r#"<Relationship Id="rIdStrings" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#);
        xml.push_str("</Relationships>");
        xml
    }
}

fn shared_strings_xml(strings: &[String]) -> String {
    let mut xml = String::with_capacity(strings.len() * 32 + 256);
    xml.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    ));
    for s in strings {
        xml.push_str("<si><t>");
        xml.push_str(&escape(s));
        xml.push_str("</t></si>");
    }
    xml.push_str("</sst>");
    xml
}

/// Wrap row markup into a worksheet part.
pub fn sheet_xml(rows: impl IntoIterator<Item = String>) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for row in rows {
        xml.push_str(&row);
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// A row whose cells all reference shared strings, starting at column A.
pub fn shared_row(row: usize, indices: &[usize]) -> String {
    let mut xml = format!(r#"<row r="{}">"#, row);
    for (col, idx) in indices.iter().enumerate() {
        xml.push_str(&format!(
            r#"<c r="{}{}" t="s"><v>{}</v></c>"#,
            column_name(col),
            row,
            idx
        ));
    }
    xml.push_str("</row>");
    xml
}

/// A row of inline string cells, starting at column A.
pub fn inline_row(row: usize, values: &[&str]) -> String {
    let mut xml = format!(r#"<row r="{}">"#, row);
    for (col, value) in values.iter().enumerate() {
        xml.push_str(&format!(
            r#"<c r="{}{}" t="inlineStr"><is><t>{}</t></is></c>"#,
            column_name(col),
            row,
            escape(value)
        ));
    }
    xml.push_str("</row>");
    xml
}

/// Column letters for a zero-based column index.
pub fn column_name(mut col: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    name.reverse();
    String::from_utf8(name).unwrap()
}

pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
