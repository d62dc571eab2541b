//! Workbook manifest (`workbook.xml`) parsing.

use crate::config::{tag_matches, ReaderConfig};
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;
use std::path::Path;

/// One sheet entry declared by the workbook manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetDescriptor {
    /// Display name of the sheet (not necessarily unique)
    pub name: String,
    /// The `sheetId` attribute
    pub sheet_id: String,
    /// Relationship id pointing at the sheet part (e.g. "rId1")
    pub relationship_id: String,
}

/// Parse the manifest bytes into sheet descriptors, in declaration order.
///
/// A manifest without sheets is returned as an empty list; whether that is
/// acceptable is up to the caller.
pub fn parse_manifest(xml: &[u8], config: &ReaderConfig, path: &Path) -> Result<Vec<SheetDescriptor>> {
    let mut sheets = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if tag_matches(e.name().as_ref(), &config.prefix, &config.sheet_tag) =>
            {
                sheets.push(read_descriptor(e));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::invalid_format(
                    path,
                    format!(
                        "malformed workbook manifest at byte {}: {}",
                        reader.error_position(),
                        e
                    ),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    log::debug!("manifest declares {} sheets", sheets.len());
    Ok(sheets)
}

fn read_descriptor(e: &BytesStart<'_>) -> SheetDescriptor {
    let mut descriptor = SheetDescriptor {
        name: String::new(),
        sheet_id: String::new(),
        relationship_id: String::new(),
    };

    for attr in e.attributes().flatten() {
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        match attr.key.as_ref() {
            b"name" => descriptor.name = value,
            b"sheetId" => descriptor.sheet_id = value,
            // r:id, whatever the relationships namespace is bound to
            key if attr.key.local_name().as_ref() == b"id" && key.contains(&b':') => {
                descriptor.relationship_id = value
            }
            _ => {}
        }
    }

    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
          xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Zeta" sheetId="3" r:id="rId3"/>
    <sheet name="Alpha &amp; Co" sheetId="1" r:id="rId1"/>
    <sheet name="Zeta" sheetId="2" r:id="rId2"/>
  </sheets>
</workbook>"#;

    #[test]
    fn test_manifest_keeps_declaration_order() {
        let sheets =
            parse_manifest(WORKBOOK.as_bytes(), &ReaderConfig::default(), Path::new("a.xlsx"))
                .unwrap();
        let ids: Vec<&str> = sheets.iter().map(|s| s.sheet_id.as_str()).collect();
        assert_eq!(ids, ["3", "1", "2"]);
        assert_eq!(sheets[1].name, "Alpha & Co");
        assert_eq!(sheets[1].relationship_id, "rId1");
        // duplicate names are kept as separate descriptors
        assert_eq!(sheets[0].name, sheets[2].name);
    }

    #[test]
    fn test_manifest_without_sheets_is_empty() {
        let xml = br#"<workbook><sheets/></workbook>"#;
        let sheets = parse_manifest(xml, &ReaderConfig::default(), Path::new("a.xlsx")).unwrap();
        assert!(sheets.is_empty());
    }

    #[test]
    fn test_manifest_with_prefix() {
        let xml = br#"<x:workbook xmlns:x="urn:x" xmlns:r="urn:r"><x:sheets>
            <x:sheet name="Data" sheetId="1" r:id="rId7"/>
        </x:sheets></x:workbook>"#;
        let config = ReaderConfig::new().with_prefix("x");
        let sheets = parse_manifest(xml, &config, Path::new("a.xlsx")).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].relationship_id, "rId7");
    }

    #[test]
    fn test_malformed_manifest() {
        let xml = br#"<workbook><sheets><sheet name="A" sheetId="1" r:id="rId1"/></wrong></workbook>"#;
        let err = parse_manifest(xml, &ReaderConfig::default(), Path::new("bad.xlsx")).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat { .. }));
    }

    #[test]
    fn test_descriptor_serializes_to_json() {
        let descriptor = SheetDescriptor {
            name: "Data".to_string(),
            sheet_id: "1".to_string(),
            relationship_id: "rId1".to_string(),
        };
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Data", "sheet_id": "1", "relationship_id": "rId1"})
        );
    }
}
