//! Locating and extracting a sheet part.

use super::manifest::SheetDescriptor;
use super::relationships::RelationshipMap;
use crate::config::ReaderConfig;
use crate::container::{Package, ScratchStream};
use crate::error::{Error, Result};

/// Internal path of the part holding `sheet`'s rows.
///
/// Fails with `MissingRelationship` when the sheet's relationship id is not in
/// `relationships`.
pub fn sheet_part_path(
    package: &Package,
    sheet: &SheetDescriptor,
    relationships: &RelationshipMap,
    config: &ReaderConfig,
) -> Result<String> {
    relationships
        .part_path(&sheet.relationship_id, &config.root_segment)
        .ok_or_else(|| Error::MissingRelationship {
            path: package.path().to_path_buf(),
            sheet: sheet.name.clone(),
            relationship_id: sheet.relationship_id.clone(),
        })
}

/// Copy `sheet`'s part out of the package into a scratch stream.
pub fn extract_sheet(
    package: &Package,
    sheet: &SheetDescriptor,
    relationships: &RelationshipMap,
    config: &ReaderConfig,
) -> Result<ScratchStream> {
    let part = sheet_part_path(package, sheet, relationships, config)?;
    log::debug!("sheet '{}' resolves to {}", sheet.name, part);
    package.extract_part_to_stream(&part, config.scratch_dir.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn package_with_sheet(dir: &std::path::Path) -> Package {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            zip.start_file("xl/worksheets/sheet1.xml", SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"<worksheet><sheetData/></worksheet>").unwrap();
            zip.finish().unwrap();
        }
        let path = dir.join("book.xlsx");
        std::fs::write(&path, buffer).unwrap();
        Package::open(&path).unwrap()
    }

    fn descriptor(relationship_id: &str) -> SheetDescriptor {
        SheetDescriptor {
            name: "Data".to_string(),
            sheet_id: "1".to_string(),
            relationship_id: relationship_id.to_string(),
        }
    }

    #[test]
    fn test_extract_sheet_through_relationship() {
        let dir = tempfile::tempdir().unwrap();
        let package = package_with_sheet(dir.path());
        let mut relationships = RelationshipMap::default();
        relationships.insert("rId1", "worksheets/sheet1.xml");

        let mut stream = extract_sheet(
            &package,
            &descriptor("rId1"),
            &relationships,
            &ReaderConfig::default(),
        )
        .unwrap();
        assert_eq!(stream.part(), "xl/worksheets/sheet1.xml");

        let mut content = String::new();
        stream.read_to_string(&mut content).unwrap();
        assert!(content.contains("<sheetData/>"));
    }

    #[test]
    fn test_unknown_relationship() {
        let dir = tempfile::tempdir().unwrap();
        let package = package_with_sheet(dir.path());

        let err = extract_sheet(
            &package,
            &descriptor("rId7"),
            &RelationshipMap::default(),
            &ReaderConfig::default(),
        )
        .unwrap_err();
        match err {
            Error::MissingRelationship {
                sheet,
                relationship_id,
                ..
            } => {
                assert_eq!(sheet, "Data");
                assert_eq!(relationship_id, "rId7");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
