//! Package kind detection from `[Content_Types].xml`.

use crate::error::{Error, Result};
use std::path::Path;

/// Name of the content types part at the package root.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Content type for XLSX workbook part.
const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";

/// Content type for macro-enabled XLSM workbook part.
const XLSM_CONTENT_TYPE: &str = "application/vnd.ms-excel.sheet.macroEnabled.main+xml";

/// Content type for DOCX main document part.
const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

/// Content type for PPTX presentation part.
const PPTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";

/// Kind of Office package declared by its content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// Excel workbook (.xlsx / .xlsm)
    Spreadsheet,
    /// Word document (.docx)
    WordProcessing,
    /// PowerPoint presentation (.pptx)
    Presentation,
}

impl PackageKind {
    /// Returns the usual file extension for this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            PackageKind::Spreadsheet => "xlsx",
            PackageKind::WordProcessing => "docx",
            PackageKind::Presentation => "pptx",
        }
    }
}

/// Detect the package kind from the content types XML.
///
/// Returns `None` when no known main part is declared.
pub fn detect_kind(content_types: &str) -> Option<PackageKind> {
    if content_types.contains(XLSX_CONTENT_TYPE) || content_types.contains(XLSM_CONTENT_TYPE) {
        Some(PackageKind::Spreadsheet)
    } else if content_types.contains(DOCX_CONTENT_TYPE) {
        Some(PackageKind::WordProcessing)
    } else if content_types.contains(PPTX_CONTENT_TYPE) {
        Some(PackageKind::Presentation)
    } else {
        None
    }
}

/// Fail with `InvalidFormat` when the content types declare another Office format.
pub(crate) fn ensure_spreadsheet(path: &Path, content_types: &str) -> Result<()> {
    match detect_kind(content_types) {
        Some(PackageKind::Spreadsheet) | None => Ok(()),
        Some(other) => Err(Error::InvalidFormat {
            path: path.to_path_buf(),
            reason: "package is not a spreadsheet".to_string(),
            expected: Some(PackageKind::Spreadsheet.extension().to_string()),
            detected: Some(other.extension().to_string()),
        }),
    }
}
