//! Reader configuration.

use std::path::PathBuf;

/// Options controlling where parts live inside the package and which
/// element names the scanners look for.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Namespace prefix expected on the sheet and text tags (e.g. "x:")
    pub prefix: String,

    /// Internal root segment that relationship targets are relative to
    pub root_segment: String,

    /// Workbook manifest part
    pub workbook_part: String,

    /// Workbook relationships part
    pub relationships_part: String,

    /// Optional shared strings part
    pub shared_strings_part: String,

    /// Local name of sheet entries in the manifest
    pub sheet_tag: String,

    /// Local name of text nodes in the shared strings part
    pub text_tag: String,

    /// Substring identifying row elements in a sheet part
    pub row_marker: String,

    /// Directory for scratch streams (None = system temp dir)
    pub scratch_dir: Option<PathBuf>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            root_segment: "xl".to_string(),
            workbook_part: "xl/workbook.xml".to_string(),
            relationships_part: "xl/_rels/workbook.xml.rels".to_string(),
            shared_strings_part: "xl/sharedStrings.xml".to_string(),
            sheet_tag: "sheet".to_string(),
            text_tag: "t".to_string(),
            row_marker: "row".to_string(),
            scratch_dir: None,
        }
    }
}

impl ReaderConfig {
    /// Create a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the namespace prefix for sheet and text tags.
    ///
    /// A trailing `:` is added when missing.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.is_empty() && !prefix.ends_with(':') {
            prefix.push(':');
        }
        self.prefix = prefix;
        self
    }

    /// Set the internal root segment and derive the default part names from it.
    pub fn with_root_segment(mut self, root: impl Into<String>) -> Self {
        let root = root.into().trim_matches('/').to_string();
        self.workbook_part = format!("{}/workbook.xml", root);
        self.relationships_part = format!("{}/_rels/workbook.xml.rels", root);
        self.shared_strings_part = format!("{}/sharedStrings.xml", root);
        self.root_segment = root;
        self
    }

    /// Set the substring used to recognise row elements.
    pub fn with_row_marker(mut self, marker: impl Into<String>) -> Self {
        self.row_marker = marker.into();
        self
    }

    /// Set the directory used for scratch streams.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Qualified name of sheet entries, prefix included.
    pub fn sheet_name(&self) -> String {
        format!("{}{}", self.prefix, self.sheet_tag)
    }

    /// Qualified name of shared-string text nodes, prefix included.
    pub fn text_name(&self) -> String {
        format!("{}{}", self.prefix, self.text_tag)
    }
}

/// Whether an element's qualified name matches `prefix` + `local`.
///
/// With an empty prefix, any namespace prefix on the element is accepted.
pub(crate) fn tag_matches(qualified: &[u8], prefix: &str, local: &str) -> bool {
    if prefix.is_empty() {
        let local_part = match qualified.iter().rposition(|&b| b == b':') {
            Some(pos) => &qualified[pos + 1..],
            None => qualified,
        };
        return local_part == local.as_bytes();
    }
    qualified.len() == prefix.len() + local.len()
        && qualified.starts_with(prefix.as_bytes())
        && qualified.ends_with(local.as_bytes())
}
