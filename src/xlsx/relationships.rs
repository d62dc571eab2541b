//! Workbook relationships (`workbook.xml.rels`) parsing.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RelationshipsXml {
    #[serde(rename = "Relationship", default)]
    relationships: Vec<RelationshipXml>,
}

#[derive(Debug, Deserialize)]
struct RelationshipXml {
    #[serde(rename = "@Id")]
    id: String,
    #[serde(rename = "@Target")]
    target: String,
    #[serde(rename = "@TargetMode", default)]
    target_mode: Option<String>,
}

/// Mapping from relationship id to the target path it declares.
#[derive(Debug, Clone, Default)]
pub struct RelationshipMap {
    targets: HashMap<String, String>,
}

impl RelationshipMap {
    /// Parse a relationships part.
    ///
    /// The part is small, so it goes through a full serde parse instead of a
    /// token-by-token scan. External targets (hyperlinks and the like) are skipped.
    pub fn parse(xml: &str, path: &Path) -> Result<Self> {
        let parsed: RelationshipsXml = quick_xml::de::from_str(xml).map_err(|e| {
            Error::invalid_format(path, format!("malformed workbook relationships: {}", e))
        })?;

        let targets = parsed
            .relationships
            .into_iter()
            .filter(|rel| {
                !rel.target_mode
                    .as_deref()
                    .is_some_and(|mode| mode.eq_ignore_ascii_case("external"))
            })
            .map(|rel| (rel.id, rel.target))
            .collect::<HashMap<_, _>>();

        log::debug!("loaded {} workbook relationships", targets.len());
        Ok(Self { targets })
    }

    /// Raw target declared for a relationship id.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.targets.get(id).map(String::as_str)
    }

    /// Internal part path for a relationship id, normalized against `root`.
    pub fn part_path(&self, id: &str, root: &str) -> Option<String> {
        self.get(id).map(|target| normalize_part_path(target, root))
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Insert or replace a relationship.
    pub fn insert(&mut self, id: impl Into<String>, target: impl Into<String>) {
        self.targets.insert(id.into(), target.into());
    }
}

/// Normalize a relationship target into an internal package path.
///
/// Leading separators are stripped and `root` is prepended when the target
/// does not already start with it.
pub fn normalize_part_path(target: &str, root: &str) -> String {
    let target = target.replace('\\', "/");
    let target = target.trim_start_matches('/');
    let root = root.trim_matches('/');

    if root.is_empty() {
        return target.to_string();
    }
    match target.strip_prefix(root) {
        Some(rest) if rest.starts_with('/') => target.to_string(),
        _ => format!("{}/{}", root, target),
    }
}
