//! XLSX shared strings parsing.

use crate::config::{tag_matches, ReaderConfig};
use crate::error::{Error, Result};
use quick_xml::events::Event;
use std::path::Path;

/// Shared strings table.
///
/// Lookups are total: an index past the end resolves to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedStringTable {
    /// All strings in order
    strings: Vec<String>,
}

impl SharedStringTable {
    /// Parse shared strings from XML content.
    ///
    /// Text nodes inside one `<si>` item (rich-text runs) are joined into a
    /// single entry so indexes line up with what cells reference. Phonetic
    /// runs (`<rPh>`) are left out.
    pub fn parse(xml: &[u8], config: &ReaderConfig, path: &Path) -> Result<Self> {
        let mut strings = Vec::new();
        let mut reader = quick_xml::Reader::from_reader(xml);

        let prefix = config.prefix.as_str();
        let text_tag = config.text_tag.as_str();

        let mut buf = Vec::new();
        let mut in_si = false;
        let mut in_phonetic = false;
        let mut in_text = false;
        let mut current_text = String::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let name = e.name();
                    if tag_matches(name.as_ref(), prefix, "si") {
                        in_si = true;
                        current_text.clear();
                    } else if tag_matches(name.as_ref(), prefix, "rPh") {
                        in_phonetic = true;
                    } else if tag_matches(name.as_ref(), prefix, text_tag) && !in_phonetic {
                        in_text = true;
                    }
                }
                Ok(Event::Empty(e)) => {
                    // <si/> and <t/> are legal and still occupy an index
                    let name = e.name();
                    if tag_matches(name.as_ref(), prefix, "si") {
                        strings.push(String::new());
                    } else if tag_matches(name.as_ref(), prefix, text_tag) && !in_si {
                        strings.push(String::new());
                    }
                }
                Ok(Event::Text(e)) if in_text => {
                    let text = e.unescape().unwrap_or_default();
                    current_text.push_str(&text);
                }
                Ok(Event::CData(e)) if in_text => {
                    current_text.push_str(&String::from_utf8_lossy(&e));
                }
                Ok(Event::End(e)) => {
                    let name = e.name();
                    if tag_matches(name.as_ref(), prefix, "si") {
                        strings.push(std::mem::take(&mut current_text));
                        in_si = false;
                    } else if tag_matches(name.as_ref(), prefix, "rPh") {
                        in_phonetic = false;
                    } else if tag_matches(name.as_ref(), prefix, text_tag) && in_text {
                        in_text = false;
                        if !in_si {
                            strings.push(std::mem::take(&mut current_text));
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::invalid_format(
                        path,
                        format!("malformed shared strings: {}", e),
                    ))
                }
                _ => {}
            }
            buf.clear();
        }

        log::debug!("loaded {} shared strings", strings.len());
        Ok(Self { strings })
    }

    /// Get a string by index, or `""` when out of range.
    pub fn get(&self, index: usize) -> &str {
        self.strings.get(index).map(String::as_str).unwrap_or("")
    }

    /// Resolve the raw text of a shared-string cell.
    ///
    /// Text that is not an index resolves to `""`, like an out-of-range index.
    pub fn resolve(&self, raw: &str) -> &str {
        let raw = raw.trim();
        match raw.parse::<usize>() {
            Ok(index) => self.get(index),
            Err(_) if raw.is_empty() => "",
            Err(_) => {
                log::warn!("shared string reference '{}' is not an index", raw);
                ""
            }
        }
    }

    /// Get the count of shared strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl From<Vec<String>> for SharedStringTable {
    fn from(strings: Vec<String>) -> Self {
        Self { strings }
    }
}
