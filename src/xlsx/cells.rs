//! Cell value extraction from row fragments.
//!
//! Values come back as plain strings: shared-string cells are resolved through
//! the table, everything else (numbers, booleans, inline strings, cached
//! formula results) is passed through as written. A cell without a value, or
//! with a shared-string index the table does not have, becomes `""`.

use super::rows::RowFragment;
use super::shared_strings::SharedStringTable;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Turns a row fragment into its cell values.
pub trait CellExtractor {
    /// Resolved values of the cells in `fragment`.
    fn extract(&self, fragment: &RowFragment, strings: &SharedStringTable) -> Vec<String>;
}

/// How extracted values are positioned in the output list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CellLayout {
    /// One entry per cell, in the order cells appear in the fragment
    #[default]
    DocumentOrder,
    /// Entries placed by the column of each cell reference; skipped
    /// columns are filled with `""`
    ColumnAligned,
}

/// Regular-expression extractor for the high-row-count path.
///
/// Does not build a tree; namespaced cell elements (`<x:c>`) are not
/// recognised. Use [`TreeCellExtractor`] when that matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternCellExtractor {
    layout: CellLayout,
}

impl PatternCellExtractor {
    /// Extractor returning values in document order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extractor placing values by column reference.
    pub fn column_aligned() -> Self {
        Self {
            layout: CellLayout::ColumnAligned,
        }
    }
}

fn cell_pattern() -> &'static Regex {
    static CELL_RE: OnceLock<Regex> = OnceLock::new();
    CELL_RE.get_or_init(|| {
        // a cell cut off by the end of the fragment runs to the end
        Regex::new(r#"(?s)<c\b([^>]*?)(?:/>|>(.*?)(?:</c>|\z))"#).expect("valid regex")
    })
}

fn reference_pattern() -> &'static Regex {
    static REF_RE: OnceLock<Regex> = OnceLock::new();
    REF_RE.get_or_init(|| Regex::new(r#"\br="([A-Za-z]+)(\d+)""#).expect("valid regex"))
}

fn type_pattern() -> &'static Regex {
    static TYPE_RE: OnceLock<Regex> = OnceLock::new();
    TYPE_RE.get_or_init(|| Regex::new(r#"\bt\s*=\s*["']([^"']*)["']"#).expect("valid regex"))
}

fn value_pattern() -> &'static Regex {
    static VALUE_RE: OnceLock<Regex> = OnceLock::new();
    VALUE_RE.get_or_init(|| Regex::new(r#"<v(?:\s[^>]*)?>([^<]*)</v>"#).expect("valid regex"))
}

fn inline_text_pattern() -> &'static Regex {
    static TEXT_RE: OnceLock<Regex> = OnceLock::new();
    TEXT_RE.get_or_init(|| Regex::new(r#"<t(?:\s[^>]*)?>([^<]*)</t>"#).expect("valid regex"))
}

impl CellExtractor for PatternCellExtractor {
    fn extract(&self, fragment: &RowFragment, strings: &SharedStringTable) -> Vec<String> {
        let mut values = Vec::new();

        for cell in cell_pattern().captures_iter(fragment.as_str()) {
            let attrs = cell.get(1).map_or("", |m| m.as_str());
            let inner = cell.get(2).map_or("", |m| m.as_str());

            let cell_type = type_pattern()
                .captures(attrs)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str());
            let raw = value_pattern()
                .captures(inner)
                .and_then(|c| c.get(1))
                .map(|m| unescape(m.as_str()));
            let inline = || {
                inline_text_pattern()
                    .captures_iter(inner)
                    .filter_map(|c| c.get(1))
                    .map(|m| unescape(m.as_str()))
                    .collect::<String>()
            };

            let value = match (cell_type, raw) {
                (Some("s"), raw) => strings.resolve(raw.as_deref().unwrap_or("")).to_string(),
                (_, Some(raw)) => raw.into_owned(),
                (Some("inlineStr"), None) => inline(),
                (_, None) => String::new(),
            };

            let column = match self.layout {
                CellLayout::DocumentOrder => None,
                CellLayout::ColumnAligned => reference_pattern()
                    .captures(attrs)
                    .and_then(|c| c.get(1))
                    .map(|m| column_index(m.as_str())),
            };
            place(&mut values, column, value);
        }

        values
    }
}

/// Event-based extractor that parses the fragment as XML.
///
/// Slower than [`PatternCellExtractor`] but accepts any well-formed row
/// markup, including prefixed element names and attribute quoting variants.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeCellExtractor {
    layout: CellLayout,
}

impl TreeCellExtractor {
    /// Extractor returning values in document order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extractor placing values by column reference.
    pub fn column_aligned() -> Self {
        Self {
            layout: CellLayout::ColumnAligned,
        }
    }
}

#[derive(Default)]
struct PendingCell {
    cell_type: Option<String>,
    column: Option<usize>,
    value: Option<String>,
    inline: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Capture {
    None,
    Value,
    Inline,
}

impl PendingCell {
    fn from_start(e: &BytesStart<'_>) -> Self {
        let mut cell = PendingCell::default();
        for attr in e.attributes().flatten() {
            let value = String::from_utf8_lossy(&attr.value);
            match attr.key.local_name().as_ref() {
                b"t" => cell.cell_type = Some(value.into_owned()),
                b"r" => {
                    let letters: String =
                        value.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
                    if !letters.is_empty() {
                        cell.column = Some(column_index(&letters));
                    }
                }
                _ => {}
            }
        }
        cell
    }

    fn resolve(self, strings: &SharedStringTable) -> String {
        match (self.cell_type.as_deref(), self.value) {
            (Some("s"), raw) => strings.resolve(raw.as_deref().unwrap_or("")).to_string(),
            (_, Some(raw)) => raw,
            (Some("inlineStr"), None) => self.inline,
            (_, None) => String::new(),
        }
    }
}

impl CellExtractor for TreeCellExtractor {
    fn extract(&self, fragment: &RowFragment, strings: &SharedStringTable) -> Vec<String> {
        let mut values = Vec::new();
        let mut reader = quick_xml::Reader::from_str(fragment.as_str());

        let mut cell: Option<PendingCell> = None;
        let mut capture = Capture::None;
        let mut in_inline = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"c" => cell = Some(PendingCell::from_start(&e)),
                    b"v" if cell.is_some() => {
                        capture = Capture::Value;
                        if let Some(ref mut c) = cell {
                            c.value.get_or_insert_with(String::new);
                        }
                    }
                    b"is" if cell.is_some() => in_inline = true,
                    b"t" if in_inline => capture = Capture::Inline,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.local_name().as_ref() == b"c" => {
                    let pending = PendingCell::from_start(&e);
                    let column = self.column_for(&pending);
                    place(&mut values, column, pending.resolve(strings));
                }
                Ok(Event::Text(e)) => {
                    if let Some(ref mut c) = cell {
                        let text = e.unescape().unwrap_or_default();
                        match capture {
                            Capture::Value => c.value.get_or_insert_with(String::new).push_str(&text),
                            Capture::Inline => c.inline.push_str(&text),
                            Capture::None => {}
                        }
                    }
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"c" => {
                        if let Some(pending) = cell.take() {
                            let column = self.column_for(&pending);
                            place(&mut values, column, pending.resolve(strings));
                        }
                        capture = Capture::None;
                        in_inline = false;
                    }
                    b"v" | b"t" => capture = Capture::None,
                    b"is" => in_inline = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    log::debug!("stopping cell extraction on malformed row markup: {}", e);
                    break;
                }
                _ => {}
            }
        }

        // a fragment cut short by the end of the stream may leave a cell open
        if let Some(pending) = cell.take() {
            let column = self.column_for(&pending);
            place(&mut values, column, pending.resolve(strings));
        }

        values
    }
}

impl TreeCellExtractor {
    fn column_for(&self, cell: &PendingCell) -> Option<usize> {
        match self.layout {
            CellLayout::DocumentOrder => None,
            CellLayout::ColumnAligned => cell.column,
        }
    }
}

/// Put `value` at `column`, or append it when no column is known.
fn place(values: &mut Vec<String>, column: Option<usize>, value: String) {
    match column {
        Some(idx) if idx < values.len() => values[idx] = value,
        Some(idx) => {
            values.resize(idx, String::new());
            values.push(value);
        }
        None => values.push(value),
    }
}

fn unescape(raw: &str) -> Cow<'_, str> {
    quick_xml::escape::unescape(raw).unwrap_or(Cow::Borrowed(raw))
}

/// Zero-based column index of column letters ("A" -> 0, "AA" -> 26).
pub fn column_index(letters: &str) -> usize {
    letters
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .fold(0usize, |acc, c| {
            acc.saturating_mul(26)
                .saturating_add((c.to_ascii_uppercase() as u8 - b'A') as usize + 1)
        })
        .saturating_sub(1)
}
