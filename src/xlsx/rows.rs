//! Forward-only row scanning over a sheet part.
//!
//! The scanner pulls XML events from any `BufRead` (normally a
//! [`ScratchStream`](crate::container::ScratchStream)) and hands out one
//! [`RowFragment`] per row element. Rows are never buffered beyond the one
//! being captured, and a consumed row cannot be revisited.

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Writer;
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// The serialized subtree of one row element, as read from the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFragment {
    xml: String,
}

impl RowFragment {
    /// Wrap already-serialized row markup.
    pub fn new(xml: impl Into<String>) -> Self {
        Self { xml: xml.into() }
    }

    /// The row markup.
    pub fn as_str(&self) -> &str {
        &self.xml
    }
}

/// When a scan stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Stop at the first row the matcher accepts
    FirstMatch,
    /// Offer every row to the matcher and keep all accepted results
    Exhaustive,
}

/// Decides, row by row, whether a fragment produces a result.
///
/// Any `FnMut(&RowFragment) -> Option<T>` closure is a matcher.
pub trait RowMatcher<T> {
    /// Return `Some` to accept the row.
    fn match_row(&mut self, fragment: &RowFragment) -> Option<T>;
}

impl<T, F> RowMatcher<T> for F
where
    F: FnMut(&RowFragment) -> Option<T>,
{
    fn match_row(&mut self, fragment: &RowFragment) -> Option<T> {
        self(fragment)
    }
}

/// Pull parser yielding row fragments in document order.
pub struct RowScanner<R: BufRead> {
    reader: quick_xml::Reader<R>,
    marker: Vec<u8>,
    origin: PathBuf,
    buf: Vec<u8>,
    rows_scanned: usize,
    finished: bool,
}

impl<R: BufRead> RowScanner<R> {
    /// Create a scanner treating every element whose name contains `row_marker`
    /// as a row.
    ///
    /// Containment rather than equality lets prefixed names (`x:row`) through;
    /// it also lets through unrelated elements that happen to contain the
    /// marker, such as `rowBreaks`, which then simply yield no cells.
    pub fn new(stream: R, row_marker: &str) -> Self {
        Self {
            reader: quick_xml::Reader::from_reader(stream),
            marker: row_marker.as_bytes().to_vec(),
            origin: PathBuf::new(),
            buf: Vec::with_capacity(8 * 1024),
            rows_scanned: 0,
            finished: false,
        }
    }

    /// Record the package path reported in errors.
    pub fn with_origin(mut self, path: impl Into<PathBuf>) -> Self {
        self.origin = path.into();
        self
    }

    /// Number of row fragments produced so far.
    pub fn rows_scanned(&self) -> usize {
        self.rows_scanned
    }

    /// Advance to the next row and capture it.
    ///
    /// Returns `Ok(None)` at end of stream. A row cut off by the end of the
    /// stream is still returned with whatever markup was read.
    pub fn next_fragment(&mut self) -> Result<Option<RowFragment>> {
        if self.finished {
            return Ok(None);
        }

        loop {
            self.buf.clear();
            let start = match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(e)) if contains_marker(e.name().as_ref(), &self.marker) => {
                    e.into_owned()
                }
                Ok(Event::Empty(e)) if contains_marker(e.name().as_ref(), &self.marker) => {
                    let mut writer = Writer::new(Vec::new());
                    write_event(&mut writer, Event::Empty(e), &self.origin)?;
                    return Ok(Some(self.finish_fragment(writer)));
                }
                Ok(Event::Eof) => {
                    self.finished = true;
                    return Ok(None);
                }
                Err(e) => {
                    self.finished = true;
                    return Err(malformed(&self.origin, self.reader.error_position(), e));
                }
                Ok(_) => continue,
            };

            return self.capture(start).map(Some);
        }
    }

    /// Capture everything up to the end tag matching `start`.
    fn capture(&mut self, start: BytesStart<'static>) -> Result<RowFragment> {
        let mut writer = Writer::new(Vec::with_capacity(1024));
        write_event(&mut writer, Event::Start(start), &self.origin)?;

        let mut depth = 1usize;
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => {
                    self.finished = true;
                    return Err(malformed(&self.origin, self.reader.error_position(), e));
                }
            };

            match event {
                Event::Eof => {
                    log::warn!(
                        "{}: stream ended inside a row after {} rows; keeping the partial row",
                        self.origin.display(),
                        self.rows_scanned
                    );
                    self.finished = true;
                    break;
                }
                Event::Start(_) => depth += 1,
                Event::End(_) => depth -= 1,
                _ => {}
            }
            write_event(&mut writer, event, &self.origin)?;

            if depth == 0 {
                break;
            }
        }

        Ok(self.finish_fragment(writer))
    }

    fn finish_fragment(&mut self, writer: Writer<Vec<u8>>) -> RowFragment {
        self.rows_scanned += 1;
        let bytes = writer.into_inner();
        let xml = String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());
        RowFragment { xml }
    }

    /// Drive the scan, offering each row to `matcher`.
    ///
    /// In [`ScanMode::FirstMatch`] the scan stops right after the first
    /// accepted row; later rows are not read. In [`ScanMode::Exhaustive`]
    /// accepted results are collected in stream order.
    pub fn drive<T, M>(&mut self, mode: ScanMode, mut matcher: M) -> Result<Vec<T>>
    where
        M: RowMatcher<T>,
    {
        let mut results = Vec::new();
        while let Some(fragment) = self.next_fragment()? {
            if let Some(hit) = matcher.match_row(&fragment) {
                results.push(hit);
                if mode == ScanMode::FirstMatch {
                    break;
                }
            }
        }
        Ok(results)
    }

    /// First accepted row, if any.
    pub fn find_first<T, M>(&mut self, matcher: M) -> Result<Option<T>>
    where
        M: RowMatcher<T>,
    {
        Ok(self.drive(ScanMode::FirstMatch, matcher)?.into_iter().next())
    }

    /// Every accepted row, in stream order.
    pub fn find_all<T, M>(&mut self, matcher: M) -> Result<Vec<T>>
    where
        M: RowMatcher<T>,
    {
        self.drive(ScanMode::Exhaustive, matcher)
    }
}

impl<R: BufRead> Iterator for RowScanner<R> {
    type Item = Result<RowFragment>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_fragment().transpose()
    }
}

fn contains_marker(name: &[u8], marker: &[u8]) -> bool {
    !marker.is_empty() && name.windows(marker.len()).any(|window| window == marker)
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>, origin: &Path) -> Result<()> {
    writer.write_event(event).map_err(|e| {
        Error::invalid_format(origin, format!("cannot re-serialize row markup: {}", e))
    })
}

fn malformed(origin: &Path, position: impl std::fmt::Display, err: quick_xml::Error) -> Error {
    Error::invalid_format(
        origin,
        format!("malformed sheet XML at byte {}: {}", position, err),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <dimension ref="A1:B3"/>
  <sheetData>
    <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1"><v>1</v></c></row>
    <row r="2" spans="1:2"><c r="A2"><v>2</v></c></row>
    <row r="3"/>
  </sheetData>
  <rowBreaks count="1"><brk id="2" max="16383" man="1"/></rowBreaks>
</worksheet>"#;

    fn scanner(xml: &str) -> RowScanner<&[u8]> {
        RowScanner::new(xml.as_bytes(), "row")
    }

    #[test]
    fn test_fragments_are_verbatim() {
        let rows: Vec<RowFragment> = scanner(SHEET).collect::<Result<_>>().unwrap();
        assert_eq!(
            rows[0].as_str(),
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1"><v>1</v></c></row>"#
        );
        assert_eq!(rows[1].as_str(), r#"<row r="2" spans="1:2"><c r="A2"><v>2</v></c></row>"#);
        assert_eq!(rows[2].as_str(), r#"<row r="3"/>"#);
        // rowBreaks contains the marker too
        assert_eq!(rows.len(), 4);
        assert!(rows[3].as_str().starts_with("<rowBreaks"));
    }

    #[test]
    fn test_prefixed_rows() {
        let xml = r#"<x:worksheet xmlns:x="urn:x"><x:sheetData><x:row r="1"><x:c r="A1"><x:v>7</x:v></x:c></x:row></x:sheetData></x:worksheet>"#;
        let rows: Vec<RowFragment> = scanner(xml).collect::<Result<_>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].as_str().contains("<x:v>7</x:v>"));
    }

    #[test]
    fn test_first_match_stops_scanning() {
        let xml = "<sheetData><row>A</row><row>B</row><row>C</row></sheetData>";
        let calls = Cell::new(0);
        let mut scanner = scanner(xml);

        let hit = scanner
            .find_first(|row: &RowFragment| {
                calls.set(calls.get() + 1);
                row.as_str().contains('B').then(|| row.as_str().to_string())
            })
            .unwrap();

        assert_eq!(hit.as_deref(), Some("<row>B</row>"));
        assert_eq!(calls.get(), 2);
        assert_eq!(scanner.rows_scanned(), 2);

        // the scan resumes where it stopped
        let rest: Vec<String> = scanner
            .find_all(|row: &RowFragment| Some(row.as_str().to_string()))
            .unwrap();
        assert_eq!(rest, ["<row>C</row>"]);
    }

    #[test]
    fn test_exhaustive_keeps_stream_order() {
        let xml = "<sheetData><row>1</row><row>2</row><row>3</row><row>4</row></sheetData>";
        let even = scanner(xml)
            .find_all(|row: &RowFragment| {
                let n: u32 = row.as_str()[5..6].parse().ok()?;
                (n % 2 == 0).then_some(n)
            })
            .unwrap();
        assert_eq!(even, [2, 4]);
    }

    #[test]
    fn test_drive_on_owned_scanner() {
        let xml = "<sheetData><row>1</row><row>2</row><row>3</row></sheetData>";
        let len = |row: &RowFragment| Some(row.as_str().len());

        let all = scanner(xml).drive(ScanMode::Exhaustive, len).unwrap();
        assert_eq!(all, [12, 12, 12]);

        let first = scanner(xml).drive(ScanMode::FirstMatch, len).unwrap();
        assert_eq!(first, [12]);
    }

    #[test]
    fn test_truncated_stream_keeps_partial_row() {
        let xml = r#"<sheetData><row r="1"><c r="A1"><v>1</v></c></row><row r="2"><c r="A2"><v>2</v>"#;
        let rows: Vec<RowFragment> = scanner(xml).collect::<Result<_>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].as_str(), r#"<row r="2"><c r="A2"><v>2</v>"#);
    }

    #[test]
    fn test_malformed_sheet() {
        let xml = "<sheetData><row><c></row></sheetData>";
        let mut scanner = scanner(xml).with_origin("bad.xlsx");
        let err = scanner.next_fragment().unwrap_err();
        assert_eq!(err.path(), Some(Path::new("bad.xlsx")));
        assert!(scanner.next().is_none());
    }
}
