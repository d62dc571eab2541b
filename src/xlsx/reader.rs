//! Workbook reading session.

use super::cells::{CellExtractor, PatternCellExtractor};
use super::manifest::{parse_manifest, SheetDescriptor};
use super::relationships::RelationshipMap;
use super::rows::{RowFragment, RowMatcher, RowScanner, ScanMode};
use super::shared_strings::SharedStringTable;
use super::sheet::extract_sheet;
use crate::config::ReaderConfig;
use crate::container::{Package, ScratchStream};
use crate::error::{Error, Result};
use crate::header::{AlignedRow, HeaderRow};
use crate::search::Search;
use std::io::BufRead;
use std::path::Path;

/// A reading session over one workbook.
///
/// The session owns the open package and whatever has been loaded from it:
/// the sheet list, the relationship map, the shared strings and the bound
/// header. Each load step is explicit so callers only pay for what they use;
/// [`load`](Self::load) runs all of them.
///
/// # Example
///
/// ```no_run
/// use sheetseek::{Search, XlsxReader};
///
/// let mut reader = XlsxReader::open("data.xlsx")?;
/// reader.load()?;
///
/// let sheet = reader.sheets()[0].clone();
/// let search = Search::new(["xlsx--300000-3"])?;
/// if let Some(row) = reader.find_row(&sheet, &search)? {
///     println!("{:?}", row);
/// }
/// # Ok::<(), sheetseek::Error>(())
/// ```
pub struct XlsxReader {
    package: Package,
    config: ReaderConfig,
    sheets: Vec<SheetDescriptor>,
    relationships: RelationshipMap,
    shared_strings: SharedStringTable,
    header: Option<HeaderRow>,
    extractor: Box<dyn CellExtractor>,
}

impl XlsxReader {
    /// Open a workbook with the default configuration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, ReaderConfig::default())
    }

    /// Open a workbook with a custom configuration.
    pub fn open_with_config(path: impl AsRef<Path>, config: ReaderConfig) -> Result<Self> {
        let package = Package::open(path)?;
        Ok(Self {
            package,
            config,
            sheets: Vec::new(),
            relationships: RelationshipMap::default(),
            shared_strings: SharedStringTable::default(),
            header: None,
            extractor: Box::new(PatternCellExtractor::new()),
        })
    }

    /// Replace the cell extractor (e.g. with a
    /// [`TreeCellExtractor`](super::cells::TreeCellExtractor)).
    pub fn with_extractor(mut self, extractor: impl CellExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// Load the manifest, relationships and shared strings, in that order.
    pub fn load(&mut self) -> Result<&mut Self> {
        self.load_manifest()?;
        self.load_relationships()?;
        self.load_shared_strings()?;
        Ok(self)
    }

    /// Parse the workbook manifest into sheet descriptors.
    ///
    /// Fails with `InvalidFormat` when the manifest part is missing or
    /// malformed. A manifest without sheets loads as an empty list.
    pub fn load_manifest(&mut self) -> Result<&[SheetDescriptor]> {
        let xml = self.required_part(&self.config.workbook_part, "workbook manifest")?;
        self.sheets = parse_manifest(&xml, &self.config, self.package.path())?;
        Ok(&self.sheets)
    }

    /// Parse the workbook relationships.
    pub fn load_relationships(&mut self) -> Result<&RelationshipMap> {
        let xml = self.required_part(&self.config.relationships_part, "workbook relationships")?;
        self.relationships =
            RelationshipMap::parse(&String::from_utf8_lossy(&xml), self.package.path())?;
        Ok(&self.relationships)
    }

    /// Load the shared strings table; a workbook without one gets an empty table.
    pub fn load_shared_strings(&mut self) -> Result<&SharedStringTable> {
        self.shared_strings = match self.package.extract_part(&self.config.shared_strings_part)? {
            Some(xml) => SharedStringTable::parse(&xml, &self.config, self.package.path())?,
            None => {
                log::debug!("no shared strings part; all cells are inline");
                SharedStringTable::default()
            }
        };
        Ok(&self.shared_strings)
    }

    fn required_part(&self, name: &str, what: &str) -> Result<Vec<u8>> {
        self.package.extract_part(name)?.ok_or_else(|| {
            Error::invalid_format(self.package.path(), format!("{} '{}' is missing", what, name))
        })
    }

    /// Path of the workbook file.
    pub fn path(&self) -> &Path {
        self.package.path()
    }

    /// The underlying package.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// The active configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Sheets in manifest order (empty until [`load_manifest`](Self::load_manifest)).
    pub fn sheets(&self) -> &[SheetDescriptor] {
        &self.sheets
    }

    /// The loaded relationship map.
    pub fn relationships(&self) -> &RelationshipMap {
        &self.relationships
    }

    /// The loaded shared strings.
    pub fn shared_strings(&self) -> &SharedStringTable {
        &self.shared_strings
    }

    /// First sheet with the given name.
    pub fn sheet_by_name(&self, name: &str) -> Option<&SheetDescriptor> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// First sheet with the given name, or `SheetNotFound`.
    pub fn sheet(&self, name: &str) -> Result<&SheetDescriptor> {
        self.sheet_by_name(name).ok_or_else(|| Error::SheetNotFound {
            path: self.package.path().to_path_buf(),
            name: name.to_string(),
        })
    }

    /// Extract a sheet's part into a scratch stream.
    pub fn open_sheet_stream(&self, sheet: &SheetDescriptor) -> Result<ScratchStream> {
        extract_sheet(&self.package, sheet, &self.relationships, &self.config)
    }

    /// Row scanner over a sheet.
    ///
    /// The scratch stream behind it is removed when the scanner is dropped.
    pub fn rows(&self, sheet: &SheetDescriptor) -> Result<RowScanner<ScratchStream>> {
        let stream = self.open_sheet_stream(sheet)?;
        Ok(RowScanner::new(stream, &self.config.row_marker).with_origin(self.package.path()))
    }

    /// Resolved cell values of one row.
    pub fn row_values(&self, fragment: &RowFragment) -> Vec<String> {
        self.extractor.extract(fragment, &self.shared_strings)
    }

    /// Run `matcher` over a sheet's rows in the given mode.
    pub fn scan_rows<T, M>(&self, sheet: &SheetDescriptor, mode: ScanMode, matcher: M) -> Result<Vec<T>>
    where
        M: RowMatcher<T>,
    {
        self.rows(sheet)?.drive(mode, matcher)
    }

    /// First row of `sheet` matching `search`.
    pub fn find_row(&self, sheet: &SheetDescriptor, search: &Search) -> Result<Option<Vec<String>>> {
        self.find_row_in(&mut self.rows(sheet)?, search)
    }

    /// Every row of `sheet` matching `search`, in sheet order.
    pub fn find_rows(&self, sheet: &SheetDescriptor, search: &Search) -> Result<Vec<Vec<String>>> {
        self.find_rows_in(&mut self.rows(sheet)?, search)
    }

    /// First row matching `search`, continuing from where `scanner` stands.
    ///
    /// Rows already consumed, such as a header taken by
    /// [`read_header`](Self::read_header), are not searched.
    pub fn find_row_in<R: BufRead>(
        &self,
        scanner: &mut RowScanner<R>,
        search: &Search,
    ) -> Result<Option<Vec<String>>> {
        scanner.find_first(search.matcher(self.extractor.as_ref(), &self.shared_strings))
    }

    /// Every remaining row of `scanner` matching `search`.
    pub fn find_rows_in<R: BufRead>(
        &self,
        scanner: &mut RowScanner<R>,
        search: &Search,
    ) -> Result<Vec<Vec<String>>> {
        scanner.find_all(search.matcher(self.extractor.as_ref(), &self.shared_strings))
    }

    /// Capture the next row with at least one cell as the header.
    ///
    /// Normally called on a fresh scanner so the header is the sheet's first
    /// row; the scanner is left positioned after it. Fails with
    /// `HeaderNotFound` when the stream has no such row.
    pub fn read_header<R: BufRead>(&mut self, scanner: &mut RowScanner<R>) -> Result<&HeaderRow> {
        let extractor = self.extractor.as_ref();
        let strings = &self.shared_strings;
        let values = scanner.find_first(|fragment: &RowFragment| {
            let values = extractor.extract(fragment, strings);
            (!values.is_empty()).then_some(values)
        })?;

        match values {
            Some(values) => self.bind_header(values),
            None => Err(Error::HeaderNotFound {
                path: self.package.path().to_path_buf(),
            }),
        }
    }

    /// Bind `values` as the session's header.
    pub fn bind_header(&mut self, values: Vec<String>) -> Result<&HeaderRow> {
        let header = HeaderRow::bind(values)?;
        log::debug!("bound header with {} columns", header.len());
        Ok(self.header.insert(header))
    }

    /// The bound header, if any.
    pub fn header(&self) -> Option<&HeaderRow> {
        self.header.as_ref()
    }

    /// Align a row to the bound header.
    pub fn align_row(&self, values: Vec<String>) -> Result<AlignedRow> {
        let header = self.header.as_ref().ok_or_else(|| Error::HeaderNotFound {
            path: self.package.path().to_path_buf(),
        })?;
        Ok(header.align(values))
    }
}

impl std::fmt::Debug for XlsxReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XlsxReader")
            .field("path", &self.package.path())
            .field("sheets", &self.sheets.len())
            .field("relationships", &self.relationships.len())
            .field("shared_strings", &self.shared_strings.len())
            .field("header", &self.header.as_ref().map(HeaderRow::len))
            .finish()
    }
}
