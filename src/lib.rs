//! # sheetseek
//!
//! Streaming row search over large Excel (.xlsx) workbooks.
//!
//! Workbooks are read without materializing sheets in memory: the sheet part
//! is extracted to a scratch file, scanned row by row, and each row's cells
//! are resolved through the shared strings table and tested against a set of
//! search rules.
//!
//! ## Quick Start
//!
//! ```no_run
//! // First row anywhere in "Data" with a cell equal to "xlsx--300000-3"
//! let row = sheetseek::find_row("data.xlsx", "Data", ["xlsx--300000-3"])?;
//! println!("{:?}", row);
//!
//! // Every row with a cell matching a pattern
//! let rows = sheetseek::find_rows("data.xlsx", "Data", ["/^total/i"])?;
//! println!("{} rows", rows.len());
//! # Ok::<(), sheetseek::Error>(())
//! ```
//!
//! ## Sessions
//!
//! ```no_run
//! use sheetseek::{ReaderConfig, Search, XlsxReader};
//!
//! let config = ReaderConfig::default().with_scratch_dir("/var/tmp");
//! let mut reader = XlsxReader::open_with_config("data.xlsx", config)?;
//! reader.load()?;
//!
//! let sheet = reader.sheet("Data")?.clone();
//! let mut rows = reader.rows(&sheet)?;
//! reader.read_header(&mut rows)?;
//!
//! let search = Search::new(["Bob"])?.excluding(["archived"]);
//! for values in reader.find_rows(&sheet, &search)? {
//!     let aligned = reader.align_row(values)?;
//!     println!("{:?}", aligned.get("city"));
//! }
//! # Ok::<(), sheetseek::Error>(())
//! ```

pub mod config;
pub mod container;
pub mod detect;
pub mod error;
pub mod header;
pub mod search;
pub mod xlsx;

// Re-exports
pub use config::ReaderConfig;
pub use container::{Package, ScratchStream};
pub use detect::{detect_kind, PackageKind};
pub use error::{Error, Result};
pub use header::{AlignedRow, HeaderRow};
pub use search::{match_row, MatchRule, Search};
pub use xlsx::{
    CellExtractor, CellLayout, PatternCellExtractor, RowFragment, RowMatcher, RowScanner,
    ScanMode, SheetDescriptor, SharedStringTable, TreeCellExtractor, XlsxReader,
};

use std::path::Path;

/// Find the first row of a sheet containing a cell that satisfies any rule.
///
/// Opens the workbook, loads it, and stops scanning at the first match.
///
/// # Example
///
/// ```no_run
/// use sheetseek::find_row;
///
/// if let Some(row) = find_row("data.xlsx", "Sheet1", ["Bob", "/^B.b$/"])? {
///     println!("{}", row.join(", "));
/// }
/// # Ok::<(), sheetseek::Error>(())
/// ```
pub fn find_row<I, S>(path: impl AsRef<Path>, sheet: &str, rules: I) -> Result<Option<Vec<String>>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let search = Search::new(rules)?;
    let mut reader = XlsxReader::open(path)?;
    reader.load()?;
    let sheet = reader.sheet(sheet)?.clone();
    reader.find_row(&sheet, &search)
}

/// Find every row of a sheet containing a cell that satisfies any rule.
///
/// Rows come back in sheet order.
///
/// # Example
///
/// ```no_run
/// use sheetseek::find_rows;
///
/// let rows = find_rows("data.xlsx", "Sheet1", ["/^2024-/"])?;
/// println!("{} matching rows", rows.len());
/// # Ok::<(), sheetseek::Error>(())
/// ```
pub fn find_rows<I, S>(path: impl AsRef<Path>, sheet: &str, rules: I) -> Result<Vec<Vec<String>>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let search = Search::new(rules)?;
    let mut reader = XlsxReader::open(path)?;
    reader.load()?;
    let sheet = reader.sheet(sheet)?.clone();
    reader.find_rows(&sheet, &search)
}
