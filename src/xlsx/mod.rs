//! Streaming XLSX (Excel) workbook reading.
//!
//! Sheets are never loaded whole. A sheet part is copied out of the package
//! into a scratch file and scanned row by row; each row is handed to a
//! matcher and dropped unless the matcher keeps it.
//!
//! # Example
//!
//! ```no_run
//! use sheetseek::xlsx::{RowFragment, ScanMode, XlsxReader};
//!
//! let mut reader = XlsxReader::open("spreadsheet.xlsx")?;
//! reader.load()?;
//!
//! for sheet in reader.sheets() {
//!     println!("Sheet: {} ({})", sheet.name, sheet.relationship_id);
//! }
//!
//! let sheet = reader.sheet("Data")?.clone();
//! let long_rows = reader.scan_rows(&sheet, ScanMode::Exhaustive, |row: &RowFragment| {
//!     let values = reader.row_values(row);
//!     (values.len() > 10).then_some(values)
//! })?;
//! println!("{} wide rows", long_rows.len());
//! # Ok::<(), sheetseek::Error>(())
//! ```

mod cells;
mod manifest;
mod reader;
mod relationships;
mod rows;
mod shared_strings;
mod sheet;

pub use cells::{column_index, CellExtractor, CellLayout, PatternCellExtractor, TreeCellExtractor};
pub use manifest::{parse_manifest, SheetDescriptor};
pub use reader::XlsxReader;
pub use relationships::{normalize_part_path, RelationshipMap};
pub use rows::{RowFragment, RowMatcher, RowScanner, ScanMode};
pub use shared_strings::SharedStringTable;
pub use sheet::{extract_sheet, sheet_part_path};
