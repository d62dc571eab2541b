//! ZIP package access for spreadsheet workbooks.
//!
//! The package is opened once per session and parts are pulled out on demand:
//! small parts (manifest, relationships, shared strings) as bytes, sheet parts
//! copied to a scratch file so the row scanner reads them sequentially without
//! touching the archive again.

use crate::detect::{ensure_spreadsheet, CONTENT_TYPES_PART};
use crate::error::{Error, Result};
use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use zip::result::ZipError;

/// Read buffer used for scratch streams.
const SCRATCH_BUFFER_SIZE: usize = 64 * 1024;

/// An open workbook package.
pub struct Package {
    path: PathBuf,
    archive: RefCell<zip::ZipArchive<BufReader<File>>>,
}

impl Package {
    /// Open a package from a file path.
    ///
    /// Fails with `FileNotFound` when nothing exists at `path` and with
    /// `NotReadable` when the file cannot be opened as a ZIP archive.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sheetseek::container::Package;
    ///
    /// let package = Package::open("data.xlsx")?;
    /// # Ok::<(), sheetseek::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path).map_err(|e| Error::NotReadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
            source: None,
        })?;
        let archive = zip::ZipArchive::new(BufReader::new(file)).map_err(|e| Error::NotReadable {
            path: path.to_path_buf(),
            reason: "not a ZIP archive".to_string(),
            source: Some(e),
        })?;

        let package = Self {
            path: path.to_path_buf(),
            archive: RefCell::new(archive),
        };

        if let Some(bytes) = package.extract_part(CONTENT_TYPES_PART)? {
            ensure_spreadsheet(&package.path, &String::from_utf8_lossy(&bytes))?;
        }

        log::debug!(
            "opened package {} ({} parts)",
            package.path.display(),
            package.archive.borrow().len()
        );
        Ok(package)
    }

    /// Path the package was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if a part exists in the package.
    pub fn contains(&self, name: &str) -> bool {
        let archive = self.archive.borrow();
        let found = archive.file_names().any(|n| n == name);
        found
    }

    /// List all part names.
    pub fn part_names(&self) -> Vec<String> {
        let archive = self.archive.borrow();
        archive.file_names().map(String::from).collect()
    }

    /// Read a whole part into memory.
    ///
    /// Returns `Ok(None)` when the part is absent, which callers use for
    /// optional parts.
    pub fn extract_part(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let mut archive = self.archive.borrow_mut();
        let mut entry = match archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(extraction_failure(&self.path, name, zip_to_io(e))),
        };

        let mut data = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut data)
            .map_err(|e| extraction_failure(&self.path, name, e))?;
        Ok(Some(data))
    }

    /// Copy one part into a scratch file and return a sequential reader over it.
    ///
    /// The scratch file lives in `scratch_dir` (or the system temp dir) and is
    /// removed when the returned stream is dropped, including when extraction
    /// fails halfway.
    pub fn extract_part_to_stream(
        &self,
        name: &str,
        scratch_dir: Option<&Path>,
    ) -> Result<ScratchStream> {
        let failure = |source: io::Error| extraction_failure(&self.path, name, source);

        let mut archive = self.archive.borrow_mut();
        let mut entry = match archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => {
                return Err(failure(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("part '{}' not found in package", name),
                )))
            }
            Err(e) => return Err(failure(zip_to_io(e))),
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix("sheet_").suffix(".xml");
        let mut file = match scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(failure)?;

        let copied = io::copy(&mut entry, &mut file).map_err(failure)?;
        file.flush().map_err(failure)?;
        file.seek(SeekFrom::Start(0)).map_err(failure)?;

        log::debug!(
            "extracted {} ({} bytes) to {}",
            name,
            copied,
            file.path().display()
        );

        Ok(ScratchStream {
            part: name.to_string(),
            reader: BufReader::with_capacity(SCRATCH_BUFFER_SIZE, file),
        })
    }
}

fn extraction_failure(path: &Path, part: &str, source: io::Error) -> Error {
    Error::ExtractionFailure {
        path: path.to_path_buf(),
        part: part.to_string(),
        source,
    }
}

fn zip_to_io(err: ZipError) -> io::Error {
    match err {
        ZipError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("path", &self.path)
            .field("parts", &self.archive.borrow().len())
            .finish()
    }
}

/// A part copied out of the package, readable front to back.
///
/// Owns its backing temporary file; dropping the stream deletes it.
pub struct ScratchStream {
    part: String,
    reader: BufReader<NamedTempFile>,
}

impl ScratchStream {
    /// Name of the package part this stream was extracted from.
    pub fn part(&self) -> &str {
        &self.part
    }

    /// Location of the backing scratch file.
    pub fn scratch_path(&self) -> &Path {
        self.reader.get_ref().path()
    }
}

impl Read for ScratchStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl BufRead for ScratchStream {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.reader.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.reader.consume(amt)
    }
}

impl std::fmt::Debug for ScratchStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchStream")
            .field("part", &self.part)
            .field("scratch", &self.scratch_path())
            .finish()
    }
}
