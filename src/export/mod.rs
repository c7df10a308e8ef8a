//! XLSX export pipeline.
//!
//! Serializes a [`Workbook`] into a fresh XLSX package. Every sheet is
//! written in workbook order; the first one is the selected tab.

mod package;
mod sheet_writer;

use std::path::Path;

use crate::error::{CbqaError, Result};
use crate::types::Workbook;

/// Serialize a workbook to XLSX bytes.
///
/// # Errors
/// [`CbqaError::EmptyWorkbook`] when there is nothing to write, ZIP and I/O
/// errors from the archive writer.
pub fn write_xlsx(workbook: &Workbook) -> Result<Vec<u8>> {
    if workbook.sheets().is_empty() {
        return Err(CbqaError::EmptyWorkbook);
    }
    package::write_package(workbook)
}

/// Serialize a workbook and write it to `path`.
///
/// # Errors
/// See [`write_xlsx`], plus I/O errors writing the file.
pub fn save_xlsx(workbook: &Workbook, path: &Path) -> Result<()> {
    let bytes = write_xlsx(workbook)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
