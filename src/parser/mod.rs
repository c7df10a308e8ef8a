//! XLSX reader.
//!
//! Reads sheet names and cells back into a [`Workbook`]: inline and shared
//! strings, numbers, formulas and error cells, plus frozen panes and column
//! widths. Styles, drawings and everything else in the package are skipped.

mod relationships;
mod worksheet;

use std::io::Cursor;
use std::path::Path;
use zip::ZipArchive;

use crate::error::Result;
use crate::types::Workbook;

use relationships::{get_sheet_info, parse_shared_strings, parse_workbook_relationships};
use worksheet::parse_sheet;

/// Parse XLSX bytes into a workbook.
///
/// # Errors
/// ZIP, XML and [`crate::CbqaError::Parse`] errors for malformed parts;
/// sheet name errors for names this crate would not write.
pub fn read_xlsx(data: &[u8]) -> Result<Workbook> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;

    let rels = parse_workbook_relationships(&mut archive)?;
    let sheet_info = get_sheet_info(&mut archive, &rels.worksheets)?;
    let shared_strings = parse_shared_strings(&mut archive, rels.shared_strings.as_deref())?;

    let mut workbook = Workbook::new();
    for info in &sheet_info {
        let sheet = parse_sheet(&mut archive, info, &shared_strings)?;
        log::debug!("Read sheet `{}` ({} rows)", sheet.name, sheet.max_row());
        workbook.add_sheet(sheet)?;
    }
    Ok(workbook)
}

/// Read and parse an XLSX file.
///
/// # Errors
/// I/O errors, then see [`read_xlsx`].
pub fn read_xlsx_path(path: &Path) -> Result<Workbook> {
    let data = std::fs::read(path)?;
    read_xlsx(&data)
}
