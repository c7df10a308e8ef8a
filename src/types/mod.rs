//! Workbook model shared by the layout engine, the package writer and the reader.

mod cell;
mod workbook;

pub use cell::*;
pub use workbook::*;
