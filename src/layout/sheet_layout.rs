//! Row cursor and position indices for one sheet.
//!
//! Blocks are stacked top to bottom. Each block is a title row in column A,
//! followed by its data rows, followed by one blank separator row, so the
//! cursor advances by `rows + BLOCK_GAP` per block.

use super::PositionIndex;
use crate::cell_ref::{CellRef, ColumnTable};
use crate::error::Result;
use crate::types::{CellValue, Sheet};

/// Rows added after a block's data rows: its title row and one blank row.
pub const BLOCK_GAP: u32 = 2;

/// 1-based row number of a row written through [`SheetLayout::write_row`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowHandle(u32);

impl RowHandle {
    pub(crate) fn new(row: u32) -> Self {
        Self(row)
    }

    /// 1-based row number.
    #[must_use]
    pub fn row(self) -> u32 {
        self.0
    }

    /// 0-indexed row, as stored in [`Sheet`].
    #[must_use]
    pub fn index(self) -> u32 {
        self.0.saturating_sub(1)
    }
}

/// Reference to the cell of `handle`'s row at a period offset.
///
/// # Errors
/// [`crate::CbqaError::ColumnOverflow`] when the offset is past the column table.
pub fn formula_ref(columns: &ColumnTable, handle: RowHandle, period: u32) -> Result<CellRef> {
    columns.cell(period, handle.row())
}

/// Per-sheet mutable state: the row cursor and both position indices.
#[derive(Debug, Clone)]
pub struct SheetLayout {
    initial_row: u32,
    cursor: u32,
    next_row: u32,
    positions: PositionIndex,
    cumulative: PositionIndex,
}

impl SheetLayout {
    /// Fresh state whose first block title goes on `initial_row` (1-based).
    #[must_use]
    pub fn new(initial_row: u32) -> Self {
        Self {
            initial_row,
            cursor: initial_row,
            next_row: initial_row.saturating_add(1),
            positions: PositionIndex::new(),
            cumulative: PositionIndex::new(),
        }
    }

    /// Row the next block title goes on.
    #[must_use]
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    #[must_use]
    pub fn initial_row(&self) -> u32 {
        self.initial_row
    }

    #[must_use]
    pub fn positions(&self) -> &PositionIndex {
        &self.positions
    }

    #[must_use]
    pub fn cumulative(&self) -> &PositionIndex {
        &self.cumulative
    }

    pub(crate) fn positions_mut(&mut self) -> &mut PositionIndex {
        &mut self.positions
    }

    pub(crate) fn cumulative_mut(&mut self) -> &mut PositionIndex {
        &mut self.cumulative
    }

    /// Write the header row just above the first block, from column B.
    /// The label cell in column A stays blank.
    pub(crate) fn write_header(
        &self,
        sheet: &mut Sheet,
        values: impl IntoIterator<Item = CellValue>,
    ) -> RowHandle {
        let handle = RowHandle::new(self.initial_row.saturating_sub(1).max(1));
        for (col, value) in (1u32..).zip(values) {
            sheet.set_cell(handle.index(), col, value);
        }
        handle
    }

    /// Put `title` in column A at the cursor; rows follow right below.
    pub(crate) fn open_block(&mut self, sheet: &mut Sheet, title: &str) {
        sheet.set_cell(RowHandle::new(self.cursor).index(), 0, title.into());
        self.next_row = self.cursor.saturating_add(1);
    }

    /// Write `label` in column A and `values` from column B on the next block row.
    pub(crate) fn write_row(
        &mut self,
        sheet: &mut Sheet,
        label: &str,
        values: impl IntoIterator<Item = CellValue>,
    ) -> RowHandle {
        let handle = RowHandle::new(self.next_row);
        write_cells(sheet, handle, std::iter::once(label.into()).chain(values));
        self.next_row = self.next_row.saturating_add(1);
        handle
    }

    /// Move the cursor past the block just written and its separator row.
    pub(crate) fn close_block(&mut self) {
        self.cursor = self.next_row.saturating_add(1);
    }

    /// Back to the initial cursor with empty indices. Written cells stay.
    pub fn reset(&mut self) {
        self.cursor = self.initial_row;
        self.next_row = self.initial_row.saturating_add(1);
        self.positions.clear();
        self.cumulative.clear();
    }

    /// Whether the state equals a fresh [`SheetLayout::new`].
    #[must_use]
    pub fn is_reset(&self) -> bool {
        self.cursor == self.initial_row && self.positions.is_empty() && self.cumulative.is_empty()
    }
}

fn write_cells(sheet: &mut Sheet, handle: RowHandle, values: impl IntoIterator<Item = CellValue>) {
    for (col, value) in (0u32..).zip(values) {
        sheet.set_cell(handle.index(), col, value);
    }
}
