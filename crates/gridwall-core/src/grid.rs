//! The canonical grid: a fixed-length array of cell values.
//!
//! The length is set once at construction and never changes. Writes go
//! through [`Grid::apply_write`], which trusts its caller: range and rate
//! checks belong to the coordinator in [`crate::board`].

/// Fixed-size square grid of cell values. An empty string is a blank cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<String>,
}

impl Grid {
    /// Create a blank grid with `size * size` cells.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![String::new(); size.saturating_mul(size)],
        }
    }

    /// Side length of the grid.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Total number of cells, `size * size`.
    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    /// Owned copy of every cell value in index order.
    pub fn snapshot(&self) -> Vec<String> {
        self.cells.clone()
    }

    /// Value of one cell, or `None` if `index` is out of range.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }

    /// Overwrite one cell. Out-of-range indices are ignored.
    pub fn apply_write(&mut self, index: usize, value: String) {
        if let Some(cell) = self.cells.get_mut(index) {
            *cell = value;
        }
    }
}
