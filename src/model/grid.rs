//! Jagged cell grids, sheets and parsed files.

use super::Cell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A row of optional cells. `None` marks a position the source never emitted.
pub type GridRow = Vec<Option<Cell>>;

/// An ordered, possibly jagged, sequence of rows.
///
/// Rows and columns are 0-based. Rows need not share a length and an empty
/// grid is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    pub rows: Vec<GridRow>,
}

impl Grid {
    /// Create an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing rows.
    pub fn from_rows(rows: Vec<GridRow>) -> Self {
        Self { rows }
    }

    /// Append a row.
    pub fn push_row(&mut self, row: GridRow) {
        self.rows.push(row);
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Length of the longest row.
    pub fn col_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `(row, col)`, if both the slot and the cell exist.
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row)?.get(col)?.as_ref()
    }

    /// Mutable cell at `(row, col)`.
    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        self.rows.get_mut(row)?.get_mut(col)?.as_mut()
    }

    /// Store a cell, growing the grid with empty rows and slots as needed.
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let slots = &mut self.rows[row];
        if slots.len() <= col {
            slots.resize(col + 1, None);
        }
        slots[col] = Some(cell);
    }

    /// Iterate over present cells with their positions.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &Cell)> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(c, slot)| slot.as_ref().map(|cell| (r, c, cell)))
        })
    }
}

/// A named worksheet and its grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    /// Display name from workbook.xml
    pub name: String,
    /// Cell grid
    pub grid: Grid,
}

impl Sheet {
    pub fn new(name: impl Into<String>, grid: Grid) -> Self {
        Self {
            name: name.into(),
            grid,
        }
    }
}

/// All sheets read from one package file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedFile {
    /// Full path of the source file
    pub path: PathBuf,
    /// File name component
    pub file_name: String,
    /// Sheets in workbook order
    pub sheets: Vec<Sheet>,
}

impl ParsedFile {
    /// Look up a sheet by display name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jagged_extents() {
        let grid = Grid::from_rows(vec![
            vec![Some(Cell::new("a"))],
            vec![],
            vec![None, None, Some(Cell::new("c"))],
        ]);
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.col_count(), 3);
        assert_eq!(grid.get(2, 2).map(|c| c.value.as_str()), Some("c"));
        assert!(grid.get(2, 1).is_none());
        assert!(grid.get(1, 0).is_none());
        assert!(grid.get(9, 9).is_none());
    }

    #[test]
    fn test_set_grows_grid() {
        let mut grid = Grid::new();
        assert!(grid.is_empty());
        assert_eq!(grid.col_count(), 0);

        grid.set(1, 2, Cell::new("x"));
        assert_eq!(grid.row_count(), 2);
        assert!(grid.rows[0].is_empty());
        assert_eq!(grid.rows[1], vec![None, None, Some(Cell::new("x"))]);
    }

    #[test]
    fn test_cells_iterator_skips_gaps() {
        let grid = Grid::from_rows(vec![
            vec![Some(Cell::new("a")), None],
            vec![None, Some(Cell::new("b"))],
        ]);
        let positions: Vec<_> = grid.cells().map(|(r, c, cell)| (r, c, cell.value.clone())).collect();
        assert_eq!(positions, vec![(0, 0, "a".to_string()), (1, 1, "b".to_string())]);
    }
}
