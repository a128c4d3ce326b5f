//! Playfield grid: fixed ROWS x COLUMNS matrix of cells, row clearing.

use crate::piece::PieceColor;
use std::collections::VecDeque;
use thiserror::Error;

/// Single cell: either empty or filled with a piece colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(PieceColor),
}

impl Cell {
    #[inline]
    pub fn is_filled(self) -> bool {
        matches!(self, Self::Filled(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i32, y: i32 },
}

/// Grid of cells. y=0 is top; rows[y][x] = cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    columns: usize,
    rows: VecDeque<Vec<Cell>>,
}

impl Grid {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            columns,
            rows: (0..rows).map(|_| vec![Cell::Empty; columns]).collect(),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Index into the row storage, or `OutOfBounds`.
    fn index(&self, x: i32, y: i32) -> Result<(usize, usize), GridError> {
        let in_x = usize::try_from(x).ok().filter(|&x| x < self.columns);
        let in_y = usize::try_from(y).ok().filter(|&y| y < self.rows.len());
        match (in_x, in_y) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(GridError::OutOfBounds { x, y }),
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Result<Cell, GridError> {
        let (x, y) = self.index(x, y)?;
        Ok(self.rows[y][x])
    }

    pub fn set(&mut self, x: i32, y: i32, color: PieceColor) -> Result<(), GridError> {
        let (x, y) = self.index(x, y)?;
        self.rows[y][x] = Cell::Filled(color);
        Ok(())
    }

    /// Rows above the visible area (y < 0) are always empty.
    pub fn is_empty_at(&self, x: i32, y: i32) -> Result<bool, GridError> {
        if y < 0 {
            return Ok(true);
        }
        Ok(!self.get(x, y)?.is_filled())
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        self.rows
            .get(y)
            .is_some_and(|row| row.iter().all(|cell| cell.is_filled()))
    }

    /// Drop row `y` and push a fresh empty row on top; rows above `y` shift down by one.
    pub fn clear_row(&mut self, y: usize) {
        if self.rows.remove(y).is_some() {
            self.rows.push_front(vec![Cell::Empty; self.columns]);
        }
    }

    /// Rows top to bottom.
    pub fn rows_iter(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }
}
