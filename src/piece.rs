//! Piece catalog: shapes, colours, and the falling piece.

use rand::Rng;
use std::sync::LazyLock;

/// Colour names carried by the catalog; mapped to terminal colours by the theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceColor {
    Cyan,
    Blue,
    Yellow,
    Green,
    Orange,
    Red,
    Purple,
}

impl PieceColor {
    pub const ALL: [Self; 7] = [
        Self::Cyan,
        Self::Blue,
        Self::Yellow,
        Self::Green,
        Self::Orange,
        Self::Red,
        Self::Purple,
    ];

    /// Lower-case name, used as the theme file key.
    pub fn name(self) -> &'static str {
        match self {
            Self::Cyan => "cyan",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Orange => "orange",
            Self::Red => "red",
            Self::Purple => "purple",
        }
    }
}

/// Rectangular occupancy matrix, row-major; `cells[y * width + x]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Shape {
    /// Build from rows of 0/1. Short rows are padded with unoccupied cells.
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let width = rows.iter().map(|row| row.len()).max().unwrap_or(0);
        let mut cells = vec![false; width * rows.len()];
        for (y, row) in rows.iter().enumerate() {
            for (x, &v) in row.iter().enumerate() {
                cells[y * width + x] = v != 0;
            }
        }
        Self {
            width,
            height: rows.len(),
            cells,
        }
    }

    pub(crate) fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> bool) -> Self {
        let cells = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self {
            width,
            height,
            cells,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// False outside the matrix.
    #[inline]
    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[y * self.width + x]
    }

    /// Occupied cells as (dx, dy) offsets from the top-left corner.
    pub fn occupied(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, filled)| **filled)
            .map(|(i, _)| ((i % self.width) as i32, (i / self.width) as i32))
    }
}

/// Catalog entry: template shape and its colour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceDef {
    pub shape: Shape,
    pub color: PieceColor,
}

fn def(rows: &[&[u8]], color: PieceColor) -> PieceDef {
    PieceDef {
        shape: Shape::from_rows(rows),
        color,
    }
}

static CATALOG: LazyLock<[PieceDef; 7]> = LazyLock::new(|| {
    [
        def(&[&[1, 1, 1, 1]], PieceColor::Cyan),
        def(&[&[1, 1, 1], &[1]], PieceColor::Blue),
        def(&[&[1, 1], &[1, 1]], PieceColor::Yellow),
        def(&[&[0, 1, 0], &[1, 1, 1]], PieceColor::Green),
        def(&[&[1, 0, 0], &[1, 1, 1]], PieceColor::Orange),
        def(&[&[0, 1, 1], &[1, 1, 0]], PieceColor::Red),
        def(&[&[1, 1, 0], &[0, 1, 1]], PieceColor::Purple),
    ]
});

/// All piece definitions in fixed order: I, J, O, then the four three-wide pieces.
pub fn catalog() -> &'static [PieceDef] {
    CATALOG.as_slice()
}

/// Uniform pick over `catalog()`.
pub fn random_definition<R: Rng>(rng: &mut R) -> &'static PieceDef {
    let all = catalog();
    &all[rng.random_range(0..all.len())]
}

/// Top-left offset into grid coordinates. y may be negative above the visible area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// The falling piece. Its shape may be a rotated copy of the catalog template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePiece {
    pub shape: Shape,
    pub color: PieceColor,
    pub pos: Position,
}

impl ActivePiece {
    /// Spawn horizontally centred on row 0.
    pub fn spawn(def: &PieceDef, columns: usize) -> Self {
        let x = (columns / 2) as i32 - (def.shape.width() / 2) as i32;
        Self {
            shape: def.shape.clone(),
            color: def.color,
            pos: Position::new(x, 0),
        }
    }

    /// Absolute grid coordinates of every occupied cell.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape
            .occupied()
            .map(|(dx, dy)| (self.pos.x + dx, self.pos.y + dy))
    }
}
