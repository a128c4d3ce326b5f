//! Drawing seam: a pixel surface and a score sink, fed from `GameState`.

use crate::driver::GameState;
use crate::grid::Cell;
use crate::piece::PieceColor;

/// Pixels per grid cell.
pub const BLOCK_SIZE: u32 = 30;

/// Something that can draw filled and outlined rectangles in pixel coordinates.
pub trait Surface {
    fn clear_surface(&mut self, width: u32, height: u32);
    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: PieceColor);
    fn stroke_rect(&mut self, x: u32, y: u32, w: u32, h: u32);
}

/// Numeric sink updated whenever the score changes.
pub trait ScoreDisplay {
    fn show_score(&mut self, score: u32);
}

fn draw_block<S: Surface + ?Sized>(surface: &mut S, x: i32, y: i32, color: PieceColor, bs: u32) {
    let (px, py) = (x as u32 * bs, y as u32 * bs);
    surface.fill_rect(px, py, bs, bs, color);
    surface.stroke_rect(px, py, bs, bs);
}

/// Full redraw: clear, every filled grid cell, then the active piece.
/// Piece cells above the top row are skipped.
pub fn render<S: Surface + ?Sized>(state: &GameState, surface: &mut S, block_size: u32) {
    let grid = &state.grid;
    surface.clear_surface(
        grid.columns() as u32 * block_size,
        grid.rows() as u32 * block_size,
    );
    for (y, row) in grid.rows_iter().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            if let Cell::Filled(color) = *cell {
                draw_block(surface, x as i32, y as i32, color, block_size);
            }
        }
    }
    for (x, y) in state.piece.cells().filter(|&(x, y)| x >= 0 && y >= 0) {
        draw_block(surface, x, y, state.piece.color, block_size);
    }
}
