//! Collision and placement: move validation, rotation, gravity, lock, line clear.

use crate::driver::{GameState, Status};
use crate::grid::{Grid, GridError};
use crate::piece::{ActivePiece, Position, Shape, random_definition};
use log::{debug, info, warn};
use rand::Rng;

/// Points per cleared row.
pub const LINE_SCORE: u32 = 100;

/// Result of one gravity step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GravityStep {
    Moved,
    Locked,
}

/// What a lock did to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOutcome {
    pub lines_cleared: u32,
    pub topped_out: bool,
}

/// True if every occupied cell of `shape` at `pos` lands inside the walls, above the floor,
/// and on an empty cell. Cells above row 0 are allowed.
pub fn is_valid_move(grid: &Grid, shape: &Shape, pos: Position) -> bool {
    let columns = grid.columns() as i32;
    let rows = grid.rows() as i32;
    shape.occupied().all(|(sx, sy)| {
        let x = pos.x + sx;
        let y = pos.y + sy;
        if x < 0 || x >= columns || y >= rows {
            return false;
        }
        grid.is_empty_at(x, y).unwrap_or(false)
    })
}

/// Quarter turn: transpose, then reverse row order. `new[i][j] = old[j][w - 1 - i]`.
///
/// With y growing downward this turns the shape counter-clockwise on screen.
pub fn rotate(shape: &Shape) -> Shape {
    let w = shape.width();
    Shape::from_fn(shape.height(), w, |x, y| shape.is_occupied(w - 1 - y, x))
}

/// Shift the active piece if the target is valid. Returns whether it moved.
pub fn try_move(state: &mut GameState, dx: i32, dy: i32) -> bool {
    let target = state.piece.pos.offset(dx, dy);
    if is_valid_move(&state.grid, &state.piece.shape, target) {
        state.piece.pos = target;
        true
    } else {
        false
    }
}

/// Rotate in place if the rotated shape fits at the current position. No wall kicks.
pub fn try_rotate(state: &mut GameState) -> bool {
    let rotated = rotate(&state.piece.shape);
    if is_valid_move(&state.grid, &rotated, state.piece.pos) {
        state.piece.shape = rotated;
        true
    } else {
        false
    }
}

/// Move the piece down one row, or report that it has landed.
pub fn apply_gravity_step(grid: &Grid, piece: &mut ActivePiece) -> GravityStep {
    let below = piece.pos.offset(0, 1);
    if is_valid_move(grid, &piece.shape, below) {
        piece.pos = below;
        GravityStep::Moved
    } else {
        GravityStep::Locked
    }
}

/// Write the piece's colour into every cell it occupies.
pub fn merge_piece(grid: &mut Grid, piece: &ActivePiece) -> Result<(), GridError> {
    for (x, y) in piece.cells() {
        grid.set(x, y, piece.color)?;
    }
    Ok(())
}

/// One bottom-up pass over the row indices. A cleared row is replaced by the row above it,
/// which is not re-examined in this pass. Returns the number of rows cleared.
pub fn clear_completed_lines(grid: &mut Grid) -> u32 {
    let mut cleared = 0;
    for y in (0..grid.rows()).rev() {
        if grid.is_row_full(y) {
            grid.clear_row(y);
            cleared += 1;
        }
    }
    cleared
}

/// Lock the active piece: merge, clear lines, score, then spawn the next piece.
/// A spawn that is immediately blocked tops the game out.
pub fn lock_and_respawn<R: Rng>(
    state: &mut GameState,
    rng: &mut R,
) -> Result<LockOutcome, GridError> {
    merge_piece(&mut state.grid, &state.piece)?;
    debug!(
        "locked {:?} piece at ({}, {})",
        state.piece.color, state.piece.pos.x, state.piece.pos.y
    );

    let lines_cleared = clear_completed_lines(&mut state.grid);
    if lines_cleared > 0 {
        state.score += lines_cleared * LINE_SCORE;
        info!("cleared {} line(s), score {}", lines_cleared, state.score);
    }

    state.piece = ActivePiece::spawn(random_definition(rng), state.grid.columns());
    debug!("spawned {:?} piece at x={}", state.piece.color, state.piece.pos.x);

    let topped_out = !is_valid_move(&state.grid, &state.piece.shape, state.piece.pos);
    if topped_out {
        warn!("spawn position blocked, score {}", state.score);
        state.status = Status::ToppedOut;
    }
    Ok(LockOutcome {
        lines_cleared,
        topped_out,
    })
}
