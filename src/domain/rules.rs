/// Movement rules — pure functions over the maze, no side effects.
/// They compute outcomes; the step pipeline applies them.
///
/// ## Turn acceptance (before the forward step, same tick)
/// ┌──────────────────────────────────┬──────────────────────────────────┐
/// │ Condition                         │ Result                           │
/// ├──────────────────────────────────┼──────────────────────────────────┤
/// │ request exists, heading open      │ dir := request, request cleared  │
/// │ request exists, heading blocked   │ dir unchanged, request retained  │
/// │ no request                        │ dir unchanged                    │
/// └──────────────────────────────────┴──────────────────────────────────┘
///
/// ## Forward step
/// ┌──────────────────────────────────┬──────────────────────────────────┐
/// │ destination open                  │ position := destination          │
/// │ destination wall                  │ position unchanged, dir retained │
/// └──────────────────────────────────┴──────────────────────────────────┘
///
/// Coordinates are clamped to the grid before any wall check, so an
/// out-of-range request degrades to "no move" instead of wrapping.

use super::entity::Direction;
use super::grid::Maze;

/// The cell one step in `dir` from (x, y), clamped to grid bounds.
pub fn target_cell(maze: &Maze, x: usize, y: usize, dir: Direction) -> (usize, usize) {
    let (dx, dy) = dir.delta();
    let tx = (x as i32 + dx).clamp(0, maze.width as i32 - 1) as usize;
    let ty = (y as i32 + dy).clamp(0, maze.height as i32 - 1) as usize;
    (tx, ty)
}

/// Is the cell one step in `dir` open?
pub fn heading_open(maze: &Maze, x: usize, y: usize, dir: Direction) -> bool {
    let (tx, ty) = target_cell(maze, x, y, dir);
    maze.is_open(tx, ty)
}

/// Result of one movement tick for a turn-driven entity. A wall leaves
/// the position unchanged with the direction retained.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MoveOutcome {
    pub x: usize,
    pub y: usize,
    pub dir: Direction,
    pub pending: Option<Direction>,
}

/// Resolve one movement tick: accept the pending turn if its heading is
/// open, then step forward along the (possibly updated) direction unless a
/// wall blocks it.
pub fn resolve_move(
    maze: &Maze,
    x: usize,
    y: usize,
    mut dir: Direction,
    mut pending: Option<Direction>,
) -> MoveOutcome {
    if let Some(req) = pending {
        if heading_open(maze, x, y, req) {
            dir = req;
            pending = None;
        }
    }

    let (tx, ty) = target_cell(maze, x, y, dir);
    if maze.is_open(tx, ty) {
        MoveOutcome { x: tx, y: ty, dir, pending }
    } else {
        MoveOutcome { x, y, dir, pending }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
