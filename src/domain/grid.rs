/// Maze cells and the grid aggregate.
/// Cell semantics are queried via methods, not stored as flags,
/// so they stay centralized here.
///
/// The grid keeps two layers: `base_cells` is the immutable template,
/// `cells` is the live layer mutated by collection. A level reset copies
/// base over live and recounts the collectibles.

// ── CellKind ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CellKind {
    Empty,
    Wall,
    Dot,         // 10 points
    PowerPellet, // 50 points, starts power mode
}

impl CellKind {
    pub fn is_wall(self) -> bool {
        matches!(self, CellKind::Wall)
    }

    /// Can the player pick this up?
    pub fn is_collectible(self) -> bool {
        matches!(self, CellKind::Dot | CellKind::PowerPellet)
    }
}

impl Default for CellKind {
    fn default() -> Self {
        CellKind::Empty
    }
}

// ── Grid dimensions ──

pub const GRID_WIDTH: usize = 15;
pub const GRID_HEIGHT: usize = 15;

/// The built-in maze.
///
/// Legend:  '#'=Wall  '.'=Dot  'o'=PowerPellet  ' '=Empty
///
/// The border is solid wall; the single interior empty cell (7,7) is the
/// player spawn and the adversary respawn point.
const DEFAULT_MAP: [&str; GRID_HEIGHT] = [
    "###############",
    "#......#......#",
    "#o##.#.#.#.##o#",
    "#.##.#####.##.#",
    "#.............#",
    "#.............#",
    "#.##.#.#.#.##.#",
    "#..#.#. .#.#..#",
    "##.#.#.#.#.#.##",
    "#....#...#....#",
    "#.##.#####.##.#",
    "#..#.......#..#",
    "#o##.#.#.#.##o#",
    "#......#......#",
    "###############",
];

// ── Maze ──

#[derive(Clone, Debug)]
pub struct Maze {
    base_cells: Vec<Vec<CellKind>>,
    cells: Vec<Vec<CellKind>>,
    pub width: usize,
    pub height: usize,
    remaining: usize,
}

impl Maze {
    /// The built-in 15×15 maze.
    pub fn standard() -> Self {
        Maze::from_rows(&DEFAULT_MAP)
    }

    /// Build a maze from string rows using the template legend.
    /// Unknown characters become Empty.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.chars().count());
        let mut cells = vec![vec![CellKind::Empty; width]; height];
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if x >= width {
                    break;
                }
                cells[y][x] = match ch {
                    '#' => CellKind::Wall,
                    '.' => CellKind::Dot,
                    'o' => CellKind::PowerPellet,
                    _ => CellKind::Empty,
                };
            }
        }
        let remaining = count_collectibles(&cells);
        Maze {
            base_cells: cells.clone(),
            cells,
            width,
            height,
            remaining,
        }
    }

    /// Cell classification at (x, y). Out of bounds reads as Wall.
    pub fn cell_at(&self, x: usize, y: usize) -> CellKind {
        if x >= self.width || y >= self.height {
            return CellKind::Wall;
        }
        self.cells[y][x]
    }

    /// Can an entity occupy (x, y)?
    pub fn is_open(&self, x: usize, y: usize) -> bool {
        !self.cell_at(x, y).is_wall()
    }

    /// Pick up the collectible at (x, y).
    ///
    /// Returns `(score_delta, starts_power_mode)`, or `None` when the
    /// cell holds nothing to collect. Out of bounds reads as `Wall` and
    /// is a no-op.
    pub fn collect(&mut self, x: usize, y: usize) -> Option<(u32, bool)> {
        match self.cell_at(x, y) {
            CellKind::Dot => {
                self.cells[y][x] = CellKind::Empty;
                self.remaining -= 1;
                Some((10, false))
            }
            CellKind::PowerPellet => {
                self.cells[y][x] = CellKind::Empty;
                self.remaining -= 1;
                Some((50, true))
            }
            _ => None,
        }
    }

    /// Collectibles (dots + pellets) still on the live layer.
    pub fn remaining_collectibles(&self) -> usize {
        self.remaining
    }

    /// Restore the live layer from the template and recount.
    pub fn reset(&mut self) {
        self.cells = self.base_cells.clone();
        self.remaining = count_collectibles(&self.cells);
    }
}

fn count_collectibles(cells: &[Vec<CellKind>]) -> usize {
    cells
        .iter()
        .flat_map(|row| row.iter())
        .filter(|c| c.is_collectible())
        .count()
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
