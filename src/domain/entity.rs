/// Entities: the Direction value type, Player, and Adversary records.
/// Movement logic lives in `rules`; these are plain data with spawns.

// ── Direction ──

/// One of the four unit steps. y grows downward (row-major grid).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// The exact reverse heading. Well-defined for all four members.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

// ── Player ──

pub const PLAYER_SPAWN: (usize, usize) = (7, 7);

#[derive(Clone, Debug)]
pub struct Player {
    pub x: usize,
    pub y: usize,
    pub dir: Direction,
    /// Most recently requested turn, applied opportunistically before the
    /// forward step. Latest request wins.
    pub pending: Option<Direction>,
}

impl Player {
    pub fn spawn() -> Self {
        Player {
            x: PLAYER_SPAWN.0,
            y: PLAYER_SPAWN.1,
            dir: Direction::Right,
            pending: None,
        }
    }
}

// ── Adversary ──

/// Cosmetic identity for rendering; the simulation never reads it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AdversaryColor {
    Red,
    Cyan,
    Pink,
    Orange,
}

#[derive(Clone, Debug)]
pub struct Adversary {
    pub id: usize,
    pub x: usize,
    pub y: usize,
    pub dir: Direction,
    pub color: AdversaryColor,
}

impl Adversary {
    fn new(id: usize, x: usize, y: usize, dir: Direction, color: AdversaryColor) -> Self {
        Adversary { id, x, y, dir, color }
    }

    /// The four adversaries at their corner spawns with distinct headings.
    pub fn spawn_all() -> Vec<Adversary> {
        vec![
            Adversary::new(0, 1, 1, Direction::Right, AdversaryColor::Red),
            Adversary::new(1, 13, 1, Direction::Left, AdversaryColor::Cyan),
            Adversary::new(2, 1, 13, Direction::Up, AdversaryColor::Pink),
            Adversary::new(3, 13, 13, Direction::Down, AdversaryColor::Orange),
        ]
    }
}
