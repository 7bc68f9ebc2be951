/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// Each frame is composed into the `front` cell buffer, diffed against
/// `back` (the previous frame), and only the differences become terminal
/// commands — batched with `queue!` and flushed once per frame, then the
/// buffers swap. The partial updates keep the terminal flicker-free;
/// resize and phase changes force a full repaint.
///
/// The board is a fixed 15×15 grid, two terminal columns per game cell.
/// Overlays (countdown digit, pause, level clear, game over) draw on top
/// of the composed board.

use std::io::{self, BufWriter, Write};
use std::time::Instant;

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::AdversaryColor;
use crate::domain::grid::{CellKind, GRID_HEIGHT, GRID_WIDTH};
use crate::sim::session::{Phase, Session};

// ── Palette ──

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const OVERLAY_BG: Color = Color::Rgb { r: 30, g: 30, b: 46 };
const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const GREEN: Color = Color::Rgb { r: 80, g: 255, b: 80 };

const WALL_COLOR: Color = Color::Rgb { r: 37, g: 99, b: 235 };
const DOT_COLOR: Color = Color::Rgb { r: 254, g: 249, b: 195 };
const PELLET_COLOR: Color = Color::Rgb { r: 253, g: 224, b: 71 };
const PLAYER_COLOR: Color = Color::Rgb { r: 250, g: 204, b: 21 };
/// Every adversary turns this while power mode is active.
const FLEE_COLOR: Color = Color::Rgb { r: 0, g: 0, b: 255 };

fn adversary_color(c: AdversaryColor) -> Color {
    match c {
        AdversaryColor::Red => Color::Rgb { r: 239, g: 68, b: 68 },
        AdversaryColor::Cyan => Color::Rgb { r: 34, g: 211, b: 238 },
        AdversaryColor::Pink => Color::Rgb { r: 236, g: 72, b: 153 },
        AdversaryColor::Orange => Color::Rgb { r: 249, g: 115, b: 22 },
    }
}

/// Darken an RGB color to a third of its brightness. The board is drawn
/// this way behind the game-over overlay.
fn dim_color(c: Color) -> Color {
    match c {
        Color::Rgb { r, g, b } => Color::Rgb { r: r / 3, g: g / 3, b: b / 3 },
        other => other,
    }
}

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every "empty" cell.
    ///
    /// VTE-based terminals (GNOME Terminal and friends) paint inter-row
    /// gap pixels with the color of the last `Clear`, not the cell above
    /// them. Clearing with the same RGB that every cell carries as its
    /// background keeps those gaps invisible.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel that matches no real cell; filling `back` with it makes
    /// the next diff repaint every position.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    /// Map `Color::Reset` to BASE_BG so no cell ever carries the
    /// terminal-default background.
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn as_str(&self) -> &str {
        if self.ch_len == 0 {
            return "";
        }
        unsafe { std::str::from_utf8_unchecked(&self.ch[..self.ch_len as usize]) }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            cx += 1;
        }
    }
}

// ── Renderer ──

/// Each game cell spans 2 terminal columns, so game cell gx maps to
/// columns (gx*2, gx*2+1).
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(
        &mut self,
        session: &Session,
        high_score: u32,
        message: &str,
        now: Instant,
    ) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // A phase change clears the screen so the new layout starts clean
        if self.last_phase != Some(session.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(session.phase);
        }

        // Build front buffer
        self.front.clear();

        match session.phase {
            Phase::Idle => self.compose_title(session, high_score, message),
            _ => {
                self.compose_game(session, high_score, message, now);
                match session.phase {
                    Phase::Countdown => self.compose_countdown_overlay(session),
                    Phase::Paused => self.compose_pause_overlay(),
                    Phase::LevelTransition => self.compose_level_overlay(session),
                    Phase::GameOver => self.compose_game_over_overlay(session, high_score),
                    _ => {}
                }
            }
        }

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Open the frame with explicit colors, never ResetColor: the
        // terminal's native default can differ from BASE_BG and would
        // draw line artifacts into the row gaps.
        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                // Position cursor if needed
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                // Set colors only if changed
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, s: &Session, high_score: u32, message: &str, now: Instant) {
        let buf_w = self.front.width;

        // ── HUD row ──
        let power = match s.power_remaining(now) {
            // Display rounds up so the counter reads 10..1, never 0.
            Some(left) => format!("  POWER {}s", (left.as_millis() + 999) / 1000),
            None => String::new(),
        };
        let hud = format!(
            " Score:{:<7} Hi:{:<7} ♥×{}  Level {:<2} {:<6}{} ",
            s.score,
            high_score,
            s.lives,
            s.level,
            s.difficulty.label(),
            power,
        );
        for x in 0..buf_w {
            self.front.set(x, HUD_ROW, Cell::from_char(' ', Color::White, HUD_BG));
        }
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Board ──
        let dim = s.phase == Phase::GameOver;
        for gy in 0..s.maze.height {
            let row = MAP_ROW + gy;
            if row >= self.front.height {
                break;
            }
            for gx in 0..s.maze.width {
                let col = gx * CELL_W;
                if col + 1 >= buf_w {
                    break;
                }
                self.compose_cell(s, gx, gy, col, row, dim);
            }
        }

        // ── Message bar ──
        let msg_row = MAP_ROW + s.maze.height + 1;
        if msg_row < self.front.height && !message.is_empty() {
            let msg = format!(" ◈ {} ", message);
            for x in 0..buf_w {
                self.front.set(x, msg_row, Cell::from_char(' ', Color::Black, MSG_BG));
            }
            self.front.put_str(0, msg_row, &msg, Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help_row = MAP_ROW + s.maze.height + 3;
        if help_row < self.front.height {
            let help = " ←→↑↓/WASD:Steer  P:Pause  R:Reset  Q:Quit";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    /// Write the visual for game cell (gx, gy) into the front buffer at
    /// (col, row). Each game cell = 2 terminal columns. `dim` darkens the
    /// whole board for the game-over screen.
    fn compose_cell(&mut self, s: &Session, gx: usize, gy: usize, col: usize, row: usize, dim: bool) {
        let shade = |c: Color| if dim { dim_color(c) } else { c };

        // Player over everything else on the cell
        if s.player.x == gx && s.player.y == gy {
            self.front.set(col, row, Cell::from_char('ᗧ', shade(PLAYER_COLOR), Color::Reset));
            self.front.set(col + 1, row, Cell::BLANK);
            return;
        }

        let frightened = s.power_mode();
        for adv in &s.adversaries {
            if adv.x == gx && adv.y == gy {
                let fg = if frightened {
                    FLEE_COLOR
                } else {
                    adversary_color(adv.color)
                };
                self.front.set(col, row, Cell::from_char('ᗣ', shade(fg), Color::Reset));
                self.front.set(col + 1, row, Cell::BLANK);
                return;
            }
        }

        let (c0, c1, fg) = match s.maze.cell_at(gx, gy) {
            CellKind::Wall => ('█', '█', WALL_COLOR),
            CellKind::Dot => ('·', ' ', DOT_COLOR),
            CellKind::PowerPellet => ('●', ' ', PELLET_COLOR),
            CellKind::Empty => (' ', ' ', Color::Reset),
        };
        self.front.set(col, row, Cell::from_char(c0, shade(fg), Color::Reset));
        self.front.set(col + 1, row, Cell::from_char(c1, shade(fg), Color::Reset));
    }

    // ── Overlays (drawn on top of the composed board) ──

    /// Draw boxed lines centered over the board on a dark backdrop.
    fn compose_overlay(&mut self, lines: &[&str], fg: Color) {
        let inner = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 4;
        let board_cols = GRID_WIDTH * CELL_W;
        let x0 = board_cols.saturating_sub(inner + 2) / 2;
        let y0 = MAP_ROW + GRID_HEIGHT.saturating_sub(lines.len() + 2) / 2;

        let top = format!("╔{}╗", "═".repeat(inner));
        let bottom = format!("╚{}╝", "═".repeat(inner));
        self.front.put_str(x0, y0, &top, fg, OVERLAY_BG);
        for (i, line) in lines.iter().enumerate() {
            let len = line.chars().count();
            let left = (inner - len) / 2;
            let right = inner - len - left;
            let text = format!("║{}{}{}║", " ".repeat(left), line, " ".repeat(right));
            self.front.put_str(x0, y0 + 1 + i, &text, fg, OVERLAY_BG);
        }
        self.front.put_str(x0, y0 + 1 + lines.len(), &bottom, fg, OVERLAY_BG);
    }

    fn compose_countdown_overlay(&mut self, s: &Session) {
        let digit = format!("{}", s.countdown);
        self.compose_overlay(&["GET READY", "", &digit], GOLD);
    }

    fn compose_pause_overlay(&mut self) {
        self.compose_overlay(&["PAUSED", "", "P to resume"], GOLD);
    }

    fn compose_level_overlay(&mut self, s: &Session) {
        let line = format!("LEVEL {} COMPLETE!", s.level);
        self.compose_overlay(&[&line], GREEN);
    }

    fn compose_game_over_overlay(&mut self, s: &Session, high_score: u32) {
        let score_line = format!("Final Score: {}", s.score);
        let hs_line = if s.score >= high_score && s.score > 0 {
            "★ NEW HIGH SCORE! ★".to_string()
        } else {
            format!("High Score: {}", high_score)
        };
        let lines = [
            "GAME OVER",
            "",
            score_line.as_str(),
            hs_line.as_str(),
            "",
            "ENTER Play Again",
            "R     Title",
        ];
        self.compose_overlay(&lines, Color::Rgb { r: 255, g: 60, b: 60 });
    }

    // ── Static screens ──

    fn compose_title(&mut self, s: &Session, high_score: u32, message: &str) {
        let title = [
            r" ___    _    ___  __  __    _    ____ ___ ",
            r"| _ \  /_\  / __||  \/  |  /_\  |_  /| __|",
            r"|  _/ / _ \| (__ | |\/| | / _ \  / / | _| ",
            r"|_|  /_/ \_\\___||_|  |_|/_/ \_\/___||___|",
        ];

        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, GOLD, Color::Reset);
        }

        let subtitle = "◈◈  Maze Chase  ◈◈";
        let sx = 2 + (title[1].chars().count().saturating_sub(subtitle.chars().count())) / 2;
        self.front.put_str(sx, 7, subtitle, GREEN, Color::Reset);

        let tagline = "━━━ Terminal Edition ━━━";
        let tx = 2 + (title[1].chars().count().saturating_sub(tagline.chars().count())) / 2;
        self.front.put_str(tx, 8, tagline, Color::Rgb { r: 180, g: 140, b: 50 }, Color::Reset);

        // Menu
        let menu_base = 11;
        self.front.put_str(8, menu_base, "ENTER   Start Game", GREEN, Color::Reset);
        self.front.put_str(8, menu_base + 1, "  Q     Quit", Color::White, Color::Reset);

        // Difficulty selector: the active one lights up
        self.front.put_str(8, menu_base + 3, "Difficulty:", Color::White, Color::Reset);
        let mut x = 21;
        for (key, d) in [
            ("1", crate::config::Difficulty::Easy),
            ("2", crate::config::Difficulty::Medium),
            ("3", crate::config::Difficulty::Hard),
        ] {
            let label = format!("{}:{}", key, d.label());
            let color = if s.difficulty == d { GREEN } else { Color::DarkGrey };
            self.front.put_str(x, menu_base + 3, &label, color, Color::Reset);
            x += label.chars().count() + 3;
        }

        let hs = format!("◈ High Score: {}", high_score);
        self.front.put_str(8, menu_base + 5, &hs, GOLD, Color::Reset);

        // Controls reference
        let help = [
            "Controls",
            "  ←→↑↓ / WASD   Steer",
            "  ENTER/SPACE   Start      P  Pause",
            "  R  Reset      1-3  Difficulty",
            "  Q / ESC       Quit",
        ];
        let help_base = menu_base + 7;
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { GOLD } else { Color::White };
            self.front.put_str(8, help_base + i, line, color, Color::Reset);
        }

        // Message bar (reset confirmation, etc.)
        if !message.is_empty() {
            let msg_row = self.front.height.saturating_sub(1);
            if msg_row >= help_base + help.len() {
                let msg = format!(" ◈ {} ", message);
                let buf_w = self.front.width;
                for mx in 0..buf_w {
                    self.front.set(mx, msg_row, Cell::from_char(' ', Color::Black, MSG_BG));
                }
                self.front.put_str(0, msg_row, &msg, Color::Black, MSG_BG);
            }
        }
    }
}
