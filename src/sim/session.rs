/// Session: the complete state of one game run.
///
/// ## Phase machine
///
///   - `Idle` → `Countdown` via `start`; digits count 3 → 1 in
///     one-second steps, then the run goes live.
///   - `Running` ⇄ `Paused` via `toggle_pause`. No other phase pauses;
///     countdowns and cooldowns refuse the toggle.
///   - `Running` → `LevelTransition` when the last collectible is taken.
///     The next board is set up when the transition pause elapses.
///   - `Running` → `LifeLostCooldown` on fatal contact with lives left.
///     Positions reset immediately; play resumes after the cooldown.
///   - `Running` → `GameOver` when the last life is lost. Terminal until
///     `start` (new run) or `reset` (back to `Idle`).
///
/// ## Deadlines
///
/// All timing is carried as absolute `Option<Instant>` deadlines, fired
/// by `advance` and cancelled by writing `None`. `reset` and game over
/// cancel every deadline. The power deadline is wall-clock: it keeps
/// running through pauses, cooldowns and level transitions.

use std::time::{Duration, Instant};

use crate::config::{Difficulty, GameConfig, SpeedConfig};
use crate::domain::entity::{Adversary, Direction, Player};
use crate::domain::grid::Maze;
use crate::sim::event::GameEvent;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Idle,
    Countdown,
    Running,
    Paused,
    LevelTransition,
    LifeLostCooldown,
    GameOver,
}

pub struct Session {
    // ── Board ──
    pub maze: Maze,

    // ── Entities ──
    pub player: Player,
    pub adversaries: Vec<Adversary>,

    // ── Run tracking ──
    pub score: u32,
    pub lives: u32,
    pub level: u32,

    // ── Phase ──
    pub phase: Phase,
    /// Digit currently shown during `Countdown` (3, 2, 1).
    pub countdown: u8,

    // ── Deadlines (absolute, None = inactive) ──
    pub power_until: Option<Instant>,
    pub countdown_at: Option<Instant>,
    pub cooldown_until: Option<Instant>,
    pub next_tick_at: Option<Instant>,

    // ── Settings ──
    pub difficulty: Difficulty,
    pub starting_lives: u32,
    pub start_level: u32,
    pub speed: SpeedConfig,
}

// ── Construction ──

impl Session {
    pub fn new(cfg: &GameConfig) -> Self {
        Session {
            maze: Maze::standard(),
            player: Player::spawn(),
            adversaries: Adversary::spawn_all(),
            score: 0,
            lives: cfg.lives,
            level: cfg.start_level,
            phase: Phase::Idle,
            countdown: 0,
            power_until: None,
            countdown_at: None,
            cooldown_until: None,
            next_tick_at: None,
            difficulty: cfg.difficulty,
            starting_lives: cfg.lives,
            start_level: cfg.start_level,
            speed: cfg.speed,
        }
    }
}

// ── Queries ──

impl Session {
    /// Power mode is exactly "a power deadline is pending".
    #[inline]
    pub fn power_mode(&self) -> bool {
        self.power_until.is_some()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.speed.tick_ms(self.difficulty))
    }

    /// Time left on the power deadline, for the HUD.
    pub fn power_remaining(&self, now: Instant) -> Option<Duration> {
        self.power_until.map(|t| t.saturating_duration_since(now))
    }

    /// A run is live in every phase except the idle and game over screens.
    pub fn run_live(&self) -> bool {
        !matches!(self.phase, Phase::Idle | Phase::GameOver)
    }
}

// ── Control surface ──
//
// Each operation either applies and reports an event, or refuses with
// None. The shell never needs to pre-check the phase.

impl Session {
    /// Begin a new run. Valid from `Idle` and `GameOver` only.
    pub fn start(&mut self, now: Instant) -> Option<GameEvent> {
        if self.run_live() {
            return None;
        }
        self.reset_run();
        self.phase = Phase::Countdown;
        self.countdown = 3;
        self.countdown_at = Some(now + Duration::from_millis(self.speed.countdown_step_ms));
        Some(GameEvent::GameStarted)
    }

    /// Toggle `Running` ⇄ `Paused`.
    pub fn toggle_pause(&mut self, now: Instant) -> Option<GameEvent> {
        match self.phase {
            Phase::Running => {
                self.phase = Phase::Paused;
                Some(GameEvent::Paused)
            }
            Phase::Paused => {
                self.phase = Phase::Running;
                // Re-baseline so the pause does not owe a burst of ticks.
                self.next_tick_at = Some(now + self.tick_interval());
                Some(GameEvent::Resumed)
            }
            _ => None,
        }
    }

    /// Abandon the run and return to the idle screen. Valid from any phase.
    pub fn reset(&mut self) -> Option<GameEvent> {
        self.reset_run();
        self.phase = Phase::Idle;
        Some(GameEvent::SessionReset)
    }

    /// Buffer a direction request, applied by the next movement tick that
    /// finds the turn open. Dropped in every phase but `Running`.
    pub fn request_direction(&mut self, dir: Direction) {
        if self.phase == Phase::Running {
            self.player.pending = Some(dir);
        }
    }

    /// Switch difficulty between runs. Refused while a run is live.
    pub fn try_set_difficulty(&mut self, difficulty: Difficulty) -> bool {
        if self.run_live() {
            return false;
        }
        self.difficulty = difficulty;
        true
    }
}

// ── State resets ──

impl Session {
    /// Fresh run: board, entities, counters; every deadline cancelled.
    pub fn reset_run(&mut self) {
        self.maze.reset();
        self.reset_positions();
        self.score = 0;
        self.lives = self.starting_lives;
        self.level = self.start_level;
        self.countdown = 0;
        self.power_until = None;
        self.countdown_at = None;
        self.cooldown_until = None;
        self.next_tick_at = None;
    }

    /// Entities back to spawn with headings and buffered input cleared.
    /// The board is left as-is.
    pub fn reset_positions(&mut self) {
        self.player = Player::spawn();
        self.adversaries = Adversary::spawn_all();
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
