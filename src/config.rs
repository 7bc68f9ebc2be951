/// External configuration.
///
/// `pacmaze.toml` is looked up next to the executable, then in the CWD.
/// Every key is optional; a missing file just means all defaults. Parse
/// problems warn on stderr and never stop the game from starting.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn parse(s: &str) -> Option<Difficulty> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub difficulty: Difficulty,
    pub lives: u32,
    pub start_level: u32,
    pub speed: SpeedConfig,
}

#[derive(Clone, Copy, Debug)]
pub struct SpeedConfig {
    pub tick_ms_easy: u64,
    pub tick_ms_medium: u64,
    pub tick_ms_hard: u64,
    pub power_mode_ms: u64,      // fixed duration, restarted on re-collection
    pub countdown_step_ms: u64,  // one digit of the 3-2-1 countdown
    pub life_lost_ms: u64,       // freeze after a fatal contact
    pub level_pause_ms: u64,     // freeze after clearing a board
}

impl SpeedConfig {
    /// Simulation tick interval for the given difficulty.
    pub fn tick_ms(&self, difficulty: Difficulty) -> u64 {
        match difficulty {
            Difficulty::Easy => self.tick_ms_easy,
            Difficulty::Medium => self.tick_ms_medium,
            Difficulty::Hard => self.tick_ms_hard,
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    game: TomlGame,
    #[serde(default)]
    speed: TomlSpeed,
}

#[derive(Deserialize, Debug)]
struct TomlGame {
    #[serde(default = "default_difficulty")]
    difficulty: String,
    #[serde(default = "default_lives")]
    lives: u32,
    #[serde(default = "default_start_level")]
    start_level: u32,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_easy")]
    tick_ms_easy: u64,
    #[serde(default = "default_tick_medium")]
    tick_ms_medium: u64,
    #[serde(default = "default_tick_hard")]
    tick_ms_hard: u64,
    #[serde(default = "default_power_mode")]
    power_mode_ms: u64,
    #[serde(default = "default_countdown_step")]
    countdown_step_ms: u64,
    #[serde(default = "default_life_lost")]
    life_lost_ms: u64,
    #[serde(default = "default_level_pause")]
    level_pause_ms: u64,
}

// ── Defaults ──

fn default_difficulty() -> String { "medium".into() }
fn default_lives() -> u32 { 3 }
fn default_start_level() -> u32 { 1 }

fn default_tick_easy() -> u64 { 200 }
fn default_tick_medium() -> u64 { 150 }
fn default_tick_hard() -> u64 { 100 }
fn default_power_mode() -> u64 { 10_000 }
fn default_countdown_step() -> u64 { 1_000 }
fn default_life_lost() -> u64 { 1_000 }
fn default_level_pause() -> u64 { 1_500 }

impl Default for TomlGame {
    fn default() -> Self {
        TomlGame {
            difficulty: default_difficulty(),
            lives: default_lives(),
            start_level: default_start_level(),
        }
    }
}

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_ms_easy: default_tick_easy(),
            tick_ms_medium: default_tick_medium(),
            tick_ms_hard: default_tick_hard(),
            power_mode_ms: default_power_mode(),
            countdown_step_ms: default_countdown_step(),
            life_lost_ms: default_life_lost(),
            level_pause_ms: default_level_pause(),
        }
    }
}

impl Default for GameConfig {
    /// The built-in settings, identical to an absent `pacmaze.toml`.
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default())
    }
}

// ── Loading ──

impl GameConfig {
    /// Load `pacmaze.toml` from the first candidate directory holding one,
    /// filling absent keys (or an absent file) with the defaults.
    pub fn load() -> Self {
        let toml_cfg = load_toml(&candidate_dirs());
        GameConfig::from_toml(toml_cfg)
    }

    fn from_toml(toml_cfg: TomlConfig) -> Self {
        let difficulty = match Difficulty::parse(&toml_cfg.game.difficulty) {
            Some(d) => d,
            None => {
                eprintln!(
                    "Warning: unknown difficulty {:?}, using medium.",
                    toml_cfg.game.difficulty
                );
                Difficulty::Medium
            }
        };

        GameConfig {
            difficulty,
            // A run needs at least one life and a first level.
            lives: toml_cfg.game.lives.max(1),
            start_level: toml_cfg.game.start_level.max(1),
            speed: SpeedConfig {
                tick_ms_easy: toml_cfg.speed.tick_ms_easy,
                tick_ms_medium: toml_cfg.speed.tick_ms_medium,
                tick_ms_hard: toml_cfg.speed.tick_ms_hard,
                power_mode_ms: toml_cfg.speed.power_mode_ms,
                countdown_step_ms: toml_cfg.speed.countdown_step_ms,
                life_lost_ms: toml_cfg.speed.life_lost_ms,
                level_pause_ms: toml_cfg.speed.level_pause_ms,
            },
        }
    }
}

/// Candidate directories to search: exe dir, then CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a packaged binary still finds its config.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// First readable `pacmaze.toml` wins; an unparsable one warns and yields
/// the defaults rather than continuing the search.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("pacmaze.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    eprintln!("Warning: {} is not valid TOML: {e}", path.display());
                    eprintln!("Running with default settings.");
                    return TomlConfig::default();
                }
            },
            Err(e) => {
                eprintln!("Warning: could not read {}: {e}", path.display());
            }
        }
    }
    TomlConfig::default()
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_difficulty_is_case_insensitive() {
        assert_eq!(Difficulty::parse("Easy"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse(" HARD "), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("impossible"), None);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let toml_cfg: TomlConfig =
            toml::from_str("[speed]\ntick_ms_hard = 80\n").unwrap();
        let cfg = GameConfig::from_toml(toml_cfg);
        assert_eq!(cfg.speed.tick_ms_hard, 80);
        assert_eq!(cfg.speed.tick_ms_medium, 150);
        assert_eq!(cfg.difficulty, Difficulty::Medium);
        assert_eq!(cfg.lives, 3);
    }

    #[test]
    fn degenerate_values_are_clamped() {
        let toml_cfg: TomlConfig =
            toml::from_str("[game]\nlives = 0\nstart_level = 0\n").unwrap();
        let cfg = GameConfig::from_toml(toml_cfg);
        assert_eq!(cfg.lives, 1);
        assert_eq!(cfg.start_level, 1);
    }

    #[test]
    fn tick_interval_follows_difficulty() {
        let cfg = GameConfig::from_toml(TomlConfig::default());
        assert_eq!(cfg.speed.tick_ms(Difficulty::Easy), 200);
        assert_eq!(cfg.speed.tick_ms(Difficulty::Medium), 150);
        assert_eq!(cfg.speed.tick_ms(Difficulty::Hard), 100);
    }
}
