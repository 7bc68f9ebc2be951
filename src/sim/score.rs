/// High score persistence.
///
/// ## File format:
///   A single key-value line in `highscore.dat`:
///     high_score=1230
///
/// Stored next to the executable when that directory is writable,
/// otherwise under ~/.local/share/pacmaze. Reads also accept a bare
/// `highscore.dat` in the CWD so portable installs keep working.

use std::path::PathBuf;

const HIGHSCORE_FILE: &str = "highscore.dat";

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

/// A writable exe directory wins so portable installs stay self-contained;
/// read-only installs (e.g. /usr/games) fall back to the XDG data dir.
fn save_dir() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let probe = parent.join(".pacmaze_write_probe");
            if std::fs::write(&probe, "").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return parent.to_path_buf();
            }
        }
    }

    let data_home = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".local/share")));
    if let Ok(base) = data_home {
        let dir = base.join("pacmaze");
        if std::fs::create_dir_all(&dir).is_ok() {
            return dir;
        }
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn score_path() -> PathBuf {
    save_dir().join(HIGHSCORE_FILE)
}

// ══════════════════════════════════════════════════════════════
// Load / store
// ══════════════════════════════════════════════════════════════

/// Load the stored high score. An absent or unreadable file reads as zero.
pub fn load_high_score() -> u32 {
    let candidates = [score_path(), PathBuf::from(HIGHSCORE_FILE)];
    for path in &candidates {
        if let Ok(content) = std::fs::read_to_string(path) {
            if let Some(score) = parse_high_score(&content) {
                return score;
            }
        }
    }
    0
}

pub fn store_high_score(score: u32) -> Result<(), String> {
    std::fs::write(score_path(), serialize_high_score(score))
        .map_err(|e| format!("High score save failed: {}", e))
}

// ══════════════════════════════════════════════════════════════
// Serialization
// ══════════════════════════════════════════════════════════════

fn serialize_high_score(score: u32) -> String {
    format!("high_score={}\n", score)
}

fn parse_high_score(content: &str) -> Option<u32> {
    for line in content.lines() {
        if let Some(val) = line.strip_prefix("high_score=") {
            return val.trim().parse().ok();
        }
    }
    None
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
