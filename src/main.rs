/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::{Difficulty, GameConfig};
use sim::event::GameEvent;
use sim::score;
use sim::session::Session;
use sim::step;
use ui::input::InputState;
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// How long a toast stays on the message line.
const MESSAGE_TTL: Duration = Duration::from_millis(2000);

fn main() {
    let config = GameConfig::load();
    let mut session = Session::new(&config);
    let high_score = score::load_high_score();

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut session, &mut renderer, high_score);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Pacmaze!");
    println!("Final Score: {}", session.score);
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    mut high_score: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut rng = rand::thread_rng();
    let mut message = MessageLine::new();

    loop {
        let now = Instant::now();
        kb.drain_events();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_keys(session, &kb, &mut message, now) {
            break;
        }

        let events = step::advance(session, now, &mut rng);
        apply_events(&events, &mut high_score, &mut message, now);

        message.expire(now);
        renderer.render(session, high_score, &message.text, now)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P')];
const KEYS_RESET: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc];

/// Dispatch one frame of key input. Returns true to quit.
///
/// The session refuses operations that do not apply in its current phase,
/// so keys can be forwarded without pre-checking.
fn handle_keys(
    session: &mut Session,
    kb: &InputState,
    message: &mut MessageLine,
    now: Instant,
) -> bool {
    if kb.any_pressed(KEYS_QUIT) {
        return true;
    }

    // Steering: the latest direction key this frame wins; the request is
    // buffered until a tick finds the turn open.
    if let Some(dir) = kb.latest_direction() {
        session.request_direction(dir);
    }

    if kb.any_pressed(KEYS_CONFIRM) && session.start(now).is_some() {
        message.set("Game starting!", now);
    }

    if kb.any_pressed(KEYS_PAUSE) {
        match session.toggle_pause(now) {
            Some(GameEvent::Paused) => message.set("Game paused", now),
            Some(GameEvent::Resumed) => message.set("Game resumed", now),
            _ => {}
        }
    }

    if kb.any_pressed(KEYS_RESET) && session.reset().is_some() {
        message.set("Game reset", now);
    }

    // Difficulty switch, refused while a run is live
    for (key, difficulty) in [
        ('1', Difficulty::Easy),
        ('2', Difficulty::Medium),
        ('3', Difficulty::Hard),
    ] {
        if kb.was_pressed(KeyCode::Char(key)) && session.try_set_difficulty(difficulty) {
            message.set(&format!("Difficulty: {}", difficulty.label()), now);
        }
    }

    false
}

/// Turn simulation events into message-line toasts. The last event of the
/// frame wins the line, so a lost life gives way to the game-over report.
fn apply_events(
    events: &[GameEvent],
    high_score: &mut u32,
    message: &mut MessageLine,
    now: Instant,
) {
    for event in events {
        match event {
            GameEvent::PowerModeStarted => message.set("Power mode activated!", now),
            GameEvent::PowerModeEnded => message.set("Power mode expired!", now),
            GameEvent::AdversaryCaptured { .. } => message.set("Ghost eaten! +200 points", now),
            GameEvent::LifeLost { .. } => message.set("You lost a life!", now),
            GameEvent::LevelCompleted { level } => {
                message.set(&format!("Level {} complete!", level), now)
            }
            GameEvent::GameOver { final_score } => {
                if *final_score > *high_score {
                    *high_score = *final_score;
                    match score::store_high_score(*high_score) {
                        Ok(()) => message.set(&format!("New high score: {}!", high_score), now),
                        Err(_) => {
                            message.set(&format!("New high score: {}! (not saved)", high_score), now)
                        }
                    }
                } else {
                    message.set("Game Over!", now);
                }
            }
            _ => {}
        }
    }
}

// ── Message line ──

/// One-line toast shown under the board, cleared after MESSAGE_TTL.
struct MessageLine {
    text: String,
    expires_at: Option<Instant>,
}

impl MessageLine {
    fn new() -> Self {
        MessageLine {
            text: String::new(),
            expires_at: None,
        }
    }

    fn set(&mut self, text: &str, now: Instant) {
        self.text.clear();
        self.text.push_str(text);
        self.expires_at = Some(now + MESSAGE_TTL);
    }

    fn expire(&mut self, now: Instant) {
        if let Some(at) = self.expires_at {
            if now >= at {
                self.text.clear();
                self.expires_at = None;
            }
        }
    }
}
