/// The advance function: fires due deadlines and runs due ticks.
///
/// Per call, in order:
///   1. Power expiry (wall-clock, fires in whatever phase holds it)
///   2. The current phase's timer: countdown digit, life-lost cooldown,
///      or level transition pause
///   3. The simulation tick, when `Running` and the tick deadline is due
///
/// Tick processing order:
///   1. Player movement + collection
///   2. Adversary movement (the player snapshot is fixed for the tick)
///   3. Contact resolution
///   4. Board exhaustion check (skipped on a tick that cost a life;
///      it fires on the next tick instead)
///
/// A late caller gets exactly one tick and a fresh deadline measured
/// from the call time. Lost time is not repaid with catch-up ticks.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::domain::ai;
use crate::domain::rules;
use super::event::GameEvent;
use super::session::{Phase, Session};

/// Score for each adversary captured during power mode.
const CAPTURE_POINTS: u32 = 200;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn advance(session: &mut Session, now: Instant, rng: &mut impl Rng) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();

    if let Some(deadline) = session.power_until {
        if now >= deadline {
            session.power_until = None;
            events.push(GameEvent::PowerModeEnded);
        }
    }

    match session.phase {
        Phase::Countdown => resolve_countdown(session, now),
        Phase::LifeLostCooldown => resolve_cooldown(session, now),
        Phase::LevelTransition => resolve_level_setup(session, now),
        Phase::Running => {
            if let Some(due) = session.next_tick_at {
                if now >= due {
                    run_tick(session, now, rng, &mut events);
                    if session.phase == Phase::Running {
                        session.next_tick_at = Some(now + session.tick_interval());
                    }
                }
            }
        }
        Phase::Idle | Phase::Paused | Phase::GameOver => {}
    }

    events
}

// ══════════════════════════════════════════════════════════════
// Phase timers
// ══════════════════════════════════════════════════════════════

fn resolve_countdown(session: &mut Session, now: Instant) {
    match session.countdown_at {
        Some(t) if now >= t => {}
        _ => return,
    }
    session.countdown = session.countdown.saturating_sub(1);
    if session.countdown == 0 {
        session.countdown_at = None;
        session.phase = Phase::Running;
        session.next_tick_at = Some(now + session.tick_interval());
    } else {
        session.countdown_at =
            Some(now + Duration::from_millis(session.speed.countdown_step_ms));
    }
}

fn resolve_cooldown(session: &mut Session, now: Instant) {
    match session.cooldown_until {
        Some(t) if now >= t => {}
        _ => return,
    }
    session.cooldown_until = None;
    session.phase = Phase::Running;
    session.next_tick_at = Some(now + session.tick_interval());
}

/// End of the level transition pause: bring up the next board.
fn resolve_level_setup(session: &mut Session, now: Instant) {
    match session.cooldown_until {
        Some(t) if now >= t => {}
        _ => return,
    }
    session.cooldown_until = None;
    session.level += 1;
    session.maze.reset();
    session.reset_positions();
    session.phase = Phase::Running;
    session.next_tick_at = Some(now + session.tick_interval());
}

// ══════════════════════════════════════════════════════════════
// The tick pipeline
// ══════════════════════════════════════════════════════════════

fn run_tick(session: &mut Session, now: Instant, rng: &mut impl Rng, events: &mut Vec<GameEvent>) {
    resolve_player(session, now, events);
    resolve_adversaries(session, rng);
    let lost_life = resolve_contacts(session, now, events);
    if !lost_life {
        resolve_level_complete(session, now, events);
    }
}

fn resolve_player(session: &mut Session, now: Instant, events: &mut Vec<GameEvent>) {
    let p = &session.player;
    let outcome = rules::resolve_move(&session.maze, p.x, p.y, p.dir, p.pending);
    session.player.x = outcome.x;
    session.player.y = outcome.y;
    session.player.dir = outcome.dir;
    session.player.pending = outcome.pending;

    if let Some((points, power)) = session.maze.collect(outcome.x, outcome.y) {
        session.score += points;
        if power {
            // Re-collection restarts the full window.
            session.power_until =
                Some(now + Duration::from_millis(session.speed.power_mode_ms));
            events.push(GameEvent::PowerModeStarted);
        }
    }
}

fn resolve_adversaries(session: &mut Session, rng: &mut impl Rng) {
    // Every adversary sees the same post-move player snapshot; none sees
    // another's move within the tick.
    let target = (session.player.x, session.player.y);
    let flee = session.power_mode();
    for adv in &mut session.adversaries {
        if let Some(dir) = ai::choose_direction(rng, &session.maze, adv, target, flee) {
            // choose_direction only returns open in-bounds steps.
            let (dx, dy) = dir.delta();
            adv.dir = dir;
            adv.x = (adv.x as i32 + dx) as usize;
            adv.y = (adv.y as i32 + dy) as usize;
        }
    }
}

/// Returns true when the contact cost a life; that tick skips the board
/// exhaustion check.
fn resolve_contacts(session: &mut Session, now: Instant, events: &mut Vec<GameEvent>) -> bool {
    let (px, py) = (session.player.x, session.player.y);

    if session.power_mode() {
        // Every overlapping adversary is captured, each worth the same
        // flat score. Captured ones restart from the maze center with
        // their heading kept.
        let cx = session.maze.width / 2;
        let cy = session.maze.height / 2;
        for adv in &mut session.adversaries {
            if adv.x == px && adv.y == py {
                session.score += CAPTURE_POINTS;
                adv.x = cx;
                adv.y = cy;
                events.push(GameEvent::AdversaryCaptured { id: adv.id });
            }
        }
        return false;
    }

    if session.adversaries.iter().any(|a| a.x == px && a.y == py) {
        session.lives -= 1;
        events.push(GameEvent::LifeLost { lives_left: session.lives });
        if session.lives == 0 {
            game_over(session, events);
        } else {
            session.reset_positions();
            session.phase = Phase::LifeLostCooldown;
            session.cooldown_until =
                Some(now + Duration::from_millis(session.speed.life_lost_ms));
            session.next_tick_at = None;
        }
        return true;
    }

    false
}

fn resolve_level_complete(session: &mut Session, now: Instant, events: &mut Vec<GameEvent>) {
    if session.maze.remaining_collectibles() > 0 {
        return;
    }
    events.push(GameEvent::LevelCompleted { level: session.level });
    session.phase = Phase::LevelTransition;
    session.cooldown_until =
        Some(now + Duration::from_millis(session.speed.level_pause_ms));
    session.next_tick_at = None;
}

/// Terminal: every deadline is cancelled and the final score is reported
/// exactly once. A cancelled power window ends without an expiry event.
fn game_over(session: &mut Session, events: &mut Vec<GameEvent>) {
    session.phase = Phase::GameOver;
    session.power_until = None;
    session.countdown_at = None;
    session.cooldown_until = None;
    session.next_tick_at = None;
    events.push(GameEvent::GameOver { final_score: session.score });
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::{Adversary, AdversaryColor, Direction, PLAYER_SPAWN};
    use crate::domain::grid::{CellKind, Maze};
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn session() -> Session {
        Session::new(&GameConfig::default())
    }

    /// A session already in `Running` with the tick due at `t0`, a custom
    /// board, and no adversaries. Tests place entities by hand.
    fn running(rows: &[&str], t0: Instant) -> Session {
        let mut s = session();
        s.maze = Maze::from_rows(rows);
        s.adversaries.clear();
        s.phase = Phase::Running;
        s.next_tick_at = Some(t0);
        s
    }

    fn adv_at(x: usize, y: usize, dir: Direction) -> Adversary {
        Adversary { id: 0, x, y, dir, color: AdversaryColor::Red }
    }

    #[test]
    fn countdown_steps_through_digits_then_goes_live() {
        let mut s = session();
        let mut rng = StepRng::new(0, 0);
        let t0 = Instant::now();
        s.start(t0);

        assert!(advance(&mut s, t0 + ms(999), &mut rng).is_empty());
        assert_eq!(s.countdown, 3);

        advance(&mut s, t0 + ms(1_000), &mut rng);
        assert_eq!((s.phase, s.countdown), (Phase::Countdown, 2));
        advance(&mut s, t0 + ms(2_000), &mut rng);
        assert_eq!((s.phase, s.countdown), (Phase::Countdown, 1));

        // No tick deadline exists yet, so the player has not moved.
        assert_eq!((s.player.x, s.player.y), PLAYER_SPAWN);

        advance(&mut s, t0 + ms(3_000), &mut rng);
        assert_eq!(s.phase, Phase::Running);
        assert_eq!(s.next_tick_at, Some(t0 + ms(3_000) + s.tick_interval()));
    }

    #[test]
    fn first_tick_from_spawn_takes_the_east_dot() {
        let t0 = Instant::now();
        let mut s = session();
        s.phase = Phase::Running;
        s.next_tick_at = Some(t0);
        let mut rng = StepRng::new(0, 0);

        // Spawn faces Right; (8,7) holds a dot on the built-in board.
        advance(&mut s, t0, &mut rng);
        assert_eq!((s.player.x, s.player.y), (8, 7));
        assert_eq!(s.score, 10);
        assert_eq!(s.maze.cell_at(8, 7), CellKind::Empty);
        assert_eq!(s.maze.remaining_collectibles(), 111);
    }

    #[test]
    fn late_frame_runs_one_tick_and_rebaselines() {
        let t0 = Instant::now();
        let mut s = running(&["#######", "#.....#", "#######"], t0);
        s.player.x = 1;
        s.player.y = 1;
        let mut rng = StepRng::new(0, 0);

        // 700ms late: still exactly one cell of movement, one dot.
        let late = t0 + ms(700);
        advance(&mut s, late, &mut rng);
        assert_eq!((s.player.x, s.player.y), (2, 1));
        assert_eq!(s.score, 10);
        assert_eq!(s.next_tick_at, Some(late + s.tick_interval()));
    }

    #[test]
    fn paused_session_runs_no_ticks() {
        let t0 = Instant::now();
        let mut s = running(&["#######", "#.....#", "#######"], t0);
        s.player.x = 1;
        s.player.y = 1;
        s.toggle_pause(t0);
        let mut rng = StepRng::new(0, 0);

        assert!(advance(&mut s, t0 + ms(10_000), &mut rng).is_empty());
        assert_eq!((s.player.x, s.player.y), (1, 1));
        assert_eq!(s.score, 0);
    }

    #[test]
    fn power_pellet_recollection_restarts_the_window() {
        let t0 = Instant::now();
        let mut s = running(&["#####", "#.oo#", "#####"], t0);
        s.player.x = 1;
        s.player.y = 1;
        let mut rng = StepRng::new(0, 0);

        let ev = advance(&mut s, t0, &mut rng);
        assert!(ev.contains(&GameEvent::PowerModeStarted));
        assert_eq!(s.power_until, Some(t0 + ms(10_000)));

        // Second pellet two ticks later: the deadline moves out in full.
        let t1 = t0 + s.tick_interval();
        let ev = advance(&mut s, t1, &mut rng);
        assert!(ev.contains(&GameEvent::PowerModeStarted));
        assert_eq!(s.power_until, Some(t1 + ms(10_000)));
        assert_eq!(s.score, 50 + 50);
    }

    #[test]
    fn power_expiry_fires_even_while_paused() {
        let t0 = Instant::now();
        let mut s = running(&["#####", "#...#", "#####"], t0);
        s.player.x = 1;
        s.player.y = 1;
        s.power_until = Some(t0 + ms(10_000));
        s.toggle_pause(t0);
        let mut rng = StepRng::new(0, 0);

        assert!(advance(&mut s, t0 + ms(9_999), &mut rng).is_empty());
        let ev = advance(&mut s, t0 + ms(10_000), &mut rng);
        assert_eq!(ev, vec![GameEvent::PowerModeEnded]);
        assert!(!s.power_mode());
        assert_eq!(s.phase, Phase::Paused);
    }

    #[test]
    fn capture_takes_every_overlapping_adversary() {
        let t0 = Instant::now();
        let mut s = session();
        s.phase = Phase::Running;
        s.power_until = Some(t0 + ms(5_000));
        s.player.x = 5;
        s.player.y = 5;
        s.adversaries = vec![
            adv_at(5, 5, Direction::Left),
            Adversary { id: 1, ..adv_at(5, 5, Direction::Down) },
            Adversary { id: 2, ..adv_at(1, 1, Direction::Up) },
        ];
        let mut events = vec![];

        let lost = resolve_contacts(&mut s, t0, &mut events);
        assert!(!lost);
        assert_eq!(s.score, 400);
        assert_eq!(events, vec![
            GameEvent::AdversaryCaptured { id: 0 },
            GameEvent::AdversaryCaptured { id: 1 },
        ]);
        // Captured adversaries restart from the maze center, heading kept.
        assert_eq!((s.adversaries[0].x, s.adversaries[0].y), (7, 7));
        assert_eq!(s.adversaries[0].dir, Direction::Left);
        assert_eq!(s.adversaries[1].dir, Direction::Down);
        // The bystander did not move.
        assert_eq!((s.adversaries[2].x, s.adversaries[2].y), (1, 1));
    }

    #[test]
    fn fatal_contact_enters_cooldown_and_resets_positions() {
        let t0 = Instant::now();
        let mut s = session();
        s.phase = Phase::Running;
        s.player.x = 5;
        s.player.y = 5;
        s.adversaries = vec![adv_at(5, 5, Direction::Left)];
        let mut events = vec![];

        let lost = resolve_contacts(&mut s, t0, &mut events);
        assert!(lost);
        assert_eq!(s.lives, 2);
        assert_eq!(events, vec![GameEvent::LifeLost { lives_left: 2 }]);
        assert_eq!(s.phase, Phase::LifeLostCooldown);
        assert_eq!(s.cooldown_until, Some(t0 + ms(1_000)));
        assert_eq!(s.next_tick_at, None);
        assert_eq!((s.player.x, s.player.y), PLAYER_SPAWN);
        assert_eq!(s.adversaries.len(), 4);
    }

    #[test]
    fn losing_the_last_life_reports_the_final_score() {
        let t0 = Instant::now();
        let mut s = session();
        s.phase = Phase::Running;
        s.lives = 1;
        s.score = 1_230;
        s.player.x = 5;
        s.player.y = 5;
        s.adversaries = vec![adv_at(5, 5, Direction::Left)];
        s.next_tick_at = Some(t0);
        let mut events = vec![];

        resolve_contacts(&mut s, t0, &mut events);
        assert_eq!(events, vec![
            GameEvent::LifeLost { lives_left: 0 },
            GameEvent::GameOver { final_score: 1_230 },
        ]);
        assert_eq!(s.phase, Phase::GameOver);
        assert_eq!(s.next_tick_at, None);
        assert_eq!(s.cooldown_until, None);
    }

    #[test]
    fn adversaries_chase_the_post_move_player() {
        let t0 = Instant::now();
        let mut s = running(
            &[
                "#######",
                "#.....#",
                "#.....#",
                "#.....#",
                "#.....#",
                "#.....#",
                "#######",
            ],
            t0,
        );
        // Player at (1,1) heading Down steps to (1,2). The adversary at
        // (5,1) heading Down ranks Down and Left even against the post-move
        // target, keeping Down by candidate order; against the stale
        // pre-move target Left would win outright.
        s.player.x = 1;
        s.player.y = 1;
        s.player.dir = Direction::Down;
        s.adversaries = vec![adv_at(5, 1, Direction::Down)];
        let mut rng = StepRng::new(0, 0);

        advance(&mut s, t0, &mut rng);
        assert_eq!((s.player.x, s.player.y), (1, 2));
        assert_eq!((s.adversaries[0].x, s.adversaries[0].y), (5, 2));
    }

    #[test]
    fn clearing_the_board_pauses_then_brings_up_the_next_level() {
        let t0 = Instant::now();
        let mut s = running(&["#####", "# .o#", "#####"], t0);
        s.player.x = 1;
        s.player.y = 1;
        let mut rng = StepRng::new(0, 0);

        advance(&mut s, t0, &mut rng); // takes the dot
        let t1 = t0 + s.tick_interval();
        let ev = advance(&mut s, t1, &mut rng); // takes the final pellet
        assert!(ev.contains(&GameEvent::PowerModeStarted));
        assert!(ev.contains(&GameEvent::LevelCompleted { level: 1 }));
        assert_eq!(s.phase, Phase::LevelTransition);
        assert_eq!(s.cooldown_until, Some(t1 + ms(1_500)));
        assert_eq!(s.next_tick_at, None);

        // The pause elapses: board refilled, entities respawned, level up.
        let t2 = t1 + ms(1_600);
        advance(&mut s, t2, &mut rng);
        assert_eq!(s.phase, Phase::Running);
        assert_eq!(s.level, 2);
        assert_eq!(s.maze.remaining_collectibles(), 2);
        assert_eq!((s.player.x, s.player.y), PLAYER_SPAWN);
        // Score carries over; power mode rides through untouched.
        assert_eq!(s.score, 60);
        assert!(s.power_mode());
    }

    #[test]
    fn life_loss_defers_the_exhaustion_check_by_one_tick() {
        let t0 = Instant::now();
        let mut s = running(&["#####", "# . #", "#####"], t0);
        s.player.x = 1;
        s.player.y = 1;
        s.adversaries = vec![adv_at(3, 1, Direction::Left)];
        let mut rng = StepRng::new(0, 0);

        // Player takes the last dot at (2,1); the adversary walks into the
        // same cell. The life is lost and the clear is left unreported.
        let ev = advance(&mut s, t0, &mut rng);
        assert!(ev.contains(&GameEvent::LifeLost { lives_left: 2 }));
        assert!(!ev.iter().any(|e| matches!(e, GameEvent::LevelCompleted { .. })));
        assert_eq!(s.phase, Phase::LifeLostCooldown);
        assert_eq!(s.maze.remaining_collectibles(), 0);

        // Cooldown ends, and the very next tick reports the clear.
        let t1 = t0 + ms(1_000);
        advance(&mut s, t1, &mut rng);
        assert_eq!(s.phase, Phase::Running);
        let t2 = t1 + s.tick_interval();
        let ev = advance(&mut s, t2, &mut rng);
        assert!(ev.contains(&GameEvent::LevelCompleted { level: 1 }));
        assert_eq!(s.phase, Phase::LevelTransition);
    }

    #[test]
    fn soak_run_holds_the_core_invariants() {
        let t0 = Instant::now();
        let mut s = session();
        let mut rng = StdRng::seed_from_u64(0xACE5);
        s.start(t0);

        let mut now = t0;
        let mut prev_score = 0;
        let mut prev_lives = s.lives;
        let mut game_overs = 0;
        for _ in 0..2_000 {
            now += ms(150);
            for ev in advance(&mut s, now, &mut rng) {
                if matches!(ev, GameEvent::GameOver { .. }) {
                    game_overs += 1;
                }
            }
            assert!(s.score >= prev_score, "score went backwards");
            assert!(s.lives <= prev_lives, "lives went up mid-run");
            prev_score = s.score;
            prev_lives = s.lives;
            assert!(s.maze.is_open(s.player.x, s.player.y), "player inside a wall");
            for adv in &s.adversaries {
                assert!(s.maze.is_open(adv.x, adv.y), "adversary inside a wall");
            }
            assert!(s.maze.remaining_collectibles() <= 112);
            if s.phase == Phase::GameOver {
                break;
            }
        }
        assert!(game_overs <= 1);

        // Terminal phase stays inert.
        if s.phase == Phase::GameOver {
            let settled = s.score;
            assert!(advance(&mut s, now + ms(10_000), &mut rng).is_empty());
            assert_eq!(s.score, settled);
        }
    }
}
