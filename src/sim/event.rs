/// Events emitted by session control calls and `advance`.
/// The presentation layer consumes these for the message line.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    GameStarted,
    PowerModeStarted,
    PowerModeEnded,
    AdversaryCaptured { id: usize },
    LifeLost { lives_left: u32 },
    LevelCompleted { level: u32 },
    GameOver { final_score: u32 },
    Paused,
    Resumed,
    SessionReset,
}
