mod countdown;
mod plan;
mod progress;
mod session;
mod workflow;

// Public API of the game subsystem.
pub use crate::error::SessionError;
pub use countdown::Countdown;
pub use plan::GamePlan;
pub use progress::GameProgress;
pub use session::{GamePhase, GameSession, Submission, TickOutcome, TimerToken};
pub use workflow::{AnswerOutcome, Completion, GameLoopService, Persistence, TickReport};
