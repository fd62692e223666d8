use thiserror::Error;

use crate::model::Difficulty;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GameSettingsError {
    #[error("questions per game must be > 0")]
    InvalidQuestionsPerGame,

    #[error("question time limit must be between 5 and 600 seconds")]
    InvalidTimeLimit,

    #[error("feedback delay must be <= 10000 ms")]
    InvalidFeedbackDelay,

    #[error("question pool limit must be >= questions per game")]
    InvalidPoolLimit,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

pub const DEFAULT_QUESTIONS_PER_GAME: u32 = 10;
pub const DEFAULT_QUESTION_TIME_LIMIT_SECS: u32 = 30;
pub const DEFAULT_FEEDBACK_DELAY_MS: u64 = 300;
pub const DEFAULT_QUESTION_POOL_LIMIT: u32 = 500;

/// Per-round configuration of a game session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    questions_per_game: u32,
    question_time_limit_secs: u32,
    feedback_delay_ms: u64,
    question_pool_limit: u32,
    difficulties: Vec<Difficulty>,
}

impl Default for GameSettings {
    /// Ten questions, thirty seconds each, all difficulties.
    fn default() -> Self {
        Self {
            questions_per_game: DEFAULT_QUESTIONS_PER_GAME,
            question_time_limit_secs: DEFAULT_QUESTION_TIME_LIMIT_SECS,
            feedback_delay_ms: DEFAULT_FEEDBACK_DELAY_MS,
            question_pool_limit: DEFAULT_QUESTION_POOL_LIMIT,
            difficulties: Vec::new(),
        }
    }
}

impl GameSettings {
    /// Creates custom game settings.
    ///
    /// An empty `difficulties` list means every difficulty is eligible.
    ///
    /// # Errors
    ///
    /// Returns `GameSettingsError` if any value is out of range.
    pub fn new(
        questions_per_game: u32,
        question_time_limit_secs: u32,
        feedback_delay_ms: u64,
        question_pool_limit: u32,
        mut difficulties: Vec<Difficulty>,
    ) -> Result<Self, GameSettingsError> {
        if questions_per_game == 0 {
            return Err(GameSettingsError::InvalidQuestionsPerGame);
        }
        if !(5..=600).contains(&question_time_limit_secs) {
            return Err(GameSettingsError::InvalidTimeLimit);
        }
        if feedback_delay_ms > 10_000 {
            return Err(GameSettingsError::InvalidFeedbackDelay);
        }
        if question_pool_limit < questions_per_game {
            return Err(GameSettingsError::InvalidPoolLimit);
        }
        difficulties.sort();
        difficulties.dedup();

        Ok(Self {
            questions_per_game,
            question_time_limit_secs,
            feedback_delay_ms,
            question_pool_limit,
            difficulties,
        })
    }

    #[must_use]
    pub fn questions_per_game(&self) -> u32 {
        self.questions_per_game
    }

    #[must_use]
    pub fn question_time_limit_secs(&self) -> u32 {
        self.question_time_limit_secs
    }

    #[must_use]
    pub fn feedback_delay_ms(&self) -> u64 {
        self.feedback_delay_ms
    }

    #[must_use]
    pub fn question_pool_limit(&self) -> u32 {
        self.question_pool_limit
    }

    #[must_use]
    pub fn difficulties(&self) -> &[Difficulty] {
        &self.difficulties
    }
}
