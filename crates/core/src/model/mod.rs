mod ids;
mod profile;
mod question;
mod result;
mod settings;

pub use ids::{ParseIdError, QuestionId, UserId};

pub use profile::{PlayerProfile, ProfileError};
pub use question::{Difficulty, Question, QuestionDraft, QuestionError, ValidatedQuestion};
pub use result::{AnswerRecord, GameResult, GameResultError, accuracy_percent};
pub use settings::{
    DEFAULT_FEEDBACK_DELAY_MS, DEFAULT_QUESTION_POOL_LIMIT, DEFAULT_QUESTION_TIME_LIMIT_SECS,
    DEFAULT_QUESTIONS_PER_GAME, GameSettings, GameSettingsError,
};
