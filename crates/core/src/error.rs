use thiserror::Error;

use crate::model::{GameResultError, GameSettingsError, ProfileError, QuestionError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    GameResult(#[from] GameResultError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Settings(#[from] GameSettingsError),
}
