//! Shared error types for the services crate.

use thiserror::Error;

use genie_core::model::{GameResultError, QuestionError};
use storage::remote::RemoteInitError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by game sessions and the game loop.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for a game")]
    Empty,
    #[error("no game is in progress")]
    NotActive,
    #[error("current question has not been answered yet")]
    NotAwaitingAdvance,
    #[error("game is not complete")]
    NotComplete,
    #[error("game result was already handed to the result store")]
    AlreadyFinalized,
    #[error("failed to fetch questions: {0}")]
    Fetch(#[source] StorageError),
    #[error(transparent)]
    Result(#[from] GameResultError),
}

/// Errors emitted by `QuestionBankService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Remote(#[from] RemoteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
