#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod game;
pub mod question_bank_service;
pub mod stats_service;

pub use genie_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, QuestionBankError, SessionError, StatsError};
pub use game::{
    AnswerOutcome, Completion, Countdown, GameLoopService, GamePhase, GameProgress, GameSession,
    Persistence, Submission, TickOutcome, TickReport, TimerToken,
};
pub use question_bank_service::{QuestionBankService, SeedReport};
pub use stats_service::{StatsOverview, StatsService, StreakWeek, WeekDay};
