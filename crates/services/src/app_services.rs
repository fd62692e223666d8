use std::sync::Arc;

use genie_core::model::GameSettings;
use genie_core::progression::ProgressionRules;
use storage::remote::RemoteConfig;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::game::GameLoopService;
use crate::question_bank_service::QuestionBankService;
use crate::stats_service::StatsService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    game_loop: Arc<GameLoopService>,
    stats: Arc<StatsService>,
    question_bank: Arc<QuestionBankService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: GameSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, settings))
    }

    /// Build services backed by the remote tables.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client cannot be built.
    pub fn new_remote(
        config: RemoteConfig,
        clock: Clock,
        settings: GameSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::remote(config)?;
        Ok(Self::from_storage(&storage, clock, settings))
    }

    /// Build services over an in-memory store, e.g. for demos and tests.
    #[must_use]
    pub fn in_memory(clock: Clock, settings: GameSettings) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, settings)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, settings: GameSettings) -> Self {
        let game_loop = Arc::new(
            GameLoopService::new(
                clock,
                Arc::clone(&storage.question_source),
                Arc::clone(&storage.results),
                Arc::clone(&storage.profiles),
            )
            .with_settings(settings)
            .with_rules(ProgressionRules::default()),
        );
        let stats = Arc::new(StatsService::new(
            clock,
            Arc::clone(&storage.results),
            Arc::clone(&storage.profiles),
        ));
        let question_bank = Arc::new(QuestionBankService::new(Arc::clone(
            &storage.question_bank,
        )));

        Self {
            game_loop,
            stats,
            question_bank,
        }
    }

    #[must_use]
    pub fn game_loop(&self) -> Arc<GameLoopService> {
        Arc::clone(&self.game_loop)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn question_bank(&self) -> Arc<QuestionBankService> {
        Arc::clone(&self.question_bank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genie_core::model::UserId;
    use genie_core::time::fixed_now;

    #[tokio::test]
    async fn in_memory_services_share_one_store() {
        let services = AppServices::in_memory(Clock::fixed(fixed_now()), GameSettings::default());
        services.question_bank().seed_samples(false).await.unwrap();

        let user = UserId::local();
        let game_loop = services.game_loop();
        let mut session = game_loop.start_game(user).await.unwrap();
        while !session.is_complete() {
            let correct = session
                .current_question()
                .unwrap()
                .correct_option()
                .to_string();
            let outcome = game_loop.submit_answer(&mut session, &correct).await.unwrap();
            if outcome.completion.is_none() {
                game_loop.advance(&mut session).unwrap();
            }
        }

        let overview = services.stats().overview(user).await.unwrap();
        assert_eq!(overview.games_played, 1);
        assert_eq!(overview.average_accuracy, 100);
        assert_eq!(overview.points, 1000);
        assert_eq!(overview.level, 2);
    }
}
