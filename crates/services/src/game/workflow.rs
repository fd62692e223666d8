use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use genie_core::model::{GameResult, GameSettings, PlayerProfile, UserId};
use genie_core::progression::{ProgressUpdate, ProgressionRules};
use genie_core::time::local_date;
use storage::repository::{
    GameResultId, ProfileRepository, QuestionSource, ResultRepository, StorageError,
};

use super::plan::GamePlan;
use super::session::{GamePhase, GameSession, Submission, TickOutcome, TimerToken};
use crate::Clock;
use crate::error::SessionError;

/// What happened to a completed game's result.
#[derive(Debug)]
pub enum Persistence {
    Saved {
        result_id: GameResultId,
        progress: ProgressUpdate,
    },
    /// The write failed. It is not retried; the result is still reported.
    Failed { error: StorageError },
}

/// Report for a game that just completed.
#[derive(Debug)]
pub struct Completion {
    pub result: GameResult,
    pub persistence: Persistence,
}

impl Completion {
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self.persistence, Persistence::Saved { .. })
    }

    #[must_use]
    pub fn progress(&self) -> Option<&ProgressUpdate> {
        match &self.persistence {
            Persistence::Saved { progress, .. } => Some(progress),
            Persistence::Failed { .. } => None,
        }
    }
}

/// Result of submitting an answer through the game loop.
#[derive(Debug)]
pub struct AnswerOutcome {
    pub submission: Submission,
    /// Present when this answer completed the game.
    pub completion: Option<Completion>,
}

/// Result of forwarding a countdown tick.
#[derive(Debug)]
pub struct TickReport {
    pub outcome: TickOutcome,
    /// Present when the expiry completed the game.
    pub completion: Option<Completion>,
}

type ProfileLocks = Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>;

/// Orchestrates game start, answering, countdown expiry and completion
/// persistence.
#[derive(Clone)]
pub struct GameLoopService {
    clock: Clock,
    settings: GameSettings,
    rules: ProgressionRules,
    questions: Arc<dyn QuestionSource>,
    results: Arc<dyn ResultRepository>,
    profiles: Arc<dyn ProfileRepository>,
    profile_locks: Arc<ProfileLocks>,
}

impl GameLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionSource>,
        results: Arc<dyn ResultRepository>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            clock,
            settings: GameSettings::default(),
            rules: ProgressionRules::default(),
            questions,
            results,
            profiles,
            profile_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: GameSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_rules(mut self, rules: ProgressionRules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Start a new game for `user_id`.
    ///
    /// Pulls up to `question_pool_limit` questions from the source and samples
    /// `questions_per_game` of them without replacement. A smaller pool is
    /// used whole.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Fetch` if the source fails and
    /// `SessionError::Empty` if it has no questions.
    pub async fn start_game(&self, user_id: UserId) -> Result<GameSession, SessionError> {
        let mut session = GameSession::idle(user_id, self.settings.question_time_limit_secs());
        self.restart_game(&mut session).await?;
        Ok(session)
    }

    /// Start a fresh game in an existing session, discarding its state.
    ///
    /// On error the session is left untouched.
    ///
    /// # Errors
    ///
    /// Same as `start_game`.
    pub async fn restart_game(&self, session: &mut GameSession) -> Result<TimerToken, SessionError> {
        let pool = self
            .questions
            .fetch_questions(
                self.settings.question_pool_limit(),
                self.settings.difficulties(),
            )
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "question fetch failed");
                SessionError::Fetch(e)
            })?;

        let requested = usize::try_from(self.settings.questions_per_game()).unwrap_or(usize::MAX);
        let plan = GamePlan::sample(pool, requested);
        if plan.questions.is_empty() {
            return Err(SessionError::Empty);
        }
        if plan.is_short() {
            tracing::warn!(
                requested = plan.requested,
                available = plan.available,
                "question pool smaller than requested game size"
            );
        }

        if session.time_limit_secs() != self.settings.question_time_limit_secs() {
            *session = GameSession::idle(session.user_id(), self.settings.question_time_limit_secs());
        }
        let token = session.start(plan.questions, self.clock.now())?;
        tracing::info!(
            user_id = %session.user_id(),
            questions = session.questions().len(),
            "game started"
        );
        Ok(token)
    }

    /// Submit an answer for the pending question; persists the result when
    /// this completes the game.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` when no game is in progress.
    pub async fn submit_answer(
        &self,
        session: &mut GameSession,
        choice: &str,
    ) -> Result<AnswerOutcome, SessionError> {
        let submission = session.submit_answer(choice, self.clock.now())?;
        let completion = self.complete_if_done(session, &submission).await;
        Ok(AnswerOutcome {
            submission,
            completion,
        })
    }

    /// Expire the pending question explicitly.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` when no game is in progress.
    pub async fn expire_timer(
        &self,
        session: &mut GameSession,
    ) -> Result<AnswerOutcome, SessionError> {
        let submission = session.expire_timer(self.clock.now())?;
        let completion = self.complete_if_done(session, &submission).await;
        Ok(AnswerOutcome {
            submission,
            completion,
        })
    }

    /// Forward one countdown tick.
    ///
    /// # Errors
    ///
    /// Propagates result synthesis errors.
    pub async fn tick(
        &self,
        session: &mut GameSession,
        token: TimerToken,
    ) -> Result<TickReport, SessionError> {
        let outcome = session.tick(token, self.clock.now())?;
        let completion = match &outcome {
            TickOutcome::Expired(submission) => self.complete_if_done(session, submission).await,
            TickOutcome::Ignored | TickOutcome::Counting { .. } => None,
        };
        Ok(TickReport {
            outcome,
            completion,
        })
    }

    /// Move to the next question after the feedback window.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotAwaitingAdvance` if no answered question is
    /// waiting or the game is over.
    pub fn advance(&self, session: &mut GameSession) -> Result<TimerToken, SessionError> {
        session.advance()
    }

    /// Abandon the game without persisting anything.
    pub fn reset(&self, session: &mut GameSession) {
        if session.phase() != GamePhase::Idle {
            tracing::info!(user_id = %session.user_id(), "game reset");
        }
        session.reset();
    }

    /// Persist a completed game's result and apply the progression rules.
    ///
    /// Runs at most once per game: the session is marked as handed off before
    /// the first write, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotComplete` for an unfinished game and
    /// `SessionError::AlreadyFinalized` if the result was already handed off.
    pub async fn finalize(&self, session: &mut GameSession) -> Result<Completion, SessionError> {
        if session.is_finalized() {
            return Err(SessionError::AlreadyFinalized);
        }
        let result = session.result().cloned().ok_or(SessionError::NotComplete)?;
        session.mark_finalized();

        let persistence = match self.persist(session.user_id(), &result).await {
            Ok((result_id, progress)) => {
                tracing::info!(
                    user_id = %session.user_id(),
                    result_id,
                    score = result.score(),
                    accuracy = result.accuracy(),
                    points = progress.after.points(),
                    level = progress.after.level(),
                    streak_days = progress.after.streak_days(),
                    "game completed"
                );
                Persistence::Saved {
                    result_id,
                    progress,
                }
            }
            Err(error) => {
                tracing::warn!(
                    user_id = %session.user_id(),
                    error = %error,
                    "failed to persist game result"
                );
                Persistence::Failed { error }
            }
        };

        Ok(Completion {
            result,
            persistence,
        })
    }

    async fn complete_if_done(
        &self,
        session: &mut GameSession,
        submission: &Submission,
    ) -> Option<Completion> {
        let just_completed = matches!(
            submission,
            Submission::Recorded {
                is_complete: true,
                ..
            }
        );
        if !just_completed || session.is_finalized() {
            return None;
        }
        self.finalize(session).await.ok()
    }

    async fn persist(
        &self,
        user_id: UserId,
        result: &GameResult,
    ) -> Result<(GameResultId, ProgressUpdate), StorageError> {
        let lock = self.profile_lock(user_id);
        let outcome = {
            let _guard = lock.lock().await;
            self.write_progress(user_id, result).await
        };
        drop(lock);
        self.release_profile_lock(user_id);
        outcome
    }

    async fn write_progress(
        &self,
        user_id: UserId,
        result: &GameResult,
    ) -> Result<(GameResultId, ProgressUpdate), StorageError> {
        let result_id = self.results.append_result(user_id, result).await?;
        let profile = self
            .profiles
            .get_profile(user_id)
            .await?
            .unwrap_or_else(|| PlayerProfile::new(user_id));

        let progress = self
            .rules
            .apply(&profile, result.accuracy(), local_date(result.completed_at()));
        if progress.is_changed() {
            self.profiles.upsert_profile(&progress.after).await?;
        }
        Ok((result_id, progress))
    }

    fn profile_lock(&self, user_id: UserId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .profile_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(user_id).or_default())
    }

    /// Forget the user's lock once no other completion holds it.
    fn release_profile_lock(&self, user_id: UserId) {
        let mut locks = self
            .profile_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&user_id);
        }
    }
}
