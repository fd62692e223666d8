use chrono::{DateTime, Utc};
use std::fmt;

use genie_core::model::{AnswerRecord, GameResult, Question, UserId};

use super::progress::GameProgress;
use crate::error::SessionError;

//
// ─── PHASES AND TOKENS ─────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// No game in progress.
    Idle,
    /// A question is pending and its countdown is running.
    Active,
    /// The current question was answered or expired; waiting for `advance`.
    AwaitingAdvance,
    /// Every question has an answer record. Terminal.
    Complete,
}

/// Identifies one countdown run.
///
/// A fresh token is issued whenever a question starts, and the previous one is
/// invalidated whenever the pending question is answered, expired or reset. A
/// tick carrying a stale token is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Outcome of submitting an answer (or of a timeout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// A new record was added to the answer log.
    Recorded {
        record: AnswerRecord,
        is_complete: bool,
    },
    /// The question already had an answer; the first record is returned and
    /// nothing changes.
    Duplicate(AnswerRecord),
}

impl Submission {
    #[must_use]
    pub fn record(&self) -> &AnswerRecord {
        match self {
            Submission::Recorded { record, .. } | Submission::Duplicate(record) => record,
        }
    }

    #[must_use]
    pub fn was_correct(&self) -> bool {
        self.record().was_correct
    }

    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Submission::Duplicate(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Token was stale or no question is pending.
    Ignored,
    /// One second elapsed; the countdown still runs.
    Counting { remaining_secs: u32 },
    /// The countdown reached zero and the question was recorded as incorrect.
    Expired(Submission),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One timed run through a fixed batch of questions.
///
/// All mutation goes through `&mut self`, so a caller that owns the session
/// serializes submissions, ticks and resets by construction.
pub struct GameSession {
    user_id: UserId,
    time_limit_secs: u32,
    questions: Vec<Question>,
    index: usize,
    remaining_secs: u32,
    answers: Vec<AnswerRecord>,
    phase: GamePhase,
    generation: u64,
    started_at: Option<DateTime<Utc>>,
    result: Option<GameResult>,
    finalized: bool,
}

impl GameSession {
    /// An idle session for `user_id`.
    #[must_use]
    pub fn idle(user_id: UserId, time_limit_secs: u32) -> Self {
        Self {
            user_id,
            time_limit_secs,
            questions: Vec::new(),
            index: 0,
            remaining_secs: 0,
            answers: Vec::new(),
            phase: GamePhase::Idle,
            generation: 0,
            started_at: None,
            result: None,
            finalized: false,
        }
    }

    /// Start a game over `questions`, discarding any previous state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `questions` is empty; the session is
    /// left idle.
    pub fn start(
        &mut self,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<TimerToken, SessionError> {
        self.reset();
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        self.questions = questions;
        self.started_at = Some(started_at);
        Ok(self.begin_question())
    }

    /// Force `Idle`. Nothing is persisted. A no-op when already idle.
    pub fn reset(&mut self) {
        self.questions.clear();
        self.answers.clear();
        self.index = 0;
        self.remaining_secs = 0;
        self.phase = GamePhase::Idle;
        self.started_at = None;
        self.result = None;
        self.finalized = false;
        self.generation += 1;
    }

    /// Record `choice` for the pending question.
    ///
    /// The comparison against the correct option is exact. A second call for
    /// the same question returns `Submission::Duplicate` with the first record.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` when no game is in progress.
    pub fn submit_answer(
        &mut self,
        choice: &str,
        now: DateTime<Utc>,
    ) -> Result<Submission, SessionError> {
        if let Some(first) = self.answered_record()? {
            return Ok(Submission::Duplicate(first));
        }
        let question = self.current_question().ok_or(SessionError::NotActive)?;
        let elapsed = self.time_limit_secs.saturating_sub(self.remaining_secs);
        let record = AnswerRecord::answered(
            question.id(),
            choice.to_string(),
            question.is_correct(choice),
            elapsed,
        );
        self.record(record, now)
    }

    /// Record the pending question as unanswered and incorrect, with the full
    /// time limit as elapsed time.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` when no game is in progress.
    pub fn expire_timer(&mut self, now: DateTime<Utc>) -> Result<Submission, SessionError> {
        if let Some(first) = self.answered_record()? {
            return Ok(Submission::Duplicate(first));
        }
        let question = self.current_question().ok_or(SessionError::NotActive)?;
        let record = AnswerRecord::timed_out(question.id(), self.time_limit_secs);
        self.record(record, now)
    }

    /// One second of countdown for the run identified by `token`.
    ///
    /// Expires the question when the countdown reaches zero. Stale tokens are
    /// ignored, so a tick racing a submission can never expire the next
    /// question.
    ///
    /// # Errors
    ///
    /// Propagates result synthesis errors when the expiry completes the game.
    pub fn tick(
        &mut self,
        token: TimerToken,
        now: DateTime<Utc>,
    ) -> Result<TickOutcome, SessionError> {
        if self.phase != GamePhase::Active || token != self.current_token() {
            return Ok(TickOutcome::Ignored);
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return Ok(TickOutcome::Counting {
                remaining_secs: self.remaining_secs,
            });
        }

        tracing::debug!(index = self.index, "question timed out");
        Ok(TickOutcome::Expired(self.expire_timer(now)?))
    }

    /// Move from the feedback window to the next question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotAwaitingAdvance` unless the current question
    /// has been answered and more questions remain.
    pub fn advance(&mut self) -> Result<TimerToken, SessionError> {
        if self.phase != GamePhase::AwaitingAdvance {
            return Err(SessionError::NotAwaitingAdvance);
        }
        self.index += 1;
        Ok(self.begin_question())
    }

    fn begin_question(&mut self) -> TimerToken {
        self.generation += 1;
        self.remaining_secs = self.time_limit_secs;
        self.phase = GamePhase::Active;
        self.current_token()
    }

    fn current_token(&self) -> TimerToken {
        TimerToken(self.generation)
    }

    /// The first record for the current question if it was already answered.
    fn answered_record(&self) -> Result<Option<AnswerRecord>, SessionError> {
        match self.phase {
            GamePhase::Idle => Err(SessionError::NotActive),
            GamePhase::Active => Ok(None),
            GamePhase::AwaitingAdvance | GamePhase::Complete => {
                Ok(self.answers.last().cloned())
            }
        }
    }

    fn record(
        &mut self,
        record: AnswerRecord,
        now: DateTime<Utc>,
    ) -> Result<Submission, SessionError> {
        // Invalidate the running countdown before touching the log.
        self.generation += 1;
        self.answers.push(record.clone());

        let is_complete = self.answers.len() >= self.questions.len();
        if is_complete {
            self.result = Some(GameResult::from_answers(now, &self.answers)?);
            self.index = self.questions.len();
            self.phase = GamePhase::Complete;
        } else {
            self.phase = GamePhase::AwaitingAdvance;
        }

        tracing::debug!(
            question_id = %record.question_id,
            was_correct = record.was_correct,
            elapsed_secs = record.elapsed_secs,
            is_complete,
            "answer recorded"
        );
        Ok(Submission::Recorded {
            record,
            is_complete,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == GamePhase::Complete
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Token of the running countdown, `None` unless a question is pending.
    #[must_use]
    pub fn timer_token(&self) -> Option<TimerToken> {
        (self.phase == GamePhase::Active).then(|| self.current_token())
    }

    /// Zero-based index of the current question; equals the question count
    /// once the game is complete.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// The question being asked, or the one just answered during the feedback
    /// window.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            GamePhase::Active | GamePhase::AwaitingAdvance => self.questions.get(self.index),
            GamePhase::Idle | GamePhase::Complete => None,
        }
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// The synthesized result, once complete.
    #[must_use]
    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn progress(&self) -> GameProgress {
        let answered = self.answers.len();
        GameProgress {
            total: self.questions.len(),
            answered,
            correct: self.answers.iter().filter(|a| a.was_correct).count(),
            remaining: self.questions.len().saturating_sub(answered),
            is_complete: self.is_complete(),
        }
    }

    pub(crate) fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub(crate) fn mark_finalized(&mut self) {
        self.finalized = true;
    }
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("user_id", &self.user_id)
            .field("phase", &self.phase)
            .field("questions_len", &self.questions.len())
            .field("index", &self.index)
            .field("remaining_secs", &self.remaining_secs)
            .field("answers_len", &self.answers.len())
            .field("finalized", &self.finalized)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
