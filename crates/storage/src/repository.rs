use async_trait::async_trait;
use chrono::{DateTime, Utc};
use genie_core::model::{
    Difficulty, GameResult, PlayerProfile, Question, QuestionId, UserId, ValidatedQuestion,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Storage identifier for a persisted game result.
pub type GameResultId = i64;

/// A persisted result together with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResultRow {
    pub id: GameResultId,
    pub user_id: UserId,
    pub result: GameResult,
}

impl GameResultRow {
    #[must_use]
    pub fn new(id: GameResultId, user_id: UserId, result: GameResult) -> Self {
        Self {
            id,
            user_id,
            result,
        }
    }
}

/// Read side of the question bank used by game sessions.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch up to `limit` questions, restricted to `difficulties` unless empty.
    ///
    /// No ordering is promised; callers sample for themselves.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the source is unavailable.
    async fn fetch_questions(
        &self,
        limit: u32,
        difficulties: &[Difficulty],
    ) -> Result<Vec<Question>, StorageError>;
}

/// Administrative access to the question bank.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// List every question ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_questions(&self) -> Result<Vec<Question>, StorageError>;

    /// Fetch a question by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError>;

    /// Insert a new question and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn insert_question(&self, question: &ValidatedQuestion)
    -> Result<QuestionId, StorageError>;

    /// Replace an existing question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no question has this id.
    async fn update_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Delete a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no question has this id.
    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError>;
}

/// Append-only log of completed game results, keyed by user.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Append a result for a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(
        &self,
        user_id: UserId,
        result: &GameResult,
    ) -> Result<GameResultId, StorageError>;

    /// Results for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_results(
        &self,
        user_id: UserId,
        completed_from: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<GameResultRow>, StorageError>;
}

/// One profile per user.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch a profile, `None` when the user has never been stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_profile(&self, user_id: UserId) -> Result<Option<PlayerProfile>, StorageError>;

    /// Insert or replace a profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be stored.
    async fn upsert_profile(&self, profile: &PlayerProfile) -> Result<(), StorageError>;
}

#[derive(Default)]
struct ResultLog {
    next_id: GameResultId,
    rows: Vec<GameResultRow>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<BTreeMap<QuestionId, Question>>>,
    results: Arc<Mutex<ResultLog>>,
    profiles: Arc<Mutex<HashMap<UserId, PlayerProfile>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-filled with the given questions.
    #[must_use]
    pub fn with_questions(questions: impl IntoIterator<Item = Question>) -> Self {
        let repo = Self::new();
        if let Ok(mut guard) = repo.questions.lock() {
            guard.extend(questions.into_iter().map(|q| (q.id(), q)));
        }
        repo
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl QuestionSource for InMemoryRepository {
    async fn fetch_questions(
        &self,
        limit: u32,
        difficulties: &[Difficulty],
    ) -> Result<Vec<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(guard
            .values()
            .filter(|q| difficulties.is_empty() || difficulties.contains(&q.difficulty()))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl QuestionBank for InMemoryRepository {
    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn insert_question(
        &self,
        question: &ValidatedQuestion,
    ) -> Result<QuestionId, StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        let next = guard.keys().next_back().map_or(1, |id| id.value() + 1);
        let id = QuestionId::new(next);
        guard.insert(id, question.clone().assign_id(id));
        Ok(id)
    }

    async fn update_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        match guard.get_mut(&question.id()) {
            Some(slot) => {
                *slot = question.clone();
                Ok(())
            }
            None => Err(StorageError::NotFound),
        }
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        guard.remove(&id).map(|_| ()).ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn append_result(
        &self,
        user_id: UserId,
        result: &GameResult,
    ) -> Result<GameResultId, StorageError> {
        let mut guard = self.results.lock().map_err(poisoned)?;
        guard.next_id += 1;
        let id = guard.next_id;
        guard
            .rows
            .push(GameResultRow::new(id, user_id, result.clone()));
        Ok(id)
    }

    async fn list_results(
        &self,
        user_id: UserId,
        completed_from: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<GameResultRow>, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        let mut rows: Vec<_> = guard
            .rows
            .iter()
            .filter(|row| row.user_id == user_id)
            .filter(|row| completed_from.is_none_or(|from| row.result.completed_at() >= from))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.result
                .completed_at()
                .cmp(&a.result.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<PlayerProfile>, StorageError> {
        let guard = self.profiles.lock().map_err(poisoned)?;
        Ok(guard.get(&user_id).cloned())
    }

    async fn upsert_profile(&self, profile: &PlayerProfile) -> Result<(), StorageError> {
        let mut guard = self.profiles.lock().map_err(poisoned)?;
        guard.insert(profile.user_id(), profile.clone());
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub question_source: Arc<dyn QuestionSource>,
    pub question_bank: Arc<dyn QuestionBank>,
    pub results: Arc<dyn ResultRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let question_source: Arc<dyn QuestionSource> = Arc::new(repo.clone());
        let question_bank: Arc<dyn QuestionBank> = Arc::new(repo.clone());
        let results: Arc<dyn ResultRepository> = Arc::new(repo.clone());
        let profiles: Arc<dyn ProfileRepository> = Arc::new(repo);
        Self {
            question_source,
            question_bank,
            results,
            profiles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use genie_core::model::QuestionDraft;
    use genie_core::time::fixed_now;

    fn validated(prompt: &str, difficulty: Difficulty) -> ValidatedQuestion {
        QuestionDraft {
            prompt: prompt.into(),
            options: vec!["a".into(), "b".into()],
            correct_option: "a".into(),
            category: "logical".into(),
            difficulty,
        }
        .validate()
        .unwrap()
    }

    fn result(score: u32, at: DateTime<Utc>) -> GameResult {
        GameResult::from_persisted(
            at,
            score,
            10,
            100,
            genie_core::model::accuracy_percent(score, 10),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn question_bank_crud() {
        let repo = InMemoryRepository::new();
        let first = repo
            .insert_question(&validated("Q1", Difficulty::Easy))
            .await
            .unwrap();
        let second = repo
            .insert_question(&validated("Q2", Difficulty::Hard))
            .await
            .unwrap();
        assert_eq!(first, QuestionId::new(1));
        assert_eq!(second, QuestionId::new(2));

        let hard = repo.fetch_questions(10, &[Difficulty::Hard]).await.unwrap();
        assert_eq!(hard.len(), 1);
        assert_eq!(hard[0].prompt(), "Q2");

        let mut draft = hard[0].to_draft();
        draft.prompt = "Q2 edited".into();
        let edited = genie_core::model::Question::from_persisted(second, draft).unwrap();
        repo.update_question(&edited).await.unwrap();
        assert_eq!(
            repo.get_question(second).await.unwrap().unwrap().prompt(),
            "Q2 edited"
        );

        repo.delete_question(first).await.unwrap();
        assert!(matches!(
            repo.delete_question(first).await,
            Err(StorageError::NotFound)
        ));
        assert_eq!(repo.list_questions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn results_list_newest_first_per_user() {
        let repo = InMemoryRepository::new();
        let me = UserId::local();
        let other = UserId::random();
        let now = fixed_now();

        repo.append_result(me, &result(3, now - Duration::days(2)))
            .await
            .unwrap();
        repo.append_result(other, &result(9, now)).await.unwrap();
        repo.append_result(me, &result(7, now)).await.unwrap();

        let rows = repo.list_results(me, None, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].result.score(), 7);
        assert_eq!(rows[1].result.score(), 3);

        let recent = repo
            .list_results(me, Some(now - Duration::days(1)), 10)
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);
    }

    #[tokio::test]
    async fn profile_upsert_replaces() {
        let repo = InMemoryRepository::new();
        let me = UserId::local();
        assert!(repo.get_profile(me).await.unwrap().is_none());

        let profile = PlayerProfile::from_persisted(me, 120, 2, 3, None).unwrap();
        repo.upsert_profile(&profile).await.unwrap();
        repo.upsert_profile(&profile).await.unwrap();
        assert_eq!(repo.get_profile(me).await.unwrap(), Some(profile));
    }
}
