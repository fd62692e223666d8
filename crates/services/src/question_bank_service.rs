use std::sync::Arc;

use genie_core::model::{Question, QuestionDraft, QuestionId};
use storage::repository::QuestionBank;
use storage::sample::sample_drafts;

use crate::error::QuestionBankError;

/// Outcome of loading the built-in questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    /// Questions present before seeding.
    pub existing: usize,
}

/// Administration of the question bank.
#[derive(Clone)]
pub struct QuestionBankService {
    bank: Arc<dyn QuestionBank>,
}

impl QuestionBankService {
    #[must_use]
    pub fn new(bank: Arc<dyn QuestionBank>) -> Self {
        Self { bank }
    }

    /// List every question ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Storage` if repository access fails.
    pub async fn list(&self) -> Result<Vec<Question>, QuestionBankError> {
        Ok(self.bank.list_questions().await?)
    }

    /// Fetch a question by id; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Storage` if repository access fails.
    pub async fn get(&self, id: QuestionId) -> Result<Option<Question>, QuestionBankError> {
        Ok(self.bank.get_question(id).await?)
    }

    /// Validate and store a new question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Question` for validation failures.
    /// Returns `QuestionBankError::Storage` if persistence fails.
    pub async fn add(&self, draft: QuestionDraft) -> Result<Question, QuestionBankError> {
        let validated = draft.validate()?;
        let id = self.bank.insert_question(&validated).await?;
        tracing::info!(question_id = %id, "question added");
        Ok(validated.assign_id(id))
    }

    /// Replace the question with `id`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Question` for validation failures.
    /// Returns `QuestionBankError::Storage` (`NotFound` included) if
    /// persistence fails.
    pub async fn update(
        &self,
        id: QuestionId,
        draft: QuestionDraft,
    ) -> Result<Question, QuestionBankError> {
        let question = Question::from_persisted(id, draft)?;
        self.bank.update_question(&question).await?;
        tracing::info!(question_id = %id, "question updated");
        Ok(question)
    }

    /// Delete the question with `id`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Storage` (`NotFound` included) if
    /// persistence fails.
    pub async fn delete(&self, id: QuestionId) -> Result<(), QuestionBankError> {
        self.bank.delete_question(id).await?;
        tracing::info!(question_id = %id, "question deleted");
        Ok(())
    }

    /// Load the built-in questions. Skipped when the bank already has
    /// questions unless `force` is set.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError` if a sample fails validation or storage
    /// fails.
    pub async fn seed_samples(&self, force: bool) -> Result<SeedReport, QuestionBankError> {
        let existing = self.bank.list_questions().await?.len();
        if existing > 0 && !force {
            return Ok(SeedReport {
                inserted: 0,
                existing,
            });
        }

        let mut inserted = 0;
        for draft in sample_drafts() {
            let validated = draft.validate()?;
            self.bank.insert_question(&validated).await?;
            inserted += 1;
        }
        tracing::info!(inserted, existing, "sample questions seeded");
        Ok(SeedReport { inserted, existing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genie_core::model::{Difficulty, QuestionError};
    use storage::repository::{InMemoryRepository, StorageError};
    use storage::sample::SAMPLE_QUESTION_COUNT;

    fn service() -> QuestionBankService {
        QuestionBankService::new(Arc::new(InMemoryRepository::new()))
    }

    fn draft(prompt: &str) -> QuestionDraft {
        QuestionDraft {
            prompt: prompt.into(),
            options: vec!["Triangle".into(), "Square".into(), "Circle".into()],
            correct_option: "Circle".into(),
            category: "geometry".into(),
            difficulty: Difficulty::Easy,
        }
    }

    #[tokio::test]
    async fn add_update_delete() {
        let svc = service();
        let added = svc.add(draft("Which shape has no corners?")).await.unwrap();
        assert_eq!(svc.list().await.unwrap().len(), 1);

        let mut edit = added.to_draft();
        edit.difficulty = Difficulty::Medium;
        let updated = svc.update(added.id(), edit).await.unwrap();
        assert_eq!(
            svc.get(added.id()).await.unwrap(),
            Some(updated.clone())
        );

        svc.delete(added.id()).await.unwrap();
        assert!(matches!(
            svc.delete(added.id()).await,
            Err(QuestionBankError::Storage(StorageError::NotFound))
        ));
        assert!(matches!(
            svc.update(added.id(), updated.to_draft()).await,
            Err(QuestionBankError::Storage(StorageError::NotFound))
        ));
    }

    #[tokio::test]
    async fn invalid_draft_is_not_stored() {
        let svc = service();
        let mut bad = draft("Pick one");
        bad.correct_option = "Hexagon".into();
        assert!(matches!(
            svc.add(bad).await,
            Err(QuestionBankError::Question(
                QuestionError::CorrectOptionMissing { .. }
            ))
        ));
        assert!(svc.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seeding_skips_non_empty_bank() {
        let svc = service();
        let first = svc.seed_samples(false).await.unwrap();
        assert_eq!(first.inserted, SAMPLE_QUESTION_COUNT);
        assert_eq!(first.existing, 0);

        let second = svc.seed_samples(false).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.existing, SAMPLE_QUESTION_COUNT);

        let forced = svc.seed_samples(true).await.unwrap();
        assert_eq!(forced.inserted, SAMPLE_QUESTION_COUNT);
        assert_eq!(svc.list().await.unwrap().len(), 2 * SAMPLE_QUESTION_COUNT);
    }
}
