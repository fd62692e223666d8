use chrono::{DateTime, SecondsFormat, Utc};
use genie_core::model::{
    Difficulty, GameResult, PlayerProfile, Question, QuestionId, UserId, ValidatedQuestion,
};
use reqwest::Method;

use super::RemoteRepository;
use super::rows::{InsertedId, ProfileRow, QuestionPayload, QuestionRow, ResultPayload, ResultRow};
use crate::repository::{
    GameResultId, GameResultRow, ProfileRepository, QuestionBank, QuestionSource,
    ResultRepository, StorageError,
};

const QUESTIONS: &str = "questions";
const RESULTS: &str = "game_results";
const PROFILES: &str = "profiles";

const RETURN_REPRESENTATION: &str = "return=representation";

/// Convert rows one at a time, logging and dropping any that fail to map.
///
/// Transport and HTTP failures are reported by the caller; a single
/// malformed row never fails the whole listing.
fn map_valid<R, T>(table: &'static str, rows: Vec<R>, row_id: impl Fn(&R) -> i64) -> Vec<T>
where
    T: TryFrom<R, Error = StorageError>,
{
    rows.into_iter()
        .filter_map(|row| {
            let id = row_id(&row);
            match T::try_from(row) {
                Ok(value) => Some(value),
                Err(error) => {
                    tracing::warn!(table, id, %error, "skipping invalid remote row");
                    None
                }
            }
        })
        .collect()
}

fn map_questions(rows: Vec<QuestionRow>) -> Vec<Question> {
    map_valid(QUESTIONS, rows, |row| row.id)
}

fn map_results(rows: Vec<ResultRow>) -> Vec<GameResultRow> {
    map_valid(RESULTS, rows, |row| row.id)
}

fn single<T>(mut rows: Vec<T>) -> Result<T, StorageError> {
    rows.pop().ok_or(StorageError::NotFound)
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

#[async_trait::async_trait]
impl QuestionSource for RemoteRepository {
    async fn fetch_questions(
        &self,
        limit: u32,
        difficulties: &[Difficulty],
    ) -> Result<Vec<Question>, StorageError> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("limit", limit.to_string()),
        ];
        if !difficulties.is_empty() {
            let list: Vec<&str> = difficulties.iter().map(|d| d.as_str()).collect();
            query.push(("difficulty", format!("in.({})", list.join(","))));
        }

        let req = self.request(Method::GET, QUESTIONS)?.query(&query);
        let rows: Vec<QuestionRow> = self.send_json(req).await?;
        tracing::debug!(rows = rows.len(), "fetched remote questions");
        Ok(map_questions(rows))
    }
}

#[async_trait::async_trait]
impl QuestionBank for RemoteRepository {
    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let req = self
            .request(Method::GET, QUESTIONS)?
            .query(&[("select", "*"), ("order", "id.asc")]);
        let rows: Vec<QuestionRow> = self.send_json(req).await?;
        Ok(map_questions(rows))
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let req = self
            .request(Method::GET, QUESTIONS)?
            .query(&[("select", "*".to_string()), ("id", eq(id))]);
        let rows: Vec<QuestionRow> = self.send_json(req).await?;
        rows.into_iter().next().map(Question::try_from).transpose()
    }

    async fn insert_question(
        &self,
        question: &ValidatedQuestion,
    ) -> Result<QuestionId, StorageError> {
        let req = self
            .request(Method::POST, QUESTIONS)?
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&[QuestionPayload::from_validated(question)]);
        let rows: Vec<QuestionRow> = self.send_json(req).await?;
        let inserted = Question::try_from(single(rows)?)?;
        Ok(inserted.id())
    }

    async fn update_question(&self, question: &Question) -> Result<(), StorageError> {
        let req = self
            .request(Method::PATCH, QUESTIONS)?
            .query(&[("id", eq(question.id()))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&QuestionPayload::from_question(question));
        let rows: Vec<serde_json::Value> = self.send_json(req).await?;
        single(rows).map(|_| ())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let req = self
            .request(Method::DELETE, QUESTIONS)?
            .query(&[("id", eq(id))])
            .header("Prefer", RETURN_REPRESENTATION);
        let rows: Vec<serde_json::Value> = self.send_json(req).await?;
        single(rows).map(|_| ())
    }
}

#[async_trait::async_trait]
impl ResultRepository for RemoteRepository {
    async fn append_result(
        &self,
        user_id: UserId,
        result: &GameResult,
    ) -> Result<GameResultId, StorageError> {
        let req = self
            .request(Method::POST, RESULTS)?
            .query(&[("select", "id")])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&[ResultPayload::new(user_id, result)]);
        let rows: Vec<InsertedId> = self.send_json(req).await?;
        Ok(single(rows)?.id)
    }

    async fn list_results(
        &self,
        user_id: UserId,
        completed_from: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<GameResultRow>, StorageError> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("user_id", eq(user_id)),
            ("order", "completed_at.desc,id.desc".to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(from) = completed_from {
            query.push((
                "completed_at",
                format!("gte.{}", from.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ));
        }

        let req = self.request(Method::GET, RESULTS)?.query(&query);
        let rows: Vec<ResultRow> = self.send_json(req).await?;
        Ok(map_results(rows))
    }
}

#[async_trait::async_trait]
impl ProfileRepository for RemoteRepository {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<PlayerProfile>, StorageError> {
        let req = self
            .request(Method::GET, PROFILES)?
            .query(&[("select", "*".to_string()), ("id", eq(user_id))]);
        let rows: Vec<ProfileRow> = self.send_json(req).await?;
        rows.into_iter().next().map(PlayerProfile::try_from).transpose()
    }

    async fn upsert_profile(&self, profile: &PlayerProfile) -> Result<(), StorageError> {
        let req = self
            .request(Method::POST, PROFILES)?
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[ProfileRow::from(profile)]);
        self.send_empty(req).await
    }
}
