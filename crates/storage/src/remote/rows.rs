//! Wire rows for the remote tables and their mapping to domain types.
//!
//! Remote column names never leave this module.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use genie_core::model::{
    Difficulty, GameResult, PlayerProfile, Question, QuestionDraft, QuestionId, UserId,
    ValidatedQuestion,
};
use genie_core::time::local_date;
use serde::{Deserialize, Serialize};

use crate::repository::{GameResultId, GameResultRow, StorageError};

const DEFAULT_CATEGORY: &str = "general";

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn non_negative_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

/// Options as stored remotely: a plain list, a letter-keyed object, or either
/// of those JSON-encoded into a string column.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RemoteOptions {
    List(Vec<String>),
    Lettered(BTreeMap<String, String>),
    Encoded(String),
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionRow {
    pub id: i64,
    pub question_text: String,
    pub options: RemoteOptions,
    pub correct_answer: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionPayload<'a> {
    pub question_text: &'a str,
    pub options: &'a [String],
    pub correct_answer: &'a str,
    pub category: &'a str,
    pub difficulty: &'static str,
}

impl<'a> QuestionPayload<'a> {
    pub fn from_validated(q: &'a ValidatedQuestion) -> Self {
        Self {
            question_text: q.prompt(),
            options: q.options(),
            correct_answer: q.correct_option(),
            category: q.category(),
            difficulty: q.difficulty().as_str(),
        }
    }

    pub fn from_question(q: &'a Question) -> Self {
        Self {
            question_text: q.prompt(),
            options: q.options(),
            correct_answer: q.correct_option(),
            category: q.category(),
            difficulty: q.difficulty().as_str(),
        }
    }
}

/// Resolve options into a list plus the correct option text.
///
/// Letter-keyed options are ordered by key; a `correct_answer` naming one of
/// the keys is replaced by that option's text.
fn resolve_options(
    options: RemoteOptions,
    correct_answer: String,
) -> Result<(Vec<String>, String), StorageError> {
    match options {
        RemoteOptions::List(list) => Ok((list, correct_answer)),
        RemoteOptions::Lettered(map) => {
            let correct = map
                .get(correct_answer.trim())
                .cloned()
                .unwrap_or(correct_answer);
            Ok((map.into_values().collect(), correct))
        }
        RemoteOptions::Encoded(raw) => {
            let decoded: RemoteOptions = serde_json::from_str(&raw).map_err(ser)?;
            if matches!(decoded, RemoteOptions::Encoded(_)) {
                return Err(StorageError::Serialization(
                    "options encoded more than once".into(),
                ));
            }
            resolve_options(decoded, correct_answer)
        }
    }
}

impl TryFrom<QuestionRow> for Question {
    type Error = StorageError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let id = u64::try_from(row.id)
            .map(QuestionId::new)
            .map_err(|_| StorageError::Serialization(format!("invalid question id: {}", row.id)))?;
        let (options, correct_option) = resolve_options(row.options, row.correct_answer)?;
        let difficulty = match row.difficulty.as_deref() {
            None | Some("") => Difficulty::Medium,
            Some(raw) => raw.parse::<Difficulty>().map_err(ser)?,
        };
        let category = row
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let draft = QuestionDraft {
            prompt: row.question_text,
            options,
            correct_option,
            category,
            difficulty,
        };
        Question::from_persisted(id, draft).map_err(ser)
    }
}

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct ResultRow {
    pub id: i64,
    pub user_id: String,
    pub score: i64,
    pub total_questions: i64,
    pub time_taken: i64,
    pub accuracy: f64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultPayload {
    pub user_id: String,
    pub score: u32,
    pub total_questions: u32,
    pub time_taken: u32,
    pub accuracy: u8,
    pub completed_at: DateTime<Utc>,
}

impl ResultPayload {
    pub fn new(user_id: UserId, result: &GameResult) -> Self {
        Self {
            user_id: user_id.to_string(),
            score: result.score(),
            total_questions: result.total_questions(),
            time_taken: result.time_taken_secs(),
            accuracy: result.accuracy(),
            completed_at: result.completed_at(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct InsertedId {
    pub id: GameResultId,
}

impl TryFrom<ResultRow> for GameResultRow {
    type Error = StorageError;

    fn try_from(row: ResultRow) -> Result<Self, Self::Error> {
        let user_id = row.user_id.parse::<UserId>().map_err(ser)?;
        if !(0.0..=100.0).contains(&row.accuracy) {
            return Err(StorageError::Serialization(format!(
                "invalid accuracy: {}",
                row.accuracy
            )));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let accuracy = row.accuracy.round() as u8;

        let result = GameResult::from_persisted(
            row.completed_at,
            non_negative_u32("score", row.score)?,
            non_negative_u32("total_questions", row.total_questions)?,
            non_negative_u32("time_taken", row.time_taken)?,
            accuracy,
        )
        .map_err(ser)?;
        Ok(GameResultRow::new(row.id, user_id, result))
    }
}

//
// ─── PROFILES ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct ProfileRow {
    pub id: String,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub level: Option<i64>,
    #[serde(default)]
    pub streak_days: Option<i64>,
    #[serde(default)]
    pub last_played: Option<String>,
}

/// Accepts a bare date or a full timestamp; timestamps map to the local day.
fn parse_last_played(raw: &str) -> Result<NaiveDate, StorageError> {
    let raw = raw.trim();
    if let Ok(date) = raw.parse::<NaiveDate>() {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|at| local_date(at.with_timezone(&Utc)))
        .map_err(|_| StorageError::Serialization(format!("invalid last_played: {raw}")))
}

impl TryFrom<ProfileRow> for PlayerProfile {
    type Error = StorageError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let user_id = row.id.parse::<UserId>().map_err(ser)?;
        let last_played_on = row
            .last_played
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(parse_last_played)
            .transpose()?;

        PlayerProfile::from_persisted(
            user_id,
            non_negative_u32("points", row.points.unwrap_or(0))?,
            non_negative_u32("level", row.level.unwrap_or(1))?,
            non_negative_u32("streak_days", row.streak_days.unwrap_or(0))?,
            last_played_on,
        )
        .map_err(ser)
    }
}

impl From<&PlayerProfile> for ProfileRow {
    fn from(profile: &PlayerProfile) -> Self {
        Self {
            id: profile.user_id().to_string(),
            points: Some(i64::from(profile.points())),
            level: Some(i64::from(profile.level())),
            streak_days: Some(i64::from(profile.streak_days())),
            last_played: profile
                .last_played_on()
                .map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question_row(value: serde_json::Value) -> QuestionRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn list_options_map_directly() {
        let row = question_row(json!({
            "id": 4,
            "question_text": "What is 15% of 80?",
            "options": ["10", "12", "14", "16"],
            "correct_answer": "12",
            "category": "Math",
            "difficulty": "easy"
        }));
        let q = Question::try_from(row).unwrap();
        assert_eq!(q.id(), QuestionId::new(4));
        assert_eq!(q.options().len(), 4);
        assert_eq!(q.correct_option(), "12");
        assert_eq!(q.category(), "math");
    }

    #[test]
    fn lettered_options_resolve_correct_letter() {
        let row = question_row(json!({
            "id": 9,
            "question_text": "Odd one out?",
            "options": {"B": "Oak", "A": "Maple", "D": "Bush", "C": "Pine"},
            "correct_answer": "D"
        }));
        let q = Question::try_from(row).unwrap();
        assert_eq!(q.options(), ["Maple", "Oak", "Pine", "Bush"]);
        assert_eq!(q.correct_option(), "Bush");
        assert_eq!(q.category(), DEFAULT_CATEGORY);
        assert_eq!(q.difficulty(), Difficulty::Medium);
    }

    #[test]
    fn string_encoded_options_are_decoded() {
        let row = question_row(json!({
            "id": 2,
            "question_text": "Pick A",
            "options": "{\"A\":\"yes\",\"B\":\"no\"}",
            "correct_answer": "A"
        }));
        let q = Question::try_from(row).unwrap();
        assert_eq!(q.correct_option(), "yes");
    }

    #[test]
    fn placeholder_rows_fail_validation() {
        let row = question_row(json!({
            "id": 3,
            "question_text": "New question",
            "options": {"A": "", "B": "", "C": "", "D": ""},
            "correct_answer": "A"
        }));
        assert!(matches!(
            Question::try_from(row),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn profile_row_accepts_timestamp_or_date() {
        let user = UserId::local();
        let dated: ProfileRow = serde_json::from_value(json!({
            "id": user.to_string(),
            "points": 120,
            "level": 2,
            "streak_days": 3,
            "last_played": "2024-03-01"
        }))
        .unwrap();
        let profile = PlayerProfile::try_from(dated).unwrap();
        assert_eq!(
            profile.last_played_on(),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );

        let sparse: ProfileRow =
            serde_json::from_value(json!({ "id": user.to_string() })).unwrap();
        let profile = PlayerProfile::try_from(sparse).unwrap();
        assert_eq!(profile, PlayerProfile::new(user));

        assert!(parse_last_played("yesterday").is_err());
        assert!(parse_last_played("2024-03-01T10:00:00Z").is_ok());
    }

    #[test]
    fn result_row_rounds_fractional_accuracy() {
        let row: ResultRow = serde_json::from_value(json!({
            "id": 11,
            "user_id": UserId::local().to_string(),
            "score": 2,
            "total_questions": 3,
            "time_taken": 40,
            "accuracy": 66.67,
            "completed_at": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        let mapped = GameResultRow::try_from(row).unwrap();
        assert_eq!(mapped.result.accuracy(), 67);
        assert_eq!(mapped.result.time_taken_secs(), 40);
    }
}
