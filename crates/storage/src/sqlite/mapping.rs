use genie_core::model::{
    Difficulty, GameResult, PlayerProfile, Question, QuestionDraft, QuestionId, UserId,
};
use sqlx::Row;

use crate::repository::{GameResultRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    u64::try_from(v)
        .map(QuestionId::new)
        .map_err(|_| StorageError::Serialization("question_id sign overflow".into()))
}

pub(crate) fn user_id_to_text(user_id: UserId) -> String {
    user_id.to_string()
}

pub(crate) fn user_id_from_text(raw: &str) -> Result<UserId, StorageError> {
    raw.parse::<UserId>().map_err(ser)
}

pub(crate) fn options_to_json(options: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

pub(crate) fn parse_difficulty(s: &str) -> Result<Difficulty, StorageError> {
    s.parse::<Difficulty>()
        .map_err(|_| StorageError::Serialization(format!("invalid difficulty: {s}")))
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let id = question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let options_json: String = row.try_get("options").map_err(ser)?;
    let options: Vec<String> = serde_json::from_str(&options_json).map_err(ser)?;
    let difficulty_str: String = row.try_get("difficulty").map_err(ser)?;

    let draft = QuestionDraft {
        prompt: row.try_get("prompt").map_err(ser)?,
        options,
        correct_option: row.try_get("correct_option").map_err(ser)?,
        category: row.try_get("category").map_err(ser)?,
        difficulty: parse_difficulty(&difficulty_str)?,
    };

    Question::from_persisted(id, draft).map_err(ser)
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<GameResultRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let user_id = user_id_from_text(&row.try_get::<String, _>("user_id").map_err(ser)?)?;
    let accuracy_i64: i64 = row.try_get("accuracy").map_err(ser)?;
    let accuracy = u8::try_from(accuracy_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid accuracy: {accuracy_i64}")))?;

    let result = GameResult::from_persisted(
        row.try_get("completed_at").map_err(ser)?,
        u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
        u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        u32_from_i64(
            "time_taken_secs",
            row.try_get::<i64, _>("time_taken_secs").map_err(ser)?,
        )?,
        accuracy,
    )
    .map_err(ser)?;

    Ok(GameResultRow::new(id, user_id, result))
}

pub(crate) fn map_profile_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<PlayerProfile, StorageError> {
    let user_id = user_id_from_text(&row.try_get::<String, _>("user_id").map_err(ser)?)?;
    PlayerProfile::from_persisted(
        user_id,
        u32_from_i64("points", row.try_get::<i64, _>("points").map_err(ser)?)?,
        u32_from_i64("level", row.try_get::<i64, _>("level").map_err(ser)?)?,
        u32_from_i64(
            "streak_days",
            row.try_get::<i64, _>("streak_days").map_err(ser)?,
        )?,
        row.try_get("last_played_on").map_err(ser)?,
    )
    .map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_strings_match_schema_check() {
        for d in Difficulty::ALL {
            assert_eq!(parse_difficulty(d.as_str()).unwrap(), d);
        }
        assert!(parse_difficulty("insane").is_err());
    }

    #[test]
    fn options_serialize_as_json_array() {
        let json = options_to_json(&["1/6".to_string(), "1/8".to_string()]).unwrap();
        assert_eq!(json, r#"["1/6","1/8"]"#);
    }
}
