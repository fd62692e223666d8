use chrono::{DateTime, Utc};
use genie_core::model::{GameResult, UserId};

use super::{
    SqliteRepository,
    mapping::{conn, map_result_row, user_id_to_text},
};
use crate::repository::{GameResultId, GameResultRow, ResultRepository, StorageError};

#[async_trait::async_trait]
impl ResultRepository for SqliteRepository {
    async fn append_result(
        &self,
        user_id: UserId,
        result: &GameResult,
    ) -> Result<GameResultId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO game_results (
                    user_id, completed_at, score, total_questions, time_taken_secs, accuracy
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(user_id_to_text(user_id))
        .bind(result.completed_at())
        .bind(i64::from(result.score()))
        .bind(i64::from(result.total_questions()))
        .bind(i64::from(result.time_taken_secs()))
        .bind(i64::from(result.accuracy()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn list_results(
        &self,
        user_id: UserId,
        completed_from: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<GameResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, user_id, completed_at, score, total_questions, time_taken_secs, accuracy
                FROM game_results
                WHERE user_id = ?1
                  AND (?2 IS NULL OR completed_at >= ?2)
                ORDER BY completed_at DESC, id DESC
                LIMIT ?3
            ",
        )
        .bind(user_id_to_text(user_id))
        .bind(completed_from)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_result_row(&row)?);
        }
        Ok(out)
    }
}
