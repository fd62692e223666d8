use chrono::Utc;
use genie_core::model::{Difficulty, Question, QuestionId, ValidatedQuestion};

use super::{
    SqliteRepository,
    mapping::{conn, id_i64, map_question_row, options_to_json, question_id_from_i64},
};
use crate::repository::{QuestionBank, QuestionSource, StorageError};

const QUESTION_COLUMNS: &str = "id, prompt, options, correct_option, category, difficulty";

#[async_trait::async_trait]
impl QuestionSource for SqliteRepository {
    async fn fetch_questions(
        &self,
        limit: u32,
        difficulties: &[Difficulty],
    ) -> Result<Vec<Question>, StorageError> {
        let mut sql = format!("SELECT {QUESTION_COLUMNS} FROM questions");

        if !difficulties.is_empty() {
            sql.push_str(" WHERE difficulty IN (");
            for i in 0..difficulties.len() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push('?');
                sql.push_str(&(i + 1).to_string());
            }
            sql.push(')');
        }
        sql.push_str(" ORDER BY RANDOM() LIMIT ?");
        sql.push_str(&(difficulties.len() + 1).to_string());

        let mut query = sqlx::query(&sql);
        for difficulty in difficulties {
            query = query.bind(difficulty.as_str());
        }
        query = query.bind(i64::from(limit));

        let rows = query.fetch_all(&self.pool).await.map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_question_row(&row)?);
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl QuestionBank for SqliteRepository {
    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions ORDER BY id ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_question_row(&row)?);
        }
        Ok(out)
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_i64("question_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_question_row).transpose()
    }

    async fn insert_question(
        &self,
        question: &ValidatedQuestion,
    ) -> Result<QuestionId, StorageError> {
        let q = question;
        let res = sqlx::query(
            r"
                INSERT INTO questions (
                    prompt, options, correct_option, category, difficulty, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(q.prompt())
        .bind(options_to_json(q.options())?)
        .bind(q.correct_option())
        .bind(q.category())
        .bind(q.difficulty().as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        question_id_from_i64(res.last_insert_rowid())
    }

    async fn update_question(&self, question: &Question) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
                UPDATE questions SET
                    prompt = ?2,
                    options = ?3,
                    correct_option = ?4,
                    category = ?5,
                    difficulty = ?6
                WHERE id = ?1
            ",
        )
        .bind(id_i64("question_id", question.id().value())?)
        .bind(question.prompt())
        .bind(options_to_json(question.options())?)
        .bind(question.correct_option())
        .bind(question.category())
        .bind(question.difficulty().as_str())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM questions WHERE id = ?1")
            .bind(id_i64("question_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
