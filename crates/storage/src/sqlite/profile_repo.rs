use chrono::Utc;
use genie_core::model::{PlayerProfile, UserId};

use super::{
    SqliteRepository,
    mapping::{conn, map_profile_row, user_id_to_text},
};
use crate::repository::{ProfileRepository, StorageError};

#[async_trait::async_trait]
impl ProfileRepository for SqliteRepository {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<PlayerProfile>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT user_id, points, level, streak_days, last_played_on
                FROM player_profiles
                WHERE user_id = ?1
            ",
        )
        .bind(user_id_to_text(user_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_profile_row).transpose()
    }

    async fn upsert_profile(&self, profile: &PlayerProfile) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO player_profiles (
                    user_id, points, level, streak_days, last_played_on, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(user_id) DO UPDATE SET
                    points = excluded.points,
                    level = excluded.level,
                    streak_days = excluded.streak_days,
                    last_played_on = excluded.last_played_on,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(user_id_to_text(profile.user_id()))
        .bind(i64::from(profile.points()))
        .bind(i64::from(profile.level()))
        .bind(i64::from(profile.streak_days()))
        .bind(profile.last_played_on())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
