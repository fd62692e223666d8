use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use genie_core::feedback::streak_message;
use genie_core::model::{PlayerProfile, UserId};
use genie_core::time::local_date;
use storage::repository::{GameResultRow, ProfileRepository, ResultRepository};

use crate::Clock;
use crate::error::StatsError;

/// Upper bound on results read when aggregating a player's history.
const HISTORY_SCAN_LIMIT: u32 = 10_000;

/// Aggregate numbers for a player's dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsOverview {
    pub games_played: u32,
    /// `round(sum of accuracies / games played)`, zero without games.
    pub average_accuracy: u8,
    pub total_correct: u32,
    pub total_questions: u32,
    pub streak_days: u32,
    pub points: u32,
    pub level: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekDay {
    pub date: NaiveDate,
    pub played: bool,
    pub is_today: bool,
}

/// The current week, Sunday first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakWeek {
    pub days: Vec<WeekDay>,
    pub streak_days: u32,
    pub message: &'static str,
}

/// Read-side views over results and profiles.
#[derive(Clone)]
pub struct StatsService {
    clock: Clock,
    results: Arc<dyn ResultRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl StatsService {
    #[must_use]
    pub fn new(
        clock: Clock,
        results: Arc<dyn ResultRepository>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            clock,
            results,
            profiles,
        }
    }

    /// Most recent results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if repository access fails.
    pub async fn history(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<GameResultRow>, StatsError> {
        Ok(self.results.list_results(user_id, None, limit).await?)
    }

    /// The player's profile, or a fresh one if they have never finished a game.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if repository access fails.
    pub async fn profile(&self, user_id: UserId) -> Result<PlayerProfile, StatsError> {
        Ok(self
            .profiles
            .get_profile(user_id)
            .await?
            .unwrap_or_else(|| PlayerProfile::new(user_id)))
    }

    /// # Errors
    ///
    /// Returns `StatsError::Storage` if repository access fails.
    pub async fn overview(&self, user_id: UserId) -> Result<StatsOverview, StatsError> {
        let rows = self
            .results
            .list_results(user_id, None, HISTORY_SCAN_LIMIT)
            .await?;
        let profile = self.profile(user_id).await?;
        Ok(summarize(&rows, &profile))
    }

    /// # Errors
    ///
    /// Returns `StatsError::Storage` if repository access fails.
    pub async fn streak_week(&self, user_id: UserId) -> Result<StreakWeek, StatsError> {
        let now = self.clock.now();
        // Covers the whole local week whatever the UTC offset.
        let from = now - Duration::days(8);
        let rows = self
            .results
            .list_results(user_id, Some(from), HISTORY_SCAN_LIMIT)
            .await?;
        let profile = self.profile(user_id).await?;

        let streak_days = profile.streak_days();
        Ok(StreakWeek {
            days: week_days(self.clock.today(), &rows),
            streak_days,
            message: streak_message(streak_days),
        })
    }
}

/// Fold a result history and profile into the dashboard numbers.
#[must_use]
pub fn summarize(rows: &[GameResultRow], profile: &PlayerProfile) -> StatsOverview {
    let games_played = u32::try_from(rows.len()).unwrap_or(u32::MAX);
    let accuracy_sum: u64 = rows.iter().map(|r| u64::from(r.result.accuracy())).sum();
    let average_accuracy = if rows.is_empty() {
        0
    } else {
        let n = rows.len() as u64;
        u8::try_from((2 * accuracy_sum + n) / (2 * n)).unwrap_or(100)
    };

    StatsOverview {
        games_played,
        average_accuracy,
        total_correct: rows.iter().map(|r| r.result.score()).sum(),
        total_questions: rows.iter().map(|r| r.result.total_questions()).sum(),
        streak_days: profile.streak_days(),
        points: profile.points(),
        level: profile.level(),
    }
}

/// Sunday-first week containing `today`, flagging days with a completed game.
#[must_use]
pub fn week_days(today: NaiveDate, rows: &[GameResultRow]) -> Vec<WeekDay> {
    let played: HashSet<NaiveDate> = rows
        .iter()
        .map(|r| local_date(r.result.completed_at()))
        .collect();
    let start = today - Duration::days(i64::from(today.weekday().num_days_from_sunday()));

    (0..7)
        .map(|offset| {
            let date = start + Duration::days(offset);
            WeekDay {
                date,
                played: played.contains(&date),
                is_today: date == today,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use genie_core::model::{GameResult, accuracy_percent};
    use genie_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn row(id: i64, score: u32, total: u32) -> GameResultRow {
        let result = GameResult::from_persisted(
            fixed_now(),
            score,
            total,
            60,
            accuracy_percent(score, total),
        )
        .unwrap();
        GameResultRow::new(id, UserId::local(), result)
    }

    #[test]
    fn overview_rounds_average_accuracy() {
        // 70 + 85 = 155 / 2 = 77.5 -> 78
        let rows = vec![row(1, 7, 10), row(2, 17, 20)];
        let profile = PlayerProfile::from_persisted(UserId::local(), 1550, 3, 2, None).unwrap();
        let overview = summarize(&rows, &profile);

        assert_eq!(overview.games_played, 2);
        assert_eq!(overview.average_accuracy, 78);
        assert_eq!(overview.total_correct, 24);
        assert_eq!(overview.total_questions, 30);
        assert_eq!(overview.points, 1550);
        assert_eq!(overview.level, 3);
        assert_eq!(overview.streak_days, 2);
    }

    #[test]
    fn empty_history_has_zero_average() {
        let overview = summarize(&[], &PlayerProfile::new(UserId::local()));
        assert_eq!(overview.games_played, 0);
        assert_eq!(overview.average_accuracy, 0);
        assert_eq!(overview.level, 1);
    }

    #[test]
    fn week_starts_on_sunday_and_flags_played_days() {
        // 2024-03-06 is a Wednesday.
        let today = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let played_at = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc();
        let result = GameResult::from_persisted(played_at, 5, 10, 60, 50).unwrap();
        let rows = vec![GameResultRow::new(1, UserId::local(), result)];

        let days = week_days(today, &rows);
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].date.weekday(), Weekday::Sun);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
        assert!(days[3].is_today);
        assert_eq!(days.iter().filter(|d| d.is_today).count(), 1);

        let flagged: Vec<NaiveDate> = days.iter().filter(|d| d.played).map(|d| d.date).collect();
        assert_eq!(flagged, vec![local_date(played_at)]);
    }

    #[tokio::test]
    async fn streak_week_uses_profile_streak() {
        let repo = InMemoryRepository::new();
        let user = UserId::local();
        repo.upsert_profile(
            &PlayerProfile::from_persisted(user, 400, 2, 5, Some(local_date(fixed_now()))).unwrap(),
        )
        .await
        .unwrap();
        let svc = StatsService::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo),
        );

        let week = svc.streak_week(user).await.unwrap();
        assert_eq!(week.streak_days, 5);
        assert_eq!(week.message, "You're building momentum!");
        assert_eq!(week.days.len(), 7);
        assert!(week.days.iter().all(|d| !d.played));
        let today = week.days.iter().find(|d| d.is_today).unwrap();
        assert_eq!(today.date, local_date(fixed_now()));
    }
}
