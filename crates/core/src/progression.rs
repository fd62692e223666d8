//! Streak, points and level rules applied once per completed session.

use chrono::NaiveDate;

use crate::model::PlayerProfile;

/// Largest calendar-day gap between two plays that still continues a streak.
///
/// `1` means the previous play must have been exactly yesterday; any longer
/// gap resets the streak to 1.
pub const STREAK_CONTINUITY_DAYS: u32 = 1;

/// Points awarded per accuracy percentage point.
pub const POINTS_PER_ACCURACY_POINT: u32 = 10;

/// A level is gained when points exceed `level * LEVEL_STEP_POINTS`.
pub const LEVEL_STEP_POINTS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressOutcome {
    /// The player already completed a session today; nothing changed.
    AlreadyPlayedToday,
    Updated,
}

/// Before/after view of a profile update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub before: PlayerProfile,
    pub after: PlayerProfile,
    pub outcome: ProgressOutcome,
    pub points_awarded: u32,
}

impl ProgressUpdate {
    #[must_use]
    pub fn leveled_up(&self) -> bool {
        self.after.level() > self.before.level()
    }

    #[must_use]
    pub fn streak_continued(&self) -> bool {
        self.outcome == ProgressOutcome::Updated && self.after.streak_days() > 1
    }

    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.outcome == ProgressOutcome::Updated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionRules {
    points_per_accuracy_point: u32,
    level_step_points: u32,
    streak_continuity_days: u32,
}

impl Default for ProgressionRules {
    fn default() -> Self {
        Self {
            points_per_accuracy_point: POINTS_PER_ACCURACY_POINT,
            level_step_points: LEVEL_STEP_POINTS,
            streak_continuity_days: STREAK_CONTINUITY_DAYS,
        }
    }
}

impl ProgressionRules {
    /// Rules with a wider streak window. `0` is treated as `1`.
    #[must_use]
    pub fn with_streak_continuity_days(mut self, days: u32) -> Self {
        self.streak_continuity_days = days.max(1);
        self
    }

    #[must_use]
    pub fn streak_continuity_days(&self) -> u32 {
        self.streak_continuity_days
    }

    /// Streak length after playing on `today`.
    ///
    /// A `last_played_on` later than `today` (clock skew) restarts the streak.
    #[must_use]
    pub fn next_streak(&self, profile: &PlayerProfile, today: NaiveDate) -> u32 {
        let Some(last) = profile.last_played_on() else {
            return 1;
        };
        let gap = today.signed_duration_since(last).num_days();
        if gap >= 1 && gap <= i64::from(self.streak_continuity_days) {
            profile.streak_days().saturating_add(1)
        } else {
            1
        }
    }

    /// Apply one completed session with the given accuracy (0..=100).
    ///
    /// Levels only ever rise by one per session: the new total is compared
    /// against the threshold of the current level, not recomputed from points.
    #[must_use]
    pub fn apply(&self, profile: &PlayerProfile, accuracy: u8, today: NaiveDate) -> ProgressUpdate {
        if profile.last_played_on() == Some(today) {
            return ProgressUpdate {
                before: profile.clone(),
                after: profile.clone(),
                outcome: ProgressOutcome::AlreadyPlayedToday,
                points_awarded: 0,
            };
        }

        let streak = self.next_streak(profile, today);
        let awarded = u32::from(accuracy.min(100)).saturating_mul(self.points_per_accuracy_point);
        let points = profile.points().saturating_add(awarded);
        let threshold = profile.level().saturating_mul(self.level_step_points);
        let level = if points > threshold {
            profile.level().saturating_add(1)
        } else {
            profile.level()
        };

        let mut after = profile.clone();
        after.record_play(points, level, streak, today);

        ProgressUpdate {
            before: profile.clone(),
            after,
            outcome: ProgressOutcome::Updated,
            points_awarded: awarded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserId;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn profile(points: u32, level: u32, streak: u32, last: Option<NaiveDate>) -> PlayerProfile {
        PlayerProfile::from_persisted(UserId::local(), points, level, streak, last).unwrap()
    }

    #[test]
    fn playing_after_yesterday_extends_streak() {
        let today = day(2024, 3, 10);
        let p = profile(0, 1, 4, Some(day(2024, 3, 9)));
        let update = ProgressionRules::default().apply(&p, 50, today);
        assert_eq!(update.after.streak_days(), 5);
        assert!(update.streak_continued());
        assert_eq!(update.after.last_played_on(), Some(today));
    }

    #[test]
    fn three_day_gap_resets_streak() {
        let today = day(2024, 3, 10);
        let p = profile(0, 1, 4, Some(day(2024, 3, 7)));
        let update = ProgressionRules::default().apply(&p, 50, today);
        assert_eq!(update.after.streak_days(), 1);
    }

    #[test]
    fn two_day_gap_resets_with_default_window_only() {
        let today = day(2024, 3, 10);
        let p = profile(0, 1, 4, Some(day(2024, 3, 8)));
        let strict = ProgressionRules::default().apply(&p, 50, today);
        assert_eq!(strict.after.streak_days(), 1);

        let lenient = ProgressionRules::default()
            .with_streak_continuity_days(2)
            .apply(&p, 50, today);
        assert_eq!(lenient.after.streak_days(), 5);
    }

    #[test]
    fn streak_crosses_month_boundary() {
        let p = profile(0, 1, 2, Some(day(2024, 2, 29)));
        let update = ProgressionRules::default().apply(&p, 0, day(2024, 3, 1));
        assert_eq!(update.after.streak_days(), 3);
    }

    #[test]
    fn first_play_starts_streak_at_one() {
        let p = PlayerProfile::new(UserId::local());
        let update = ProgressionRules::default().apply(&p, 0, day(2024, 3, 10));
        assert_eq!(update.after.streak_days(), 1);
        assert_eq!(update.after.points(), 0);
        assert_eq!(update.after.level(), 1);
    }

    #[test]
    fn already_played_today_changes_nothing() {
        let today = day(2024, 3, 10);
        let p = profile(340, 3, 2, Some(today));
        let update = ProgressionRules::default().apply(&p, 100, today);
        assert_eq!(update.outcome, ProgressOutcome::AlreadyPlayedToday);
        assert_eq!(update.after, p);
        assert_eq!(update.points_awarded, 0);
    }

    #[test]
    fn seventy_percent_from_zero_reaches_level_two() {
        // 70 * 10 = 700 points; 700 > 1 * 100, so one level is gained.
        let p = PlayerProfile::new(UserId::local());
        let update = ProgressionRules::default().apply(&p, 70, day(2024, 3, 10));
        assert_eq!(update.points_awarded, 700);
        assert_eq!(update.after.points(), 700);
        assert_eq!(update.after.level(), 2);
        assert!(update.leveled_up());
    }

    #[test]
    fn level_threshold_is_strictly_greater() {
        // 200 + 100 = 300 is not > 3 * 100.
        let p = profile(200, 3, 0, None);
        let update = ProgressionRules::default().apply(&p, 10, day(2024, 3, 10));
        assert_eq!(update.after.points(), 300);
        assert_eq!(update.after.level(), 3);
        assert!(!update.leveled_up());
    }

    #[test]
    fn points_never_decrease() {
        let rules = ProgressionRules::default();
        let mut p = PlayerProfile::new(UserId::local());
        let mut today = day(2024, 1, 1);
        for accuracy in [0_u8, 100, 30, 0, 55] {
            let update = rules.apply(&p, accuracy, today);
            assert!(update.after.points() >= p.points());
            assert!(update.after.level() >= p.level());
            p = update.after;
            today = today.succ_opt().unwrap();
        }
        assert_eq!(p.points(), 1850);
        assert_eq!(p.streak_days(), 5);
    }

    #[test]
    fn future_last_played_restarts_streak() {
        let p = profile(0, 1, 9, Some(day(2024, 3, 12)));
        assert_eq!(ProgressionRules::default().next_streak(&p, day(2024, 3, 10)), 1);
    }
}
