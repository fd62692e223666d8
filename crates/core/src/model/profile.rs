use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("level must be >= 1, got {0}")]
    InvalidLevel(u32),
}

/// Per-user aggregate of points, level and streak state.
///
/// This is the single canonical field set; storage adapters translate their
/// own column names into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    user_id: UserId,
    points: u32,
    level: u32,
    streak_days: u32,
    last_played_on: Option<NaiveDate>,
}

impl PlayerProfile {
    /// A brand-new player: no points, level 1, no streak.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            points: 0,
            level: 1,
            streak_days: 0,
            last_played_on: None,
        }
    }

    /// Rehydrate a profile from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::InvalidLevel` if `level` is zero.
    pub fn from_persisted(
        user_id: UserId,
        points: u32,
        level: u32,
        streak_days: u32,
        last_played_on: Option<NaiveDate>,
    ) -> Result<Self, ProfileError> {
        if level == 0 {
            return Err(ProfileError::InvalidLevel(level));
        }
        Ok(Self {
            user_id,
            points,
            level,
            streak_days,
            last_played_on,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn streak_days(&self) -> u32 {
        self.streak_days
    }

    #[must_use]
    pub fn last_played_on(&self) -> Option<NaiveDate> {
        self.last_played_on
    }

    pub(crate) fn record_play(
        &mut self,
        points: u32,
        level: u32,
        streak_days: u32,
        played_on: NaiveDate,
    ) {
        self.points = points;
        self.level = level.max(self.level);
        self.streak_days = streak_days;
        self.last_played_on = Some(played_on);
    }
}
