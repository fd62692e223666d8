//! Player-facing verdicts derived from results and streaks.

/// Coarse grouping of an accuracy percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuracyBand {
    High,
    Medium,
    Low,
}

impl AccuracyBand {
    #[must_use]
    pub fn from_accuracy(accuracy: u8) -> Self {
        match accuracy {
            80.. => AccuracyBand::High,
            50..=79 => AccuracyBand::Medium,
            _ => AccuracyBand::Low,
        }
    }
}

/// Short encouragement for a finished round.
#[must_use]
pub fn accuracy_feedback(accuracy: u8) -> &'static str {
    match accuracy {
        90.. => "Outstanding!",
        80..=89 => "Excellent!",
        70..=79 => "Great job!",
        60..=69 => "Good work!",
        50..=59 => "Not bad!",
        40..=49 => "Keep practicing!",
        30..=39 => "You can do better!",
        _ => "Try again!",
    }
}

const STREAK_MESSAGES: [&str; 7] = [
    "Start your streak today!",
    "Great start! Keep going!",
    "You're building momentum!",
    "Impressive consistency!",
    "You're on fire!",
    "Unstoppable streak!",
    "Legendary dedication!",
];

/// One message per two streak days, capped at the last rung.
#[must_use]
pub fn streak_message(streak_days: u32) -> &'static str {
    let rung = usize::try_from(streak_days / 2).unwrap_or(usize::MAX);
    STREAK_MESSAGES[rung.min(STREAK_MESSAGES.len() - 1)]
}
