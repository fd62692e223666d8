use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::QuestionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GameResultError {
    #[error("a game result needs at least one question")]
    NoQuestions,

    #[error("score ({score}) exceeds total questions ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("accuracy {accuracy} does not match score {score}/{total}")]
    AccuracyMismatch { accuracy: u8, score: u32, total: u32 },

    #[error("too many answers for a single game: {len}")]
    TooManyAnswers { len: usize },
}

/// One entry of a session's answer log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    /// `None` when the countdown ran out before an answer was given.
    pub choice: Option<String>,
    pub was_correct: bool,
    pub elapsed_secs: u32,
}

impl AnswerRecord {
    #[must_use]
    pub fn answered(question_id: QuestionId, choice: String, was_correct: bool, elapsed_secs: u32) -> Self {
        Self {
            question_id,
            choice: Some(choice),
            was_correct,
            elapsed_secs,
        }
    }

    #[must_use]
    pub fn timed_out(question_id: QuestionId, limit_secs: u32) -> Self {
        Self {
            question_id,
            choice: None,
            was_correct: false,
            elapsed_secs: limit_secs,
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.choice.is_none()
    }
}

/// `round(100 * score / total)`, rounding halves up. Zero when `total` is zero.
#[must_use]
pub fn accuracy_percent(score: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let score = u64::from(score.min(total));
    let total = u64::from(total);
    let rounded = (200 * score + total) / (2 * total);
    u8::try_from(rounded).unwrap_or(100)
}

/// Outcome of one completed session. Append-only once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    completed_at: DateTime<Utc>,
    score: u32,
    total_questions: u32,
    time_taken_secs: u32,
    accuracy: u8,
}

impl GameResult {
    /// Rehydrate a result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `GameResultError` if the stored numbers are inconsistent.
    pub fn from_persisted(
        completed_at: DateTime<Utc>,
        score: u32,
        total_questions: u32,
        time_taken_secs: u32,
        accuracy: u8,
    ) -> Result<Self, GameResultError> {
        if total_questions == 0 {
            return Err(GameResultError::NoQuestions);
        }
        if score > total_questions {
            return Err(GameResultError::ScoreExceedsTotal {
                score,
                total: total_questions,
            });
        }
        if accuracy != accuracy_percent(score, total_questions) {
            return Err(GameResultError::AccuracyMismatch {
                accuracy,
                score,
                total: total_questions,
            });
        }

        Ok(Self {
            completed_at,
            score,
            total_questions,
            time_taken_secs,
            accuracy,
        })
    }

    /// Build a result from a session's answer log.
    ///
    /// `time_taken_secs` is the sum of per-answer elapsed seconds, so time spent
    /// in the feedback window between questions is not counted.
    ///
    /// # Errors
    ///
    /// Returns `GameResultError::NoQuestions` for an empty log and
    /// `GameResultError::TooManyAnswers` if the count cannot fit in `u32`.
    pub fn from_answers(
        completed_at: DateTime<Utc>,
        answers: &[AnswerRecord],
    ) -> Result<Self, GameResultError> {
        let total_questions = u32::try_from(answers.len())
            .map_err(|_| GameResultError::TooManyAnswers { len: answers.len() })?;
        let mut score = 0_u32;
        let mut time_taken_secs = 0_u32;
        for answer in answers {
            if answer.was_correct {
                score = score.saturating_add(1);
            }
            time_taken_secs = time_taken_secs.saturating_add(answer.elapsed_secs);
        }

        Self::from_persisted(
            completed_at,
            score,
            total_questions,
            time_taken_secs,
            accuracy_percent(score, total_questions),
        )
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn time_taken_secs(&self) -> u32 {
        self.time_taken_secs
    }

    #[must_use]
    pub fn accuracy(&self) -> u8 {
        self.accuracy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn log(correct: &[bool], elapsed: u32) -> Vec<AnswerRecord> {
        correct
            .iter()
            .enumerate()
            .map(|(i, ok)| {
                AnswerRecord::answered(QuestionId::new(i as u64 + 1), "x".into(), *ok, elapsed)
            })
            .collect()
    }

    #[test]
    fn seven_of_ten_is_seventy_percent() {
        let answers = log(
            &[true, true, true, true, true, true, true, false, false, false],
            4,
        );
        let result = GameResult::from_answers(fixed_now(), &answers).unwrap();
        assert_eq!(result.score(), 7);
        assert_eq!(result.total_questions(), 10);
        assert_eq!(result.accuracy(), 70);
        assert_eq!(result.time_taken_secs(), 40);
    }

    #[test]
    fn accuracy_rounds_half_up() {
        assert_eq!(accuracy_percent(1, 3), 33);
        assert_eq!(accuracy_percent(2, 3), 67);
        assert_eq!(accuracy_percent(1, 8), 13);
        assert_eq!(accuracy_percent(0, 10), 0);
        assert_eq!(accuracy_percent(10, 10), 100);
        assert_eq!(accuracy_percent(0, 0), 0);
    }

    #[test]
    fn accuracy_stays_in_range_for_all_small_sessions() {
        for total in 1..=30 {
            for score in 0..=total {
                let a = accuracy_percent(score, total);
                assert!(a <= 100);
                let expected = (100.0 * f64::from(score) / f64::from(total)).round();
                assert_eq!(f64::from(a), expected, "{score}/{total}");
            }
        }
    }

    #[test]
    fn timeouts_count_as_wrong_with_full_limit() {
        let answers = vec![
            AnswerRecord::timed_out(QuestionId::new(1), 30),
            AnswerRecord::answered(QuestionId::new(2), "9".into(), true, 18),
        ];
        let result = GameResult::from_answers(fixed_now(), &answers).unwrap();
        assert_eq!(result.score(), 1);
        assert_eq!(result.accuracy(), 50);
        assert_eq!(result.time_taken_secs(), 48);
        assert!(answers[0].is_timeout());
    }

    #[test]
    fn persisted_inconsistencies_are_rejected() {
        let now = fixed_now();
        assert_eq!(
            GameResult::from_persisted(now, 0, 0, 0, 0).unwrap_err(),
            GameResultError::NoQuestions
        );
        assert!(matches!(
            GameResult::from_persisted(now, 11, 10, 0, 100).unwrap_err(),
            GameResultError::ScoreExceedsTotal { .. }
        ));
        assert!(matches!(
            GameResult::from_persisted(now, 7, 10, 0, 71).unwrap_err(),
            GameResultError::AccuracyMismatch { .. }
        ));
    }

    #[test]
    fn empty_log_cannot_build_a_result() {
        let err = GameResult::from_answers(fixed_now(), &[]).unwrap_err();
        assert_eq!(err, GameResultError::NoQuestions);
    }
}
