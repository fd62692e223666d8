use rand::Rng;
use rand::rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use genie_core::model::Question;

/// Questions drawn for one game.
#[derive(Debug, Clone, PartialEq)]
pub struct GamePlan {
    pub questions: Vec<Question>,
    pub requested: usize,
    /// Distinct questions the pool offered.
    pub available: usize,
}

impl GamePlan {
    /// Sample up to `count` distinct questions from `pool` using the thread rng.
    #[must_use]
    pub fn sample(pool: Vec<Question>, count: usize) -> Self {
        Self::sample_with(pool, count, &mut rng())
    }

    /// Sample without replacement. Questions repeated in the pool (same id)
    /// count once; a pool smaller than `count` yields every question.
    #[must_use]
    pub fn sample_with<R: Rng + ?Sized>(pool: Vec<Question>, count: usize, rng: &mut R) -> Self {
        let mut seen = HashSet::with_capacity(pool.len());
        let mut questions: Vec<Question> =
            pool.into_iter().filter(|q| seen.insert(q.id())).collect();
        let available = questions.len();

        questions.shuffle(rng);
        questions.truncate(count);

        Self {
            questions,
            requested: count,
            available,
        }
    }

    #[must_use]
    pub fn is_short(&self) -> bool {
        self.questions.len() < self.requested
    }
}
