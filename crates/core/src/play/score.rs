use serde::{Deserialize, Serialize};

use crate::models::Deck;

/// Running tally for one play-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scorecard {
    award: u32,
    score: u32,
    answered: usize,
    correct: usize,
}

impl Scorecard {
    /// Empty tally awarding `award` points per correct answer.
    pub fn new(award: u32) -> Self {
        Self {
            award,
            score: 0,
            answered: 0,
            correct: 0,
        }
    }

    /// Count one answer and return the points it earned.
    pub fn record(&mut self, correct: bool) -> u32 {
        self.answered += 1;
        if !correct {
            return 0;
        }
        self.correct += 1;
        self.score = self.score.saturating_add(self.award);
        self.award
    }

    /// Cumulative points.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Answers recorded so far.
    pub fn answered(&self) -> usize {
        self.answered
    }

    /// Correct answers recorded so far.
    pub fn correct(&self) -> usize {
        self.correct
    }

    /// Upper bound on the score for `total_questions` questions.
    pub fn max_score(&self, total_questions: usize) -> u32 {
        let total = u32::try_from(total_questions).unwrap_or(u32::MAX);
        self.award.saturating_mul(total)
    }
}

/// Outcome of a finished round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    /// Deck that was played.
    pub deck: Deck,
    /// Final points.
    pub score: u32,
    /// Questions answered.
    pub answered: usize,
    /// Questions answered correctly.
    pub correct: usize,
    /// Questions across every card in the deck.
    pub total_questions: usize,
    /// Points available for a perfect round.
    pub max_score: u32,
}

impl RoundSummary {
    pub(crate) fn new(deck: Deck, card: &Scorecard, total_questions: usize) -> Self {
        Self {
            deck,
            score: card.score(),
            answered: card.answered(),
            correct: card.correct(),
            total_questions,
            max_score: card.max_score(total_questions),
        }
    }

    /// Share of correct answers, `0.0` when nothing was asked.
    pub fn accuracy(&self) -> f64 {
        if self.answered == 0 {
            0.0
        } else {
            self.correct as f64 / self.answered as f64
        }
    }
}
