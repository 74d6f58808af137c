use crate::models::{Deck, FlashcardSet, Question};

use super::Phase;

/// How an answer option should be highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionFeedback {
    /// Nothing answered yet, or an uninvolved wrong option.
    Neutral,
    /// The correct option, revealed once an answer is recorded.
    Correct,
    /// The player's pick when it was wrong.
    Wrong,
}

/// Read-only snapshot of the engine for rendering.
#[derive(Debug, Clone, Copy)]
pub struct PlayView<'a> {
    /// Current phase.
    pub phase: Phase,
    /// Deck being loaded or played.
    pub deck: Option<Deck>,
    /// Zero-based position of the current card.
    pub card_index: usize,
    /// Cards in the round.
    pub total_cards: usize,
    /// Zero-based position of the question within the card.
    pub question_index: usize,
    /// Questions on the current card.
    pub total_questions_in_card: usize,
    /// Countdown, only while the image is shown.
    pub seconds_left: Option<u32>,
    /// Option picked for the current question.
    pub selected_option: Option<usize>,
    /// Cumulative points.
    pub score: u32,
    /// Current card.
    pub card: Option<&'a FlashcardSet>,
    /// Current question while asking.
    pub question: Option<&'a Question>,
}

impl<'a> PlayView<'a> {
    pub(crate) fn idle(phase: Phase, deck: Option<Deck>) -> Self {
        Self {
            phase,
            deck,
            card_index: 0,
            total_cards: 0,
            question_index: 0,
            total_questions_in_card: 0,
            seconds_left: None,
            selected_option: None,
            score: 0,
            card: None,
            question: None,
        }
    }

    /// Whether `option` is the right answer to the current question.
    pub fn is_correct_option(&self, option: usize) -> bool {
        self.question
            .map(|question| question.is_correct(option))
            .unwrap_or(false)
    }

    /// Highlight for `option`; neutral until an answer is recorded.
    pub fn feedback(&self, option: usize) -> OptionFeedback {
        match self.selected_option {
            None => OptionFeedback::Neutral,
            Some(_) if self.is_correct_option(option) => OptionFeedback::Correct,
            Some(selected) if selected == option => OptionFeedback::Wrong,
            Some(_) => OptionFeedback::Neutral,
        }
    }

    /// Whether the player may still answer.
    pub fn accepts_answer(&self) -> bool {
        self.phase == Phase::Asking && self.question.is_some() && self.selected_option.is_none()
    }
}
