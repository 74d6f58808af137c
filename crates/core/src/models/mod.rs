//! Shared domain models.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Named grouping of flashcard sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deck {
    /// Picture decks aimed at young players.
    Children,
    /// Everything else.
    Miscellaneous,
}

impl Deck {
    /// Every deck known to the catalog, in menu order.
    pub const ALL: [Deck; 2] = [Deck::Children, Deck::Miscellaneous];

    /// Identifier used on the wire and in query strings.
    pub fn id(&self) -> &'static str {
        match self {
            Deck::Children => "children",
            Deck::Miscellaneous => "miscellaneous",
        }
    }

    /// Returns a user-facing label.
    pub fn display_name(&self) -> &'static str {
        match self {
            Deck::Children => "Children Deck",
            Deck::Miscellaneous => "Miscellaneous Deck",
        }
    }
}

impl fmt::Display for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Raised when a deck identifier is not one of [`Deck::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown deck '{0}'")]
pub struct UnknownDeck(pub String);

impl FromStr for Deck {
    type Err = UnknownDeck;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        Deck::ALL
            .into_iter()
            .find(|deck| deck.id().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownDeck(value.to_string()))
    }
}

/// One multiple-choice prompt about a flashcard image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Prompt shown to the player.
    pub question: String,
    /// Answer options in display order.
    pub options: Vec<String>,
    /// Zero-based index into `options`.
    pub correct_answer: usize,
}

impl Question {
    /// Returns whether `option` is the correct answer.
    pub fn is_correct(&self, option: usize) -> bool {
        self.correct_answer == option
    }

    /// Check the question invariants. `index` is only used for error reporting.
    pub fn validate(&self, index: usize) -> Result<(), ValidationError> {
        if self.question.trim().is_empty() {
            return Err(ValidationError::EmptyQuestion { question: index });
        }
        if self.options.len() < 2 {
            return Err(ValidationError::TooFewOptions {
                question: index,
                found: self.options.len(),
            });
        }
        if let Some(option) = self.options.iter().position(|opt| opt.trim().is_empty()) {
            return Err(ValidationError::EmptyOption {
                question: index,
                option,
            });
        }
        if self.correct_answer >= self.options.len() {
            return Err(ValidationError::CorrectAnswerOutOfRange {
                question: index,
                correct: self.correct_answer,
                options: self.options.len(),
            });
        }
        Ok(())
    }
}

/// An image plus the ordered questions asked about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardSet {
    /// Identifier assigned by the catalog.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Deck the set belongs to.
    pub deck: Deck,
    /// Location of the image to memorise.
    pub image_url: String,
    /// Questions in play order.
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Creation time as recorded by the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification time as recorded by the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl FlashcardSet {
    /// Number of questions attached to the image.
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Borrow a question by position.
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }
}

/// Draft of a flashcard set before the catalog assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFlashcardSet {
    /// Target deck.
    pub deck: Deck,
    /// Location of the image to memorise.
    pub image_url: String,
    /// Questions in play order.
    pub questions: Vec<Question>,
}

impl NewFlashcardSet {
    /// Start an empty draft for `deck`.
    pub fn new(deck: Deck, image_url: impl Into<String>) -> Self {
        Self {
            deck,
            image_url: image_url.into(),
            questions: Vec::new(),
        }
    }

    /// Append a question, returning the draft for chaining.
    pub fn with_question(
        mut self,
        question: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        correct_answer: usize,
    ) -> Self {
        self.questions.push(Question {
            question: question.into(),
            options: options.into_iter().map(Into::into).collect(),
            correct_answer,
        });
        self
    }

    /// Check every invariant a stored set must satisfy.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.image_url.trim().is_empty() {
            return Err(ValidationError::MissingImage);
        }
        if self.questions.is_empty() {
            return Err(ValidationError::NoQuestions);
        }
        self.questions
            .iter()
            .enumerate()
            .try_for_each(|(index, question)| question.validate(index))
    }

    /// Turn the draft into a stored set.
    pub fn into_set(self, id: Option<String>, now: DateTime<Utc>) -> FlashcardSet {
        FlashcardSet {
            id,
            deck: self.deck,
            image_url: self.image_url.trim().to_string(),
            questions: self.questions,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// Reasons a flashcard draft is rejected. Question and option positions are zero-based.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("image URL is required")]
    MissingImage,
    #[error("a flashcard needs at least one question")]
    NoQuestions,
    #[error("question {} has no text", .question + 1)]
    EmptyQuestion { question: usize },
    #[error("question {} needs at least two options, found {found}", .question + 1)]
    TooFewOptions { question: usize, found: usize },
    #[error("option {} of question {} is empty", .option + 1, .question + 1)]
    EmptyOption { question: usize, option: usize },
    #[error(
        "question {} marks option {} as correct but only has {options}",
        .question + 1,
        .correct + 1
    )]
    CorrectAnswerOutOfRange {
        question: usize,
        correct: usize,
        options: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_deck_names() {
        assert_eq!("children".parse::<Deck>(), Ok(Deck::Children));
        assert_eq!(" Miscellaneous ".parse::<Deck>(), Ok(Deck::Miscellaneous));
        assert_eq!(
            "animals".parse::<Deck>(),
            Err(UnknownDeck("animals".to_string()))
        );
    }

    #[test]
    fn decodes_service_payload() -> serde_json::Result<()> {
        let payload = r#"{
            "_id": "65f1c0ffee",
            "deck": "children",
            "imageUrl": "https://example.com/cat.png",
            "questions": [
                { "question": "What colour was the cat?", "options": ["Black", "Orange", "White"], "correctAnswer": 1, "_id": "q1" }
            ],
            "createdAt": "2024-03-13T09:30:00.000Z",
            "updatedAt": "2024-03-13T09:30:00.000Z",
            "__v": 0
        }"#;
        let set: FlashcardSet = serde_json::from_str(payload)?;
        assert_eq!(set.id.as_deref(), Some("65f1c0ffee"));
        assert_eq!(set.deck, Deck::Children);
        assert_eq!(set.question_count(), 1);
        assert!(set.questions[0].is_correct(1));
        assert!(set.created_at.is_some());
        Ok(())
    }

    #[test]
    fn draft_serialises_with_service_field_names() -> serde_json::Result<()> {
        let draft = NewFlashcardSet::new(Deck::Miscellaneous, "img.png")
            .with_question("Q", ["a", "b"], 0);
        let value = serde_json::to_value(&draft)?;
        assert_eq!(value["deck"], "miscellaneous");
        assert_eq!(value["imageUrl"], "img.png");
        assert_eq!(value["questions"][0]["correctAnswer"], 0);
        Ok(())
    }

    #[test]
    fn validation_reports_first_problem() {
        let draft = NewFlashcardSet::new(Deck::Children, "  ");
        assert_eq!(draft.validate(), Err(ValidationError::MissingImage));

        let draft = NewFlashcardSet::new(Deck::Children, "img.png");
        assert_eq!(draft.validate(), Err(ValidationError::NoQuestions));

        let draft = NewFlashcardSet::new(Deck::Children, "img.png")
            .with_question("Fine", ["a", "b"], 1)
            .with_question("Only one", ["a"], 0);
        assert_eq!(
            draft.validate(),
            Err(ValidationError::TooFewOptions {
                question: 1,
                found: 1
            })
        );

        let draft = NewFlashcardSet::new(Deck::Children, "img.png")
            .with_question("Out of range", ["a", "b", "c"], 3);
        let err = draft.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "question 1 marks option 4 as correct but only has 3"
        );

        let draft = NewFlashcardSet::new(Deck::Children, "img.png")
            .with_question("Blank option", ["a", " "], 0);
        assert_eq!(
            draft.validate(),
            Err(ValidationError::EmptyOption {
                question: 0,
                option: 1
            })
        );
    }
}
