//! Authoring form for new flashcard sets.

use anyhow::{anyhow, bail, Context, Result};
use flashpeek_core::models::{Deck, NewFlashcardSet, Question};

const MAX_FIELD_LEN: usize = 256;
/// Separator between answer options in the options field.
pub const OPTION_SEPARATOR: char = '|';

/// Single-line text field with a char-based cursor.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Cursor position in chars.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(index, _)| index)
            .unwrap_or(self.value.len())
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.char_len() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    pub fn insert(&mut self, ch: char) {
        if ch.is_control() || self.char_len() >= MAX_FIELD_LEN {
            return;
        }
        let at = self.byte_index(self.cursor);
        self.value.insert(at, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.value.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }
}

/// Form fields in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ImageUrl,
    Question,
    Options,
    Correct,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::ImageUrl,
        Field::Question,
        Field::Options,
        Field::Correct,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Field::ImageUrl => "Image URL",
            Field::Question => "Question",
            Field::Options => "Options (a | b | c)",
            Field::Correct => "Correct option #",
        }
    }

    fn position(&self) -> usize {
        Field::ALL
            .iter()
            .position(|field| field == self)
            .unwrap_or(0)
    }

    fn step(&self, delta: isize) -> Field {
        let len = Field::ALL.len() as isize;
        let next = (self.position() as isize + delta).rem_euclid(len);
        Field::ALL[next as usize]
    }
}

/// Draft of one flashcard set being typed in.
#[derive(Debug, Clone)]
pub struct SetForm {
    deck: Deck,
    focus: Field,
    image_url: TextInput,
    question: TextInput,
    options: TextInput,
    correct: TextInput,
    questions: Vec<Question>,
}

impl SetForm {
    pub fn new(deck: Deck) -> Self {
        Self {
            deck,
            focus: Field::ImageUrl,
            image_url: TextInput::default(),
            question: TextInput::default(),
            options: TextInput::default(),
            correct: TextInput::default(),
            questions: Vec::new(),
        }
    }

    pub fn deck(&self) -> Deck {
        self.deck
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    /// Questions already added to the draft.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn field(&self, field: Field) -> &TextInput {
        match field {
            Field::ImageUrl => &self.image_url,
            Field::Question => &self.question,
            Field::Options => &self.options,
            Field::Correct => &self.correct,
        }
    }

    pub fn focused_mut(&mut self) -> &mut TextInput {
        match self.focus {
            Field::ImageUrl => &mut self.image_url,
            Field::Question => &mut self.question,
            Field::Options => &mut self.options,
            Field::Correct => &mut self.correct,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.step(1);
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.step(-1);
    }

    /// Move the typed question into the draft and clear its fields.
    pub fn add_question(&mut self) -> Result<usize> {
        let question = self
            .pending_question()?
            .ok_or_else(|| anyhow!("Type a question before adding it"))?;
        self.questions.push(question);
        self.question.clear();
        self.options.clear();
        self.correct.clear();
        self.focus = Field::Question;
        Ok(self.questions.len())
    }

    /// The draft to send to the catalog, including a typed but not yet added question.
    pub fn build(&self) -> Result<NewFlashcardSet> {
        let mut draft = NewFlashcardSet::new(self.deck, self.image_url.value().trim());
        draft.questions = self.questions.clone();
        if let Some(question) = self.pending_question()? {
            draft.questions.push(question);
        }
        draft.validate()?;
        Ok(draft)
    }

    fn pending_question(&self) -> Result<Option<Question>> {
        if self.question.is_blank() && self.options.is_blank() && self.correct.is_blank() {
            return Ok(None);
        }
        let index = self.questions.len();
        let question = Question {
            question: self.question.value().trim().to_string(),
            options: parse_options(self.options.value()),
            correct_answer: parse_correct(self.correct.value())
                .with_context(|| format!("question {}", index + 1))?,
        };
        question.validate(index)?;
        Ok(Some(question))
    }
}

/// Split the options field on [`OPTION_SEPARATOR`].
pub fn parse_options(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(OPTION_SEPARATOR)
        .map(|option| option.trim().to_string())
        .collect()
}

/// Parse a 1-based option number into a zero-based index.
pub fn parse_correct(raw: &str) -> Result<usize> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("choose the correct option number");
    }
    let number: usize = trimmed
        .parse()
        .map_err(|_| anyhow!("'{trimmed}' is not an option number"))?;
    if number == 0 {
        bail!("option numbers start at 1");
    }
    Ok(number - 1)
}
