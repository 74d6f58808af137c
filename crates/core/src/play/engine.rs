use std::{fmt, mem};

use tracing::{debug, info, warn};

use super::{
    scheduler::{Scheduler, Timer, TimerHandle, TimerKind},
    score::{RoundSummary, Scorecard},
    view::PlayView,
    PlayConfig,
};
use crate::{
    catalog::CatalogError,
    models::{Deck, FlashcardSet, Question},
};

/// State-machine phase visible to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Waiting for the player to pick a deck.
    SelectingDeck,
    /// Deck chosen, sets being fetched.
    Loading,
    /// Image on screen while the countdown runs.
    ShowingImage,
    /// Questions about the last image.
    Asking,
    /// The current card has no questions; waiting for the player to continue.
    NoContent,
    /// Round complete.
    Finished,
}

impl Phase {
    /// Short label for status lines.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::SelectingDeck => "Choose a deck",
            Phase::Loading => "Loading",
            Phase::ShowingImage => "Memorise",
            Phase::Asking => "Question",
            Phase::NoContent => "No content",
            Phase::Finished => "Round complete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Transient message for the player. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The deck could not be fetched, or its name is unknown.
    FetchFailure {
        /// Deck name as requested.
        deck: String,
        /// Reason reported by the catalog.
        message: String,
    },
    /// The deck exists but holds no flashcard sets.
    EmptyDeck(Deck),
    /// The card at this zero-based position has no questions.
    NoQuestionsInCard {
        /// Zero-based card position.
        card: usize,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::FetchFailure { deck, message } => {
                write!(f, "Failed to load deck {deck}: {message}")
            }
            Notice::EmptyDeck(deck) => {
                write!(f, "No flashcards available in the {} deck.", deck)
            }
            Notice::NoQuestionsInCard { card } => {
                write!(f, "Card {} has no questions.", card + 1)
            }
        }
    }
}

/// Fetch the host must perform for a chosen deck, then report back through
/// [`PlayEngine::complete_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadRequest {
    id: u64,
    deck: Deck,
}

impl LoadRequest {
    /// Deck to fetch.
    pub fn deck(&self) -> Deck {
        self.deck
    }
}

/// Result of an accepted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    /// Option the player picked.
    pub option: usize,
    /// Index of the right option.
    pub correct_option: usize,
    /// Points earned by this answer.
    pub awarded: u32,
    /// Score after this answer.
    pub score: u32,
}

impl AnswerOutcome {
    /// Whether the pick was right.
    pub fn is_correct(&self) -> bool {
        self.option == self.correct_option
    }
}

#[derive(Debug)]
struct Round {
    deck: Deck,
    cards: Vec<FlashcardSet>,
    card_index: usize,
    question_index: usize,
    scorecard: Scorecard,
}

impl Round {
    fn new(deck: Deck, cards: Vec<FlashcardSet>, award: u32) -> Self {
        Self {
            deck,
            cards,
            card_index: 0,
            question_index: 0,
            scorecard: Scorecard::new(award),
        }
    }

    fn card(&self) -> Option<&FlashcardSet> {
        self.cards.get(self.card_index)
    }

    fn question(&self) -> Option<&Question> {
        self.card()
            .and_then(|card| card.question(self.question_index))
    }

    fn total_questions(&self) -> usize {
        self.cards.iter().map(FlashcardSet::question_count).sum()
    }

    fn view(
        &self,
        phase: Phase,
        seconds_left: Option<u32>,
        selected_option: Option<usize>,
    ) -> PlayView<'_> {
        let card = self.card();
        PlayView {
            phase,
            deck: Some(self.deck),
            card_index: self.card_index,
            total_cards: self.cards.len(),
            question_index: self.question_index,
            total_questions_in_card: card.map(FlashcardSet::question_count).unwrap_or(0),
            seconds_left,
            selected_option,
            score: self.scorecard.score(),
            card,
            question: if phase == Phase::Asking {
                self.question()
            } else {
                None
            },
        }
    }
}

enum State {
    SelectingDeck,
    Loading(LoadRequest),
    ShowingImage { round: Round, seconds_left: u32 },
    Asking { round: Round, selected: Option<usize> },
    NoContent { round: Round },
    Finished { round: Round },
}

/// Drives one quiz run at a time.
///
/// The engine is passive: the host feeds it player input and the timers its
/// [`Scheduler`] delivers, and renders [`PlayEngine::view`] after each event.
/// Timers are tracked by id; a timer that was cancelled or belongs to a
/// replaced session is ignored if it still arrives.
pub struct PlayEngine<S: Scheduler> {
    config: PlayConfig,
    scheduler: S,
    state: State,
    armed: Vec<(Timer, TimerHandle)>,
    sequence: u64,
    notice: Option<Notice>,
}

impl<S: Scheduler> PlayEngine<S> {
    /// Engine waiting for a deck choice.
    pub fn new(config: PlayConfig, scheduler: S) -> Self {
        Self {
            config,
            scheduler,
            state: State::SelectingDeck,
            armed: Vec::new(),
            sequence: 0,
            notice: None,
        }
    }

    /// Active timing and scoring settings.
    pub fn config(&self) -> &PlayConfig {
        &self.config
    }

    /// Borrow the scheduler backend.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Mutably borrow the scheduler backend.
    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        match self.state {
            State::SelectingDeck => Phase::SelectingDeck,
            State::Loading(_) => Phase::Loading,
            State::ShowingImage { .. } => Phase::ShowingImage,
            State::Asking { .. } => Phase::Asking,
            State::NoContent { .. } => Phase::NoContent,
            State::Finished { .. } => Phase::Finished,
        }
    }

    /// Pending notice, if any.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Remove and return the pending notice.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> PlayView<'_> {
        match &self.state {
            State::SelectingDeck => PlayView::idle(Phase::SelectingDeck, None),
            State::Loading(request) => PlayView::idle(Phase::Loading, Some(request.deck)),
            State::ShowingImage {
                round,
                seconds_left,
            } => round.view(Phase::ShowingImage, Some(*seconds_left), None),
            State::Asking { round, selected } => round.view(Phase::Asking, None, *selected),
            State::NoContent { round } => round.view(Phase::NoContent, None, None),
            State::Finished { round } => round.view(Phase::Finished, None, None),
        }
    }

    /// Final tally once the round is over.
    pub fn summary(&self) -> Option<RoundSummary> {
        match &self.state {
            State::Finished { round } => Some(RoundSummary::new(
                round.deck,
                &round.scorecard,
                round.total_questions(),
            )),
            _ => None,
        }
    }

    /// Start a new session for `deck`. Any running session is discarded.
    pub fn choose_deck(&mut self, deck: Deck) -> LoadRequest {
        self.reset();
        let request = LoadRequest {
            id: self.next_sequence(),
            deck,
        };
        self.state = State::Loading(request);
        info!(deck = %deck, request = request.id, "Loading deck");
        request
    }

    /// Like [`Self::choose_deck`] for a deck given by name. Unknown names
    /// raise a fetch failure and leave the engine selecting.
    pub fn choose_deck_named(&mut self, name: &str) -> Option<LoadRequest> {
        match name.parse::<Deck>() {
            Ok(deck) => Some(self.choose_deck(deck)),
            Err(err) => {
                self.reset();
                warn!("Rejected deck choice: {err}");
                self.notice = Some(Notice::FetchFailure {
                    deck: name.trim().to_string(),
                    message: err.to_string(),
                });
                None
            }
        }
    }

    /// Report the outcome of a fetch started by [`Self::choose_deck`].
    /// Results for a request that is no longer current are dropped.
    pub fn complete_load(
        &mut self,
        request: LoadRequest,
        result: Result<Vec<FlashcardSet>, CatalogError>,
    ) {
        if !matches!(&self.state, State::Loading(current) if *current == request) {
            debug!(request = request.id, "Ignoring stale deck load");
            return;
        }

        match result {
            Err(err) => {
                warn!(deck = %request.deck, "Deck load failed: {err}");
                self.state = State::SelectingDeck;
                self.notice = Some(Notice::FetchFailure {
                    deck: request.deck.to_string(),
                    message: err.to_string(),
                });
            }
            Ok(cards) if cards.is_empty() => {
                info!(deck = %request.deck, "Deck has no flashcards");
                self.state = State::SelectingDeck;
                self.notice = Some(Notice::EmptyDeck(request.deck));
            }
            Ok(cards) => {
                info!(deck = %request.deck, cards = cards.len(), "Round started");
                let round = Round::new(request.deck, cards, self.config.correct_award);
                self.show_card(round);
            }
        }
    }

    /// Deliver a timer from the scheduler.
    pub fn fire(&mut self, timer: Timer) {
        let Some(position) = self.armed.iter().position(|(armed, _)| *armed == timer) else {
            debug!(timer = timer.id(), "Ignoring stale timer");
            return;
        };
        self.armed.swap_remove(position);
        match timer.kind() {
            TimerKind::Countdown => self.tick(),
            TimerKind::Advance => self.advance(),
        }
    }

    /// Answer the current question. Ignored when there is no question, the
    /// question was already answered, or `option` is out of range.
    pub fn submit_answer(&mut self, option: usize) -> Option<AnswerOutcome> {
        let State::Asking { round, selected } = &mut self.state else {
            return None;
        };
        if let Some(previous) = selected {
            debug!(previous = *previous, option, "Ignoring duplicate answer");
            return None;
        }
        let (correct_option, options) = round
            .question()
            .map(|question| (question.correct_answer, question.options.len()))?;
        if option >= options {
            debug!(option, options, "Ignoring out-of-range answer");
            return None;
        }

        *selected = Some(option);
        let awarded = round.scorecard.record(option == correct_option);
        let outcome = AnswerOutcome {
            option,
            correct_option,
            awarded,
            score: round.scorecard.score(),
        };
        info!(
            card = round.card_index,
            question = round.question_index,
            correct = outcome.is_correct(),
            score = outcome.score,
            "Answer recorded"
        );
        self.arm(self.config.advance_delay(), TimerKind::Advance);
        Some(outcome)
    }

    /// Leave a card without questions. Returns `false` outside [`Phase::NoContent`].
    pub fn skip_card(&mut self) -> bool {
        match mem::replace(&mut self.state, State::SelectingDeck) {
            State::NoContent { round } => {
                self.next_card(round);
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// Abandon the session and return to deck selection.
    pub fn restart(&mut self) {
        self.reset();
        info!("Session restarted");
    }

    fn reset(&mut self) {
        self.cancel_all();
        self.state = State::SelectingDeck;
        self.notice = None;
    }

    fn tick(&mut self) {
        match mem::replace(&mut self.state, State::SelectingDeck) {
            State::ShowingImage {
                round,
                seconds_left,
            } => {
                let remaining = seconds_left.saturating_sub(1);
                if remaining == 0 {
                    self.enter_questions(round);
                } else {
                    self.state = State::ShowingImage {
                        round,
                        seconds_left: remaining,
                    };
                    self.arm(self.config.tick_interval(), TimerKind::Countdown);
                }
            }
            other => self.state = other,
        }
    }

    fn advance(&mut self) {
        match mem::replace(&mut self.state, State::SelectingDeck) {
            State::Asking {
                mut round,
                selected: Some(_),
            } => {
                let questions = round.card().map(FlashcardSet::question_count).unwrap_or(0);
                if round.question_index + 1 < questions {
                    round.question_index += 1;
                    self.state = State::Asking {
                        round,
                        selected: None,
                    };
                } else {
                    self.next_card(round);
                }
            }
            other => self.state = other,
        }
    }

    fn show_card(&mut self, round: Round) {
        if self.config.image_seconds == 0 {
            self.enter_questions(round);
            return;
        }
        self.state = State::ShowingImage {
            round,
            seconds_left: self.config.image_seconds,
        };
        self.arm(self.config.tick_interval(), TimerKind::Countdown);
    }

    fn enter_questions(&mut self, round: Round) {
        if round.question().is_some() {
            self.state = State::Asking {
                round,
                selected: None,
            };
            return;
        }
        warn!(card = round.card_index, "Card has no questions");
        self.notice = Some(Notice::NoQuestionsInCard {
            card: round.card_index,
        });
        self.state = State::NoContent { round };
    }

    fn next_card(&mut self, mut round: Round) {
        if round.card_index + 1 < round.cards.len() {
            round.card_index += 1;
            round.question_index = 0;
            self.show_card(round);
        } else {
            info!(
                deck = %round.deck,
                score = round.scorecard.score(),
                correct = round.scorecard.correct(),
                "Round finished"
            );
            self.state = State::Finished { round };
        }
    }

    fn arm(&mut self, delay: std::time::Duration, kind: TimerKind) {
        let timer = Timer::new(self.next_sequence(), kind);
        let handle = self.scheduler.schedule(delay, timer);
        self.armed.push((timer, handle));
    }

    fn cancel_all(&mut self) {
        for (timer, handle) in self.armed.drain(..) {
            debug!(timer = timer.id(), kind = ?timer.kind(), "Cancelling timer");
            handle.cancel();
        }
    }

    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

impl<S: Scheduler> Drop for PlayEngine<S> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc, time::Duration};

    use super::*;
    use crate::play::{scheduler::ManualScheduler, OptionFeedback};

    type Engine = PlayEngine<ManualScheduler>;

    fn question(correct_answer: usize, options: usize) -> Question {
        Question {
            question: format!("Question with answer {correct_answer}"),
            options: (0..options).map(|i| format!("Option {i}")).collect(),
            correct_answer,
        }
    }

    fn card(image: &str, questions: Vec<Question>) -> FlashcardSet {
        FlashcardSet {
            id: Some(image.to_string()),
            deck: Deck::Children,
            image_url: format!("https://example.com/{image}.png"),
            questions,
            created_at: None,
            updated_at: None,
        }
    }

    fn engine() -> Engine {
        PlayEngine::new(PlayConfig::default(), ManualScheduler::default())
    }

    fn elapse(engine: &mut Engine, by: Duration) {
        let until = engine.scheduler().now() + by;
        while let Some(timer) = engine.scheduler_mut().pop_due(until) {
            engine.fire(timer);
        }
        engine.scheduler_mut().set_now(until);
    }

    fn elapse_image(engine: &mut Engine) {
        let total = engine.config().tick_interval() * engine.config().image_seconds;
        elapse(engine, total);
    }

    fn elapse_advance(engine: &mut Engine) {
        let delay = engine.config().advance_delay();
        elapse(engine, delay);
    }

    fn start(engine: &mut Engine, cards: Vec<FlashcardSet>) {
        let request = engine.choose_deck(Deck::Children);
        assert_eq!(engine.phase(), Phase::Loading);
        engine.complete_load(request, Ok(cards));
    }

    #[test]
    fn children_deck_scenario() {
        let mut engine = engine();
        start(
            &mut engine,
            vec![
                card("a", vec![question(1, 3)]),
                card("b", vec![question(0, 3), question(1, 3)]),
            ],
        );

        let view = engine.view();
        assert_eq!(view.phase, Phase::ShowingImage);
        assert_eq!(view.seconds_left, Some(15));
        assert_eq!((view.card_index, view.total_cards), (0, 2));
        assert_eq!(view.score, 0);

        elapse_image(&mut engine);
        assert_eq!(engine.phase(), Phase::Asking);
        let outcome = engine.submit_answer(1).expect("answer accepted");
        assert!(outcome.is_correct());
        assert_eq!(outcome.score, 10);

        elapse_advance(&mut engine);
        let view = engine.view();
        assert_eq!(view.phase, Phase::ShowingImage);
        assert_eq!(view.card_index, 1);
        assert_eq!(view.question_index, 0);
        assert_eq!(view.seconds_left, Some(15));
        assert_eq!(view.selected_option, None);

        elapse_image(&mut engine);
        assert_eq!(engine.submit_answer(0).map(|o| o.awarded), Some(10));
        elapse_advance(&mut engine);
        let view = engine.view();
        assert_eq!(view.phase, Phase::Asking);
        assert_eq!((view.question_index, view.total_questions_in_card), (1, 2));
        assert_eq!(view.selected_option, None);

        let outcome = engine.submit_answer(2).expect("answer accepted");
        assert!(!outcome.is_correct());
        assert_eq!(outcome.awarded, 0);
        elapse_advance(&mut engine);

        assert_eq!(engine.phase(), Phase::Finished);
        assert_eq!(engine.view().score, 20);
        let summary = engine.summary().expect("finished round has a summary");
        assert_eq!(summary.answered, 3);
        assert_eq!(summary.correct, 2);
        assert_eq!(summary.total_questions, 3);
        assert_eq!(summary.max_score, 30);
        assert!(engine.scheduler().armed().is_empty());
    }

    #[test]
    fn empty_deck_returns_to_selection() {
        let mut engine = engine();
        start(&mut engine, Vec::new());

        assert_eq!(engine.phase(), Phase::SelectingDeck);
        assert_eq!(engine.notice(), Some(&Notice::EmptyDeck(Deck::Children)));
        let view = engine.view();
        assert_eq!(view.score, 0);
        assert_eq!(view.deck, None);
        assert_eq!(view.total_cards, 0);
        assert!(view.card.is_none());
        assert!(engine.scheduler().armed().is_empty());
        assert!(engine.take_notice().is_some());
        assert!(engine.notice().is_none());
    }

    #[test]
    fn fetch_failure_returns_to_selection() {
        let mut engine = engine();
        let request = engine.choose_deck(Deck::Miscellaneous);
        assert_eq!(engine.view().deck, Some(Deck::Miscellaneous));
        engine.complete_load(
            request,
            Err(CatalogError::Status {
                status: 500,
                message: "Failed to fetch questions".to_string(),
            }),
        );

        assert_eq!(engine.phase(), Phase::SelectingDeck);
        match engine.take_notice() {
            Some(Notice::FetchFailure { deck, message }) => {
                assert_eq!(deck, "miscellaneous");
                assert!(message.contains("Failed to fetch questions"));
            }
            other => panic!("expected fetch failure, got {other:?}"),
        }
    }

    #[test]
    fn unknown_deck_name_is_fetch_failure() {
        let mut engine = engine();
        assert!(engine.choose_deck_named("holidays").is_none());
        assert_eq!(engine.phase(), Phase::SelectingDeck);
        assert!(matches!(
            engine.notice(),
            Some(Notice::FetchFailure { deck, .. }) if deck == "holidays"
        ));

        let request = engine.choose_deck_named("children").expect("known deck");
        assert_eq!(request.deck(), Deck::Children);
        assert!(engine.notice().is_none());
    }

    #[test]
    fn countdown_ticks_once_per_unit() {
        let mut engine = engine();
        start(&mut engine, vec![card("a", vec![question(0, 2)])]);

        elapse(&mut engine, Duration::from_millis(999));
        assert_eq!(engine.view().seconds_left, Some(15));

        elapse(&mut engine, Duration::from_millis(1));
        assert_eq!(engine.view().seconds_left, Some(14));

        for expected in (1..14).rev() {
            elapse(&mut engine, Duration::from_secs(1));
            assert_eq!(engine.phase(), Phase::ShowingImage);
            assert_eq!(engine.view().seconds_left, Some(expected));
        }

        elapse(&mut engine, Duration::from_secs(1));
        let view = engine.view();
        assert_eq!(view.phase, Phase::Asking);
        assert_eq!(view.seconds_left, None);
        assert_eq!(view.selected_option, None);
        assert!(engine.scheduler().armed().is_empty());

        elapse(&mut engine, Duration::from_secs(30));
        assert_eq!(engine.phase(), Phase::Asking);
    }

    #[test]
    fn duplicate_answers_are_ignored() {
        let mut engine = engine();
        start(&mut engine, vec![card("a", vec![question(1, 3), question(0, 2)])]);
        elapse_image(&mut engine);

        assert!(engine.submit_answer(0).is_some());
        assert!(engine.submit_answer(1).is_none());
        assert!(engine.submit_answer(0).is_none());

        let view = engine.view();
        assert_eq!(view.selected_option, Some(0));
        assert_eq!(view.score, 0);
        assert!(!view.accepts_answer());
        assert_eq!(view.feedback(1), OptionFeedback::Correct);
        assert_eq!(view.feedback(0), OptionFeedback::Wrong);
        assert_eq!(view.feedback(2), OptionFeedback::Neutral);
        assert_eq!(engine.scheduler().armed().len(), 1);

        elapse_advance(&mut engine);
        assert_eq!(engine.view().question_index, 1);
        assert_eq!(engine.view().feedback(0), OptionFeedback::Neutral);
    }

    #[test]
    fn out_of_range_and_early_answers_are_ignored() {
        let mut engine = engine();
        assert!(engine.submit_answer(0).is_none());

        start(&mut engine, vec![card("a", vec![question(1, 2)])]);
        assert!(engine.submit_answer(1).is_none());
        assert_eq!(engine.phase(), Phase::ShowingImage);

        elapse_image(&mut engine);
        assert!(engine.submit_answer(2).is_none());
        assert_eq!(engine.view().selected_option, None);
        assert!(engine.submit_answer(1).is_some());
    }

    #[test]
    fn restart_cancels_pending_work() {
        let mut engine = engine();
        start(
            &mut engine,
            vec![card("a", vec![question(0, 2)]), card("b", vec![question(0, 2)])],
        );
        elapse_image(&mut engine);
        engine.submit_answer(0);
        assert_eq!(engine.view().score, 10);

        let pending = engine.scheduler().armed();
        assert_eq!(pending.len(), 1);
        engine.restart();
        assert!(engine.scheduler().armed().is_empty());

        for timer in pending {
            engine.fire(timer);
        }
        elapse(&mut engine, Duration::from_secs(60));
        let view = engine.view();
        assert_eq!(view.phase, Phase::SelectingDeck);
        assert_eq!(view.score, 0);
        assert_eq!((view.card_index, view.question_index), (0, 0));
    }

    #[test]
    fn restart_from_every_phase() {
        let mut engine = engine();
        let cards = || vec![card("a", vec![question(0, 2)])];

        engine.choose_deck(Deck::Children);
        engine.restart();
        assert_eq!(engine.phase(), Phase::SelectingDeck);

        start(&mut engine, cards());
        let countdown = engine.scheduler().armed();
        engine.restart();
        for timer in countdown {
            engine.fire(timer);
        }
        assert_eq!(engine.phase(), Phase::SelectingDeck);

        start(&mut engine, cards());
        elapse_image(&mut engine);
        engine.submit_answer(0);
        elapse_advance(&mut engine);
        assert_eq!(engine.phase(), Phase::Finished);
        engine.restart();
        assert_eq!(engine.phase(), Phase::SelectingDeck);
        assert_eq!(engine.view().score, 0);
        assert!(engine.summary().is_none());
    }

    #[test]
    fn stale_load_results_are_dropped() {
        let mut engine = engine();
        let first = engine.choose_deck(Deck::Children);
        engine.restart();
        engine.complete_load(first, Ok(vec![card("a", vec![question(0, 2)])]));
        assert_eq!(engine.phase(), Phase::SelectingDeck);

        let old = engine.choose_deck(Deck::Children);
        let current = engine.choose_deck(Deck::Miscellaneous);
        engine.complete_load(old, Ok(Vec::new()));
        assert_eq!(engine.phase(), Phase::Loading);
        assert!(engine.notice().is_none());

        engine.complete_load(current, Ok(vec![card("b", vec![question(0, 2)])]));
        assert_eq!(engine.phase(), Phase::ShowingImage);
        assert_eq!(engine.view().deck, Some(Deck::Miscellaneous));
    }

    #[test]
    fn card_without_questions_waits_for_player() {
        let mut engine = engine();
        start(
            &mut engine,
            vec![card("empty", Vec::new()), card("b", vec![question(1, 2)])],
        );
        elapse_image(&mut engine);

        assert_eq!(engine.phase(), Phase::NoContent);
        assert_eq!(
            engine.take_notice(),
            Some(Notice::NoQuestionsInCard { card: 0 })
        );
        assert!(engine.submit_answer(0).is_none());
        elapse(&mut engine, Duration::from_secs(60));
        assert_eq!(engine.phase(), Phase::NoContent);

        assert!(engine.skip_card());
        let view = engine.view();
        assert_eq!(view.phase, Phase::ShowingImage);
        assert_eq!(view.card_index, 1);
        assert!(!engine.skip_card());

        elapse_image(&mut engine);
        engine.submit_answer(1);
        elapse_advance(&mut engine);
        let summary = engine.summary().expect("finished");
        assert_eq!(summary.score, 10);
        assert_eq!(summary.total_questions, 1);
    }

    #[test]
    fn skipping_last_empty_card_finishes() {
        let mut engine = engine();
        start(&mut engine, vec![card("empty", Vec::new())]);
        elapse_image(&mut engine);
        assert!(engine.skip_card());
        assert_eq!(engine.phase(), Phase::Finished);
        assert_eq!(engine.summary().map(|s| s.max_score), Some(0));
    }

    #[test]
    fn finishes_after_exactly_one_answer_per_question() {
        let shapes: [&[usize]; 3] = [&[1], &[3, 1], &[2, 2, 4]];
        for shape in shapes {
            let mut engine = engine();
            let cards = shape
                .iter()
                .enumerate()
                .map(|(i, &count)| {
                    card(
                        &format!("card{i}"),
                        (0..count).map(|q| question(q % 3, 3)).collect(),
                    )
                })
                .collect();
            start(&mut engine, cards);

            let total: usize = shape.iter().sum();
            let mut answers = 0;
            while engine.phase() != Phase::Finished {
                match engine.phase() {
                    Phase::ShowingImage => elapse_image(&mut engine),
                    Phase::Asking => {
                        let correct = engine
                            .view()
                            .question
                            .map(|question| question.correct_answer)
                            .expect("question while asking");
                        assert!(engine.submit_answer(correct).is_some());
                        answers += 1;
                        assert!(answers <= total);
                        elapse_advance(&mut engine);
                    }
                    other => panic!("unexpected phase {other}"),
                }
            }
            assert_eq!(answers, total);
            assert_eq!(engine.view().score as usize, 10 * total);
        }
    }

    #[test]
    fn zero_image_duration_goes_straight_to_questions() {
        let config = PlayConfig {
            image_seconds: 0,
            correct_award: 5,
            ..PlayConfig::default()
        };
        let mut engine = PlayEngine::new(config, ManualScheduler::default());
        let request = engine.choose_deck(Deck::Children);
        engine.complete_load(request, Ok(vec![card("a", vec![question(0, 2)])]));
        assert_eq!(engine.phase(), Phase::Asking);
        assert_eq!(engine.submit_answer(0).map(|o| o.score), Some(5));
    }

    struct Shared(Rc<RefCell<ManualScheduler>>);

    impl Scheduler for Shared {
        fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerHandle {
            self.0.borrow_mut().schedule(delay, timer)
        }
    }

    #[test]
    fn dropping_the_engine_cancels_timers() {
        let clock = Rc::new(RefCell::new(ManualScheduler::default()));
        let mut engine = PlayEngine::new(PlayConfig::default(), Shared(clock.clone()));
        let request = engine.choose_deck(Deck::Children);
        engine.complete_load(request, Ok(vec![card("a", vec![question(0, 2)])]));
        assert_eq!(clock.borrow().armed().len(), 1);

        drop(engine);
        assert!(clock.borrow().armed().is_empty());
    }
}
