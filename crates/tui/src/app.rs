use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use flashpeek_core::{
    catalog::{Catalog, CatalogError},
    models::{Deck, FlashcardSet},
    play::{
        LoadRequest, OptionFeedback, Phase, PlayConfig, PlayEngine, PlayView, Timer,
        TokioScheduler,
    },
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use tokio::{spawn, sync::mpsc};
use tracing::{error, info};

use crate::{
    block_font,
    form::{Field, SetForm},
};

const TICK_RATE: Duration = Duration::from_millis(250);
const MENU_ITEMS: [&str; 3] = ["Play", "Manage decks", "Quit"];

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Play,
    Manage,
}

enum AppEvent {
    Input(Event),
    Tick,
    Timer(Timer),
    DeckLoaded(LoadRequest, Result<Vec<FlashcardSet>, CatalogError>),
    SetsLoaded(Deck, Result<Vec<FlashcardSet>, CatalogError>),
    SetCreated(Result<FlashcardSet, CatalogError>),
    SetDeleted(String, Result<(), CatalogError>),
}

/// Terminal frontend: main menu, quiz player, and deck management.
pub struct FlashpeekApp {
    catalog: Catalog,
    engine: PlayEngine<TokioScheduler<AppEvent>>,
    screen: Screen,
    state: UiState,
    manage: ManageState,
    form: Option<SetForm>,
    event_tx: mpsc::Sender<AppEvent>,
    event_rx: Option<mpsc::Receiver<AppEvent>>,
    theme: Theme,
}

impl FlashpeekApp {
    pub fn new(catalog: Catalog, play: PlayConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel::<AppEvent>(128);
        let scheduler = TokioScheduler::new(event_tx.clone(), AppEvent::Timer);
        Self {
            catalog,
            engine: PlayEngine::new(play, scheduler),
            screen: Screen::Menu,
            state: UiState::default(),
            manage: ManageState::default(),
            form: None,
            event_tx,
            event_rx: Some(event_rx),
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut event_rx = self
            .event_rx
            .take()
            .context("event loop is already running")?;
        self.state
            .set_status(format!("Using {}", self.catalog.describe()));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        spawn_input_thread(self.event_tx.clone());

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }
            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }
        }

        self.engine.restart();
        restore_terminal(&mut terminal)?;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Err(err) = self.handle_input(event) {
                    self.state.set_status(format!("Error: {err}"));
                }
            }
            Some(AppEvent::Tick) => {}
            Some(AppEvent::Timer(timer)) => {
                self.engine.fire(timer);
                self.surface_notice();
            }
            Some(AppEvent::DeckLoaded(request, result)) => {
                self.engine.complete_load(request, result);
                if !self.surface_notice() && self.engine.phase() == Phase::ShowingImage {
                    self.state.set_status("Memorise the image".to_string());
                }
            }
            Some(AppEvent::SetsLoaded(deck, result)) => {
                if deck != self.manage.deck {
                    return true;
                }
                self.manage.loading = false;
                match result {
                    Ok(sets) => {
                        self.state
                            .set_status(format!("{} sets in {}", sets.len(), deck.display_name()));
                        self.manage.set_sets(sets);
                    }
                    Err(err) => {
                        error!(?err, deck = %deck, "Failed to list flashcard sets");
                        self.manage.set_sets(Vec::new());
                        self.state.set_status(format!("Failed to load sets: {err}"));
                    }
                }
            }
            Some(AppEvent::SetCreated(result)) => match result {
                Ok(set) => {
                    info!(deck = %set.deck, "Flashcard set saved");
                    self.form = None;
                    self.state.set_status(format!(
                        "Saved set with {} questions",
                        set.question_count()
                    ));
                    self.reload_sets();
                }
                Err(err) => {
                    error!(?err, "Failed to save flashcard set");
                    self.state.set_status(format!("Save failed: {err}"));
                }
            },
            Some(AppEvent::SetDeleted(id, result)) => match result {
                Ok(()) => {
                    self.state.set_status(format!("Deleted set {id}"));
                    self.reload_sets();
                }
                Err(err) => {
                    error!(?err, id = %id, "Failed to delete flashcard set");
                    self.state.set_status(format!("Delete failed: {err}"));
                }
            },
            None => return false,
        }
        true
    }

    fn surface_notice(&mut self) -> bool {
        match self.engine.take_notice() {
            Some(notice) => {
                self.state.set_status(notice.to_string());
                true
            }
            None => false,
        }
    }

    fn start_deck_load(&mut self, deck: Deck) {
        let request = self.engine.choose_deck(deck);
        self.state.option_cursor = 0;
        self.state
            .set_status(format!("Loading {}…", deck.display_name()));
        let catalog = self.catalog.clone();
        let sender = self.event_tx.clone();
        spawn(async move {
            let result = catalog.fetch_sets(Some(request.deck())).await;
            let _ = sender.send(AppEvent::DeckLoaded(request, result)).await;
        });
    }

    fn reload_sets(&mut self) {
        let deck = self.manage.deck;
        self.manage.loading = true;
        self.manage.pending_delete = None;
        let catalog = self.catalog.clone();
        let sender = self.event_tx.clone();
        spawn(async move {
            let result = catalog.fetch_sets(Some(deck)).await;
            let _ = sender.send(AppEvent::SetsLoaded(deck, result)).await;
        });
    }

    fn submit_form(&mut self) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        let draft = match form.build() {
            Ok(draft) => draft,
            Err(err) => {
                self.state.set_status(format!("Cannot save: {err:#}"));
                return;
            }
        };
        self.state.set_status("Saving…".to_string());
        let catalog = self.catalog.clone();
        let sender = self.event_tx.clone();
        spawn(async move {
            let result = catalog.create_set(draft).await;
            let _ = sender.send(AppEvent::SetCreated(result)).await;
        });
    }

    fn delete_set(&mut self, id: String) {
        self.state.set_status(format!("Deleting {id}…"));
        let catalog = self.catalog.clone();
        let sender = self.event_tx.clone();
        spawn(async move {
            let result = catalog.delete_set(&id).await;
            let _ = sender.send(AppEvent::SetDeleted(id, result)).await;
        });
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return Ok(());
        }
        match self.screen {
            Screen::Menu => self.handle_menu_key(key),
            Screen::Play => self.handle_play_key(key),
            Screen::Manage if self.form.is_some() => self.handle_form_key(key),
            Screen::Manage => self.handle_manage_key(key),
        }
        Ok(())
    }

    fn handle_menu_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.state.should_quit = true;
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.move_menu_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_menu_cursor(-1),
            KeyCode::Enter => match self.state.menu_cursor {
                0 => {
                    self.engine.restart();
                    self.screen = Screen::Play;
                    self.state.set_status("Choose a deck".to_string());
                }
                1 => {
                    self.screen = Screen::Manage;
                    self.reload_sets();
                    self.state
                        .set_status(format!("Loading {}…", self.manage.deck.display_name()));
                }
                _ => self.state.should_quit = true,
            },
            _ => {}
        }
    }

    fn handle_play_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.engine.restart();
                self.screen = Screen::Menu;
                self.state.set_status("Returned to main menu".to_string());
                return;
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.engine.restart();
                self.state.option_cursor = 0;
                self.state.set_status("Restarted".to_string());
                return;
            }
            _ => {}
        }

        match self.engine.phase() {
            Phase::SelectingDeck => match key.code {
                KeyCode::Char('j') | KeyCode::Down => self.state.move_deck_cursor(1),
                KeyCode::Char('k') | KeyCode::Up => self.state.move_deck_cursor(-1),
                KeyCode::Enter => {
                    let deck = Deck::ALL[self.state.deck_cursor.min(Deck::ALL.len() - 1)];
                    self.start_deck_load(deck);
                }
                KeyCode::Char(ch) => {
                    if let Some(index) = digit_index(ch).filter(|index| *index < Deck::ALL.len()) {
                        self.state.deck_cursor = index;
                        self.start_deck_load(Deck::ALL[index]);
                    }
                }
                _ => {}
            },
            Phase::Asking => {
                let options = self
                    .engine
                    .view()
                    .question
                    .map(|question| question.options.len())
                    .unwrap_or(0);
                match key.code {
                    KeyCode::Char('j') | KeyCode::Down => {
                        self.state.move_option_cursor(1, options);
                    }
                    KeyCode::Char('k') | KeyCode::Up => {
                        self.state.move_option_cursor(-1, options);
                    }
                    KeyCode::Enter | KeyCode::Char(' ') => {
                        self.answer(self.state.option_cursor);
                    }
                    KeyCode::Char(ch) => {
                        if let Some(index) = digit_index(ch) {
                            self.answer(index);
                        }
                    }
                    _ => {}
                }
            }
            Phase::NoContent => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('n'))
                    && self.engine.skip_card()
                {
                    self.state.set_status("Skipped card".to_string());
                }
            }
            Phase::Finished => {
                if key.code == KeyCode::Enter {
                    self.engine.restart();
                    self.state.set_status("Choose a deck".to_string());
                }
            }
            Phase::Loading | Phase::ShowingImage => {}
        }
    }

    fn answer(&mut self, option: usize) {
        let Some(outcome) = self.engine.submit_answer(option) else {
            return;
        };
        self.state.option_cursor = 0;
        let message = if outcome.is_correct() {
            format!("Correct! +{}", outcome.awarded)
        } else {
            let label = self
                .engine
                .view()
                .question
                .and_then(|question| question.options.get(outcome.correct_option).cloned())
                .unwrap_or_else(|| format!("option {}", outcome.correct_option + 1));
            format!("Wrong, the answer was {label}")
        };
        self.state.set_status(message);
    }

    fn handle_manage_key(&mut self, key: KeyEvent) {
        if let Some(id) = self.manage.pending_delete.take() {
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                self.delete_set(id);
            } else {
                self.state.set_status("Delete cancelled".to_string());
            }
            return;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.screen = Screen::Menu;
                self.state.set_status("Returned to main menu".to_string());
            }
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => self.switch_deck(1),
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => self.switch_deck(-1),
            KeyCode::Char('j') | KeyCode::Down => self.manage.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.manage.move_cursor(-1),
            KeyCode::Char('r') => {
                self.reload_sets();
                self.state.set_status("Reloading…".to_string());
            }
            KeyCode::Char('a') => {
                self.form = Some(SetForm::new(self.manage.deck));
                self.state.set_status(
                    "Tab: next field • Enter on correct #: add question • Ctrl-S: save • Esc: cancel"
                        .to_string(),
                );
            }
            KeyCode::Char('d') => match self.manage.current().and_then(|set| set.id.clone()) {
                Some(id) => {
                    self.state
                        .set_status(format!("Delete set {id}? Press y to confirm"));
                    self.manage.pending_delete = Some(id);
                }
                None => self.state.set_status("Nothing to delete".to_string()),
            },
            _ => {}
        }
    }

    fn switch_deck(&mut self, delta: isize) {
        let len = Deck::ALL.len() as isize;
        let current = Deck::ALL
            .iter()
            .position(|deck| *deck == self.manage.deck)
            .unwrap_or(0) as isize;
        self.manage.deck = Deck::ALL[(current + delta).rem_euclid(len) as usize];
        self.manage.set_sets(Vec::new());
        self.reload_sets();
        self.state
            .set_status(format!("Loading {}…", self.manage.deck.display_name()));
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('s') {
                self.submit_form();
            }
            return;
        }
        match key.code {
            KeyCode::Esc => {
                self.form = None;
                self.state.set_status("Discarded draft".to_string());
            }
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
            KeyCode::Left => form.focused_mut().move_cursor(-1),
            KeyCode::Right => form.focused_mut().move_cursor(1),
            KeyCode::Home => form.focused_mut().move_home(),
            KeyCode::End => form.focused_mut().move_end(),
            KeyCode::Backspace => form.focused_mut().backspace(),
            KeyCode::Delete => form.focused_mut().delete(),
            KeyCode::Enter if form.focus() == Field::Correct => match form.add_question() {
                Ok(count) => self
                    .state
                    .set_status(format!("Added question {count}; Ctrl-S saves the set")),
                Err(err) => self.state.set_status(format!("Cannot add: {err:#}")),
            },
            KeyCode::Enter => form.focus_next(),
            KeyCode::Char(ch) => form.focused_mut().insert(ch),
            _ => {}
        }
    }

    fn draw(&self, frame: &mut Frame) {
        match self.screen {
            Screen::Menu => self.draw_menu(frame),
            Screen::Play => self.draw_play(frame),
            Screen::Manage => self.draw_manage(frame),
        }
        if let Some(form) = &self.form {
            self.render_form(frame, form);
        }
    }

    fn draw_menu(&self, frame: &mut Frame) {
        let area = frame.size();
        let banner_lines = block_font::render("FLASHPEEK");
        let banner_height = banner_lines.len() as u16;
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length((banner_height + 2).min(area.height)),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(area);

        let banner_content: Vec<Line> = banner_lines
            .into_iter()
            .map(|line| {
                Line::from(Span::styled(
                    line,
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                ))
            })
            .collect();
        let banner = Paragraph::new(banner_content).alignment(Alignment::Center);
        frame.render_widget(banner, layout[0]);

        let menu_height = (MENU_ITEMS.len() as u16)
            .saturating_mul(2)
            .saturating_add(2)
            .min(layout[1].height);
        let menu_area = centered_rect(28, menu_height, layout[1]);
        let menu_lines: Vec<Line> = MENU_ITEMS
            .iter()
            .enumerate()
            .map(|(idx, item)| self.cursor_line(idx == self.state.menu_cursor, item))
            .collect();
        let menu = Paragraph::new(menu_lines)
            .block(Block::default().borders(Borders::ALL).title("Menu"))
            .alignment(Alignment::Center);
        frame.render_widget(menu, menu_area);
        self.render_status(frame, layout[2]);
    }

    fn cursor_line(&self, selected: bool, text: &str) -> Line<'static> {
        if selected {
            Line::from(Span::styled(
                format!("▶ {text}"),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ))
        } else {
            Line::from(Span::styled(
                format!("  {text}"),
                Style::default().fg(self.theme.primary_fg),
            ))
        }
    }

    fn draw_play(&self, frame: &mut Frame) {
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(area);

        let view = self.engine.view();
        self.render_play_header(frame, rows[0], &view);
        match view.phase {
            Phase::SelectingDeck => self.render_deck_choice(frame, rows[1]),
            Phase::Loading => {
                let deck = view.deck.map(|deck| deck.display_name()).unwrap_or("deck");
                self.render_message(frame, rows[1], "Loading", &format!("Loading {deck}…"));
            }
            Phase::ShowingImage => self.render_image(frame, rows[1], &view),
            Phase::Asking => self.render_question(frame, rows[1], &view),
            Phase::NoContent => self.render_message(
                frame,
                rows[1],
                "No content",
                "This card has no questions. Press Enter to continue, r to restart.",
            ),
            Phase::Finished => self.render_finished(frame, rows[1]),
        }
        self.render_status(frame, rows[2]);
    }

    fn render_play_header(&self, frame: &mut Frame, area: Rect, view: &PlayView) {
        let cards = if view.total_cards > 0 {
            format!("Card {}/{}", view.card_index + 1, view.total_cards)
        } else {
            "No deck".to_string()
        };
        let line = Line::from(vec![
            Span::styled(
                format!("Score: {}", view.score),
                Style::default()
                    .fg(self.theme.success)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            Span::styled(cards, Style::default().fg(self.theme.muted)),
            Span::raw("   "),
            Span::styled(
                view.phase.label(),
                Style::default().fg(self.theme.accent),
            ),
            Span::styled(
                "   r: restart • Esc: menu",
                Style::default().fg(self.theme.muted),
            ),
        ]);
        let block = Block::default().borders(Borders::ALL).title("FlashPeek");
        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn render_deck_choice(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![Line::from(""), Line::from("Choose a Deck"), Line::from("")];
        lines.extend(Deck::ALL.iter().enumerate().map(|(idx, deck)| {
            self.cursor_line(
                idx == self.state.deck_cursor,
                &format!("{}. {}", idx + 1, deck.display_name()),
            )
        }));
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Play"))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }

    fn render_image(&self, frame: &mut Frame, area: Rect, view: &PlayView) {
        let seconds = view.seconds_left.unwrap_or(0);
        let mut lines = vec![Line::from("")];
        if let Some(card) = view.card {
            lines.push(Line::from(Span::styled(
                card.image_url.clone(),
                Style::default()
                    .fg(self.theme.primary_fg)
                    .add_modifier(Modifier::UNDERLINED),
            )));
        }
        lines.push(Line::from(""));
        let digits_style = Style::default()
            .fg(if seconds <= 3 {
                self.theme.warning
            } else {
                self.theme.accent
            })
            .add_modifier(Modifier::BOLD);
        lines.extend(
            block_font::render(&seconds.to_string())
                .into_iter()
                .map(|row| Line::from(Span::styled(row, digits_style))),
        );
        lines.push(Line::from(""));
        lines.push(Line::from(format!("Memorise the image: {seconds}s left")));
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Image"))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_question(&self, frame: &mut Frame, area: Rect, view: &PlayView) {
        let Some(question) = view.question else {
            self.render_message(frame, area, "Question", "No question available");
            return;
        };
        let mut lines = vec![
            Line::from(Span::styled(
                question.question.clone(),
                Style::default()
                    .fg(self.theme.primary_fg)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        for (idx, option) in question.options.iter().enumerate() {
            let style = match view.feedback(idx) {
                OptionFeedback::Correct => Style::default()
                    .fg(self.theme.success)
                    .add_modifier(Modifier::BOLD),
                OptionFeedback::Wrong => Style::default()
                    .fg(self.theme.danger)
                    .add_modifier(Modifier::CROSSED_OUT),
                OptionFeedback::Neutral if view.accepts_answer() && idx == self.state.option_cursor => {
                    Style::default()
                        .fg(self.theme.accent)
                        .bg(self.theme.selection_bg)
                }
                OptionFeedback::Neutral => Style::default().fg(self.theme.primary_fg),
            };
            lines.push(Line::from(Span::styled(
                format!(" {}. {option} ", idx + 1),
                style,
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(
                "Q {}/{}",
                view.question_index + 1,
                view.total_questions_in_card
            ),
            Style::default().fg(self.theme.muted),
        )));
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Question"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_finished(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![
            Line::from(Span::styled(
                "Round Complete!",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        if let Some(summary) = self.engine.summary() {
            let style = Style::default()
                .fg(self.theme.success)
                .add_modifier(Modifier::BOLD);
            lines.extend(
                block_font::render(&summary.score.to_string())
                    .into_iter()
                    .map(|row| Line::from(Span::styled(row, style))),
            );
            lines.push(Line::from(""));
            lines.push(Line::from(format!(
                "{} of {} correct ({:.0}%) • max {} points • {}",
                summary.correct,
                summary.answered,
                summary.accuracy() * 100.0,
                summary.max_score,
                summary.deck.display_name()
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Enter: play again • Esc: menu",
            Style::default().fg(self.theme.muted),
        )));
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Final Score"))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }

    fn render_message(&self, frame: &mut Frame, area: Rect, title: &str, message: &str) {
        let paragraph = Paragraph::new(vec![Line::from(""), Line::from(message.to_string())])
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_manage(&self, frame: &mut Frame) {
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(area);

        let selected_tab = Deck::ALL
            .iter()
            .position(|deck| *deck == self.manage.deck)
            .unwrap_or(0);
        let tabs = Tabs::new(Deck::ALL.iter().map(|deck| deck.display_name()).collect::<Vec<_>>())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Decks (Tab to switch)"),
            )
            .select(selected_tab)
            .highlight_style(
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, rows[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(rows[1]);
        self.render_set_list(frame, body[0]);
        self.render_set_details(frame, body[1]);
        self.render_status(frame, rows[2]);
    }

    fn render_set_list(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .manage
            .sets
            .iter()
            .map(|set| {
                let created = set
                    .created_at
                    .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                ListItem::new(Line::from(vec![
                    Span::styled(
                        set.image_url.clone(),
                        Style::default()
                            .fg(self.theme.primary_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(" · {}Q {created}", set.question_count()),
                        Style::default().fg(self.theme.muted),
                    ),
                ]))
            })
            .collect();
        let title = if self.manage.loading {
            "Sets (loading…)".to_string()
        } else {
            format!("Sets ({})", self.manage.sets.len())
        };
        let mut list_state = ListState::default();
        if !self.manage.sets.is_empty() {
            list_state.select(Some(self.manage.cursor));
        }
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_set_details(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Details (a: add • d: delete • r: reload • Esc: menu)");
        let Some(set) = self.manage.current() else {
            let paragraph = Paragraph::new("No flashcard sets in this deck")
                .block(block)
                .alignment(Alignment::Center);
            frame.render_widget(paragraph, area);
            return;
        };

        let mut lines = vec![
            Line::from(vec![
                Span::styled("Image: ", Style::default().fg(self.theme.muted)),
                Span::raw(set.image_url.clone()),
            ]),
            Line::from(vec![
                Span::styled("Id: ", Style::default().fg(self.theme.muted)),
                Span::raw(set.id.clone().unwrap_or_else(|| "-".to_string())),
            ]),
            Line::from(""),
        ];
        for (q_idx, question) in set.questions.iter().enumerate() {
            lines.push(Line::from(Span::styled(
                format!("{}. {}", q_idx + 1, question.question),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            for (o_idx, option) in question.options.iter().enumerate() {
                let (marker, style) = if question.is_correct(o_idx) {
                    ("✓", Style::default().fg(self.theme.success))
                } else {
                    (" ", Style::default().fg(self.theme.primary_fg))
                };
                lines.push(Line::from(Span::styled(
                    format!("   {marker} {option}"),
                    style,
                )));
            }
        }
        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_form(&self, frame: &mut Frame, form: &SetForm) {
        let frame_area = frame.size();
        let width = 72.min(frame_area.width.saturating_sub(4));
        let height = (Field::ALL.len() as u16 * 3 + 4).min(frame_area.height);
        let area = centered_rect(width, height, frame_area);
        frame.render_widget(Clear, area);

        let title = format!(
            "New set in {} ({} questions added)",
            form.deck().display_name(),
            form.questions().len()
        );
        let outer = Block::default().borders(Borders::ALL).title(title);
        let inner = outer.inner(area);
        frame.render_widget(outer, area);

        let mut constraints: Vec<Constraint> =
            Field::ALL.iter().map(|_| Constraint::Length(3)).collect();
        constraints.push(Constraint::Min(0));
        let slots = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        for (slot, field) in slots.iter().zip(Field::ALL) {
            let focused = form.focus() == field;
            let border_style = if focused {
                Style::default().fg(self.theme.accent)
            } else {
                Style::default().fg(self.theme.muted)
            };
            let input = form.field(field);
            let paragraph = Paragraph::new(input.value().to_string()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(field.label()),
            );
            frame.render_widget(paragraph, *slot);
            if focused {
                let x = slot.x + 1 + (input.cursor() as u16).min(slot.width.saturating_sub(3));
                frame.set_cursor(x, slot.y + 1);
            }
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let paragraph = Paragraph::new(vec![Line::from(self.state.status.clone())])
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

/// Zero-based index for the keys `1`–`9`.
fn digit_index(ch: char) -> Option<usize> {
    ch.to_digit(10)
        .filter(|digit| *digit > 0)
        .map(|digit| digit as usize - 1)
}

struct UiState {
    status: String,
    should_quit: bool,
    menu_cursor: usize,
    deck_cursor: usize,
    option_cursor: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            status: "Ready".to_string(),
            should_quit: false,
            menu_cursor: 0,
            deck_cursor: 0,
            option_cursor: 0,
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn move_menu_cursor(&mut self, delta: isize) {
        self.menu_cursor = step_cursor(self.menu_cursor, delta, MENU_ITEMS.len());
    }

    fn move_deck_cursor(&mut self, delta: isize) {
        self.deck_cursor = step_cursor(self.deck_cursor, delta, Deck::ALL.len());
    }

    fn move_option_cursor(&mut self, delta: isize, options: usize) {
        self.option_cursor = step_cursor(self.option_cursor, delta, options);
    }
}

struct ManageState {
    deck: Deck,
    sets: Vec<FlashcardSet>,
    cursor: usize,
    loading: bool,
    pending_delete: Option<String>,
}

impl Default for ManageState {
    fn default() -> Self {
        Self {
            deck: Deck::ALL[0],
            sets: Vec::new(),
            cursor: 0,
            loading: false,
            pending_delete: None,
        }
    }
}

impl ManageState {
    fn set_sets(&mut self, sets: Vec<FlashcardSet>) {
        self.sets = sets;
        self.cursor = self.cursor.min(self.sets.len().saturating_sub(1));
    }

    fn move_cursor(&mut self, delta: isize) {
        self.cursor = step_cursor(self.cursor, delta, self.sets.len());
    }

    fn current(&self) -> Option<&FlashcardSet> {
        self.sets.get(self.cursor)
    }
}

/// Move `cursor` by `delta`, clamped to `0..len`.
fn step_cursor(cursor: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (cursor as isize + delta).clamp(0, len as isize - 1) as usize
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_keys_map_to_zero_based_indices() {
        assert_eq!(digit_index('1'), Some(0));
        assert_eq!(digit_index('9'), Some(8));
        assert_eq!(digit_index('0'), None);
        assert_eq!(digit_index('x'), None);
    }

    #[test]
    fn cursor_steps_stay_in_bounds() {
        assert_eq!(step_cursor(0, -1, 3), 0);
        assert_eq!(step_cursor(2, 1, 3), 2);
        assert_eq!(step_cursor(1, 1, 3), 2);
        assert_eq!(step_cursor(4, 1, 0), 0);
    }

    #[test]
    fn centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered_rect(10, 4, area), Rect::new(5, 3, 10, 4));
        assert_eq!(centered_rect(40, 40, area), area);
    }
}
