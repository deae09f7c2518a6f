mod ui;
mod widgets;

pub(crate) use widgets::truncate;

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use chrono::Utc;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::debug;

use crate::deck::{Deck, Stats};
use crate::error::Result;
use crate::models::{Quality, SortBy, SortOrder, VocabItem};
use crate::store::Store;

const DASHBOARD_DUE_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Words,
    WordDetail,
    Review,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Dashboard => View::Words,
            View::Words => View::Review,
            View::WordDetail => View::Words,
            View::Review => View::Dashboard,
        }
    }

    fn prev(&self) -> Self {
        match self {
            View::Dashboard => View::Review,
            View::Words => View::Dashboard,
            View::WordDetail => View::Words,
            View::Review => View::Words,
        }
    }
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

/// Review run over the words that were due when it started.
#[derive(Debug, Default)]
pub struct ReviewSession {
    pub queue: VecDeque<String>,
    pub completed: usize,
    pub revealed: bool,
}

impl ReviewSession {
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn current(&self) -> Option<&String> {
        self.queue.front()
    }
}

pub struct App {
    store: Store,
    items_key: String,
    pub deck: Deck,
    pub view: View,
    /// Ids of the words matching the current filter, newest first.
    pub words: StatefulList<String>,
    pub selected_word: Option<String>,
    pub review: ReviewSession,
    pub stats: Stats,
    pub filter_query: Option<String>,
    pub filter_input: String,
    pub filter_mode: bool,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(store: Store, deck: Deck, items_key: String) -> Self {
        let stats = deck.stats(Utc::now());
        let mut app = Self {
            store,
            items_key,
            deck,
            view: View::Dashboard,
            words: StatefulList::with_items(Vec::new()),
            selected_word: None,
            review: ReviewSession::default(),
            stats,
            filter_query: None,
            filter_input: String::new(),
            filter_mode: false,
            status: None,
            should_quit: false,
        };
        app.reload_words();
        app
    }

    pub fn word(&self, id: &str) -> Option<&VocabItem> {
        self.deck.get(id)
    }

    pub fn due_preview(&self) -> Vec<&VocabItem> {
        let mut due = self.deck.due_items(Utc::now());
        due.truncate(DASHBOARD_DUE_LIMIT);
        due
    }

    fn reload_words(&mut self) {
        let ids = self
            .deck
            .filtered(
                self.filter_query.as_deref().unwrap_or(""),
                None,
                SortBy::Date,
                SortOrder::Desc,
            )
            .into_iter()
            .map(|item| item.id.clone())
            .collect();
        let keep = self.words.selected;
        self.words = StatefulList::with_items(ids);
        if let Some(i) = keep {
            if i < self.words.items.len() {
                self.words.selected = Some(i);
            }
        }
    }

    pub fn refresh_data(&mut self) -> Result<()> {
        let items = self.store.load_items(&self.items_key)?;
        self.deck = Deck::new(items, *self.deck.scheduler());
        self.stats = self.deck.stats(Utc::now());
        self.reload_words();
        self.review.queue.retain(|id| self.deck.get(id).is_some());
        Ok(())
    }

    fn apply_filter(&mut self) {
        let query = self.filter_input.trim();
        self.filter_query = if query.is_empty() {
            None
        } else {
            Some(query.to_string())
        };
        self.words.selected = None;
        self.reload_words();
    }

    fn select_word(&mut self) {
        if let Some(id) = self.words.selected_item() {
            self.selected_word = Some(id.clone());
            self.view = View::WordDetail;
        }
    }

    fn start_review(&mut self) {
        self.view = View::Review;
        if !self.review.queue.is_empty() {
            return;
        }
        let queue: VecDeque<String> = self
            .deck
            .due_items(Utc::now())
            .into_iter()
            .map(|item| item.id.clone())
            .collect();
        debug!(count = queue.len(), "starting review session");
        self.review = ReviewSession {
            queue,
            ..ReviewSession::default()
        };
    }

    fn rate_current(&mut self, quality: Quality) -> Result<()> {
        let Some(id) = self.review.queue.pop_front() else {
            return Ok(());
        };
        let item = self.deck.record_review_result(&id, quality.score())?;
        self.status = Some(format!(
            "'{}' rated {}: next in {} day(s)",
            item.word,
            quality.label(),
            item.interval
        ));
        self.store.save_items(&self.items_key, self.deck.items())?;

        self.review.completed += 1;
        self.review.revealed = false;
        self.stats = self.deck.stats(Utc::now());
        self.reload_words();
        Ok(())
    }

    fn skip_current(&mut self) {
        if let Some(id) = self.review.queue.pop_front() {
            self.review.queue.push_back(id);
            self.review.revealed = false;
        }
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Result<()> {
        if self.filter_mode {
            match key {
                KeyCode::Esc => {
                    self.filter_mode = false;
                    self.filter_input.clear();
                }
                KeyCode::Enter => {
                    self.filter_mode = false;
                    self.apply_filter();
                }
                KeyCode::Backspace => {
                    self.filter_input.pop();
                }
                KeyCode::Char(c) => {
                    self.filter_input.push(c);
                }
                _ => {}
            }
            return Ok(());
        }

        if self.view == View::Review && self.review.current().is_some() {
            match key {
                KeyCode::Char(' ') | KeyCode::Enter => {
                    self.review.revealed = !self.review.revealed;
                    return Ok(());
                }
                KeyCode::Char(c @ '0'..='5') if self.review.revealed => {
                    let score = c as i32 - '0' as i32;
                    if let Some(quality) = Quality::from_score(score) {
                        self.rate_current(quality)?;
                    }
                    return Ok(());
                }
                KeyCode::Char('s') => {
                    self.skip_current();
                    return Ok(());
                }
                _ => {}
            }
        }

        match key {
            KeyCode::Char('q') => self.should_quit = true,

            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.refresh_data()?;
            }

            KeyCode::Char('/') if self.view == View::Words => {
                self.filter_mode = true;
                self.filter_input.clear();
            }

            KeyCode::Esc => match self.view {
                View::WordDetail => {
                    self.view = View::Words;
                    self.selected_word = None;
                }
                View::Words if self.filter_query.is_some() => {
                    self.filter_input.clear();
                    self.apply_filter();
                }
                _ => {}
            },

            KeyCode::Char('h') | KeyCode::Left => match self.view {
                View::WordDetail => {
                    self.view = View::Words;
                    self.selected_word = None;
                }
                _ => self.switch_view(self.view.prev()),
            },
            KeyCode::Char('l') | KeyCode::Right => match self.view {
                View::Words => self.select_word(),
                _ => self.switch_view(self.view.next()),
            },

            KeyCode::Tab => {
                if modifiers.contains(KeyModifiers::SHIFT) {
                    self.switch_view(self.view.prev());
                } else {
                    self.switch_view(self.view.next());
                }
            }
            KeyCode::BackTab => self.switch_view(self.view.prev()),

            KeyCode::Char('j') | KeyCode::Down if self.view == View::Words => self.words.next(),
            KeyCode::Char('k') | KeyCode::Up if self.view == View::Words => {
                self.words.previous()
            }

            KeyCode::Char('g') if self.view == View::Words && !self.words.items.is_empty() => {
                self.words.selected = Some(0);
            }
            KeyCode::Char('G') if self.view == View::Words && !self.words.items.is_empty() => {
                self.words.selected = Some(self.words.items.len() - 1);
            }

            KeyCode::Enter if self.view == View::Words => self.select_word(),
            KeyCode::Enter if self.view == View::Dashboard => self.start_review(),

            _ => {}
        }
        Ok(())
    }

    fn switch_view(&mut self, view: View) {
        if view == View::Review {
            self.start_review();
        } else {
            self.view = view;
        }
    }
}

pub fn run(store: Store, deck: Deck, items_key: String) -> std::result::Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store, deck, items_key);

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
