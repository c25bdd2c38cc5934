//! Interactive search front end.
//!
//! Runs a [`Session`](crate::coordinator::Session) and renders whatever it
//! delivers. All drawing and result handling happens on this thread.

mod app;
pub mod key;
mod ui;

pub use app::Outcome;

use crate::coordinator::Coordinator;
use crate::index::{note_search, NoteIndex};
use crate::query::QueryCompiler;
use anyhow::{Context, Result};
use app::{App, Mode};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

/// Options for one interactive run
#[derive(Debug, Clone, Default)]
pub struct TuiOptions {
    pub initial_query: String,
    pub show_preview: bool,
    /// Extra keys that accept the selection, with their names
    pub expect: Vec<(String, KeyEvent)>,
}

pub fn run(
    coordinator: &Coordinator,
    index: Arc<NoteIndex>,
    compiler: QueryCompiler,
    options: TuiOptions,
) -> Result<Outcome> {
    let session = coordinator
        .start(note_search(Arc::clone(&index), compiler))
        .context("Failed to start search session")?;
    let mut app = App::new(index, session, options.initial_query, options.show_preview);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app, &options.expect);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    expect: &[(String, KeyEvent)],
) -> Result<Outcome> {
    loop {
        app.poll_reindex();
        app.poll_session().context("Search failed")?;

        let mut rows = 0;
        terminal.draw(|f| rows = ui::draw(f, app))?;
        app.set_visible_rows(rows);

        // Poll for events with timeout for responsive UI
        if event::poll(Duration::from_millis(100))? {
            // Only handle key press events, not release or repeat
            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
                && let Some(outcome) = handle_key(app, key, expect)
            {
                return Ok(outcome);
            }
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent, expect: &[(String, KeyEvent)]) -> Option<Outcome> {
    if let Some(name) = key::match_key(expect, key) {
        return Some(app.accept(name));
    }

    // Global keybindings
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Some(Outcome::Aborted),
        (KeyModifiers::CONTROL, KeyCode::Char('p')) => {
            app.toggle_preview();
            return None;
        }
        (_, KeyCode::Enter) => return Some(app.accept("")),
        (_, KeyCode::F(5)) => {
            app.reindex();
            return None;
        }
        _ => {}
    }

    match app.mode {
        Mode::Search => match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('j'))
            | (KeyModifiers::CONTROL, KeyCode::Char('n')) => app.select_next(),
            (KeyModifiers::CONTROL, KeyCode::Char('k')) => app.select_prev(),
            (KeyModifiers::CONTROL, KeyCode::Char('d')) => app.select_page_down(),
            (KeyModifiers::CONTROL, KeyCode::Char('u')) => app.select_page_up(),
            (KeyModifiers::CONTROL, KeyCode::Char('w')) => app.delete_word(),
            (KeyModifiers::CONTROL, KeyCode::Char('h')) => app.pop_char(),
            (KeyModifiers::NONE | KeyModifiers::SHIFT, code) => match code {
                KeyCode::Esc => {
                    if app.query.is_empty() {
                        return Some(Outcome::Aborted);
                    }
                    app.clear_query();
                }
                KeyCode::Down | KeyCode::Tab => app.select_next(),
                KeyCode::Up | KeyCode::BackTab => app.select_prev(),
                KeyCode::PageDown => app.select_page_down(),
                KeyCode::PageUp => app.select_page_up(),
                KeyCode::Backspace => app.pop_char(),
                KeyCode::Char(c) => app.push_char(c),
                _ => {}
            },
            _ => {}
        },
        Mode::Preview => match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('d')) => app.scroll_preview_down(10),
            (KeyModifiers::CONTROL, KeyCode::Char('u')) => app.scroll_preview_up(10),
            (KeyModifiers::CONTROL, KeyCode::Char('j')) => app.select_next(),
            (KeyModifiers::CONTROL, KeyCode::Char('k')) => app.select_prev(),
            (KeyModifiers::NONE | KeyModifiers::SHIFT, code) => match code {
                KeyCode::Esc | KeyCode::Char('q') => app.mode = Mode::Search,
                KeyCode::Down | KeyCode::Char('j') => app.scroll_preview_down(1),
                KeyCode::Up | KeyCode::Char('k') => app.scroll_preview_up(1),
                KeyCode::PageDown => app.scroll_preview_down(20),
                KeyCode::PageUp => app.scroll_preview_up(20),
                KeyCode::Char('n') => app.select_next(),
                KeyCode::Char('N') | KeyCode::Char('p') => app.select_prev(),
                _ => {}
            },
            _ => {}
        },
    }
    None
}
