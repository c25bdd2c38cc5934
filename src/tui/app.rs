use crate::coordinator::{DisplayedResults, Session, SessionEvent, SessionState};
use crate::error::BackendError;
use crate::index::{BuildReport, NoteHit, NoteIndex};
use lru::LruCache;
use regex::{Regex, RegexBuilder};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

/// Application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Search,
    /// Preview fills the main area
    Preview,
}

/// How the interactive search ended
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Accepted with Enter (empty key name) or an `--expect` key
    Accepted { key: String, hit: Option<NoteHit> },
    Aborted,
}

/// Number of previews kept in memory
const PREVIEW_CACHE_SIZE: NonZeroUsize = NonZeroUsize::new(32).unwrap();

/// Lines of context shown above the first highlighted line
const PREVIEW_CONTEXT_LINES: usize = 3;

/// Application state
pub struct App {
    index: Arc<NoteIndex>,
    session: Session<NoteHit>,
    pub query: String,
    pub results: DisplayedResults<NoteHit>,
    pub selected: usize,
    pub mode: Mode,
    pub show_preview: bool,
    pub preview_scroll: usize,
    pub preview_content: Option<String>,
    /// Matches query words in the preview
    pub highlight: Option<Regex>,
    preview_cache: LruCache<PathBuf, String>,
    /// Rows the result list can show, known after the first draw
    visible_rows: Option<usize>,
    reindexing: Option<Receiver<Result<BuildReport, String>>>,
}

impl App {
    pub fn new(index: Arc<NoteIndex>, session: Session<NoteHit>, query: String, show_preview: bool) -> Self {
        session.set_status(format!("{} notes indexed", index.num_notes()));
        let mut app = Self {
            index,
            session,
            query,
            results: DisplayedResults::default(),
            selected: 0,
            mode: Mode::Search,
            show_preview,
            preview_scroll: 0,
            preview_content: None,
            highlight: None,
            preview_cache: LruCache::new(PREVIEW_CACHE_SIZE),
            visible_rows: None,
            reindexing: None,
        };
        app.update_highlight();
        app
    }

    /// Record how many results fit on screen. The first call submits the
    /// initial query; later changes re-run the current one.
    pub fn set_visible_rows(&mut self, rows: usize) {
        if self.visible_rows != Some(rows) {
            self.visible_rows = Some(rows);
            self.submit();
        }
    }

    fn submit(&mut self) {
        if let Some(rows) = self.visible_rows {
            self.session.submit(self.query.clone(), rows);
        }
    }

    /// Apply everything the search worker delivered since the last call.
    pub fn poll_session(&mut self) -> Result<(), BackendError> {
        for event in self.session.drain() {
            match event {
                SessionEvent::Results(result) => {
                    let had_error = result.query_error.is_some();
                    self.results.apply(result);
                    if !had_error {
                        self.selected = self
                            .selected
                            .min(self.results.documents.len().saturating_sub(1));
                        self.update_highlight();
                        self.update_preview();
                    }
                }
                SessionEvent::Failed(err) => return Err(err),
            }
        }
        Ok(())
    }

    pub fn is_searching(&self) -> bool {
        self.session.state() == SessionState::Searching
    }

    pub fn status_text(&self) -> String {
        self.results.status_text(self.session.status())
    }

    // Query editing

    pub fn push_char(&mut self, c: char) {
        self.query.push(c);
        self.submit();
    }

    pub fn pop_char(&mut self) {
        if self.query.pop().is_some() {
            self.submit();
        }
    }

    /// Delete word backward from query (Ctrl+w)
    pub fn delete_word(&mut self) {
        let before = self.query.len();
        let trimmed = self.query.trim_end().len();
        self.query.truncate(trimmed);
        let word_start = self
            .query
            .rfind(char::is_whitespace)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.query.truncate(word_start);
        if self.query.len() != before {
            self.submit();
        }
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
        self.selected = 0;
        self.submit();
    }

    // Selection

    pub fn selected_hit(&self) -> Option<&NoteHit> {
        self.results.documents.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if !self.results.documents.is_empty() {
            self.selected = (self.selected + 1).min(self.results.documents.len() - 1);
            self.update_preview();
        }
    }

    pub fn select_prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.update_preview();
        }
    }

    pub fn select_page_down(&mut self) {
        if !self.results.documents.is_empty() {
            let page = self.visible_rows.unwrap_or(10).max(1);
            self.selected = (self.selected + page).min(self.results.documents.len() - 1);
            self.update_preview();
        }
    }

    pub fn select_page_up(&mut self) {
        let page = self.visible_rows.unwrap_or(10).max(1);
        self.selected = self.selected.saturating_sub(page);
        self.update_preview();
    }

    pub fn accept(&self, key: &str) -> Outcome {
        Outcome::Accepted {
            key: key.to_string(),
            hit: self.selected_hit().cloned(),
        }
    }

    // Preview

    pub fn toggle_preview(&mut self) {
        self.mode = match self.mode {
            Mode::Search => Mode::Preview,
            Mode::Preview => Mode::Search,
        };
    }

    pub fn scroll_preview_down(&mut self, lines: usize) {
        let max = self
            .preview_content
            .as_ref()
            .map(|c| c.lines().count().saturating_sub(1))
            .unwrap_or(0);
        self.preview_scroll = (self.preview_scroll + lines).min(max);
    }

    pub fn scroll_preview_up(&mut self, lines: usize) {
        self.preview_scroll = self.preview_scroll.saturating_sub(lines);
    }

    fn update_highlight(&mut self) {
        let words: Vec<String> = self
            .query
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|w| w.chars().count() >= 2)
            .map(regex::escape)
            .collect();
        self.highlight = if words.is_empty() {
            None
        } else {
            RegexBuilder::new(&words.join("|"))
                .case_insensitive(true)
                .build()
                .ok()
        };
    }

    pub fn update_preview(&mut self) {
        let Some(path) = self.selected_hit().map(|h| self.index.root().join(&h.path)) else {
            self.preview_content = None;
            self.preview_scroll = 0;
            return;
        };

        if !self.preview_cache.contains(&path) {
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    self.preview_cache.put(path.clone(), expand_tabs(&content));
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "preview unavailable");
                    self.preview_content = None;
                    self.preview_scroll = 0;
                    return;
                }
            }
        }

        let content = self.preview_cache.get(&path).cloned();
        self.preview_scroll = match (&content, &self.highlight) {
            (Some(content), Some(re)) => content
                .lines()
                .position(|line| re.is_match(line))
                .map(|n| n.saturating_sub(PREVIEW_CONTEXT_LINES))
                .unwrap_or(0),
            _ => 0,
        };
        self.preview_content = content;
    }

    // Reindex

    /// Rebuild the index on a background thread, then re-run the query.
    pub fn reindex(&mut self) {
        if self.reindexing.is_some() {
            return;
        }
        self.session.set_status("Reindexing...");
        self.preview_cache.clear();

        let (tx, rx) = mpsc::channel();
        let index = Arc::clone(&self.index);
        thread::spawn(move || {
            let result = index.reindex().map_err(|e| format!("{e:#}"));
            let _ = tx.send(result);
        });
        self.reindexing = Some(rx);
    }

    /// Check for background reindex completion (call this in event loop)
    pub fn poll_reindex(&mut self) {
        let Some(rx) = self.reindexing.take() else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(report)) => {
                info!(notes = report.notes, "reindexed");
                self.session
                    .set_status(format!("Index rebuilt: {} notes", report.notes));
                self.session.refresh();
            }
            Ok(Err(e)) => {
                self.session.set_status(format!("Reindex failed: {e}"));
            }
            Err(TryRecvError::Empty) => {
                self.reindexing = Some(rx);
            }
            Err(TryRecvError::Disconnected) => {
                self.session
                    .set_status("Reindex thread terminated unexpectedly");
            }
        }
    }
}

/// Expand tabs to spaces with a tab width of 4.
/// This ensures consistent rendering in the terminal where tab stops vary.
fn expand_tabs(s: &str) -> String {
    const TAB_WIDTH: usize = 4;

    let mut result = String::with_capacity(s.len());
    let mut column = 0;

    for c in s.chars() {
        match c {
            '\t' => {
                let spaces = TAB_WIDTH - (column % TAB_WIDTH);
                result.extend(std::iter::repeat_n(' ', spaces));
                column += spaces;
            }
            '\n' => {
                result.push(c);
                column = 0;
            }
            _ => {
                result.push(c);
                column += 1;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::Coordinator;
    use crate::index::{note_search, BuildOptions};
    use crate::query::QueryCompiler;
    use std::fs;
    use std::time::{Duration, Instant};

    fn wait_for_results(app: &mut App, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.results.documents.len() != count && Instant::now() < deadline {
            app.poll_session().unwrap();
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(app.results.documents.len(), count);
    }

    #[test]
    fn test_expand_tabs() {
        assert_eq!(expand_tabs("a\tb"), "a   b");
        assert_eq!(expand_tabs("\tx\n\ty"), "    x\n    y");
    }

    #[test]
    fn test_app_flow() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("apples.md"), "intro\n\nred apples are tasty\n").unwrap();
        fs::write(dir.path().join("pears.md"), "green pears\n").unwrap();
        let (index, _) = NoteIndex::build(dir.path(), BuildOptions::default()).unwrap();
        let index = Arc::new(index);

        let coordinator = Coordinator::new();
        let session = coordinator
            .start(note_search(Arc::clone(&index), QueryCompiler::interactive()))
            .unwrap();
        let mut app = App::new(index, session, String::new(), true);
        assert_eq!(app.status_text(), "2 notes indexed");

        // Empty interactive query lists everything.
        app.set_visible_rows(10);
        wait_for_results(&mut app, 2);

        for c in "appl".chars() {
            app.push_char(c);
        }
        wait_for_results(&mut app, 1);
        assert_eq!(app.selected_hit().unwrap().path, PathBuf::from("apples.md"));
        assert!(app.preview_content.as_deref().unwrap().contains("red apples"));
        assert_eq!(app.preview_scroll, 0);

        app.delete_word();
        assert!(app.query.is_empty());
        wait_for_results(&mut app, 2);

        match app.accept("ctrl-o") {
            Outcome::Accepted { key, hit } => {
                assert_eq!(key, "ctrl-o");
                assert!(hit.is_some());
            }
            Outcome::Aborted => panic!("expected acceptance"),
        }
    }
}
