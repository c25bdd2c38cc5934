//! Shared status text and the UI-side view of the latest results.

use super::SearchResult;
use crate::query::ParseError;
use std::sync::{Arc, PoisonError, RwLock};

/// Free-text status message readable and writable from any thread.
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    text: Arc<RwLock<String>>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, text: impl Into<String>) {
        *self.text.write().unwrap_or_else(PoisonError::into_inner) = text.into();
    }

    pub fn get(&self) -> String {
        self.text
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// What the UI currently shows. Owned by the UI thread.
#[derive(Debug, Clone)]
pub struct DisplayedResults<D> {
    pub documents: Vec<D>,
    pub total_candidates: u64,
    pub query_error: Option<ParseError>,
    pub status_override: Option<String>,
}

impl<D> Default for DisplayedResults<D> {
    fn default() -> Self {
        Self {
            documents: Vec::new(),
            total_candidates: 0,
            query_error: None,
            status_override: None,
        }
    }
}

impl<D> DisplayedResults<D> {
    /// Apply a delivered result. A result carrying a query error only
    /// records the error; the previous documents stay on screen.
    pub fn apply(&mut self, result: SearchResult<D>) {
        if let Some(err) = result.query_error {
            self.query_error = Some(err);
            return;
        }
        self.documents = result.documents;
        self.total_candidates = result.total_candidates;
        self.status_override = result.status_override;
        self.query_error = None;
    }

    /// Text for the status bar: query error, then the result's own
    /// status, then the shared status line.
    pub fn status_text(&self, line: &StatusLine) -> String {
        if let Some(err) = &self.query_error {
            return err.to_string();
        }
        if let Some(status) = &self.status_override {
            return status.clone();
        }
        line.get()
    }
}
