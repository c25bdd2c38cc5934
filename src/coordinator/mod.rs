//! Search-as-you-type coordination.
//!
//! A [`Session`] owns one worker thread. The UI submits a request on every
//! edit; requests go through a single-slot [`Mailbox`], so while a search
//! runs only the newest edit waits behind it. The worker runs one search
//! at a time and sends results back over a channel that the UI thread
//! drains. Results therefore arrive in submission order and never for a
//! query older than one already shown.
//!
//! Stopping a session does not interrupt a search already running. That
//! search completes and its result is dropped.

pub mod mailbox;
pub mod status;

pub use mailbox::Mailbox;
pub use status::{DisplayedResults, StatusLine};

use crate::error::{BackendError, SearchError};
use crate::query::ParseError;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// One search to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    /// Number of documents the UI can show right now
    pub desired_count: usize,
}

/// Outcome of one search.
#[derive(Debug, Clone)]
pub struct SearchResult<D> {
    pub documents: Vec<D>,
    pub total_candidates: u64,
    /// Set when the query did not compile. The UI keeps showing the
    /// previous documents.
    pub query_error: Option<ParseError>,
    /// Replaces the shared status line while this result is shown
    pub status_override: Option<String>,
}

impl<D> SearchResult<D> {
    pub fn new(documents: Vec<D>, total_candidates: u64) -> Self {
        Self {
            documents,
            total_candidates,
            query_error: None,
            status_override: None,
        }
    }

    pub fn query_error(err: ParseError) -> Self {
        Self {
            documents: Vec::new(),
            total_candidates: 0,
            query_error: Some(err),
            status_override: None,
        }
    }
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    Searching = 1,
    Error = 2,
    Stopped = 3,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => SessionState::Idle,
            1 => SessionState::Searching,
            2 => SessionState::Error,
            _ => SessionState::Stopped,
        }
    }
}

/// Message from the worker to the UI thread.
#[derive(Debug)]
pub enum SessionEvent<D> {
    Results(SearchResult<D>),
    /// The backend failed; the session is over.
    Failed(BackendError),
}

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("attempt to perform interactive search concurrently")]
    SessionActive,

    #[error("failed to spawn search worker: {0}")]
    Spawn(#[from] io::Error),
}

/// Hands out sessions, at most one at a time.
#[derive(Debug, Default)]
pub struct Coordinator {
    active: Arc<AtomicBool>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a session from this coordinator is alive.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Start a session whose worker runs `search` for each request.
    ///
    /// `search` is only ever called from the worker thread, one call at a
    /// time. Fails immediately if another session is still alive.
    pub fn start<D, F>(&self, search: F) -> Result<Session<D>, CoordinatorError>
    where
        D: Send + 'static,
        F: FnMut(&SearchRequest) -> Result<SearchResult<D>, SearchError> + Send + 'static,
    {
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CoordinatorError::SessionActive);
        }
        let guard = ActiveGuard(Arc::clone(&self.active));

        let handle = SessionHandle {
            mailbox: Arc::new(Mailbox::new()),
            last: Arc::new(Mutex::new(None)),
            state: Arc::new(AtomicU8::new(SessionState::Idle as u8)),
            status: StatusLine::new(),
        };
        let (tx, rx) = mpsc::channel();

        let worker = Worker {
            mailbox: Arc::clone(&handle.mailbox),
            state: Arc::clone(&handle.state),
            events: tx,
        };
        thread::Builder::new()
            .name("search-worker".to_string())
            .spawn(move || worker.run(search))?;

        info!("search session started");
        Ok(Session {
            handle,
            events: rx,
            _guard: guard,
        })
    }
}

/// Clears the coordinator's active flag when the session goes away.
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Cloneable control surface of a session, usable from any thread.
#[derive(Clone)]
pub struct SessionHandle {
    mailbox: Arc<Mailbox<SearchRequest>>,
    last: Arc<Mutex<Option<SearchRequest>>>,
    state: Arc<AtomicU8>,
    status: StatusLine,
}

impl SessionHandle {
    /// Queue a search, replacing any request the worker has not picked up.
    pub fn submit(&self, query: impl Into<String>, desired_count: usize) {
        let request = SearchRequest {
            query: query.into(),
            desired_count,
        };
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(request.clone());
        if let Some(dropped) = self.mailbox.put(request) {
            debug!(query = %dropped.query, "superseded pending search");
        }
    }

    /// Re-submit the most recent request. Returns false if nothing was
    /// ever submitted.
    pub fn refresh(&self) -> bool {
        let last = self
            .last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match last {
            Some(request) => {
                self.mailbox.put(request);
                true
            }
            None => false,
        }
    }

    /// End the session. A search already running completes but its result
    /// is discarded.
    pub fn stop(&self) {
        self.mailbox.close();
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| {
                (s != SessionState::Error as u8).then_some(SessionState::Stopped as u8)
            });
    }

    pub fn set_status(&self, text: impl Into<String>) {
        self.status.set(text);
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }
}

/// A running interactive session. Dropping it stops the worker.
pub struct Session<D> {
    handle: SessionHandle,
    events: Receiver<SessionEvent<D>>,
    _guard: ActiveGuard,
}

impl<D> Session<D> {
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn submit(&self, query: impl Into<String>, desired_count: usize) {
        self.handle.submit(query, desired_count);
    }

    pub fn refresh(&self) -> bool {
        self.handle.refresh()
    }

    pub fn stop(&self) {
        self.handle.stop();
    }

    pub fn set_status(&self, text: impl Into<String>) {
        self.handle.set_status(text);
    }

    pub fn status(&self) -> &StatusLine {
        self.handle.status()
    }

    pub fn state(&self) -> SessionState {
        self.handle.state()
    }

    /// Next delivered event, without blocking. Nothing is delivered once
    /// the session is stopped.
    pub fn try_event(&self) -> Option<SessionEvent<D>> {
        if self.state() == SessionState::Stopped {
            return None;
        }
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for the next event.
    pub fn wait_event(&self, timeout: Duration) -> Option<SessionEvent<D>> {
        if self.state() == SessionState::Stopped {
            return None;
        }
        match self.events.recv_timeout(timeout) {
            Ok(event) if self.state() != SessionState::Stopped => Some(event),
            Ok(_) => None,
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// All events delivered so far.
    pub fn drain(&self) -> Vec<SessionEvent<D>> {
        std::iter::from_fn(|| self.try_event()).collect()
    }
}

impl<D> Drop for Session<D> {
    fn drop(&mut self) {
        self.handle.stop();
        debug!("search session dropped");
    }
}

struct Worker<D> {
    mailbox: Arc<Mailbox<SearchRequest>>,
    state: Arc<AtomicU8>,
    events: Sender<SessionEvent<D>>,
}

impl<D> Worker<D> {
    fn run<F>(self, mut search: F)
    where
        F: FnMut(&SearchRequest) -> Result<SearchResult<D>, SearchError>,
    {
        while let Some(request) = self.mailbox.take() {
            if !self.transition(SessionState::Idle, SessionState::Searching) {
                break;
            }

            let start = Instant::now();
            let outcome = search(&request);
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

            if self.mailbox.is_closed() {
                debug!(query = %request.query, "session stopped, discarding result");
                break;
            }

            let event = match outcome {
                Ok(result) => {
                    debug!(
                        query = %request.query,
                        count = result.documents.len(),
                        elapsed_ms,
                        "search finished"
                    );
                    self.transition(SessionState::Searching, SessionState::Idle);
                    SessionEvent::Results(result)
                }
                Err(SearchError::Query(err)) => {
                    debug!(query = %request.query, error = %err, "query did not compile");
                    self.transition(SessionState::Searching, SessionState::Idle);
                    SessionEvent::Results(SearchResult::query_error(err))
                }
                Err(SearchError::Backend(err)) => {
                    warn!(query = %request.query, error = %err, "search backend failed");
                    self.transition(SessionState::Searching, SessionState::Error);
                    self.mailbox.close();
                    let _ = self.events.send(SessionEvent::Failed(err));
                    break;
                }
            };

            if self.events.send(event).is_err() {
                break;
            }
        }
        debug!("search worker exiting");
    }

    fn transition(&self, from: SessionState, to: SessionState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
