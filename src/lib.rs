//! # notefind - search-as-you-type for markdown notes
//!
//! notefind indexes a directory of markdown notes in memory and searches it
//! with a small query language, re-ranking results so that recently edited
//! notes float up.
//!
//! ## Architecture
//!
//! - [`query`] - Lexer, parser, query tree, interactive/batch compilation and
//!   recency math
//! - [`index`] - Note loading, tantivy schema, query translation and search
//! - [`coordinator`] - Search-as-you-type sessions: one worker, newest query
//!   wins
//! - [`tui`] - Interactive terminal UI (feature `interactive`)
//! - [`output`] - Batch result printing
//! - [`new_note`] - Creating notes from templates
//! - [`utils`] - Configuration, logging and progress bars
//!
//! ## Quick Start
//!
//! ```no_run
//! use notefind::index::{BuildOptions, NoteIndex};
//! use notefind::query::QueryCompiler;
//!
//! let (index, _report) = NoteIndex::build("/path/to/notes", BuildOptions::default()).unwrap();
//! let query = QueryCompiler::batch().compile("#project \"weekly review\"").unwrap();
//! let result = index.search(&query, 20).unwrap();
//!
//! for hit in result.documents {
//!     println!("{} {:.3}", hit.path.display(), hit.score);
//! }
//! ```
//!
//! ## Query syntax
//!
//! Bare words match title and content with English stemming and are OR'ed
//! together. `"quoted phrases"` must appear in order, `` `literal words` ``
//! must all appear unstemmed, `field:value` targets one field and `#tag`
//! is shorthand for `tags:tag`. A trailing `*` makes a word a prefix.

pub mod coordinator;
pub mod error;
pub mod index;
pub mod new_note;
pub mod output;
pub mod query;
#[cfg(feature = "interactive")]
pub mod tui;
pub mod utils;
