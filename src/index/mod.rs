//! Note indexing on top of tantivy.
//!
//! - [`note`] - markdown loading and front matter
//! - [`build`] - directory walk and parallel parsing
//! - [`schema`] - field layout and analyzers
//! - [`store`] - the in-memory [`NoteIndex`]
//! - [`executor`] - query translation and top-N search
//! - [`recency`] - the recency re-ranking query

pub mod build;
pub mod executor;
pub mod note;
pub mod recency;
pub mod schema;
pub mod stats;
pub mod store;

pub use build::{BuildOptions, BuildReport};
pub use executor::{note_search, NoteHit, QueryTranslator};
pub use note::NoteDocument;
pub use schema::NoteSchema;
pub use store::NoteIndex;
