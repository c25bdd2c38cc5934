//! Turns raw query text into the final tree handed to the engine.
//!
//! On top of [`parse_query`] this adds the fallback clause, the
//! type-ahead prefix rewrite for interactive use, and the outer recency
//! node.

use super::node::QueryNode;
use super::parser::{ParseError, parse_query};
use super::recency::RecencyConfig;

/// Base score given to every document when nothing has been typed yet
pub const MATCH_ALL_BOOST: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileMode {
    /// Search-as-you-type: an empty query lists everything and the last
    /// word is completed as a prefix.
    Interactive,
    /// One-shot: an empty query matches nothing.
    Batch,
}

#[derive(Debug, Clone)]
pub struct QueryCompiler {
    mode: CompileMode,
    recency: RecencyConfig,
}

impl QueryCompiler {
    pub fn new(mode: CompileMode, recency: RecencyConfig) -> Self {
        Self { mode, recency }
    }

    pub fn interactive() -> Self {
        Self::new(CompileMode::Interactive, RecencyConfig::default())
    }

    pub fn batch() -> Self {
        Self::new(CompileMode::Batch, RecencyConfig::default())
    }

    /// Compile `query`. The result is always a recency node wrapping either
    /// the fallback match (empty query) or a disjunction of the parsed
    /// clauses and the fallback.
    pub fn compile(&self, query: &str) -> Result<QueryNode, ParseError> {
        let fallback = self.fallback(query);

        let base = if query.trim().is_empty() {
            fallback
        } else {
            let text = match self.mode {
                CompileMode::Interactive => with_prefix_marker(query),
                CompileMode::Batch => query.to_string(),
            };
            let parsed = parse_query(&text)?;
            QueryNode::any_of([parsed, fallback])
        };

        Ok(base.with_recency(self.recency.clone()))
    }

    fn fallback(&self, query: &str) -> QueryNode {
        match self.mode {
            CompileMode::Interactive if query.trim().is_empty() => QueryNode::MatchAll {
                boost: MATCH_ALL_BOOST,
            },
            _ => QueryNode::MatchNone,
        }
    }
}

/// Append `*` when the query ends in a word character so the last term
/// matches as a prefix while it is still being typed.
pub fn with_prefix_marker(query: &str) -> String {
    let ends_in_word = query
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric() || c == '_');
    if ends_in_word {
        format!("{query}*")
    } else {
        query.to_string()
    }
}
