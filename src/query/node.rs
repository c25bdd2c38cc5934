//! Query tree produced by the parser and consumed by the engine adapter.

use super::recency::RecencyConfig;
use serde::Serialize;

/// A node of the compiled query tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryNode {
    /// Analyzed match of a single term. `field: None` means the default fields.
    MatchTerm {
        field: Option<String>,
        value: String,
        is_prefix: bool,
    },
    /// Analyzed phrase match
    MatchPhrase {
        field: Option<String>,
        phrase: String,
    },
    /// Exact, unstemmed words; all must occur, in any order
    LiteralTerms { values: Vec<String> },
    Boolean(Boolean),
    MatchAll { boost: f32 },
    MatchNone,
    /// Re-ranks whatever `base` matches by document freshness
    Recency(RecencyQuery),
}

/// Boolean combination of clauses.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Boolean {
    pub must: Vec<QueryNode>,
    pub should: Vec<QueryNode>,
    pub must_not: Vec<QueryNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecencyQuery {
    pub config: RecencyConfig,
    pub base: Box<QueryNode>,
}

impl QueryNode {
    pub fn term(value: impl Into<String>) -> Self {
        QueryNode::MatchTerm {
            field: None,
            value: value.into(),
            is_prefix: false,
        }
    }

    pub fn prefix(value: impl Into<String>) -> Self {
        QueryNode::MatchTerm {
            field: None,
            value: value.into(),
            is_prefix: true,
        }
    }

    pub fn phrase(phrase: impl Into<String>) -> Self {
        QueryNode::MatchPhrase {
            field: None,
            phrase: phrase.into(),
        }
    }

    /// Disjunction of `clauses`. Children that are themselves pure
    /// disjunctions are spliced in rather than nested.
    pub fn any_of(clauses: impl IntoIterator<Item = QueryNode>) -> Self {
        let mut merged = Boolean::default();
        for clause in clauses {
            match clause {
                QueryNode::Boolean(inner) if inner.is_disjunction() => {
                    merged.should.extend(inner.should);
                }
                other => merged.should.push(other),
            }
        }
        QueryNode::Boolean(merged)
    }

    /// Wrap in a recency re-ranking node.
    pub fn with_recency(self, config: RecencyConfig) -> Self {
        QueryNode::Recency(RecencyQuery {
            config,
            base: Box::new(self),
        })
    }

    /// Re-target a term or phrase match onto `field`.
    ///
    /// # Panics
    ///
    /// Panics for any other node kind. The grammar only ever scopes terms
    /// and phrases, so reaching the panic means a bug in the caller.
    pub fn scoped_to(self, field: impl Into<String>) -> Self {
        let field = field.into();
        match self {
            QueryNode::MatchTerm {
                value, is_prefix, ..
            } => QueryNode::MatchTerm {
                field: Some(field),
                value,
                is_prefix,
            },
            QueryNode::MatchPhrase { phrase, .. } => QueryNode::MatchPhrase {
                field: Some(field),
                phrase,
            },
            other => panic!("cannot scope {other:?} to field {field:?}"),
        }
    }

    /// Number of nodes in the tree, including this one.
    pub fn node_count(&self) -> usize {
        match self {
            QueryNode::Boolean(b) => {
                1 + b
                    .must
                    .iter()
                    .chain(&b.should)
                    .chain(&b.must_not)
                    .map(QueryNode::node_count)
                    .sum::<usize>()
            }
            QueryNode::Recency(r) => 1 + r.base.node_count(),
            _ => 1,
        }
    }
}

impl Boolean {
    /// True when only `should` clauses are present.
    pub fn is_disjunction(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.should.is_empty() && self.must_not.is_empty()
    }
}
