//! Query execution against the note index.
//!
//! [`QueryTranslator`] lowers a compiled [`QueryNode`] into tantivy queries.
//! Terms go through the analyzer of the field they target, so a query for
//! `Running` finds notes containing `runs`.

use crate::coordinator::{SearchRequest, SearchResult};
use crate::error::{BackendError, SearchError};
use crate::index::recency::RecencyQuery;
use crate::index::schema::{NoteSchema, KEYWORD_TOKENIZER};
use crate::index::store::NoteIndex;
use crate::query::{Boolean, QueryCompiler, QueryNode};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tantivy::collector::TopDocs;
use tantivy::query::{
    AllQuery, BooleanQuery, BoostQuery, EmptyQuery, Occur, PhraseQuery, Query, RegexQuery,
    TermQuery,
};
use tantivy::schema::{Field, FieldType, IndexRecordOption, Value};
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, TantivyDocument, Term};
use tracing::{debug, trace};

/// One matching note.
#[derive(Debug, Clone, Serialize)]
pub struct NoteHit {
    pub path: PathBuf,
    pub title: String,
    pub tags: Vec<String>,
    /// Unix seconds
    pub modified: Option<i64>,
    pub score: f32,
}

impl NoteHit {
    fn from_doc(schema: &NoteSchema, doc: &TantivyDocument, score: f32) -> Self {
        let text = |field: Field| {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        Self {
            path: PathBuf::from(text(schema.filename)),
            title: text(schema.title),
            tags: doc
                .get_all(schema.tags)
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect(),
            modified: doc
                .get_first(schema.modified)
                .and_then(|v| v.as_datetime())
                .map(|d| d.into_timestamp_secs()),
            score,
        }
    }
}

/// How a text field is indexed, as far as translation cares.
struct TextField {
    field: Field,
    keyword: bool,
    positions: bool,
}

/// Lowers [`QueryNode`] trees to tantivy queries for one index.
pub struct QueryTranslator<'a> {
    index: &'a Index,
    schema: &'a NoteSchema,
}

impl<'a> QueryTranslator<'a> {
    pub fn new(index: &'a Index, schema: &'a NoteSchema) -> Self {
        Self { index, schema }
    }

    pub fn translate(&self, node: &QueryNode) -> Box<dyn Query> {
        match node {
            QueryNode::MatchTerm {
                field,
                value,
                is_prefix,
            } => self.match_term(field.as_deref(), value, *is_prefix),
            QueryNode::MatchPhrase { field, phrase } => self.match_phrase(field.as_deref(), phrase),
            QueryNode::LiteralTerms { values } => self.literal_terms(values),
            QueryNode::Boolean(boolean) => self.boolean(boolean),
            QueryNode::MatchAll { boost } => Box::new(BoostQuery::new(Box::new(AllQuery), *boost)),
            QueryNode::MatchNone => Box::new(EmptyQuery),
            QueryNode::Recency(recency) => Box::new(RecencyQuery::new(
                self.translate(&recency.base),
                &recency.config,
            )),
        }
    }

    fn boolean(&self, boolean: &Boolean) -> Box<dyn Query> {
        if boolean.is_empty() {
            return Box::new(EmptyQuery);
        }
        let mut clauses = Vec::new();
        for (occur, nodes) in [
            (Occur::Must, &boolean.must),
            (Occur::Should, &boolean.should),
            (Occur::MustNot, &boolean.must_not),
        ] {
            clauses.extend(nodes.iter().map(|n| (occur, self.translate(n))));
        }
        // Unwrap a single positive clause.
        if clauses.len() == 1 && clauses[0].0 != Occur::MustNot {
            return clauses.pop().map(|(_, q)| q).unwrap_or_else(|| Box::new(EmptyQuery));
        }
        Box::new(BooleanQuery::new(clauses))
    }

    fn match_term(&self, field: Option<&str>, value: &str, is_prefix: bool) -> Box<dyn Query> {
        let targets = self.targets(field);
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        for target in &targets {
            for term in self.analyze(target.field, value) {
                clauses.push((Occur::Should, Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs))));
            }
        }

        if is_prefix {
            // Stemming loses word endings, so prefixes run against the
            // unstemmed copy of a field when there is one.
            for target in &targets {
                let exact = self.schema.exact_copy(target.field).and_then(|f| self.text_field(f));
                let target = exact.as_ref().unwrap_or(target);
                if let Some(query) = prefix_query(target, value) {
                    clauses.push((Occur::Should, query));
                }
            }
        }

        disjunction(clauses)
    }

    fn match_phrase(&self, field: Option<&str>, phrase: &str) -> Box<dyn Query> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for target in self.targets(field) {
            let mut terms = self.analyze(target.field, phrase);
            let query: Box<dyn Query> = match terms.len() {
                0 => continue,
                1 => match terms.pop() {
                    Some(term) => Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)),
                    None => continue,
                },
                _ if target.positions => Box::new(PhraseQuery::new(terms)),
                _ => {
                    trace!(field = ?target.field, "no positions, phrase becomes conjunction");
                    conjunction(terms)
                }
            };
            clauses.push((Occur::Should, query));
        }
        disjunction(clauses)
    }

    fn literal_terms(&self, values: &[String]) -> Box<dyn Query> {
        let field = self.schema.content_exact;
        let terms: Vec<Term> = values
            .iter()
            .flat_map(|v| self.analyze(field, &v.to_lowercase()))
            .collect();
        if terms.is_empty() {
            return Box::new(EmptyQuery);
        }
        conjunction(terms)
    }

    /// Fields a term or phrase applies to. Unknown and non-text fields
    /// yield nothing.
    fn targets(&self, field: Option<&str>) -> Vec<TextField> {
        let fields = match field {
            None => self.schema.default_fields().to_vec(),
            Some(name) => match self.schema.field(name) {
                Some(field) => vec![field],
                None => {
                    debug!(field = name, "unknown field, matching nothing");
                    return Vec::new();
                }
            },
        };
        fields
            .into_iter()
            .filter_map(|f| {
                let text = self.text_field(f);
                if text.is_none() {
                    debug!(field = ?f, "field is not searchable text, matching nothing");
                }
                text
            })
            .collect()
    }

    fn text_field(&self, field: Field) -> Option<TextField> {
        let FieldType::Str(options) = self.schema.schema.get_field_entry(field).field_type() else {
            return None;
        };
        let indexing = options.get_indexing_options()?;
        Some(TextField {
            field,
            keyword: indexing.tokenizer() == KEYWORD_TOKENIZER,
            positions: indexing.index_option().has_positions(),
        })
    }

    fn analyze(&self, field: Field, text: &str) -> Vec<Term> {
        let mut analyzer = match self.index.tokenizer_for_field(field) {
            Ok(analyzer) => analyzer,
            Err(err) => {
                debug!(field = ?field, error = %err, "no analyzer");
                return Vec::new();
            }
        };
        let mut stream = analyzer.token_stream(text);
        let mut terms = Vec::new();
        while stream.advance() {
            terms.push(Term::from_field_text(field, &stream.token().text));
        }
        terms
    }
}

/// Regex prefix match on the raw lowercased value. Tokenized fields only
/// see the last word of it.
fn prefix_query(target: &TextField, value: &str) -> Option<Box<dyn Query>> {
    let lower = value.to_lowercase();
    let stem = if target.keyword {
        lower.as_str()
    } else {
        lower
            .rsplit(|c: char| !c.is_alphanumeric())
            .find(|w| !w.is_empty())?
    };
    if stem.is_empty() {
        return None;
    }
    let pattern = format!("{}.*", regex::escape(stem));
    match RegexQuery::from_pattern(&pattern, target.field) {
        Ok(query) => Some(Box::new(query)),
        Err(err) => {
            debug!(pattern, error = %err, "prefix pattern rejected");
            None
        }
    }
}

fn disjunction(mut clauses: Vec<(Occur, Box<dyn Query>)>) -> Box<dyn Query> {
    match clauses.len() {
        0 => Box::new(EmptyQuery),
        1 => clauses.pop().map(|(_, q)| q).unwrap_or_else(|| Box::new(EmptyQuery)),
        _ => Box::new(BooleanQuery::new(clauses)),
    }
}

fn conjunction(terms: Vec<Term>) -> Box<dyn Query> {
    let clauses = terms
        .into_iter()
        .map(|t| {
            let q: Box<dyn Query> = Box::new(TermQuery::new(t, IndexRecordOption::WithFreqs));
            (Occur::Must, q)
        })
        .collect();
    Box::new(BooleanQuery::new(clauses))
}

impl NoteIndex {
    /// Run a compiled query and return the best `limit` notes.
    ///
    /// `total_candidates` is the number of indexed notes.
    pub fn search(&self, node: &QueryNode, limit: usize) -> Result<SearchResult<NoteHit>, BackendError> {
        let start = Instant::now();
        let searcher = self.searcher();
        let total = searcher.num_docs();
        // The collector allocates for `limit`; never ask for more than exists.
        let limit = limit.min(usize::try_from(total).unwrap_or(usize::MAX));

        let mut result = if limit == 0 {
            SearchResult::new(Vec::new(), total)
        } else {
            let query = QueryTranslator::new(self.index(), self.schema()).translate(node);
            let top = searcher.search(&*query, &TopDocs::with_limit(limit))?;

            let mut hits = Vec::with_capacity(top.len());
            for (score, address) in top {
                let doc: TantivyDocument = searcher.doc(address)?;
                hits.push(NoteHit::from_doc(self.schema(), &doc, score));
            }
            SearchResult::new(hits, total)
        };

        if total == 0 {
            result.status_override = Some(format!("no notes under {}", self.root().display()));
        }
        debug!(
            hits = result.documents.len(),
            total,
            limit,
            elapsed_us = start.elapsed().as_micros() as u64,
            "search"
        );
        Ok(result)
    }
}

/// Search callback for a [`crate::coordinator::Session`] over `index`.
pub fn note_search(
    index: Arc<NoteIndex>,
    compiler: QueryCompiler,
) -> impl FnMut(&SearchRequest) -> Result<SearchResult<NoteHit>, SearchError> + Send + 'static {
    move |request| {
        let node = compiler.compile(&request.query)?;
        Ok(index.search(&node, request.desired_count)?)
    }
}
