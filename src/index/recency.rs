//! Recency overlay as a tantivy query.
//!
//! [`RecencyQuery`] wraps another query. It matches exactly the documents
//! the wrapped query matches and only rewrites their scores, reading the
//! newest value of a date fast field for each matched document.

use crate::query::{RecencyConfig, RecencyScorer};
use tantivy::query::{EnableScoring, Explanation, Query, QueryClone, Scorer, Weight};
use tantivy::{DocId, DocSet, Score, SegmentReader, TantivyError, Term};
use tracing::debug;

type NewestDate = Box<dyn Fn(DocId) -> Option<i64> + Send>;

#[derive(Debug)]
pub struct RecencyQuery {
    base: Box<dyn Query>,
    field: String,
    scorer: RecencyScorer,
}

impl RecencyQuery {
    /// Wrap `base`. The current time is fixed here, once per search.
    pub fn new(base: Box<dyn Query>, config: &RecencyConfig) -> Self {
        Self {
            base,
            field: config.field.clone(),
            scorer: RecencyScorer::new(config),
        }
    }
}

impl Clone for RecencyQuery {
    fn clone(&self) -> Self {
        Self {
            base: self.base.box_clone(),
            field: self.field.clone(),
            scorer: self.scorer.clone(),
        }
    }
}

impl Query for RecencyQuery {
    fn weight(&self, enable_scoring: EnableScoring<'_>) -> tantivy::Result<Box<dyn Weight>> {
        let base = self.base.weight(enable_scoring)?;
        Ok(Box::new(RecencyWeight {
            base,
            field: self.field.clone(),
            scorer: self.scorer.clone(),
        }))
    }

    fn query_terms<'a>(&'a self, visitor: &mut dyn FnMut(&'a Term, bool)) {
        self.base.query_terms(visitor);
    }
}

struct RecencyWeight {
    base: Box<dyn Weight>,
    field: String,
    scorer: RecencyScorer,
}

impl RecencyWeight {
    fn newest_date(&self, reader: &SegmentReader) -> NewestDate {
        match reader.fast_fields().date(&self.field) {
            Ok(column) => Box::new(move |doc| {
                column
                    .values_for_doc(doc)
                    .map(|d| d.into_timestamp_secs())
                    .max()
            }),
            Err(err) => {
                debug!(field = %self.field, error = %err, "no date column, recency decay is 0");
                Box::new(|_| None)
            }
        }
    }
}

impl Weight for RecencyWeight {
    fn scorer(&self, reader: &SegmentReader, boost: Score) -> tantivy::Result<Box<dyn Scorer>> {
        Ok(Box::new(RecencyDocScorer {
            base: self.base.scorer(reader, boost)?,
            newest: self.newest_date(reader),
            scorer: self.scorer.clone(),
        }))
    }

    fn explain(&self, reader: &SegmentReader, doc: DocId) -> tantivy::Result<Explanation> {
        let mut scorer = self.scorer(reader, 1.0)?;
        if scorer.seek(doc) != doc {
            return Err(TantivyError::InvalidArgument(format!(
                "document #{doc} does not match"
            )));
        }

        let timestamp = self.newest_date(reader)(doc);
        let mut explanation = Explanation::new("recency blend", scorer.score());
        explanation.add_detail(self.base.explain(reader, doc)?);
        explanation.add_detail(Explanation::new_with_string(
            format!("decay of {} ({timestamp:?})", self.field),
            self.scorer.decay_at(timestamp),
        ));
        Ok(explanation)
    }
}

struct RecencyDocScorer {
    base: Box<dyn Scorer>,
    newest: NewestDate,
    scorer: RecencyScorer,
}

impl DocSet for RecencyDocScorer {
    fn advance(&mut self) -> DocId {
        self.base.advance()
    }

    fn seek(&mut self, target: DocId) -> DocId {
        self.base.seek(target)
    }

    fn doc(&self) -> DocId {
        self.base.doc()
    }

    fn size_hint(&self) -> u32 {
        self.base.size_hint()
    }
}

impl Scorer for RecencyDocScorer {
    fn score(&mut self) -> Score {
        let base = self.base.score();
        let timestamp = (self.newest)(self.base.doc());
        self.scorer.rescore(base, timestamp)
    }
}
