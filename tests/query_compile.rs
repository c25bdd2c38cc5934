//! Compiled query shapes seen through the public API.

use notefind::query::{QueryCompiler, QueryNode, RecencyConfig, RecencyScorer};
use std::time::Duration;

/// Strip the outer recency node and return the top-level disjunction.
fn top_level(query: &str) -> Vec<QueryNode> {
    let node = QueryCompiler::batch().compile(query).unwrap();
    let QueryNode::Recency(recency) = node else {
        panic!("expected recency at the top of {query:?}");
    };
    match *recency.base {
        QueryNode::Boolean(b) => {
            assert!(b.must.is_empty(), "{query:?} has mandatory clauses");
            assert!(b.must_not.is_empty());
            b.should
        }
        other => panic!("expected disjunction for {query:?}, got {other:?}"),
    }
}

/// Clauses other than the batch fallback.
fn clauses(query: &str) -> Vec<QueryNode> {
    let mut should = top_level(query);
    assert_eq!(should.pop(), Some(QueryNode::MatchNone));
    should
}

#[test]
fn test_single_term() {
    assert_eq!(clauses("foo"), vec![QueryNode::term("foo")]);
}

#[test]
fn test_field_scoped_term() {
    assert_eq!(
        clauses("field:foo"),
        vec![QueryNode::MatchTerm {
            field: Some("field".into()),
            value: "foo".into(),
            is_prefix: false,
        }]
    );
}

#[test]
fn test_bare_terms_are_or_by_default() {
    // Both words are optional. Multi-word queries rank by how many words
    // match rather than requiring all of them.
    assert_eq!(
        clauses("foo bar"),
        vec![QueryNode::term("foo"), QueryNode::term("bar")]
    );
}

#[test]
fn test_phrase() {
    assert_eq!(clauses("\"foo bar\""), vec![QueryNode::phrase("foo bar")]);
}

#[test]
fn test_literal_terms() {
    assert_eq!(
        clauses("`literal text`"),
        vec![QueryNode::LiteralTerms {
            values: vec!["literal".into(), "text".into()],
        }]
    );
}

#[test]
fn test_tag_shorthand() {
    assert_eq!(
        clauses("#tag"),
        vec![QueryNode::term("tag").scoped_to("tags")]
    );
}

#[test]
fn test_mixed_query_stays_flat() {
    let found = clauses("#work \"weekly review\" title:plan `Vec<T>` budget");
    assert_eq!(found.len(), 5);
    assert!(found.iter().all(|n| !matches!(n, QueryNode::Boolean(_))));
}

#[test]
fn test_compile_twice_is_identical() {
    let queries = [
        "",
        "foo",
        "foo bar",
        "title:\"a b\" #x `c d`",
        "esc\\:aped te\\\"xt",
        "naïve café ünïcode",
    ];
    for compiler in [QueryCompiler::batch(), QueryCompiler::interactive()] {
        for q in queries {
            assert_eq!(compiler.compile(q), compiler.compile(q), "query {q:?}");
        }
    }
}

#[test]
fn test_unbalanced_delimiters_are_errors() {
    for q in ["\"open phrase", "`open literal", "title:"] {
        assert!(QueryCompiler::batch().compile(q).is_err(), "query {q:?}");
        assert!(QueryCompiler::interactive().compile(q).is_err(), "query {q:?}");
    }
}

#[test]
fn test_recency_decay_curve() {
    let config = RecencyConfig {
        field: "modified".into(),
        half_life: Duration::from_secs(3600),
        boost: 0.5,
    };
    let scorer = RecencyScorer::at(&config, 1_000_000);

    assert_eq!(scorer.decay(0.0), 1.0);
    assert!((scorer.decay(3600.0) - 0.5).abs() < 1e-6);
    assert!((scorer.decay(7200.0) - 0.25).abs() < 1e-6);
    assert!(scorer.decay(3600.0 * 200.0) < 1e-9);
}

#[test]
fn test_blended_score_is_bounded() {
    let config = RecencyConfig {
        field: "modified".into(),
        half_life: Duration::from_secs(3600),
        boost: 0.5,
    };
    let now = 1_000_000;
    let scorer = RecencyScorer::at(&config, now);

    for base in [0.0f32, 0.3, 1.0, 7.5] {
        let lower = base / 1.5;
        let upper = (base + 0.5) / 1.5;
        for ts in [Some(now), Some(now - 1800), Some(now - 86400), Some(0), None] {
            let score = scorer.rescore(base, ts);
            assert!(score >= lower - 1e-6 && score <= upper + 1e-6, "base {base} ts {ts:?}");
        }
        assert!((scorer.rescore(base, Some(now)) - upper).abs() < 1e-6);
        assert!((scorer.rescore(base, None) - lower).abs() < 1e-6);
    }
}
