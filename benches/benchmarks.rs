//! Performance benchmarks for notefind
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use notefind::index::{BuildOptions, NoteIndex};
use notefind::query::{QueryCompiler, RecencyConfig, RecencyScorer};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const WORDS: &[&str] = &[
    "garden", "review", "planning", "tomatoes", "borrow", "checker", "meeting", "budget",
    "travel", "recipe", "coffee", "deadline", "project", "weekly", "research", "draft",
];

/// Create a notes directory with generated notes for benchmarking
fn create_benchmark_notes(count: usize) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root_path = temp_dir.path().to_path_buf();

    for i in 0..count {
        let body: Vec<&str> = (0..200).map(|j| WORDS[(i * 7 + j * 3) % WORDS.len()]).collect();
        let content = format!(
            "---\ntitle: Note {i}\ndate: 2024-01-{day:02}\ntags: [{t1}, {t2}]\n---\n{body}\n",
            day = i % 28 + 1,
            t1 = WORDS[i % WORDS.len()],
            t2 = WORDS[(i + 5) % WORDS.len()],
            body = body.join(" "),
        );
        fs::write(root_path.join(format!("note_{i}.md")), content).expect("Failed to write note");
    }

    (temp_dir, root_path)
}

fn bench_query_compile(c: &mut Criterion) {
    let queries = vec![
        "simple",
        "two words",
        "\"exact phrase\"",
        "#project review",
        "title:\"weekly review\" budget",
        "`Vec<T> iter` borrow*",
    ];

    let interactive = QueryCompiler::interactive();
    let batch = QueryCompiler::batch();

    let mut group = c.benchmark_group("query_compile");
    for query in queries {
        group.bench_with_input(BenchmarkId::new("batch", query), &query, |b, &q| {
            b.iter(|| batch.compile(black_box(q)))
        });
        group.bench_with_input(BenchmarkId::new("interactive", query), &query, |b, &q| {
            b.iter(|| interactive.compile(black_box(q)))
        });
    }
    group.finish();
}

fn bench_recency_rescore(c: &mut Criterion) {
    let scorer = RecencyScorer::at(&RecencyConfig::default(), 1_700_000_000);
    let timestamps: Vec<Option<i64>> = (0..1000)
        .map(|i| (i % 10 != 0).then_some(1_700_000_000 - i * 3_600))
        .collect();

    c.bench_function("recency_rescore_1k", |b| {
        b.iter(|| {
            timestamps
                .iter()
                .map(|ts| scorer.rescore(black_box(1.0), *ts))
                .sum::<f32>()
        })
    });
}

fn bench_search(c: &mut Criterion) {
    let (_temp_dir, root_path) = create_benchmark_notes(500);
    let (index, _) =
        NoteIndex::build(&root_path, BuildOptions::default()).expect("Failed to build index");
    let interactive = QueryCompiler::interactive();
    let batch = QueryCompiler::batch();

    let mut group = c.benchmark_group("search");

    group.bench_function("match_all", |b| {
        let query = interactive.compile("").unwrap();
        b.iter(|| index.search(black_box(&query), 50))
    });

    group.bench_function("simple_word", |b| {
        let query = batch.compile("tomatoes").unwrap();
        b.iter(|| index.search(black_box(&query), 50))
    });

    group.bench_function("phrase", |b| {
        let query = batch.compile("\"borrow checker\"").unwrap();
        b.iter(|| index.search(black_box(&query), 50))
    });

    group.bench_function("tag", |b| {
        let query = batch.compile("#project").unwrap();
        b.iter(|| index.search(black_box(&query), 50))
    });

    group.bench_function("typing_prefix", |b| {
        let query = interactive.compile("week").unwrap();
        b.iter(|| index.search(black_box(&query), 50))
    });

    group.finish();
}

fn bench_index_build(c: &mut Criterion) {
    let (_temp_dir, root_path) = create_benchmark_notes(200);

    c.bench_function("index_build_200", |b| {
        b.iter(|| NoteIndex::build(black_box(&root_path), BuildOptions::default()))
    });
}

criterion_group!(
    benches,
    bench_query_compile,
    bench_recency_rescore,
    bench_search,
    bench_index_build,
);

criterion_main!(benches);
