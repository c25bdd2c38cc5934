//! Note discovery and loading.

use crate::index::note::NoteDocument;
use crate::utils::progress::{ProgressBar, ProgressStyle};
use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How to find and index notes.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Globs matched against paths relative to the root
    pub note_globs: Vec<String>,
    /// Memory budget for the index writer
    pub writer_memory_mb: usize,
    /// Draw progress bars on stderr
    pub show_progress: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            note_globs: vec!["*.md".to_string(), "*.markdown".to_string()],
            writer_memory_mb: 50,
            show_progress: false,
        }
    }
}

/// Summary of one (re)build.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub notes: usize,
    /// Files that matched but could not be read
    pub skipped: usize,
    pub parse_errors: Vec<(PathBuf, String)>,
    pub tag_counts: BTreeMap<String, usize>,
    pub newest: Option<(PathBuf, i64)>,
    pub oldest: Option<(PathBuf, i64)>,
    pub elapsed: Duration,
}

impl BuildReport {
    fn record(&mut self, note: &NoteDocument) {
        self.notes += 1;
        for err in &note.parse_errors {
            self.parse_errors.push((note.path.clone(), err.clone()));
        }
        for tag in &note.tags {
            *self.tag_counts.entry(tag.to_lowercase()).or_insert(0) += 1;
        }
        if let Some(ts) = note.modified {
            if self.newest.as_ref().is_none_or(|(_, t)| ts > *t) {
                self.newest = Some((note.path.clone(), ts));
            }
            if self.oldest.as_ref().is_none_or(|(_, t)| ts < *t) {
                self.oldest = Some((note.path.clone(), ts));
            }
        }
    }

    /// Tags by descending use, ties alphabetical.
    pub fn top_tags(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut tags: Vec<_> = self
            .tag_counts
            .iter()
            .map(|(tag, count)| (tag.as_str(), *count))
            .collect();
        tags.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        tags.truncate(limit);
        tags
    }
}

/// Compile note globs. Matching is case-insensitive.
pub fn note_matcher(globs: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in globs {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("Invalid note glob: {pattern}"))?;
        builder.add(glob);
    }
    builder.build().context("Failed to build note matcher")
}

/// Relative paths of every note below `root`, sorted.
///
/// Honours `.gitignore` and skips hidden files and directories.
pub fn discover_notes(root: &Path, globs: &[String]) -> Result<Vec<PathBuf>> {
    let matcher = note_matcher(globs)?;

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .require_git(false)
        .build();

    let mut paths = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if matcher.is_match(rel) {
            paths.push(rel.to_path_buf());
        }
    }

    paths.sort();
    debug!(root = %root.display(), count = paths.len(), "discovered notes");
    Ok(paths)
}

/// Read and parse notes in parallel.
pub fn load_notes(root: &Path, paths: &[PathBuf], show_progress: bool) -> (Vec<NoteDocument>, BuildReport) {
    let start = Instant::now();

    let pb = if show_progress {
        let pb = ProgressBar::new(paths.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} notes {msg}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        Some(pb)
    } else {
        None
    };

    let loaded: Vec<_> = paths
        .par_iter()
        .map(|rel| {
            let note = NoteDocument::load(root, rel).map_err(|e| (rel.clone(), e));
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            note
        })
        .collect();

    let mut report = BuildReport::default();
    let mut notes = Vec::with_capacity(loaded.len());
    for item in loaded {
        match item {
            Ok(note) => {
                report.record(&note);
                notes.push(note);
            }
            Err((path, err)) => {
                warn!(path = %path.display(), error = %err, "failed to read note");
                report.skipped += 1;
            }
        }
    }
    for (path, err) in &report.parse_errors {
        debug!(path = %path.display(), error = %err, "note header problem");
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    report.elapsed = start.elapsed();
    info!(
        notes = report.notes,
        skipped = report.skipped,
        parse_errors = report.parse_errors.len(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "loaded notes"
    );
    (notes, report)
}
