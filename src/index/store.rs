//! The in-memory note index.

use crate::error::BackendError;
use crate::index::build::{discover_notes, load_notes, BuildOptions, BuildReport};
use crate::index::note::NoteDocument;
use crate::index::schema::{register_tokenizers, NoteSchema};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tantivy::{DateTime, Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument};
use tracing::{debug, info, warn};

/// Notes below one root directory, indexed with tantivy.
///
/// Safe to share between the UI thread, the search worker and a reindex
/// thread: searches use reader snapshots and writes go through one writer.
pub struct NoteIndex {
    root: PathBuf,
    options: BuildOptions,
    schema: NoteSchema,
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
}

impl NoteIndex {
    /// An empty index for notes below `root`.
    pub fn create(root: impl Into<PathBuf>, options: BuildOptions) -> Result<Self, BackendError> {
        let schema = NoteSchema::new();
        let index = Index::create_in_ram(schema.schema.clone());
        register_tokenizers(&index);

        let writer = index.writer(options.writer_memory_mb.max(15) * 1_000_000)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(Self {
            root: root.into(),
            options,
            schema,
            index,
            reader,
            writer: Mutex::new(writer),
        })
    }

    /// Walk `root`, index every note and return the index with its report.
    pub fn build(root: impl Into<PathBuf>, options: BuildOptions) -> Result<(Self, BuildReport)> {
        let index = Self::create(root, options).context("Failed to create note index")?;
        let report = index.reindex()?;
        Ok((index, report))
    }

    /// Drop everything and index the notes on disk again.
    pub fn reindex(&self) -> Result<BuildReport> {
        let paths = discover_notes(&self.root, &self.options.note_globs)?;
        let (notes, report) = load_notes(&self.root, &paths, self.options.show_progress);

        self.write(|writer| {
            writer.delete_all_documents()?;
            for note in &notes {
                writer.add_document(self.to_document(note))?;
            }
            Ok(())
        })
        .context("Failed to rebuild note index")?;

        self.reader.reload().context("Failed to reload note index")?;
        info!(root = %self.root.display(), notes = report.notes, "index ready");
        Ok(report)
    }

    /// Add notes on top of what is indexed and make them searchable.
    pub fn add_notes(&self, notes: &[NoteDocument]) -> Result<(), BackendError> {
        self.write(|writer| {
            for note in notes {
                writer.add_document(self.to_document(note))?;
            }
            Ok(())
        })?;

        self.reader.reload()?;
        debug!(count = notes.len(), "added notes");
        Ok(())
    }

    /// Apply `ops` and commit. On failure the pending operations are rolled
    /// back so a later commit cannot pick them up.
    fn write<F>(&self, ops: F) -> tantivy::Result<()>
    where
        F: FnOnce(&mut IndexWriter) -> tantivy::Result<()>,
    {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let outcome = ops(&mut *writer).and_then(|()| writer.commit().map(drop));
        if let Err(err) = &outcome {
            warn!(error = %err, "index write failed, rolling back");
            if let Err(rollback) = writer.rollback() {
                warn!(error = %rollback, "rollback failed");
            }
        }
        outcome
    }

    fn to_document(&self, note: &NoteDocument) -> TantivyDocument {
        let s = &self.schema;
        let mut doc = TantivyDocument::default();
        doc.add_text(s.filename, note.path.to_string_lossy().replace('\\', "/"));
        doc.add_text(s.title, &note.title);
        doc.add_text(s.title_exact, &note.title);
        doc.add_text(s.content, &note.content);
        doc.add_text(s.content_exact, &note.content);
        for tag in &note.tags {
            doc.add_text(s.tags, tag);
        }
        if let Some(ts) = note.created {
            doc.add_date(s.created, DateTime::from_timestamp_secs(ts));
        }
        if let Some(ts) = note.modified {
            doc.add_date(s.modified, DateTime::from_timestamp_secs(ts));
        }
        doc
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn schema(&self) -> &NoteSchema {
        &self.schema
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Snapshot of the last committed state.
    pub fn searcher(&self) -> Searcher {
        self.reader.searcher()
    }

    pub fn num_notes(&self) -> u64 {
        self.searcher().num_docs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_empty_index() {
        let index = NoteIndex::create("/nonexistent", BuildOptions::default()).unwrap();
        assert_eq!(index.num_notes(), 0);
    }

    #[test]
    fn test_add_notes_visible_after_commit() {
        let index = NoteIndex::create(".", BuildOptions::default()).unwrap();
        index
            .add_notes(&[
                NoteDocument::parse("a.md", "alpha", Some(1)),
                NoteDocument::parse("b.md", "beta", Some(2)),
            ])
            .unwrap();
        assert_eq!(index.num_notes(), 2);
    }

    #[test]
    fn test_reindex_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("one.md"), "first").unwrap();

        let (index, report) = NoteIndex::build(dir.path(), BuildOptions::default()).unwrap();
        assert_eq!(report.notes, 1);
        assert_eq!(index.num_notes(), 1);

        fs::write(dir.path().join("two.md"), "second").unwrap();
        fs::write(dir.path().join("three.md"), "third").unwrap();
        let report = index.reindex().unwrap();
        assert_eq!(report.notes, 3);
        assert_eq!(index.num_notes(), 3);
    }

    #[test]
    fn test_failed_write_leaves_no_pending_deletes() {
        let index = NoteIndex::create(".", BuildOptions::default()).unwrap();
        index
            .add_notes(&[NoteDocument::parse("keep.md", "kept", Some(1))])
            .unwrap();

        let failed = index.write(|writer| {
            writer.delete_all_documents()?;
            Err(tantivy::TantivyError::InternalError("disk full".into()))
        });
        assert!(failed.is_err());
        assert_eq!(index.num_notes(), 1);

        // The next successful commit must not apply the abandoned delete.
        index
            .add_notes(&[NoteDocument::parse("new.md", "fresh", Some(2))])
            .unwrap();
        assert_eq!(index.num_notes(), 2);
    }
}
