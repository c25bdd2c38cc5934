//! Field layout of the note index.

use tantivy::schema::{
    DateOptions, Field, IndexRecordOption, Schema, TextFieldIndexing,
    TextOptions, FAST, INDEXED, STORED,
};
use tantivy::tokenizer::{LowerCaser, RawTokenizer, TextAnalyzer};
use tantivy::Index;

pub const FILENAME: &str = "filename";
pub const TITLE: &str = "title";
pub const TITLE_EXACT: &str = "title_exact";
pub const CONTENT: &str = "content";
pub const CONTENT_EXACT: &str = "content_exact";
pub const TAGS: &str = "tags";
pub const CREATED: &str = "created";
pub const MODIFIED: &str = "modified";

/// Whole-value, lowercased analyzer used for filenames and tags
pub const KEYWORD_TOKENIZER: &str = "keyword";
const STEMMED_TOKENIZER: &str = "en_stem";
const EXACT_TOKENIZER: &str = "default";

/// Handles to every field of the note schema.
#[derive(Debug, Clone)]
pub struct NoteSchema {
    pub schema: Schema,
    pub filename: Field,
    pub title: Field,
    pub title_exact: Field,
    pub content: Field,
    pub content_exact: Field,
    pub tags: Field,
    pub created: Field,
    pub modified: Field,
}

impl NoteSchema {
    pub fn new() -> Self {
        let mut builder = Schema::builder();

        let keyword = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer(KEYWORD_TOKENIZER)
                    .set_index_option(IndexRecordOption::WithFreqs),
            )
            .set_stored();
        let stemmed = |stored: bool| {
            let options = TextOptions::default().set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer(STEMMED_TOKENIZER)
                    .set_index_option(IndexRecordOption::WithFreqsAndPositions),
            );
            if stored { options.set_stored() } else { options }
        };
        let exact = TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(EXACT_TOKENIZER)
                .set_index_option(IndexRecordOption::WithFreqs),
        );
        let date = DateOptions::from(INDEXED | STORED | FAST);

        let filename = builder.add_text_field(FILENAME, keyword.clone());
        let title = builder.add_text_field(TITLE, stemmed(true));
        let title_exact = builder.add_text_field(TITLE_EXACT, exact.clone());
        let content = builder.add_text_field(CONTENT, stemmed(false));
        let content_exact = builder.add_text_field(CONTENT_EXACT, exact);
        let tags = builder.add_text_field(TAGS, keyword);
        let created = builder.add_date_field(CREATED, date.clone());
        let modified = builder.add_date_field(MODIFIED, date);

        Self {
            schema: builder.build(),
            filename,
            title,
            title_exact,
            content,
            content_exact,
            tags,
            created,
            modified,
        }
    }

    /// Fields searched by unscoped terms and phrases.
    pub fn default_fields(&self) -> [Field; 2] {
        [self.title, self.content]
    }

    /// Unstemmed copy of a stemmed field, used for prefix matching.
    pub fn exact_copy(&self, field: Field) -> Option<Field> {
        if field == self.title {
            Some(self.title_exact)
        } else if field == self.content {
            Some(self.content_exact)
        } else {
            None
        }
    }

    /// Resolve a user-facing field name.
    pub fn field(&self, name: &str) -> Option<Field> {
        self.schema.get_field(name).ok()
    }
}

impl Default for NoteSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// Register the analyzers the schema refers to beyond tantivy's built-ins.
pub fn register_tokenizers(index: &Index) {
    let keyword = TextAnalyzer::builder(RawTokenizer::default())
        .filter(LowerCaser)
        .build();
    index.tokenizers().register(KEYWORD_TOKENIZER, keyword);
}
