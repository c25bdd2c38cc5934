//! Markdown note loading and front matter extraction.
//!
//! A note may open with a YAML header delimited by `---` lines:
//!
//! ```text
//! ---
//! title: Weekly review
//! date: 2024-03-01 09:30
//! tags: [planning, review]
//! ---
//! ```
//!
//! Header problems are recorded on the note, never fatal.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use regex::Regex;
use serde::Serialize;
use serde_yaml::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::UNIX_EPOCH;

static TAG_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^-a-z0-9_]+").expect("static regex"));

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"];

/// One note as handed to the indexer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NoteDocument {
    /// Path relative to the notes root
    pub path: PathBuf,
    pub title: String,
    pub tags: Vec<String>,
    /// Unix seconds from the `date` header
    pub created: Option<i64>,
    /// Unix seconds of the file modification time
    pub modified: Option<i64>,
    #[serde(skip)]
    pub content: String,
    pub parse_errors: Vec<String>,
}

impl NoteDocument {
    /// Build a note from its text. The title defaults to the file stem.
    pub fn parse(path: impl Into<PathBuf>, raw: &str, modified: Option<i64>) -> Self {
        let path = path.into();
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut note = NoteDocument {
            path,
            title,
            modified,
            content: normalize_newlines(raw),
            ..Default::default()
        };

        if let Some(header) = front_matter(&note.content) {
            match serde_yaml::from_str::<Value>(header) {
                Ok(Value::Mapping(header)) => note.apply_header(&header),
                Ok(Value::Null) => {}
                Ok(_) => note.parse_errors.push("front matter is not a mapping".to_string()),
                Err(e) => note.parse_errors.push(format!("front matter: {e}")),
            }
        }

        note
    }

    /// Read `rel` below `root`.
    pub fn load(root: &Path, rel: &Path) -> io::Result<Self> {
        let full = root.join(rel);
        let bytes = fs::read(&full)?;
        let modified = fs::metadata(&full)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64);
        Ok(Self::parse(rel, &String::from_utf8_lossy(&bytes), modified))
    }

    fn apply_header(&mut self, header: &serde_yaml::Mapping) {
        match header.get("title") {
            Some(Value::String(s)) => self.title = s.clone(),
            Some(Value::Number(n)) => self.title = n.to_string(),
            Some(Value::Bool(b)) => self.title = b.to_string(),
            Some(Value::Null) | None => {}
            Some(_) => self.parse_errors.push("title is not a string".to_string()),
        }

        match header.get("date") {
            Some(Value::String(s)) => match parse_date(s) {
                Some(ts) => self.created = Some(ts),
                None => self.parse_errors.push(format!("unrecognized date {s:?}")),
            },
            Some(Value::Null) | None => {}
            Some(_) => self.parse_errors.push("date is not a string".to_string()),
        }

        let tags: Vec<String> = match header.get("tags") {
            Some(Value::String(s)) => {
                let lower = s.to_lowercase();
                TAG_SEPARATOR.split(&lower).map(str::to_string).collect()
            }
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                self.parse_errors.push("tags must be a string or a list".to_string());
                Vec::new()
            }
        };
        self.tags = tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
    }
}

/// Convert CRLF and lone CR line endings to LF.
pub fn normalize_newlines(raw: &str) -> String {
    if !raw.contains('\r') {
        return raw.to_string();
    }
    raw.replace("\r\n", "\n").replace('\r', "\n")
}

/// The YAML between an opening `---` line and the next `---` line.
fn front_matter(content: &str) -> Option<&str> {
    let rest = content.strip_prefix("---\n")?;
    if let Some(end) = rest.find("\n---\n") {
        return Some(&rest[..end]);
    }
    rest.strip_suffix("\n---")
}

/// Parse a header date into unix seconds. Dates without an offset are
/// taken as local time.
pub fn parse_date(s: &str) -> Option<i64> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.timestamp());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return local_timestamp(naive);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return local_timestamp(date.and_hms_opt(0, 0, 0)?);
        }
    }
    None
}

fn local_timestamp(naive: NaiveDateTime) -> Option<i64> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp())
}
