//! Creating notes from the configured filename and content templates.
//!
//! Templates use `{name}` placeholders. Unknown placeholders are left as
//! they are.
//!
//! | Placeholder | Filename template | Content template |
//! |---|---|---|
//! | `{stamp}` | `20240301-0930` | `20240301-0930` |
//! | `{date}` | `2024-03-01` | `2024-03-01 09:30` |
//! | `{slug}` | `weekly-review` | `weekly-review` |
//! | `{title}` | - | title as a quoted YAML string |
//! | `{tags}` | - | comma-separated quoted tags |

use crate::utils::NewNoteSettings;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_FILENAME_TEMPLATE: &str = "{stamp}-{slug}.md";
pub const DEFAULT_CONTENT_TEMPLATE: &str = "---\ntitle: {title}\ndate: {date}\ntags: [{tags}]\n---\n\n";

/// A note about to be created.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub title: String,
    pub tags: Vec<String>,
    pub date: DateTime<Local>,
}

impl NewNote {
    pub fn new(title: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            title: title.into(),
            tags,
            date: Local::now(),
        }
    }

    /// Path of the note relative to the notes root.
    pub fn filename(&self, template: &str) -> PathBuf {
        let stamp = self.date.format("%Y%m%d-%H%M").to_string();
        let date = self.date.format("%Y-%m-%d").to_string();
        let slug = slugify(&self.title);
        PathBuf::from(render(template, |key| match key {
            "stamp" => Some(stamp.clone()),
            "date" => Some(date.clone()),
            "slug" => Some(slug.clone()),
            _ => None,
        }))
    }

    /// Initial content of the note.
    pub fn content(&self, template: &str) -> String {
        render(template, |key| match key {
            "stamp" => Some(self.date.format("%Y%m%d-%H%M").to_string()),
            "date" => Some(self.date.format("%Y-%m-%d %H:%M").to_string()),
            "slug" => Some(slugify(&self.title)),
            "title" => Some(yaml_string(&self.title)),
            "tags" => Some(
                self.tags
                    .iter()
                    .map(|t| yaml_string(t.trim()))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => None,
        })
    }

    /// Write the note below `root`. Never overwrites an existing file.
    /// Returns the path relative to `root`.
    pub fn create(&self, root: &Path, settings: &NewNoteSettings) -> Result<PathBuf> {
        let rel = self.filename(&settings.filename);
        let path = root.join(&rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("Failed to create note {}", path.display()))?;
        file.write_all(self.content(&settings.template).as_bytes())
            .with_context(|| format!("Failed to write note {}", path.display()))?;

        info!(path = %path.display(), "created note");
        Ok(rel)
    }
}

/// Lowercase words joined by `-`. Falls back to `untitled`.
pub fn slugify(title: &str) -> String {
    let words: Vec<String> = title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    if words.is_empty() {
        "untitled".to_string()
    } else {
        words.join("-")
    }
}

/// A double-quoted scalar. JSON strings are valid YAML.
fn yaml_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

/// Single pass over `template`, so substituted values are never expanded
/// again.
fn render(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => match lookup(&after[..close]) {
                Some(value) => {
                    out.push_str(&value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            },
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
