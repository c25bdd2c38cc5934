//! End-to-end tests of the notefind binary in batch mode.
//!
//! Each test gets its own notes directory and its own data directory so
//! that a user config on the machine cannot change the results.

use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn write_notes(dir: &Path) {
    fs::write(
        dir.join("apples.md"),
        "---\ntitle: Apple harvest\ntags: [orchard, autumn]\n---\nPicked three crates of apples today.\n",
    )
    .unwrap();
    fs::write(
        dir.join("pears.md"),
        "---\ntitle: Pear tree\ntags: [orchard]\n---\nThe pear tree needs pruning before spring.\n",
    )
    .unwrap();
    fs::create_dir_all(dir.join("journal")).unwrap();
    fs::write(
        dir.join("journal").join("monday.md"),
        "Meeting about the borrow checker. Apples for lunch.\n",
    )
    .unwrap();
    fs::write(dir.join("ignored.txt"), "apples apples apples\n").unwrap();
}

struct Fixture {
    notes: TempDir,
    data: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let notes = TempDir::new().unwrap();
        write_notes(notes.path());
        Self {
            notes,
            data: TempDir::new().unwrap(),
        }
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_notefind"))
            .arg("-C")
            .arg(self.notes.path())
            .args(args)
            .env("XDG_DATA_HOME", self.data.path())
            .env("HOME", self.data.path())
            .env_remove("NOTEFIND_LOG")
            .output()
            .expect("Failed to run notefind")
    }
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

fn file_names(output: &Output) -> Vec<String> {
    let mut names: Vec<String> = stdout_lines(output)
        .iter()
        .filter_map(|line| Path::new(line).file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    names
}

#[test]
fn test_filter_prints_matching_paths() {
    let fixture = Fixture::new();
    let output = fixture.run(&["filter", "apples"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(file_names(&output), vec!["apples.md", "monday.md"]);
}

#[test]
fn test_filter_paths_are_joined_with_directory() {
    let fixture = Fixture::new();
    let output = fixture.run(&["filter", "pruning"]);

    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(Path::new(&lines[0]), fixture.notes.path().join("pears.md"));
}

#[test]
fn test_filter_tag_query() {
    let fixture = Fixture::new();
    let output = fixture.run(&["filter", "#orchard"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(file_names(&output), vec!["apples.md", "pears.md"]);
}

#[test]
fn test_filter_limit() {
    let fixture = Fixture::new();
    let output = fixture.run(&["filter", "-n", "1", "apples"]);
    assert_eq!(stdout_lines(&output).len(), 1);
}

#[test]
fn test_filter_no_match_exits_one() {
    let fixture = Fixture::new();
    let output = fixture.run(&["filter", "zebra"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_filter_bad_query_exits_two() {
    let fixture = Fixture::new();
    let output = fixture.run(&["filter", "\"unterminated"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unterminated quote"), "stderr: {stderr}");
}

#[test]
fn test_filter_json_lines() {
    let fixture = Fixture::new();
    let output = fixture.run(&["filter", "--json", "pear"]);

    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 1);
    let hit: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(hit["title"], "Pear tree");
    assert_eq!(hit["tags"], serde_json::json!(["orchard"]));
    assert!(hit["score"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_dumpquery_batch() {
    let fixture = Fixture::new();
    let output = fixture.run(&["dumpquery", "foo", "#bar"]);

    assert_eq!(output.status.code(), Some(0));
    let tree: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tree["kind"], "recency");
    let should = tree["base"]["should"].as_array().unwrap();
    assert_eq!(should.len(), 3);
    assert_eq!(should[0]["value"], "foo");
    assert_eq!(should[0]["is_prefix"], false);
    assert_eq!(should[1]["field"], "tags");
    assert_eq!(should[1]["value"], "bar");
    assert_eq!(should[2]["kind"], "match_none");
}

#[test]
fn test_dumpquery_interactive_completes_last_word() {
    let fixture = Fixture::new();
    let output = fixture.run(&["dumpquery", "--interactive", "foo"]);

    let tree: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tree["base"]["should"][0]["is_prefix"], true);
}

#[test]
fn test_stats() {
    let fixture = Fixture::new();
    let output = fixture.run(&["stats"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("orchard"), "stdout: {stdout}");
}

#[test]
fn test_new_creates_note_that_filter_finds() {
    let fixture = Fixture::new();
    let output = fixture.run(&["new", "--tags", "garden,plans", "Spring", "planting"]);

    assert_eq!(output.status.code(), Some(0));
    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 1);
    let created = Path::new(&lines[0]);
    assert!(created.starts_with(fixture.notes.path()));
    assert!(lines[0].ends_with("-spring-planting.md"), "path: {}", lines[0]);

    let content = fs::read_to_string(created).unwrap();
    assert!(content.starts_with("---\ntitle: \"Spring planting\"\n"), "{content}");

    let output = fixture.run(&["filter", "--json", "#garden"]);
    let hit: Value = serde_json::from_str(&stdout_lines(&output)[0]).unwrap();
    assert_eq!(hit["title"], "Spring planting");
    assert_eq!(hit["tags"], serde_json::json!(["garden", "plans"]));
}

#[test]
fn test_config_init_does_not_overwrite() {
    let fixture = Fixture::new();

    let first = fixture.run(&["config", "--init"]);
    assert_eq!(first.status.code(), Some(0));
    let path = stdout_lines(&first)[0].clone();
    let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["filter_limit"], 100);

    let second = fixture.run(&["config", "--init"]);
    assert_eq!(second.status.code(), Some(2));

    let forced = fixture.run(&["config", "--init", "--force"]);
    assert_eq!(forced.status.code(), Some(0));
}

#[test]
fn test_config_prints_current_settings() {
    let fixture = Fixture::new();
    let output = fixture.run(&["config"]);

    assert_eq!(output.status.code(), Some(0));
    let config: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["new_note"]["filename"], "{stamp}-{slug}.md");
}
