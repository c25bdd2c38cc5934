use crate::index::build::BuildReport;
use chrono::{Local, TimeZone};
use std::io::{self, Write};
use std::path::Path;

const TOP_TAGS: usize = 15;

/// Display statistics for a freshly built note index
pub fn show_stats(root: &Path, report: &BuildReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_stats(&mut out, root, report)
}

pub fn write_stats(out: &mut impl Write, root: &Path, report: &BuildReport) -> io::Result<()> {
    writeln!(out, "Note Statistics")?;
    writeln!(out, "===============")?;
    writeln!(out)?;
    writeln!(out, "Root path:        {}", root.display())?;
    writeln!(out, "Notes:            {}", report.notes)?;
    writeln!(out, "Unreadable:       {}", report.skipped)?;
    writeln!(out, "Header problems:  {}", report.parse_errors.len())?;
    writeln!(out, "Distinct tags:    {}", report.tag_counts.len())?;
    writeln!(out, "Indexed in:       {:.2?}", report.elapsed)?;

    if let Some((path, ts)) = &report.newest {
        writeln!(out, "Newest:           {} ({})", path.display(), format_timestamp(*ts))?;
    }
    if let Some((path, ts)) = &report.oldest {
        writeln!(out, "Oldest:           {} ({})", path.display(), format_timestamp(*ts))?;
    }

    let tags = report.top_tags(TOP_TAGS);
    if !tags.is_empty() {
        writeln!(out)?;
        writeln!(out, "Top tags:")?;
        for (tag, count) in &tags {
            writeln!(out, "  {:20} {}", tag, count)?;
        }
        if report.tag_counts.len() > TOP_TAGS {
            writeln!(out, "  ... and {} more", report.tag_counts.len() - TOP_TAGS)?;
        }
    }

    if !report.parse_errors.is_empty() {
        writeln!(out)?;
        writeln!(out, "Header problems:")?;
        for (path, err) in &report.parse_errors {
            writeln!(out, "  {}: {}", path.display(), err)?;
        }
    }

    Ok(())
}

fn format_timestamp(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => ts.to_string(),
    }
}
