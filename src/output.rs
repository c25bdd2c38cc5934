//! Output formatting for batch `filter` results

use crate::index::NoteHit;
use std::io;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// How `filter` prints hits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One path per line
    Paths,
    /// Path, score and title
    Long,
    /// One JSON object per line
    Json,
}

/// Print hits to stdout
pub fn print_hits(hits: &[NoteHit], format: OutputFormat, color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    write_hits(&mut stdout, hits, format)
}

pub fn write_hits(out: &mut impl WriteColor, hits: &[NoteHit], format: OutputFormat) -> io::Result<()> {
    for hit in hits {
        match format {
            OutputFormat::Paths => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
                write!(out, "{}", hit.path.display())?;
                out.reset()?;
                writeln!(out)?;
            }
            OutputFormat::Long => write_long(out, hit)?,
            OutputFormat::Json => {
                let line = serde_json::to_string(hit).map_err(io::Error::other)?;
                writeln!(out, "{line}")?;
            }
        }
    }
    out.flush()
}

fn write_long(out: &mut impl WriteColor, hit: &NoteHit) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(out, "{:.4}", hit.score)?;
    out.reset()?;
    write!(out, "  ")?;

    out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
    write!(out, "{}", hit.path.display())?;
    out.reset()?;

    if !hit.title.is_empty() {
        write!(out, "  {}", hit.title)?;
    }
    if !hit.tags.is_empty() {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
        write!(out, "  #{}", hit.tags.join(" #"))?;
        out.reset()?;
    }
    writeln!(out)
}
