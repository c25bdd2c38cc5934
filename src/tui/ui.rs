use crate::tui::app::{App, Mode};
use chrono::{Local, TimeZone};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use regex::Regex;

/// Draw the whole screen and return how many results fit in the list.
pub fn draw(f: &mut Frame, app: &App) -> usize {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Query input
            Constraint::Min(5),    // Results / Preview
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_query_input(f, app, chunks[0]);
    let rows = draw_main_area(f, app, chunks[1]);
    draw_status_bar(f, app, chunks[2]);
    rows
}

fn draw_query_input(f: &mut Frame, app: &App, area: Rect) {
    let input = Paragraph::new(app.query.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Search (F5: reindex, Ctrl+P: preview, Esc: quit) "),
        );

    f.render_widget(input, area);

    if app.mode == Mode::Search {
        let width = app.query.chars().count() as u16;
        f.set_cursor_position((area.x + width + 1, area.y + 1));
    }
}

/// Returns the number of result rows visible.
fn draw_main_area(f: &mut Frame, app: &App, area: Rect) -> usize {
    let list_rows = area.height.saturating_sub(2) as usize;
    match app.mode {
        Mode::Search if app.show_preview => {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(area);

            draw_results_list(f, app, chunks[0]);
            draw_preview(f, app, chunks[1]);
        }
        Mode::Search => draw_results_list(f, app, area),
        Mode::Preview => draw_preview(f, app, area),
    }
    list_rows
}

fn draw_results_list(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .results
        .documents
        .iter()
        .map(|hit| {
            let mut spans = vec![Span::styled(
                hit.path.to_string_lossy().into_owned(),
                Style::default().fg(Color::Blue),
            )];
            let stem = hit.path.file_stem().map(|s| s.to_string_lossy());
            if !hit.title.is_empty() && stem.as_deref() != Some(hit.title.as_str()) {
                spans.push(Span::raw("  "));
                spans.push(Span::styled(hit.title.clone(), Style::default().fg(Color::White)));
            }
            if !hit.tags.is_empty() {
                spans.push(Span::styled(
                    format!("  #{}", hit.tags.join(" #")),
                    Style::default().fg(Color::Cyan),
                ));
            }
            spans.push(Span::styled(
                format!("  {:.3}", hit.score),
                Style::default().fg(Color::DarkGray),
            ));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Results ({}/{}) ",
            app.results.documents.len(),
            app.results.total_candidates
        )))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !app.results.documents.is_empty() {
        state.select(Some(app.selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_preview(f: &mut Frame, app: &App, area: Rect) {
    let title = match app.selected_hit() {
        Some(hit) => match hit.modified.and_then(|ts| Local.timestamp_opt(ts, 0).single()) {
            Some(dt) => format!(" {} ({}) ", hit.path.display(), dt.format("%Y-%m-%d %H:%M")),
            None => format!(" {} ", hit.path.display()),
        },
        None => " Preview ".to_string(),
    };

    let content = if let Some(ref preview) = app.preview_content {
        let lines: Vec<Line> = preview
            .lines()
            .enumerate()
            .skip(app.preview_scroll)
            .take(area.height.saturating_sub(2) as usize)
            .map(|(line_num, line)| {
                let mut spans = vec![Span::styled(
                    format!("{:4} ", line_num + 1),
                    Style::default().fg(Color::DarkGray),
                )];
                spans.extend(highlight_matches(line, app.highlight.as_ref()));
                Line::from(spans)
            })
            .collect();

        Text::from(lines)
    } else {
        Text::raw("No preview available")
    };

    let preview = Paragraph::new(content)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });

    f.render_widget(preview, area);
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let mut text = app.status_text();
    if app.is_searching() {
        text.push_str(" …");
    }
    let style = if app.results.query_error.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Cyan)
    };
    f.render_widget(Paragraph::new(text).style(style), area);
}

/// Split `text` into plain and highlighted spans
fn highlight_matches<'a>(text: &'a str, highlight: Option<&Regex>) -> Vec<Span<'a>> {
    let Some(re) = highlight else {
        return vec![Span::raw(text)];
    };

    let style = Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let mut spans = Vec::new();
    let mut last = 0;
    for m in re.find_iter(text) {
        if m.start() > last {
            spans.push(Span::raw(&text[last..m.start()]));
        }
        spans.push(Span::styled(m.as_str(), style));
        last = m.end();
    }
    if last < text.len() {
        spans.push(Span::raw(&text[last..]));
    }
    spans
}
