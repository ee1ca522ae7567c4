use practice_core::{Clock, KeyValueRepository, PieceSummary, MAX_PIECES};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::format::display_date;
use crate::tui::app::{App, InputMode};

const HISTORY_ROWS: usize = 6;

pub fn draw<R: KeyValueRepository, C: Clock>(f: &mut Frame, app: &mut App<R, C>) {
    let size = f.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(1),    // Pieces
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status / help
        ])
        .split(size);

    let header = Paragraph::new(format!(
        "PRACTICE TRACKER ({}/{} pieces)",
        app.summaries.len(),
        MAX_PIECES
    ))
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded));
    f.render_widget(header, main_chunks[0]);

    draw_pieces(f, app, main_chunks[1]);
    draw_input(f, app, main_chunks[2]);

    let footer = match &app.status {
        Some(status) => Paragraph::new(status.as_str()).style(Style::default().fg(Color::Yellow)),
        None => Paragraph::new(
            "a: Add | l/Enter: Log | h/Space: History | d: Remove | j/k: Navigate | q: Quit",
        )
        .style(Style::default().fg(Color::DarkGray)),
    };
    f.render_widget(footer.alignment(Alignment::Center), main_chunks[3]);
}

fn draw_pieces<R: KeyValueRepository, C: Clock>(f: &mut Frame, app: &mut App<R, C>, area: Rect) {
    let name_width = (area.width as usize).saturating_sub(32).max(8);

    let mut items: Vec<ListItem> = app
        .summaries
        .iter()
        .map(|summary| {
            piece_item(
                summary,
                app.is_expanded(&summary.id),
                app.pending_minutes(&summary.id),
                name_width,
            )
        })
        .collect();

    if app.summaries.is_empty() {
        items.push(ListItem::new(Line::from(Span::styled(
            "Add pieces to start tracking your practice!",
            Style::default().fg(Color::Gray),
        ))));
    }
    for _ in app.summaries.len()..MAX_PIECES {
        items.push(ListItem::new(Line::from(Span::styled(
            "  ┄ Empty slot",
            Style::default().fg(Color::DarkGray),
        ))));
    }

    let list = List::new(items)
        .block(Block::default().title(" Pieces ").borders(Borders::ALL).border_type(BorderType::Rounded))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol(">> ");

    f.render_stateful_widget(list, area, &mut app.state);
}

fn piece_item(
    summary: &PieceSummary,
    expanded: bool,
    pending: Option<&str>,
    name_width: usize,
) -> ListItem<'static> {
    let marker = if expanded { "▾" } else { "▸" };
    let mut header = vec![
        Span::raw(format!("{} ", marker)),
        Span::styled(
            truncate(&summary.name, name_width),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  Today: {} minutes", summary.today_minutes),
            Style::default().fg(Color::Green),
        ),
    ];
    if let Some(pending) = pending {
        header.push(Span::styled(
            format!("  [{}]", pending),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let mut lines = vec![Line::from(header)];
    if expanded {
        if summary.history.is_empty() {
            lines.push(Line::from(Span::styled(
                "    No practice logged yet",
                Style::default().fg(Color::DarkGray),
            )));
        }
        for entry in summary.history.iter().take(HISTORY_ROWS) {
            lines.push(Line::from(Span::styled(
                format!("    {}: {} minutes", display_date(entry.date), entry.minutes),
                Style::default().fg(Color::Gray),
            )));
        }
        if summary.history.len() > HISTORY_ROWS {
            lines.push(Line::from(Span::styled(
                format!(
                    "    … {} more days, {} minutes total",
                    summary.history.len() - HISTORY_ROWS,
                    summary.total_minutes
                ),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }
    ListItem::new(lines)
}

fn draw_input<R: KeyValueRepository, C: Clock>(f: &mut Frame, app: &App<R, C>, area: Rect) {
    let title = match &app.input_mode {
        InputMode::Normal => " Input ".to_string(),
        InputMode::AddingPiece => " New piece name ".to_string(),
        InputMode::LoggingMinutes(id) => {
            let name = app
                .summaries
                .iter()
                .find(|s| &s.id == id)
                .map(|s| s.name.as_str())
                .unwrap_or("?");
            format!(" Minutes for {} ", name)
        }
    };
    let style = match app.input_mode {
        InputMode::Normal => Style::default().fg(Color::DarkGray),
        _ => Style::default().fg(Color::Yellow),
    };

    let input = Paragraph::new(app.input.as_str())
        .style(style)
        .block(Block::default().title(title).borders(Borders::ALL).border_type(BorderType::Rounded));
    f.render_widget(input, area);

    if !matches!(app.input_mode, InputMode::Normal) {
        let before: String = app.input.chars().take(app.cursor_position).collect();
        f.set_cursor_position((area.x + 1 + before.width() as u16, area.y + 1));
    }
}

/// Cuts `s` to at most `width` terminal columns, marking the cut with `…`.
fn truncate(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Etude", 10), "Etude");
        assert_eq!(truncate("Rachmaninoff Prelude", 8), "Rachman…");
        assert_eq!(truncate("練習曲作品十", 7), "練習曲…");
    }
}
