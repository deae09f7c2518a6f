use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::{mastery_bar, truncate};
use crate::models::parse_timestamp;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(10), // Stats + due words row
            Constraint::Min(0),     // Recently added
        ])
        .split(area);

    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    draw_stats(f, app, top_chunks[0]);
    draw_due_words(f, app, top_chunks[1]);
    draw_recent_words(f, app, chunks[1]);
}

fn stat_line(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(color)),
    ])
}

fn draw_stats(f: &mut Frame, app: &App, area: Rect) {
    let stats = &app.stats;

    let text = vec![
        Line::from(vec![
            Span::styled("Words: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.total),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        stat_line(
            "Due",
            stats.due.to_string(),
            if stats.due > 0 { Color::Yellow } else { Color::White },
        ),
        stat_line("Not reviewed", stats.not_reviewed.to_string(), Color::DarkGray),
        stat_line("Learning", stats.learning.to_string(), Color::Cyan),
        stat_line("Familiar", stats.familiar.to_string(), Color::Yellow),
        stat_line("Mastered", stats.mastered.to_string(), Color::Green),
        stat_line(
            "Avg ease",
            stats
                .avg_ease
                .map(|e| format!("{:.2}", e))
                .unwrap_or_else(|| "N/A".to_string()),
            Color::Cyan,
        ),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Stats ")
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_due_words(f: &mut Frame, app: &App, area: Rect) {
    let due = app.due_preview();
    let items: Vec<ListItem> = if due.is_empty() {
        vec![ListItem::new(Span::styled(
            "All caught up!",
            Style::default().fg(Color::Green),
        ))]
    } else {
        due.iter()
            .enumerate()
            .map(|(i, item)| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::DarkGray)),
                    Span::styled(
                        format!("{:<22}", truncate(&item.word, 20)),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::styled(mastery_bar(item.repetitions), Style::default().fg(Color::Green)),
                ]))
            })
            .collect()
    };

    let title = if app.stats.due > due.len() {
        format!(" Due ({} more) ", app.stats.due - due.len())
    } else {
        " Due ".to_string()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Yellow));

    f.render_widget(List::new(items).block(block), area);
}

fn draw_recent_words(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .deck
        .recent(area.height.saturating_sub(2) as usize)
        .iter()
        .map(|item| {
            let added = item
                .created_at
                .as_deref()
                .and_then(parse_timestamp)
                .map(|dt| dt.format("%b %d").to_string())
                .unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<12}", added), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{:<22}", truncate(&item.word, 20)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    truncate(&item.definition, 48),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Recently Added ")
        .title_style(Style::default().fg(Color::Magenta));

    f.render_widget(List::new(items).block(block), area);
}
