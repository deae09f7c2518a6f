use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::{mastery_bar, mastery_color};
use crate::models::{format_timestamp, VocabItem};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(item) = app.selected_word.as_deref().and_then(|id| app.word(id)) else {
        let block = Block::default().borders(Borders::ALL).title(" Word ");
        f.render_widget(Paragraph::new("No word selected").block(block), area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // Definition, root, tags
            Constraint::Length(7), // Review progress
            Constraint::Min(0),    // Contributors
        ])
        .split(area);

    draw_header(f, item, chunks[0]);
    draw_progress(f, item, chunks[1]);
    draw_contributors(f, item, chunks[2]);
}

fn draw_header(f: &mut Frame, item: &VocabItem, area: Rect) {
    let tags = if item.tags.is_empty() {
        "None".to_string()
    } else {
        item.tags.join(", ")
    };

    let mut text = vec![
        Line::from(vec![
            Span::styled("Definition: ", Style::default().fg(Color::Gray)),
            Span::styled(item.definition.as_str(), Style::default().fg(Color::White)),
        ]),
        Line::from(""),
    ];
    if let Some(root) = &item.root {
        text.push(Line::from(vec![
            Span::styled("Root: ", Style::default().fg(Color::Gray)),
            Span::styled(root.as_str(), Style::default().fg(Color::Magenta)),
        ]));
    }
    text.push(Line::from(vec![
        Span::styled("Tags: ", Style::default().fg(Color::Gray)),
        Span::styled(tags, Style::default().fg(Color::Cyan)),
    ]));
    if let Some(status) = item.status {
        text.push(Line::from(vec![
            Span::styled("Status: ", Style::default().fg(Color::Gray)),
            Span::styled(status.as_str(), Style::default().fg(Color::White)),
        ]));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", item.word))
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: true }), area);
}

fn draw_progress(f: &mut Frame, item: &VocabItem, area: Rect) {
    let mastery = item.mastery();
    let next_review = item
        .next_review
        .as_ref()
        .map(format_timestamp)
        .unwrap_or_else(|| "Not scheduled".to_string());

    let text = vec![
        Line::from(vec![
            Span::styled("Mastery: ", Style::default().fg(Color::Gray)),
            Span::styled(mastery_bar(item.repetitions), Style::default().fg(Color::Green)),
            Span::raw(" "),
            Span::styled(mastery.label(), Style::default().fg(mastery_color(mastery))),
        ]),
        Line::from(vec![
            Span::styled("Repetitions: ", Style::default().fg(Color::Gray)),
            Span::styled(item.repetitions.to_string(), Style::default().fg(Color::White)),
            Span::styled("  Interval: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} day(s)", item.interval),
                Style::default().fg(Color::White),
            ),
            Span::styled("  Ease: ", Style::default().fg(Color::Gray)),
            Span::styled(format!("{:.2}", item.ease), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::styled("Next review: ", Style::default().fg(Color::Gray)),
            Span::styled(next_review, Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("Added: ", Style::default().fg(Color::Gray)),
            Span::styled(
                item.created_at.clone().unwrap_or_else(|| "-".to_string()),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Review ")
        .title_style(Style::default().fg(Color::Green));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_contributors(f: &mut Frame, item: &VocabItem, area: Rect) {
    let items: Vec<ListItem> = if item.contributors.is_empty() {
        vec![ListItem::new(Span::styled(
            "No contributors recorded",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        item.contributors
            .iter()
            .map(|c| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<26}", c.ts), Style::default().fg(Color::DarkGray)),
                    Span::styled(c.name.as_str(), Style::default().fg(Color::White)),
                ]))
            })
            .collect()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Contributors ")
        .title_style(Style::default().fg(Color::Magenta));

    f.render_widget(List::new(items).block(block), area);
}
