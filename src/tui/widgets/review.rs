use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::models::Quality;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Progress
            Constraint::Min(0),    // Card
            Constraint::Length(4), // Rating keys
        ])
        .split(area);

    draw_progress(f, app, chunks[0]);

    let current = app.review.current().and_then(|id| app.word(id));
    match current {
        Some(item) => {
            let mut text = vec![
                Line::from(""),
                Line::from(Span::styled(
                    item.word.as_str(),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
            ];
            if app.review.revealed {
                text.push(Line::from(Span::styled(
                    item.definition.as_str(),
                    Style::default().fg(Color::White),
                )));
                if let Some(root) = &item.root {
                    text.push(Line::from(""));
                    text.push(Line::from(Span::styled(
                        format!("root: {}", root),
                        Style::default().fg(Color::Magenta),
                    )));
                }
            } else {
                text.push(Line::from(Span::styled(
                    "<Space> to reveal",
                    Style::default().fg(Color::DarkGray),
                )));
            }

            let block = Block::default()
                .borders(Borders::ALL)
                .title(" Recall ")
                .title_style(Style::default().fg(Color::Cyan));
            let card = Paragraph::new(text)
                .block(block)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            f.render_widget(card, chunks[1]);
        }
        None => {
            let message = if app.review.completed > 0 {
                format!("Session complete: {} word(s) reviewed.", app.review.completed)
            } else {
                "Nothing due. All caught up!".to_string()
            };
            let block = Block::default().borders(Borders::ALL).title(" Recall ");
            let done = Paragraph::new(vec![Line::from(""), Line::from(message)])
                .block(block)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Green));
            f.render_widget(done, chunks[1]);
        }
    }

    draw_ratings(f, app, chunks[2]);
}

fn draw_progress(f: &mut Frame, app: &App, area: Rect) {
    let completed = app.review.completed;
    let total = completed + app.review.remaining();
    let ratio = if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64
    };

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Session "))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio)
        .label(format!(
            "{} done / {} remaining",
            completed,
            app.review.remaining()
        ));
    f.render_widget(gauge, area);
}

fn draw_ratings(f: &mut Frame, app: &App, area: Rect) {
    let enabled = app.review.revealed && app.review.current().is_some();
    let key_color = if enabled { Color::Cyan } else { Color::DarkGray };

    let mut spans = Vec::new();
    for quality in Quality::ALL {
        let label_color = match (enabled, quality.passes()) {
            (false, _) => Color::DarkGray,
            (true, true) => Color::Green,
            (true, false) => Color::Red,
        };
        spans.push(Span::styled(
            format!("{} ", quality.score()),
            Style::default().fg(key_color),
        ));
        spans.push(Span::styled(
            format!("{}  ", quality.label()),
            Style::default().fg(label_color),
        ));
    }

    let mut lines = vec![Line::from(spans)];
    if let Some(status) = &app.status {
        lines.push(Line::from(Span::styled(
            status.as_str(),
            Style::default().fg(Color::Gray),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Rate ")
        .title_style(Style::default().fg(Color::Yellow));
    f.render_widget(Paragraph::new(lines).block(block), area);
}
