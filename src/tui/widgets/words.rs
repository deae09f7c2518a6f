use chrono::Utc;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::{format_due, mastery_bar, mastery_color, truncate};
use crate::srs::is_due;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let title = match &app.filter_query {
        Some(query) => format!(" Words (filter: {}) ", query),
        None => format!(" Words ({}) ", app.words.items.len()),
    };
    let now = Utc::now();

    let items: Vec<ListItem> = app
        .words
        .items
        .iter()
        .filter_map(|id| app.word(id))
        .map(|item| {
            let mastery = item.mastery();
            let due = format_due(item.next_review);
            let (due_color, due_text) = if is_due(item, now) {
                (Color::Red, format!("{} !", due))
            } else {
                (Color::White, due)
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<24}", truncate(&item.word, 22)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:<34}", truncate(&item.definition, 32)),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(mastery_bar(item.repetitions), Style::default().fg(Color::Green)),
                Span::styled(
                    format!(" {:<14}", mastery.label()),
                    Style::default().fg(mastery_color(mastery)),
                ),
                Span::styled(due_text, Style::default().fg(due_color)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Cyan));

    let header_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::BOLD);
    let header = Line::from(vec![
        Span::styled(format!("  {:<24}", "Word"), header_style),
        Span::styled(format!("{:<34}", "Definition"), header_style),
        Span::styled(format!("{:<22}", "Mastery"), header_style),
        Span::styled("Next Review", header_style),
    ]);

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.words.selected);

    let header_area = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: 1,
    };
    f.render_widget(Paragraph::new(header), header_area);

    let list_area = Rect {
        x: area.x,
        y: area.y + 1,
        width: area.width,
        height: area.height.saturating_sub(1),
    };

    f.render_stateful_widget(list, list_area, &mut state);
}
