pub mod dashboard;
pub mod review;
pub mod word_detail;
pub mod words;

use chrono::{DateTime, Utc};
use ratatui::style::Color;

use crate::models::Mastery;

const BAR_CELLS: u32 = 7;

/// One cell per successful repetition, full at seven.
pub fn mastery_bar(repetitions: u32) -> String {
    let filled = repetitions.min(BAR_CELLS) as usize;
    let empty = BAR_CELLS as usize - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

pub fn mastery_color(mastery: Mastery) -> Color {
    match mastery {
        Mastery::NotReviewed => Color::DarkGray,
        Mastery::Learning => Color::Cyan,
        Mastery::Familiar => Color::Yellow,
        Mastery::Mastered => Color::Green,
    }
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn format_due(next_review: Option<DateTime<Utc>>) -> String {
    match next_review {
        Some(dt) => dt.format("%b %d").to_string(),
        None => "Not set".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn mastery_bar_caps_at_seven() {
        assert_eq!(mastery_bar(0), "░░░░░░░");
        assert_eq!(mastery_bar(3), "███░░░░");
        assert_eq!(mastery_bar(40), "███████");
    }

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("naïveté", 10), "naïveté");
        assert_eq!(truncate("ubiquitous", 7), "ubiq...");
    }

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 5), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn format_due_dates() {
        assert_eq!(format_due(None), "Not set");
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(format_due(Some(dt)), "Mar 01");
    }
}
