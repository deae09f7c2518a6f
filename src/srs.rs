//! Spaced-repetition scheduling.
//!
//! A small SM-2 style rule set: passing reviews (quality >= 3) grow the
//! interval 1 -> 6 -> interval * ease, failing reviews reset progress to a
//! one-day interval. Everything here is a pure function of its inputs; callers
//! own the collection and persist it afterwards.

use chrono::{DateTime, Duration, SubsecRound, Utc};

use crate::models::{PartialVocabItem, VocabItem};

pub const DEFAULT_EASE: f64 = 2.5;
pub const MIN_EASE: f64 = 1.3;
/// Upper bound on ease. Only applied when clamping is switched on.
pub const MAX_EASE: f64 = 3.5;
pub const DEFAULT_INTERVAL: u32 = 0;
pub const DEFAULT_REPETITIONS: u32 = 0;
pub const PASSING_QUALITY: i32 = 3;
pub const FIRST_INTERVAL: u32 = 1;
pub const SECOND_INTERVAL: u32 = 6;
pub const FAILED_INTERVAL: u32 = 1;

// 9999-12-31T23:59:59Z
const LATEST_DUE_SECS: i64 = 253_402_300_799;

/// Fill in any missing scheduling fields with defaults. Present values are
/// kept verbatim, including ones equal to zero.
pub fn init_srs(item: PartialVocabItem) -> VocabItem {
    VocabItem {
        id: item.id,
        word: item.word,
        definition: item.definition,
        root: item.root,
        tags: item.tags,
        status: item.status,
        contributors: item.contributors,
        created_at: item.created_at,
        updated_at: item.updated_at,
        ease: item.ease.unwrap_or(DEFAULT_EASE),
        interval: item.interval.unwrap_or(DEFAULT_INTERVAL),
        repetitions: item.repetitions.unwrap_or(DEFAULT_REPETITIONS),
        next_review: item.next_review,
        extra: item.extra,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scheduler {
    clamp_max_ease: bool,
}

impl Scheduler {
    pub fn new(clamp_max_ease: bool) -> Self {
        Self { clamp_max_ease }
    }

    pub fn clamps_max_ease(&self) -> bool {
        self.clamp_max_ease
    }

    /// Apply one review at `now`. Quality is not range checked: anything below
    /// 3 is a failure, anything else a pass.
    pub fn record_review_at(&self, item: &VocabItem, quality: i32, now: DateTime<Utc>) -> VocabItem {
        let mut out = item.clone();

        if quality < PASSING_QUALITY {
            out.repetitions = 0;
            out.interval = FAILED_INTERVAL;
        } else {
            out.repetitions = item.repetitions.saturating_add(1);
            out.interval = match out.repetitions {
                1 => FIRST_INTERVAL,
                2 => SECOND_INTERVAL,
                _ => grown_interval(item.interval, item.ease),
            };
            out.ease = self.next_ease(item.ease, quality);
        }

        out.next_review = Some(due_after(now, out.interval));
        out
    }

    fn next_ease(&self, ease: f64, quality: i32) -> f64 {
        let base = if ease == 0.0 { DEFAULT_EASE } else { ease };
        let delta = 0.1 - f64::from(5 - quality) * 0.08;
        let next = (base + delta).max(MIN_EASE);
        if self.clamp_max_ease {
            next.min(MAX_EASE)
        } else {
            next
        }
    }
}

// A zero interval falls back to the second-step interval before scaling.
fn grown_interval(previous: u32, ease: f64) -> u32 {
    let base = if previous == 0 { SECOND_INTERVAL } else { previous };
    // `as` saturates, keeping the result inside u32 for any ease.
    (f64::from(base) * ease).round() as u32
}

// Saturated intervals can run past what a timestamp can hold; those land on
// the last instant that still formats as a four-digit year.
fn due_after(now: DateTime<Utc>, interval: u32) -> DateTime<Utc> {
    let latest = DateTime::<Utc>::from_timestamp(LATEST_DUE_SECS, 999_000_000)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    now.trunc_subsecs(3)
        .checked_add_signed(Duration::days(i64::from(interval)))
        .map_or(latest, |due| due.min(latest))
}

pub fn is_due(item: &VocabItem, now: DateTime<Utc>) -> bool {
    item.has_content() && item.next_review.is_some_and(|next| next <= now)
}

/// Items with content whose next review is at or before `now`, in input order.
/// Never-scheduled items are not due.
pub fn due_items<'a, I>(items: I, now: DateTime<Utc>) -> Vec<&'a VocabItem>
where
    I: IntoIterator<Item = &'a VocabItem>,
{
    items.into_iter().filter(|it| is_due(it, now)).collect()
}
