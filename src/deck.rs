use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

use crate::error::{Result, VocabError};
use crate::models::{
    now_timestamp, Contributor, ItemStatus, Mastery, PartialVocabItem, SortBy, SortOrder,
    VocabItem,
};
use crate::srs::{self, init_srs, Scheduler};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `v_<unix millis>_<6 random base36 chars>`
pub fn make_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("v_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Merge,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub merged: bool,
    pub added: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub word: Option<String>,
    pub definition: Option<String>,
    pub root: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<ItemStatus>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.word.is_none()
            && self.definition.is_none()
            && self.root.is_none()
            && self.tags.is_none()
            && self.status.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub reviewed: usize,
    pub not_reviewed: usize,
    pub due: usize,
    pub learning: usize,
    pub familiar: usize,
    pub mastered: usize,
    pub avg_ease: Option<f64>,
}

/// The authoritative in-memory collection. Load it, mutate it, then hand
/// `items()` back to the store as a whole.
#[derive(Debug, Clone, Default)]
pub struct Deck {
    items: Vec<VocabItem>,
    scheduler: Scheduler,
}

impl Deck {
    /// Items are expected to carry ids already; `Store::load_items` assigns
    /// and persists them for legacy records.
    pub fn new(items: Vec<VocabItem>, scheduler: Scheduler) -> Self {
        Self { items, scheduler }
    }

    pub fn items(&self) -> &[VocabItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn get(&self, id: &str) -> Option<&VocabItem> {
        self.items.iter().find(|it| it.id == id)
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.items
            .iter()
            .position(|it| it.id == id)
            .ok_or_else(|| VocabError::NotFound(id.to_string()))
    }

    pub fn add_item(&mut self, payload: PartialVocabItem, contributor: Option<&str>) -> &VocabItem {
        self.insert_new(payload, contributor, ItemStatus::Published)
    }

    /// Like `add_item`, but the entry waits in `pending` status.
    pub fn submit_contribution(
        &mut self,
        payload: PartialVocabItem,
        contributor: Option<&str>,
    ) -> &VocabItem {
        self.insert_new(payload, contributor, ItemStatus::Pending)
    }

    // Fields on the payload win over the generated ones.
    fn insert_new(
        &mut self,
        mut payload: PartialVocabItem,
        contributor: Option<&str>,
        status: ItemStatus,
    ) -> &VocabItem {
        let now = now_timestamp();
        if payload.id.is_empty() {
            payload.id = make_id();
        }
        payload.created_at.get_or_insert_with(|| now.clone());
        payload.updated_at.get_or_insert_with(|| now.clone());
        payload.status.get_or_insert(status);
        if payload.contributors.is_empty() {
            if let Some(name) = contributor {
                payload.contributors.push(Contributor {
                    name: name.to_string(),
                    ts: now,
                });
            }
        }

        let item = init_srs(payload);
        debug!(id = %item.id, word = %item.word, "adding item");
        self.items.insert(0, item);
        &self.items[0]
    }

    pub fn update_item(&mut self, id: &str, patch: ItemPatch) -> Result<&VocabItem> {
        let pos = self.position(id)?;
        let item = &mut self.items[pos];
        if let Some(word) = patch.word {
            item.word = word;
        }
        if let Some(definition) = patch.definition {
            item.definition = definition;
        }
        if let Some(root) = patch.root {
            item.root = Some(root);
        }
        if let Some(tags) = patch.tags {
            item.tags = tags;
        }
        if let Some(status) = patch.status {
            item.status = Some(status);
        }
        item.updated_at = Some(now_timestamp());
        Ok(&self.items[pos])
    }

    pub fn delete_item(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|it| it.id != id);
        self.items.len() != before
    }

    /// Merge skips words (trimmed, case-insensitive) that are already present,
    /// upserts the rest by id and re-sorts newest first. Replace discards the
    /// current collection.
    pub fn import_items(&mut self, list: Vec<PartialVocabItem>, mode: ImportMode) -> ImportReport {
        let report = match mode {
            ImportMode::Merge => self.merge(list),
            ImportMode::Replace => {
                let added = list.len();
                self.items = list.into_iter().map(prepare_import).collect();
                ImportReport {
                    merged: false,
                    added,
                    duplicates: 0,
                }
            }
        };
        info!(
            merged = report.merged,
            added = report.added,
            duplicates = report.duplicates,
            "imported items"
        );
        report
    }

    fn merge(&mut self, list: Vec<PartialVocabItem>) -> ImportReport {
        let mut index: HashMap<String, usize> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, it)| (it.id.clone(), i))
            .collect();
        let mut existing_words: HashSet<String> = self
            .items
            .iter()
            .map(|it| it.word.trim().to_lowercase())
            .collect();

        let mut added = 0;
        let mut duplicates = 0;
        for raw in list {
            let word = raw.normalized_word();
            if existing_words.contains(&word) {
                duplicates += 1;
                continue;
            }

            let item = prepare_import(raw);
            match index.get(&item.id) {
                Some(&pos) => self.items[pos] = item,
                None => {
                    index.insert(item.id.clone(), self.items.len());
                    self.items.push(item);
                }
            }
            existing_words.insert(word);
            added += 1;
        }

        self.items.sort_by(|a, b| {
            let a = a.created_at.as_deref().unwrap_or("");
            let b = b.created_at.as_deref().unwrap_or("");
            b.cmp(a)
        });

        ImportReport {
            merged: true,
            added,
            duplicates,
        }
    }

    pub fn due_items(&self, now: DateTime<Utc>) -> Vec<&VocabItem> {
        srs::due_items(&self.items, now)
    }

    pub fn record_review_result(&mut self, id: &str, quality: i32) -> Result<&VocabItem> {
        self.record_review_result_at(id, quality, Utc::now())
    }

    pub fn record_review_result_at(
        &mut self,
        id: &str,
        quality: i32,
        now: DateTime<Utc>,
    ) -> Result<&VocabItem> {
        let pos = self.position(id)?;
        let updated = self.scheduler.record_review_at(&self.items[pos], quality, now);
        debug!(
            id,
            quality,
            interval = updated.interval,
            repetitions = updated.repetitions,
            "recorded review"
        );
        self.items[pos] = updated;
        Ok(&self.items[pos])
    }

    /// Case-insensitive search over word, definition, root and tags, with an
    /// optional exact tag filter.
    pub fn filtered(
        &self,
        query: &str,
        tag: Option<&str>,
        sort_by: SortBy,
        order: SortOrder,
    ) -> Vec<&VocabItem> {
        let q = query.trim().to_lowercase();
        let mut result: Vec<&VocabItem> = self
            .items
            .iter()
            .filter(|it| tag.map_or(true, |t| it.tags.iter().any(|x| x == t)))
            .filter(|it| q.is_empty() || matches_query(it, &q))
            .collect();

        result.sort_by(|a, b| {
            let cmp = compare_by(a, b, sort_by);
            match order {
                SortOrder::Asc => cmp,
                SortOrder::Desc => cmp.reverse(),
            }
        });
        result
    }

    pub fn available_tags(&self) -> Vec<String> {
        self.items
            .iter()
            .flat_map(|it| it.tags.iter())
            .filter(|t| !t.is_empty())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Rename `old` to `new` on every item carrying it, dropping a duplicate
    /// when the item already has `new`. An empty or unchanged name is a no-op.
    /// Returns how many items changed.
    pub fn rename_tag(&mut self, old: &str, new: &str) -> usize {
        let new = new.trim();
        if new.is_empty() || new == old {
            return 0;
        }

        let now = now_timestamp();
        let mut changed = 0;
        for item in self.items.iter_mut().filter(|it| it.tags.iter().any(|t| t == old)) {
            let mut seen = HashSet::new();
            item.tags = item
                .tags
                .iter()
                .map(|t| if t == old { new.to_string() } else { t.clone() })
                .filter(|t| seen.insert(t.clone()))
                .collect();
            item.updated_at = Some(now.clone());
            changed += 1;
        }
        info!(old, new, changed, "renamed tag");
        changed
    }

    /// Remove `tag` from every item. Returns how many items changed.
    pub fn delete_tag(&mut self, tag: &str) -> usize {
        let now = now_timestamp();
        let mut changed = 0;
        for item in self.items.iter_mut().filter(|it| it.tags.iter().any(|t| t == tag)) {
            item.tags.retain(|t| t != tag);
            item.updated_at = Some(now.clone());
            changed += 1;
        }
        info!(tag, changed, "deleted tag");
        changed
    }

    /// The first `n` items; new items are inserted at the front.
    pub fn recent(&self, n: usize) -> &[VocabItem] {
        &self.items[..n.min(self.items.len())]
    }

    pub fn stats(&self, now: DateTime<Utc>) -> Stats {
        let mut stats = Stats {
            total: self.items.len(),
            reviewed: 0,
            not_reviewed: 0,
            due: self.due_items(now).len(),
            learning: 0,
            familiar: 0,
            mastered: 0,
            avg_ease: None,
        };

        for item in &self.items {
            match item.mastery() {
                Mastery::NotReviewed => stats.not_reviewed += 1,
                Mastery::Learning => stats.learning += 1,
                Mastery::Familiar => stats.familiar += 1,
                Mastery::Mastered => stats.mastered += 1,
            }
        }
        stats.reviewed = stats.total - stats.not_reviewed;

        let eases: Vec<f64> = self
            .items
            .iter()
            .map(|it| it.ease)
            .filter(|e| *e != 0.0)
            .collect();
        if !eases.is_empty() {
            stats.avg_ease = Some(eases.iter().sum::<f64>() / eases.len() as f64);
        }

        stats
    }

    /// Everything that can be shown on a flashcard.
    pub fn study_pool(&self) -> Vec<&VocabItem> {
        self.items.iter().filter(|it| it.has_content()).collect()
    }

    /// Walk the study pool in collection order, wrapping around.
    pub fn study_item_at(&self, index: usize) -> Option<&VocabItem> {
        let pool = self.study_pool();
        if pool.is_empty() {
            return None;
        }
        Some(pool[index % pool.len()])
    }

    /// Stochastic pick from the study pool: overdue items and items with few
    /// repetitions are more likely. Never-scheduled items are eligible, which
    /// is how new words get their first review.
    pub fn next_study_item<R: Rng + ?Sized>(
        &self,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Option<&VocabItem> {
        let pool = self.study_pool();
        if pool.is_empty() {
            return None;
        }

        let weights: Vec<f64> = pool.iter().map(|it| study_weight(it, now)).collect();
        let total_weight: f64 = weights.iter().sum();
        let mut random_point = rng.gen::<f64>() * total_weight;

        for (item, weight) in pool.iter().zip(&weights) {
            random_point -= weight;
            if random_point <= 0.0 {
                return Some(*item);
            }
        }

        pool.first().copied()
    }
}

fn prepare_import(mut raw: PartialVocabItem) -> VocabItem {
    if raw.id.is_empty() {
        raw.id = make_id();
    }
    raw.status.get_or_insert(ItemStatus::Published);
    init_srs(raw)
}

fn matches_query(item: &VocabItem, q: &str) -> bool {
    item.word.to_lowercase().contains(q)
        || item.definition.to_lowercase().contains(q)
        || item
            .root
            .as_deref()
            .is_some_and(|r| r.to_lowercase().contains(q))
        || item.tags.iter().any(|t| t.to_lowercase().contains(q))
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn compare_by(a: &VocabItem, b: &VocabItem, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Word => compare_text(&a.word, &b.word),
        SortBy::Root => compare_text(
            a.root.as_deref().unwrap_or(""),
            b.root.as_deref().unwrap_or(""),
        ),
        SortBy::Date => a
            .created_at
            .as_deref()
            .unwrap_or("")
            .cmp(b.created_at.as_deref().unwrap_or("")),
        SortBy::Tags => compare_text(
            a.tags.first().map(String::as_str).unwrap_or(""),
            b.tags.first().map(String::as_str).unwrap_or(""),
        ),
    }
}

fn study_weight(item: &VocabItem, now: DateTime<Utc>) -> f64 {
    let overdue_days = match item.next_review {
        Some(next) => now.signed_duration_since(next).num_days().max(0) as f64 + 1.0,
        None => 1.0,
    };
    let repetition_weight = 8.0 - f64::from(item.repetitions.min(7));
    overdue_days * repetition_weight
}
