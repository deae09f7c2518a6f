use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// Timestamps are written with millisecond precision and a `Z` suffix. Every
// value has the same width, so string order and chronological order agree.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_timestamp() -> String {
    format_timestamp(&Utc::now())
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&super::format_timestamp(dt)),
            None => serializer.serialize_none(),
        }
    }

    // Empty strings are treated like null: the browser app used "" and null
    // interchangeably for "never scheduled".
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{}': {}", s, e))),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Published,
    Pending,
    Draft,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Published => "published",
            ItemStatus::Pending => "pending",
            ItemStatus::Draft => "draft",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "published" => Some(ItemStatus::Published),
            "pending" => Some(ItemStatus::Pending),
            "draft" => Some(ItemStatus::Draft),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    pub name: String,
    pub ts: String,
}

/// A vocabulary entry with fully populated scheduling state.
///
/// Only produced by [`crate::srs::init_srs`] (directly or via the deck), so the
/// four scheduling fields are always present. Unknown JSON fields ride along in
/// `extra` and are written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabItem {
    pub id: String,
    pub word: String,
    pub definition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<Contributor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    pub ease: f64,
    pub interval: u32,
    pub repetitions: u32,
    #[serde(with = "iso_millis")]
    pub next_review: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VocabItem {
    pub fn mastery(&self) -> Mastery {
        Mastery::from_repetitions(self.repetitions)
    }

    pub fn has_content(&self) -> bool {
        !self.word.is_empty() && !self.definition.is_empty()
    }
}

/// A raw record as it arrives from storage or an import file. Any of the
/// scheduling fields may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialVocabItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub word: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<Contributor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ease: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetitions: Option<u32>,
    #[serde(default, with = "iso_millis", skip_serializing_if = "Option::is_none")]
    pub next_review: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PartialVocabItem {
    pub fn new(word: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            definition: definition.into(),
            ..Default::default()
        }
    }

    // Serde already rejects wrongly typed fields; this catches values that are
    // well typed but would poison the ease arithmetic.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ease) = self.ease {
            if !ease.is_finite() || ease < 0.0 {
                return Err(format!("ease must be a non-negative number, got {}", ease));
            }
        }
        Ok(())
    }

    pub fn normalized_word(&self) -> String {
        self.word.trim().to_lowercase()
    }
}

impl From<VocabItem> for PartialVocabItem {
    fn from(item: VocabItem) -> Self {
        Self {
            id: item.id,
            word: item.word,
            definition: item.definition,
            root: item.root,
            tags: item.tags,
            status: item.status,
            contributors: item.contributors,
            created_at: item.created_at,
            updated_at: item.updated_at,
            ease: Some(item.ease),
            interval: Some(item.interval),
            repetitions: Some(item.repetitions),
            next_review: item.next_review,
            extra: item.extra,
        }
    }
}

// Recall quality buttons. The scheduler itself takes a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    Blackout = 0,
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
    Perfect = 5,
}

impl Quality {
    pub const ALL: [Quality; 6] = [
        Quality::Blackout,
        Quality::Again,
        Quality::Hard,
        Quality::Good,
        Quality::Easy,
        Quality::Perfect,
    ];

    pub fn score(&self) -> i32 {
        *self as i32
    }

    pub fn from_score(score: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.score() == score)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quality::Blackout => "Blackout",
            Quality::Again => "Again",
            Quality::Hard => "Hard",
            Quality::Good => "Good",
            Quality::Easy => "Easy",
            Quality::Perfect => "Perfect",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "blackout" | "0" => Some(Quality::Blackout),
            "again" | "a" | "1" => Some(Quality::Again),
            "hard" | "h" | "2" => Some(Quality::Hard),
            "good" | "g" | "ok" | "3" => Some(Quality::Good),
            "easy" | "e" | "4" => Some(Quality::Easy),
            "perfect" | "p" | "5" => Some(Quality::Perfect),
            _ => None,
        }
    }

    pub fn passes(&self) -> bool {
        self.score() >= 3
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mastery {
    NotReviewed,
    Learning,
    Familiar,
    Mastered,
}

impl Mastery {
    pub fn from_repetitions(repetitions: u32) -> Self {
        match repetitions {
            0 => Mastery::NotReviewed,
            1..=3 => Mastery::Learning,
            4..=6 => Mastery::Familiar,
            _ => Mastery::Mastered,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mastery::NotReviewed => "Not Reviewed",
            Mastery::Learning => "Learning",
            Mastery::Familiar => "Familiar",
            Mastery::Mastered => "Mastered",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Mastery::NotReviewed => "⚪",
            Mastery::Learning => "🔵",
            Mastery::Familiar => "🟡",
            Mastery::Mastered => "🟢",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Date,
    Word,
    Root,
    Tags,
}

impl SortBy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "date" => Some(SortBy::Date),
            "word" => Some(SortBy::Word),
            "root" => Some(SortBy::Root),
            "tags" | "tag" => Some(SortBy::Tags),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
