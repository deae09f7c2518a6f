use serde_json::Value;
use tracing::warn;

use crate::error::{Result, VocabError};
use crate::models::{PartialVocabItem, VocabItem};
use crate::store::parse_record;

pub fn export_json(items: &[VocabItem]) -> Result<String> {
    Ok(serde_json::to_string_pretty(items)?)
}

/// Parse an import file. Anything other than a JSON array imports nothing.
pub fn import_json(raw: &str) -> Result<Vec<PartialVocabItem>> {
    let parsed: Value = serde_json::from_str(raw).map_err(|_| VocabError::InvalidJson)?;
    let Value::Array(records) = parsed else {
        warn!("import document is not an array, ignoring");
        return Ok(Vec::new());
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, value)| parse_record(index, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srs::init_srs;

    #[test]
    fn export_is_pretty_array() {
        let items = vec![init_srs(PartialVocabItem::new("lucid", "clear"))];
        let text = export_json(&items).unwrap();
        assert!(text.starts_with("[\n"));
        assert!(text.contains("\"word\": \"lucid\""));
    }

    #[test]
    fn export_empty_collection() {
        assert_eq!(export_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn import_reads_exported_items() {
        let items = vec![init_srs(PartialVocabItem::new("lucid", "clear"))];
        let parsed = import_json(&export_json(&items).unwrap()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].word, "lucid");
        assert_eq!(parsed[0].ease, Some(2.5));
    }

    #[test]
    fn import_invalid_json() {
        assert!(matches!(import_json("not json"), Err(VocabError::InvalidJson)));
    }

    #[test]
    fn import_non_array_is_empty() {
        assert!(import_json(r#"{"word": "x"}"#).unwrap().is_empty());
        assert!(import_json("42").unwrap().is_empty());
    }

    #[test]
    fn import_rejects_bad_record() {
        let err = import_json(r#"[{"word": "x", "repetitions": "two"}]"#).unwrap_err();
        assert!(matches!(err, VocabError::InvalidRecord { index: 0, .. }));
    }
}
