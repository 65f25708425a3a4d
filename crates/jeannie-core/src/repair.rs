//! Field-level repair of scanner output ahead of typed deserialization.
//!
//! Curated metadata is edited by hand and drifts. A bad optional value on
//! one item costs that value only: each known field is checked against its
//! target type, and invalid ones are dropped with a warning so they fall
//! back to their defaults. Only an item's `id` is a hard requirement.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::catalog::CatalogStats;
use crate::error::{Error, Result};
use crate::model::{ItemId, MidiSpec, PlayingModes, Quality, StrumBehavior};

type Check = fn(&Value) -> bool;

const CATALOG_FIELDS: &[(&str, Check)] = &[
    ("version", valid::<Option<String>>),
    ("scanDate", valid::<Option<DateTime<Utc>>>),
    ("bitwigVersion", valid::<Option<String>>),
    ("scanDurationMs", valid::<Option<u64>>),
    ("contentTypes", valid::<Vec<String>>),
    ("totals", valid::<BTreeMap<String, u64>>),
    ("stats", valid::<CatalogStats>),
];

const ITEM_FIELDS: &[(&str, Check)] = &[
    ("name", valid::<Option<String>>),
    ("contentType", valid::<Option<String>>),
    ("deviceType", valid::<Option<String>>),
    ("fileType", valid::<Option<String>>),
    ("creator", valid::<Option<String>>),
    ("category", valid::<Option<String>>),
    ("plugin", valid::<Option<String>>),
    ("library", valid::<Option<String>>),
    ("collection", valid::<Option<String>>),
    ("path", valid::<Option<String>>),
    ("quality", valid::<Option<Quality>>),
    ("midiSpec", valid::<Option<MidiSpec>>),
    ("playingModes", valid::<Option<PlayingModes>>),
    ("strumBehavior", valid::<Option<StrumBehavior>>),
    ("nameTokens", valid::<Vec<String>>),
];

fn valid<T: DeserializeOwned>(value: &Value) -> bool {
    T::deserialize(value).is_ok()
}

/// Drop invalid scan metadata from a catalog document.
pub(crate) fn repair_catalog(document: &mut Map<String, Value>) {
    drop_invalid(document, CATALOG_FIELDS, "catalog");
}

/// Drop invalid optional fields of the item at `position`.
///
/// Genre scores and vibe tags are checked one entry at a time.
///
/// # Errors
///
/// `Error::Schema` if the item is not an object or lacks a valid `id`.
pub(crate) fn repair_item(position: usize, item: &mut Value) -> Result<()> {
    let Value::Object(fields) = item else {
        return Err(Error::Schema(format!(
            "item at position {position} is not an object"
        )));
    };
    let id = fields
        .get("id")
        .and_then(|id| ItemId::deserialize(id).ok())
        .ok_or_else(|| Error::Schema(format!("item at position {position} has no valid `id`")))?;

    let context = format!("item {id}");
    drop_invalid(fields, ITEM_FIELDS, &context);
    repair_genres(fields, &context);
    repair_vibes(fields, &context);
    Ok(())
}

fn drop_invalid(fields: &mut Map<String, Value>, checks: &[(&str, Check)], context: &str) {
    for (key, check) in checks {
        if fields.get(*key).is_some_and(|value| !check(value)) {
            log::warn!("Ignoring invalid `{}` on {}", key, context);
            fields.remove(*key);
        }
    }
}

fn repair_genres(fields: &mut Map<String, Value>, context: &str) {
    match fields.get("genres") {
        None | Some(Value::Object(_)) => {}
        Some(_) => {
            log::warn!("Ignoring invalid `genres` on {}", context);
            fields.remove("genres");
        }
    }
    if let Some(Value::Object(scores)) = fields.get_mut("genres") {
        scores.retain(|genre, score| {
            let keep = u8::deserialize(&*score).is_ok();
            if !keep {
                log::warn!(
                    "Ignoring invalid score {} for genre '{}' on {}",
                    score,
                    genre,
                    context
                );
            }
            keep
        });
    }
}

fn repair_vibes(fields: &mut Map<String, Value>, context: &str) {
    match fields.get("vibe") {
        None | Some(Value::Array(_)) => {}
        Some(_) => {
            log::warn!("Ignoring invalid `vibe` on {}", context);
            fields.remove("vibe");
        }
    }
    if let Some(Value::Array(vibes)) = fields.get_mut("vibe") {
        vibes.retain(|vibe| {
            let keep = vibe.is_string();
            if !keep {
                log::warn!("Ignoring invalid vibe {} on {}", vibe, context);
            }
            keep
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_repair_item_drops_only_invalid_fields() {
        let mut item = json!({
            "id": 4,
            "name": "Session Horns",
            "creator": 12,
            "quality": {"trustworthiness": 80},
            "playingModes": {"available": ["staccato"]},
            "strumBehavior": {"type": "phrase"}
        });
        repair_item(0, &mut item).unwrap();

        let fields = item.as_object().unwrap();
        assert_eq!(fields["name"], "Session Horns");
        assert_eq!(fields["strumBehavior"]["type"], "phrase");
        assert!(!fields.contains_key("creator"));
        assert!(!fields.contains_key("quality"));
        assert!(!fields.contains_key("playingModes"));
    }

    #[test]
    fn test_repair_item_filters_genre_entries() {
        let mut item = json!({"id": 1, "genres": {"rock": 87.5, "country": 90, "folk": -3, "pop": "high"}});
        repair_item(0, &mut item).unwrap();
        assert_eq!(item["genres"], json!({"country": 90}));

        let mut item = json!({"id": 1, "genres": [90]});
        repair_item(0, &mut item).unwrap();
        assert!(item.get("genres").is_none());
    }

    #[test]
    fn test_repair_item_filters_vibe_entries() {
        let mut item = json!({"id": 1, "vibe": ["warm", 3, null, "dark"]});
        repair_item(0, &mut item).unwrap();
        assert_eq!(item["vibe"], json!(["warm", "dark"]));

        let mut item = json!({"id": 1, "vibe": "warm"});
        repair_item(0, &mut item).unwrap();
        assert!(item.get("vibe").is_none());
    }

    #[test]
    fn test_repair_item_requires_id() {
        assert!(matches!(
            repair_item(2, &mut json!({"name": "Anonymous"})),
            Err(Error::Schema(msg)) if msg.contains("position 2")
        ));
        assert!(repair_item(0, &mut json!({"id": -1})).is_err());
        assert!(repair_item(0, &mut json!("Misfit Banjo")).is_err());
    }

    #[test]
    fn test_repair_catalog_drops_bad_metadata() {
        let mut document = json!({
            "version": "1.0",
            "scanDate": "last tuesday",
            "scanDurationMs": -4,
            "totals": {"total": 3}
        });
        let Value::Object(fields) = &mut document else {
            panic!("object expected");
        };
        repair_catalog(fields);
        assert!(fields.contains_key("version"));
        assert!(fields.contains_key("totals"));
        assert!(!fields.contains_key("scanDate"));
        assert!(!fields.contains_key("scanDurationMs"));
    }
}
