//! JSON snapshots of the active card list and the collections table.
//!
//! Both slots hold a JSON array. Loading validates every entry on its own:
//! entries that do not fit the schema are skipped and counted in a
//! [`LoadReport`] instead of failing the whole load.

use crate::{dedup_cards, dedup_tags, new_id, Card, Collection, CoreError, KvStore};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

pub const CARDS_KEY: &str = "cards";
pub const COLLECTIONS_KEY: &str = "cardCollections";
/// Presentation-only; the manager never reads or writes it.
pub const THEME_KEY: &str = "appTheme";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Slots whose content was not a JSON array at all.
    pub unreadable_slots: Vec<&'static str>,
    pub skipped_cards: usize,
    pub duplicate_cards: usize,
    pub skipped_collections: usize,
    /// Collections folded into an earlier entry with the same name.
    pub merged_collections: usize,
    /// Collections given a fresh id because an earlier one already used theirs.
    pub reassigned_ids: usize,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub cards: Vec<Card>,
    pub collections: Vec<Collection>,
}

pub fn read_snapshot(store: &dyn KvStore) -> (Snapshot, LoadReport) {
    let mut report = LoadReport::default();
    let cards = decode_cards(store.get(CARDS_KEY).as_deref(), &mut report);
    let collections = decode_collections(store.get(COLLECTIONS_KEY).as_deref(), &mut report);
    (Snapshot { cards, collections }, report)
}

pub fn encode_cards(cards: &[Card]) -> Result<String, CoreError> {
    serde_json::to_string(cards).map_err(|_| CoreError::Storage("encode cards"))
}

pub fn encode_collections(collections: &[Collection]) -> Result<String, CoreError> {
    serde_json::to_string(collections).map_err(|_| CoreError::Storage("encode collections"))
}

pub fn decode_cards(raw: Option<&str>, report: &mut LoadReport) -> Vec<Card> {
    let Some(entries) = parse_array(raw, CARDS_KEY, report) else {
        return Vec::new();
    };
    cards_from_values(entries, report)
}

pub fn decode_collections(raw: Option<&str>, report: &mut LoadReport) -> Vec<Collection> {
    let Some(entries) = parse_array(raw, COLLECTIONS_KEY, report) else {
        return Vec::new();
    };

    let mut out: Vec<Collection> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for v in entries {
        let Ok(raw) = serde_json::from_value::<RawCollection>(v) else {
            report.skipped_collections += 1;
            continue;
        };
        let name = raw.name.trim().to_string();
        if name.is_empty() {
            report.skipped_collections += 1;
            continue;
        }
        let cards = cards_from_values(raw.cards, report);
        let updated_at = raw.updated_at.unwrap_or(raw.created_at);

        if let Some(&i) = by_name.get(&name) {
            let existing = &mut out[i];
            existing.cards = cards;
            existing.updated_at = updated_at.max(existing.updated_at);
            report.merged_collections += 1;
            continue;
        }

        let mut id = raw.id;
        if !seen_ids.insert(id.clone()) {
            id = new_id();
            seen_ids.insert(id.clone());
            report.reassigned_ids += 1;
        }
        by_name.insert(name.clone(), out.len());
        out.push(Collection {
            id,
            name,
            cards,
            created_at: raw.created_at,
            updated_at,
        });
    }
    out
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCollection {
    #[serde(deserialize_with = "crate::models::id_from_string_or_number")]
    id: String,
    name: String,
    #[serde(default)]
    cards: Vec<Value>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

fn parse_array(raw: Option<&str>, slot: &'static str, report: &mut LoadReport) -> Option<Vec<Value>> {
    let raw = raw?;
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(entries)) => Some(entries),
        _ => {
            report.unreadable_slots.push(slot);
            None
        }
    }
}

fn cards_from_values(entries: Vec<Value>, report: &mut LoadReport) -> Vec<Card> {
    let mut out = Vec::with_capacity(entries.len());
    for v in entries {
        match serde_json::from_value::<Card>(v) {
            Ok(mut card) => {
                card.tags = dedup_tags(card.tags);
                out.push(card);
            }
            Err(_) => report.skipped_cards += 1,
        }
    }
    let (out, dropped) = dedup_cards(out);
    report.duplicate_cards += dropped;
    out
}
