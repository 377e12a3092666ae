use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::tags::dedup_tags;

pub type CardId = String;
pub type CollectionId = String;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: CardId,
    #[serde(default)]
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub description: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Card {
    /// Builds a card with a fresh id and `created_at = now`.
    pub fn new(input: CardInput) -> Self {
        let mut card = Self {
            id: new_id(),
            topic: String::new(),
            label: None,
            description: String::new(),
            details: String::new(),
            priority: Priority::default(),
            tags: Vec::new(),
            created_at: Utc::now(),
        };
        card.apply(input);
        card
    }

    /// Replaces every mutable field. `id` and `created_at` are never touched.
    pub fn apply(&mut self, input: CardInput) {
        self.topic = input.topic;
        self.label = input.label.filter(|l| !l.is_empty());
        self.description = input.description;
        self.details = input.details;
        self.priority = input.priority;
        self.tags = dedup_tags(input.tags);
    }
}

/// Drops cards whose id already appeared earlier in the list. Returns the kept
/// cards and how many were dropped.
pub fn dedup_cards(cards: Vec<Card>) -> (Vec<Card>, usize) {
    let mut seen = HashSet::new();
    let total = cards.len();
    let kept: Vec<Card> = cards.into_iter().filter(|c| seen.insert(c.id.clone())).collect();
    let dropped = total - kept.len();
    (kept, dropped)
}

/// The caller-editable part of a card.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CardInput {
    pub topic: String,
    pub label: Option<String>,
    pub description: String,
    pub details: String,
    pub priority: Priority,
    pub tags: Vec<String>,
}

impl CardInput {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

impl From<&Card> for CardInput {
    fn from(card: &Card) -> Self {
        Self {
            topic: card.topic.clone(),
            label: card.label.clone(),
            description: card.description.clone(),
            details: card.details.clone(),
            priority: card.priority,
            tags: card.tags.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: CollectionId,
    pub name: String,
    pub cards: Vec<Card>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collection {
    pub fn new(name: impl Into<String>, cards: Vec<Card>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.into(),
            cards,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the stored cards and moves `updated_at` strictly forward.
    pub fn overwrite(&mut self, cards: Vec<Card>) {
        self.cards = cards;
        self.updated_at = later_than(self.updated_at);
    }

    pub fn summary(&self) -> CollectionSummary {
        CollectionSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            card_count: self.cards.len(),
            updated_at: self.updated_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub id: CollectionId,
    pub name: String,
    pub card_count: usize,
    pub updated_at: DateTime<Utc>,
}

/// Sorts summaries most recently updated first.
pub fn sort_by_recent(summaries: &mut [CollectionSummary]) {
    summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

// Clock reads can repeat (or go backwards) between two quick saves.
fn later_than(prev: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > prev {
        now
    } else {
        prev + Duration::milliseconds(1)
    }
}

pub(crate) fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
