use crate::{Card, Priority};

/// Case-insensitive substring match against topic or description.
/// An empty query keeps every card.
pub fn filter_by_text(cards: &[Card], query: &str) -> Vec<Card> {
    let q = query.to_lowercase();
    if q.is_empty() {
        return cards.to_vec();
    }
    cards
        .iter()
        .filter(|c| {
            c.topic.to_lowercase().contains(&q) || c.description.to_lowercase().contains(&q)
        })
        .cloned()
        .collect()
}

pub fn filter_by_tag(cards: &[Card], tag: &str) -> Vec<Card> {
    let q = tag.trim().to_lowercase();
    cards
        .iter()
        .filter(|c| c.tags.iter().any(|t| t.to_lowercase() == q))
        .cloned()
        .collect()
}

pub fn filter_by_priority(cards: &[Card], want: Priority) -> Vec<Card> {
    cards
        .iter()
        .filter(|c| c.priority == want)
        .cloned()
        .collect()
}
