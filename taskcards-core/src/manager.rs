//! The collection manager: the active card list, the collections table, and
//! which collection (if any) the active list is bound to.
//!
//! Every successful mutation writes full snapshots back to the store. While a
//! collection is bound, card edits are mirrored into it as well.

use crate::snapshot::{encode_cards, encode_collections, read_snapshot, CARDS_KEY, COLLECTIONS_KEY};
use crate::{
    dedup_cards, filter_by_text, new_id, Card, CardInput, Collection, CollectionSummary, CoreError,
    KvStore, LoadReport,
};
use std::sync::Arc;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ActiveCollection {
    #[default]
    Unbound,
    Bound(String),
}

impl ActiveCollection {
    pub fn name(&self) -> Option<&str> {
        match self {
            ActiveCollection::Unbound => None,
            ActiveCollection::Bound(name) => Some(name),
        }
    }
}

pub struct CollectionManager {
    store: Arc<dyn KvStore>,
    cards: Vec<Card>,
    collections: Vec<Collection>,
    active: ActiveCollection,
    load_report: LoadReport,
}

impl CollectionManager {
    /// Restores cards and collections from `store`. The session starts unbound.
    pub fn open(store: Arc<dyn KvStore>) -> Self {
        let (snapshot, load_report) = read_snapshot(&*store);
        Self {
            store,
            cards: snapshot.cards,
            collections: snapshot.collections,
            active: ActiveCollection::Unbound,
            load_report,
        }
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }

    pub fn collection_by_name(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.name == name)
    }

    pub fn active(&self) -> &ActiveCollection {
        &self.active
    }

    pub fn active_collection(&self) -> Option<&str> {
        self.active.name()
    }

    // ----- Cards -----

    pub fn add_card(&mut self, input: CardInput) -> Result<Card, CoreError> {
        let mut card = Card::new(input);
        while self.card(&card.id).is_some() {
            card.id = new_id();
        }
        self.cards.push(card.clone());
        self.cards_changed()?;
        Ok(card)
    }

    /// Fails with `NotFound` and writes nothing when `id` is not in the active list.
    pub fn update_card(&mut self, id: &str, input: CardInput) -> Result<Card, CoreError> {
        let card = self
            .cards
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(CoreError::NotFound("card"))?;
        card.apply(input);
        let updated = card.clone();
        self.cards_changed()?;
        Ok(updated)
    }

    /// Fails with `NotFound` and writes nothing when `id` is not in the active list.
    pub fn remove_card(&mut self, id: &str) -> Result<Card, CoreError> {
        let pos = self
            .cards
            .iter()
            .position(|c| c.id == id)
            .ok_or(CoreError::NotFound("card"))?;
        let removed = self.cards.remove(pos);
        self.cards_changed()?;
        Ok(removed)
    }

    pub fn list_cards(&self, query: &str) -> Vec<Card> {
        filter_by_text(&self.cards, query)
    }

    // ----- Collections -----

    /// Upserts `cards` under `name` without touching the active binding. Cards
    /// repeating an earlier id are dropped.
    pub fn save_as(&mut self, name: &str, cards: &[Card]) -> Result<Collection, CoreError> {
        let name = valid_name(name)?;
        let saved = self.upsert(name, cards.to_vec());
        self.write_collections()?;
        Ok(saved)
    }

    /// Upserts an empty collection, clears the active list, and binds to it.
    pub fn create_new(&mut self, name: &str) -> Result<Collection, CoreError> {
        let name = valid_name(name)?;
        let created = self.upsert(name, Vec::new());
        self.cards.clear();
        self.active = ActiveCollection::Bound(created.name.clone());
        self.write_cards()?;
        self.write_collections()?;
        Ok(created)
    }

    /// Replaces the active list with a copy of the collection's cards and binds to it.
    pub fn load(&mut self, id: &str) -> Result<&[Card], CoreError> {
        let collection = self.collection(id).ok_or(CoreError::NotFound("collection"))?;
        let cards = collection.cards.clone();
        let name = collection.name.clone();
        self.cards = cards;
        self.active = ActiveCollection::Bound(name);
        self.write_cards()?;
        Ok(&self.cards)
    }

    /// Saves the active list into the bound collection.
    pub fn quick_save(&mut self) -> Result<Collection, CoreError> {
        let name = self
            .active
            .name()
            .ok_or(CoreError::NoActiveCollection)?
            .to_string();
        let cards = self.cards.clone();
        self.save_as(&name, &cards)
    }

    /// Summaries in insertion order.
    pub fn list_collections(&self) -> Vec<CollectionSummary> {
        self.collections.iter().map(Collection::summary).collect()
    }

    // ----- Internals -----

    // A repeated card id keeps its first occurrence.
    fn upsert(&mut self, name: &str, cards: Vec<Card>) -> Collection {
        let (cards, _) = dedup_cards(cards);
        if let Some(existing) = self.collections.iter_mut().find(|c| c.name == name) {
            existing.overwrite(cards);
            return existing.clone();
        }
        let mut created = Collection::new(name, cards);
        while self.collection(&created.id).is_some() {
            created.id = new_id();
        }
        self.collections.push(created.clone());
        created
    }

    fn cards_changed(&mut self) -> Result<(), CoreError> {
        self.write_cards()?;
        if let ActiveCollection::Bound(name) = &self.active {
            let name = name.clone();
            let cards = self.cards.clone();
            self.upsert(&name, cards);
            self.write_collections()?;
        }
        Ok(())
    }

    fn write_cards(&self) -> Result<(), CoreError> {
        let json = encode_cards(&self.cards)?;
        self.store.set(CARDS_KEY, json);
        Ok(())
    }

    fn write_collections(&self) -> Result<(), CoreError> {
        let json = encode_collections(&self.collections)?;
        self.store.set(COLLECTIONS_KEY, json);
        Ok(())
    }
}

fn valid_name(name: &str) -> Result<&str, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(CoreError::InvalidName)
    } else {
        Ok(trimmed)
    }
}
