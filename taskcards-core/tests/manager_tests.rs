use std::collections::HashSet;
use std::sync::Arc;

use taskcards_core::{
    decode_cards, decode_collections, ActiveCollection, CardInput, CollectionManager, CoreError,
    KvStore, LoadReport, MemoryKv, Priority, CARDS_KEY, COLLECTIONS_KEY,
};

fn fresh() -> (Arc<MemoryKv>, CollectionManager) {
    let kv = Arc::new(MemoryKv::new());
    let m = CollectionManager::open(kv.clone());
    (kv, m)
}

fn stored_cards(kv: &MemoryKv) -> Vec<taskcards_core::Card> {
    decode_cards(kv.get(CARDS_KEY).as_deref(), &mut LoadReport::default())
}

fn stored_collections(kv: &MemoryKv) -> Vec<taskcards_core::Collection> {
    decode_collections(kv.get(COLLECTIONS_KEY).as_deref(), &mut LoadReport::default())
}

#[test]
fn add_card_appends_with_unique_ids() {
    let (kv, mut m) = fresh();
    let mut ids = HashSet::new();
    for i in 0..25 {
        let before = m.cards().len();
        let c = m.add_card(CardInput::new(format!("card {i}"))).unwrap();
        assert_eq!(m.cards().len(), before + 1);
        assert_eq!(m.cards().last().unwrap().id, c.id);
        assert!(ids.insert(c.id));
    }
    assert_eq!(stored_cards(&kv).len(), 25);
}

#[test]
fn add_card_keeps_input_fields_and_dedups_tags() {
    let (_kv, mut m) = fresh();
    let c = m
        .add_card(
            CardInput::new("Reset MFA for locked users")
                .topic("Access")
                .label("IAM")
                .details("Use the admin console")
                .priority(Priority::High)
                .tags(["iam", "mfa", "iam"]),
        )
        .unwrap();
    assert_eq!(c.topic, "Access");
    assert_eq!(c.label.as_deref(), Some("IAM"));
    assert_eq!(c.details, "Use the admin console");
    assert_eq!(c.priority, Priority::High);
    assert_eq!(c.tags, vec!["iam", "mfa"]);
}

#[test]
fn update_card_preserves_id_and_created_at() {
    let (kv, mut m) = fresh();
    let original = m.add_card(CardInput::new("first").topic("A")).unwrap();

    let updated = m
        .update_card(&original.id, CardInput::new("second").topic("B").tags(["x"]))
        .unwrap();
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.created_at, original.created_at);
    assert_eq!(updated.description, "second");
    assert_eq!(updated.topic, "B");
    assert_eq!(updated.tags, vec!["x"]);

    let stored = stored_cards(&kv);
    assert_eq!(stored, vec![updated]);
}

#[test]
fn update_and_remove_unknown_id_fail_without_writing() {
    let (kv, mut m) = fresh();
    m.add_card(CardInput::new("only")).unwrap();
    let writes = kv.write_count();

    assert_eq!(
        m.update_card("nope", CardInput::new("x")).unwrap_err(),
        CoreError::NotFound("card")
    );
    assert_eq!(m.remove_card("nope").unwrap_err(), CoreError::NotFound("card"));
    assert_eq!(kv.write_count(), writes);
    assert_eq!(m.cards().len(), 1);
}

#[test]
fn remove_card_drops_it_and_persists() {
    let (kv, mut m) = fresh();
    let a = m.add_card(CardInput::new("a")).unwrap();
    let b = m.add_card(CardInput::new("b")).unwrap();

    let removed = m.remove_card(&a.id).unwrap();
    assert_eq!(removed.id, a.id);
    assert_eq!(m.cards().len(), 1);
    assert_eq!(m.cards()[0].id, b.id);
    assert_eq!(stored_cards(&kv).len(), 1);
}

#[test]
fn list_cards_filters_topic_or_description() {
    let (_kv, mut m) = fresh();
    m.add_card(CardInput::new("Restart the mail relay").topic("Email")).unwrap();
    m.add_card(CardInput::new("Patch C++ toolchain").topic("Build")).unwrap();
    m.add_card(CardInput::new("Überprüfung der Änderungen").topic("Change")).unwrap();

    let all = m.list_cards("");
    assert_eq!(all, m.cards().to_vec());

    assert_eq!(m.list_cards("EMAIL").len(), 1);
    assert_eq!(m.list_cards("relay").len(), 1);
    assert_eq!(m.list_cards("c++").len(), 1);
    assert_eq!(m.list_cards("änderung").len(), 1);
    assert!(m.list_cards("nothing here").is_empty());
}

#[test]
fn save_as_upserts_by_name() {
    let (kv, mut m) = fresh();
    let a = m.add_card(CardInput::new("a")).unwrap();
    let b = m.add_card(CardInput::new("b")).unwrap();

    let first = m.save_as("Runbook", &[a.clone()]).unwrap();
    let second = m.save_as("Runbook", &[a.clone(), b.clone()]).unwrap();

    assert_eq!(m.collections().len(), 1);
    assert_eq!(second.id, first.id);
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(second.cards, vec![a, b]);

    let stored = stored_collections(&kv);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0], second);
}

#[test]
fn save_as_trims_name_and_rejects_blank() {
    let (kv, mut m) = fresh();
    assert_eq!(m.save_as("", &[]).unwrap_err(), CoreError::InvalidName);
    assert_eq!(m.save_as("   ", &[]).unwrap_err(), CoreError::InvalidName);
    assert!(m.collections().is_empty());
    assert_eq!(kv.write_count(), 0);

    let saved = m.save_as("  Ops  ", &[]).unwrap();
    assert_eq!(saved.name, "Ops");
    m.save_as("Ops", &[]).unwrap();
    assert_eq!(m.collections().len(), 1);
}

#[test]
fn save_as_does_not_rebind() {
    let (_kv, mut m) = fresh();
    m.create_new("Sprint 1").unwrap();
    m.save_as("Fork", &[]).unwrap();
    assert_eq!(m.active_collection(), Some("Sprint 1"));

    let (_kv, mut unbound) = fresh();
    unbound.save_as("Fork", &[]).unwrap();
    assert_eq!(unbound.active(), &ActiveCollection::Unbound);
}

#[test]
fn sprint_scenario() {
    let (kv, mut m) = fresh();
    m.add_card(CardInput::new("left over")).unwrap();

    let created = m.create_new("Sprint 1").unwrap();
    assert!(m.cards().is_empty());
    assert_eq!(m.collections().len(), 1);
    assert!(created.cards.is_empty());
    assert_eq!(m.active_collection(), Some("Sprint 1"));
    assert!(stored_cards(&kv).is_empty());

    let card = m.add_card(CardInput::new("write runbook")).unwrap();
    assert_eq!(m.cards().len(), 1);
    let bound = m.collection_by_name("Sprint 1").unwrap().clone();
    assert_eq!(bound.cards, vec![card.clone()]);
    assert_eq!(stored_collections(&kv)[0].cards, vec![card]);

    let saved = m.quick_save().unwrap();
    assert_eq!(m.collections().len(), 1);
    assert_eq!(saved.id, created.id);
    assert!(saved.updated_at > bound.updated_at);
}

#[test]
fn bound_collection_mirrors_edits_and_removals() {
    let (_kv, mut m) = fresh();
    m.create_new("Ops").unwrap();
    let c = m.add_card(CardInput::new("draft")).unwrap();
    m.update_card(&c.id, CardInput::new("final")).unwrap();
    assert_eq!(m.collection_by_name("Ops").unwrap().cards[0].description, "final");

    m.remove_card(&c.id).unwrap();
    assert!(m.collection_by_name("Ops").unwrap().cards.is_empty());
}

#[test]
fn unbound_edits_leave_collections_alone() {
    let (_kv, mut m) = fresh();
    let a = m.add_card(CardInput::new("a")).unwrap();
    let saved = m.save_as("Snapshot", &[a]).unwrap();

    m.add_card(CardInput::new("b")).unwrap();
    assert_eq!(m.collection_by_name("Snapshot").unwrap(), &saved);
}

#[test]
fn quick_save_without_binding_is_rejected() {
    let (_kv, mut m) = fresh();
    m.add_card(CardInput::new("a")).unwrap();
    assert_eq!(m.quick_save().unwrap_err(), CoreError::NoActiveCollection);
    assert!(m.collections().is_empty());
}

#[test]
fn create_new_rejects_blank_name_without_touching_state() {
    let (_kv, mut m) = fresh();
    m.add_card(CardInput::new("keep me")).unwrap();
    assert_eq!(m.create_new(" \t ").unwrap_err(), CoreError::InvalidName);
    assert_eq!(m.cards().len(), 1);
    assert_eq!(m.active(), &ActiveCollection::Unbound);
}

#[test]
fn create_new_over_existing_name_empties_it() {
    let (_kv, mut m) = fresh();
    let a = m.add_card(CardInput::new("a")).unwrap();
    let first = m.save_as("Reuse", &[a]).unwrap();

    let again = m.create_new("Reuse").unwrap();
    assert_eq!(again.id, first.id);
    assert!(again.cards.is_empty());
    assert_eq!(m.collections().len(), 1);
}

#[test]
fn load_copies_cards_and_binds() {
    let (kv, mut m) = fresh();
    let a = m.add_card(CardInput::new("a")).unwrap();
    let saved = m.save_as("Saved", &[a.clone()]).unwrap();
    m.add_card(CardInput::new("b")).unwrap();

    let loaded = m.load(&saved.id).unwrap().to_vec();
    assert_eq!(loaded, vec![a.clone()]);
    assert_eq!(m.active_collection(), Some("Saved"));
    assert_eq!(stored_cards(&kv), vec![a]);

    // The active list is a copy: editing it goes through the binding, not aliasing.
    m.add_card(CardInput::new("c")).unwrap();
    assert_eq!(m.collection(&saved.id).unwrap().cards.len(), 2);
}

#[test]
fn load_unknown_id_leaves_state_alone() {
    let (_kv, mut m) = fresh();
    m.add_card(CardInput::new("a")).unwrap();
    let before = m.cards().to_vec();

    assert_eq!(
        m.load("unknown-id").unwrap_err(),
        CoreError::NotFound("collection")
    );
    assert_eq!(m.cards(), &before[..]);
    assert_eq!(m.active(), &ActiveCollection::Unbound);
}

#[test]
fn load_then_save_as_same_name_is_idempotent() {
    let (_kv, mut m) = fresh();
    let a = m.add_card(CardInput::new("a")).unwrap();
    let b = m.add_card(CardInput::new("b")).unwrap();
    let saved = m.save_as("Stable", &[a, b]).unwrap();

    let cards = m.load(&saved.id).unwrap().to_vec();
    let again = m.save_as("Stable", &cards).unwrap();

    assert_eq!(again.id, saved.id);
    assert_eq!(again.name, saved.name);
    assert_eq!(again.cards, saved.cards);
    assert_eq!(again.created_at, saved.created_at);
}

#[test]
fn save_as_keeps_first_of_repeated_card_ids() {
    let (kv, mut m) = fresh();
    let a = m.add_card(CardInput::new("first")).unwrap();
    let mut twin = a.clone();
    twin.description = "second".into();

    let saved = m.save_as("Dup", &[a.clone(), twin]).unwrap();
    assert_eq!(saved.cards, vec![a.clone()]);
    assert_eq!(stored_collections(&kv)[0].cards, vec![a.clone()]);

    let loaded = m.load(&saved.id).unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].description, "first");

    m.remove_card(&a.id).unwrap();
    assert!(m.cards().is_empty());
    assert!(m.card(&a.id).is_none());
}

#[test]
fn list_collections_in_insertion_order() {
    let (_kv, mut m) = fresh();
    let a = m.add_card(CardInput::new("a")).unwrap();
    let b = m.add_card(CardInput::new("b")).unwrap();
    m.save_as("Zeta", &[a.clone()]).unwrap();
    m.save_as("Alpha", &[]).unwrap();
    m.save_as("Zeta", &[a, b]).unwrap();

    let list = m.list_collections();
    let names: Vec<&str> = list.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Zeta", "Alpha"]);
    assert_eq!(list[0].card_count, 2);
    assert_eq!(list[1].card_count, 0);

    let mut recent = list.clone();
    taskcards_core::sort_by_recent(&mut recent);
    assert_eq!(recent[0].name, "Zeta");
}

#[test]
fn reopen_restores_cards_and_collections_unbound() {
    let (kv, mut m) = fresh();
    m.create_new("Week 12").unwrap();
    m.add_card(CardInput::new("a").tags(["x"])).unwrap();
    m.add_card(CardInput::new("b")).unwrap();
    let cards = m.cards().to_vec();
    let collections = m.collections().to_vec();
    drop(m);

    let reopened = CollectionManager::open(kv);
    assert_eq!(reopened.cards(), &cards[..]);
    assert_eq!(reopened.collections(), &collections[..]);
    assert_eq!(reopened.active(), &ActiveCollection::Unbound);
    assert!(reopened.load_report().is_clean());
}
