use crate::cli::opts::*;
use crate::cli::shell;

use anyhow::{bail, Result};
use chrono::Local;
use log::{info, warn};
use std::io::{stdin, stdout, Write};
use std::sync::Arc;
use taskcards_core::{
    add_tag, filter_by_priority, filter_by_tag, remove_tag, sort_by_recent, Card, CardInput,
    CollectionManager, CoreError, KvStore, THEME_KEY,
};
use taskcards_json::paths::data_root;
use taskcards_json::JsonKvStore;

pub fn run_cli(args: Cli) -> Result<()> {
    let store = open_store(&args)?;
    let mut mgr = open_manager(store.clone());
    match args.cmd {
        Command::Shell => shell::run(&*store, &mut mgr),
        cmd => run_command(&*store, &mut mgr, cmd),
    }
}

pub fn open_store(args: &Cli) -> Result<Arc<JsonKvStore>> {
    let root = args.data_dir.clone().unwrap_or_else(data_root);
    let store = JsonKvStore::open_in(&root, args.max_backups)?;
    Ok(Arc::new(store))
}

pub fn open_manager(store: Arc<JsonKvStore>) -> CollectionManager {
    let mgr = CollectionManager::open(store);
    let report = mgr.load_report();
    if !report.is_clean() {
        warn!("stored data needed repair on load: {report:?}");
    }
    info!(
        "loaded {} card(s), {} collection(s)",
        mgr.cards().len(),
        mgr.collections().len()
    );
    mgr
}

pub fn run_command(store: &dyn KvStore, mgr: &mut CollectionManager, cmd: Command) -> Result<()> {
    match cmd {
        Command::Card(c) => card_cmd(mgr, c),
        Command::Collection(c) => collection_cmd(mgr, c),
        Command::Theme { name } => theme_cmd(store, name),
        Command::Shell => bail!("already in a shell"),
    }
}

fn card_cmd(mgr: &mut CollectionManager, cmd: CardCmd) -> Result<()> {
    match cmd {
        CardCmd::Add(a) => {
            let c = mgr.add_card(add_input(a)?)?;
            println!("{}", c.id);
        }
        CardCmd::Edit(e) => {
            let id = resolve_card(mgr, &e.card)?;
            let input = match mgr.card(&id) {
                Some(card) => edit_input(card, e)?,
                None => bail!("card not found: {id}"),
            };
            mgr.update_card(&id, input)?;
            println!("ok");
        }
        CardCmd::Rm { card } => {
            let id = resolve_card(mgr, &card)?;
            mgr.remove_card(&id)?;
            println!("ok");
        }
        CardCmd::Show { card } => {
            let id = resolve_card(mgr, &card)?;
            if let Some(c) = mgr.card(&id) {
                print_card(c);
            }
        }
        CardCmd::List(l) => {
            let mut cards = mgr.list_cards(&l.query);
            if let Some(tag) = &l.tag {
                cards = filter_by_tag(&cards, tag);
            }
            if let Some(p) = l.priority {
                cards = filter_by_priority(&cards, p.into());
            }
            if l.json {
                println!("{}", serde_json::to_string_pretty(&cards)?);
                return Ok(());
            }
            for c in &cards {
                let tags = if c.tags.is_empty() { "-".to_string() } else { c.tags.join(";") };
                println!(
                    "{}\t[{}]\t{}\t{}\ttags={}",
                    c.id,
                    c.priority.as_str(),
                    c.topic,
                    c.description,
                    tags
                );
            }
            println!("{} {}", cards.len(), if cards.len() == 1 { "card" } else { "cards" });
        }
    }
    Ok(())
}

fn collection_cmd(mgr: &mut CollectionManager, cmd: CollectionCmd) -> Result<()> {
    match cmd {
        CollectionCmd::SaveAs { name } => {
            let cards = mgr.cards().to_vec();
            let c = mgr.save_as(&name, &cards)?;
            println!("saved {} ({} cards)", c.name, c.cards.len());
        }
        CollectionCmd::New { name } => {
            let c = mgr.create_new(&name)?;
            println!("{}\t{}", c.id, c.name);
        }
        CollectionCmd::Load { collection } => {
            let id = resolve_collection(mgr, &collection)?;
            let count = mgr.load(&id)?.len();
            let name = mgr.active_collection().unwrap_or_default();
            println!("loaded {name} ({count} cards)");
        }
        CollectionCmd::QuickSave { name } => {
            let c = match mgr.quick_save() {
                Ok(c) => c,
                Err(CoreError::NoActiveCollection) => {
                    let name = match name {
                        Some(n) => n,
                        None => read_line("no active collection; save as> ")?,
                    };
                    let cards = mgr.cards().to_vec();
                    mgr.save_as(&name, &cards)?
                }
                Err(e) => return Err(e.into()),
            };
            println!("saved {} ({} cards)", c.name, c.cards.len());
        }
        CollectionCmd::List { recent, json } => {
            let mut list = mgr.list_collections();
            if recent {
                sort_by_recent(&mut list);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&list)?);
                return Ok(());
            }
            if list.is_empty() {
                println!("no saved collections");
            }
            let active = mgr.active_collection();
            for s in list {
                let marker = if Some(s.name.as_str()) == active { "*" } else { " " };
                let updated = s.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M");
                println!("{marker} {}\t{}\t{} cards\tupdated {updated}", s.id, s.name, s.card_count);
            }
        }
        CollectionCmd::Status => {
            match mgr.active_collection() {
                Some(name) => println!("active: {name}"),
                None => println!("active: (none)"),
            }
            println!("{} card(s) in the active list", mgr.cards().len());
        }
    }
    Ok(())
}

fn theme_cmd(store: &dyn KvStore, name: Option<String>) -> Result<()> {
    match name {
        None => println!("{}", store.get(THEME_KEY).unwrap_or_else(|| "default".to_string())),
        Some(n) => {
            let n = n.trim();
            if n.is_empty() {
                bail!("theme name must not be empty");
            }
            store.set(THEME_KEY, n.to_string());
            println!("ok");
        }
    }
    Ok(())
}

// ===== Helpers =====

fn add_input(a: CardAdd) -> Result<CardInput> {
    let description = required_description(a.description)?;
    let mut tags = Vec::new();
    for t in &a.tags {
        add_tag(&mut tags, t);
    }
    let mut input = CardInput::new(description)
        .topic(a.topic)
        .details(a.details)
        .priority(a.priority.into())
        .tags(tags);
    if let Some(l) = a.label {
        input = input.label(l);
    }
    Ok(input)
}

/// Starts from the card's current fields and applies only what was passed.
pub fn edit_input(card: &Card, e: CardEdit) -> Result<CardInput> {
    let mut input = CardInput::from(card);
    if let Some(d) = e.description {
        input.description = required_description(d)?;
    }
    if let Some(t) = e.topic {
        input.topic = t;
    }
    if e.clear_label {
        input.label = None;
    }
    if let Some(l) = e.label {
        input.label = Some(l);
    }
    if let Some(d) = e.details {
        input.details = d;
    }
    if let Some(p) = e.priority {
        input.priority = p.into();
    }
    for t in &e.add_tags {
        add_tag(&mut input.tags, t);
    }
    for t in &e.rm_tags {
        remove_tag(&mut input.tags, t.trim());
    }
    Ok(input)
}

fn required_description(d: String) -> Result<String> {
    if d.trim().is_empty() {
        bail!("description must not be empty");
    }
    Ok(d)
}

/// Accepts a full card id or an unambiguous prefix of one.
pub fn resolve_card(mgr: &CollectionManager, sel: &str) -> Result<String> {
    if mgr.card(sel).is_some() {
        return Ok(sel.to_string());
    }
    let hits: Vec<&Card> = mgr.cards().iter().filter(|c| c.id.starts_with(sel)).collect();
    match hits.as_slice() {
        [one] if !sel.is_empty() => Ok(one.id.clone()),
        [] | [_] => bail!("card not found: {sel}"),
        _ => bail!("ambiguous card id: {sel} matches {} cards", hits.len()),
    }
}

/// Accepts a collection id or its name (exact first, then case-insensitive).
pub fn resolve_collection(mgr: &CollectionManager, sel: &str) -> Result<String> {
    if let Some(c) = mgr.collection(sel) {
        return Ok(c.id.clone());
    }
    let name = sel.trim();
    if let Some(c) = mgr.collection_by_name(name) {
        return Ok(c.id.clone());
    }
    if let Some(c) = mgr.collections().iter().find(|c| c.name.eq_ignore_ascii_case(name)) {
        return Ok(c.id.clone());
    }
    bail!("collection not found: {sel}")
}

fn print_card(c: &Card) {
    println!("id:          {}", c.id);
    println!("topic:       {}", c.topic);
    if let Some(l) = &c.label {
        println!("label:       {l}");
    }
    println!("priority:    {}", c.priority.as_str());
    println!("description: {}", c.description);
    if !c.details.is_empty() {
        println!("details:     {}", c.details);
    }
    if !c.tags.is_empty() {
        println!("tags:        {}", c.tags.join(", "));
    }
    println!("created:     {}", c.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
}

pub fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    stdout().flush().ok();
    let mut s = String::new();
    stdin().read_line(&mut s)?;
    Ok(s.trim_end_matches(&['\r', '\n'][..]).to_string())
}
