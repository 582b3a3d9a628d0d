//! Shared page fixtures for unit tests.
//!
//! A small connected world:
//! char-id-1 -> event-id-1, element-id-1; event-id-1 -> char-id-2, element-id-2;
//! element-id-1 <- puzzle-id-1 (reward); plus a mention-only event and an id-only page.

use serde_json::{json, Value};

use crate::notion::{InMemoryPageStore, Page};

fn title(text: &str) -> Value {
    json!({ "type": "title", "title": [{ "plain_text": text }] })
}

fn text(text: &str) -> Value {
    json!({ "type": "rich_text", "rich_text": [{ "plain_text": text }] })
}

fn select(name: &str) -> Value {
    json!({ "type": "select", "select": { "name": name } })
}

fn relation(ids: &[&str]) -> Value {
    let items: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
    json!({ "type": "relation", "relation": items })
}

fn page(raw: Value) -> Page {
    serde_json::from_value(raw).expect("fixture page")
}

pub(crate) fn character_page() -> Page {
    page(json!({
        "id": "char-id-1",
        "properties": {
            "Name": title("Alex Reeves"),
            "Type": select("Player"),
            "Tier": select("Core"),
            "Character Logline": text("A founder with something to hide"),
            "Connections": { "type": "number", "number": 0 },
            "Events": relation(&["event-id-1"]),
            "Character Puzzles": relation(&[]),
            "Owned Elements": relation(&["element-id-1"]),
            "Associated Elements": relation(&[])
        }
    }))
}

pub(crate) fn second_character_page() -> Page {
    page(json!({
        "id": "char-id-2",
        "properties": {
            "Name": title("Marcus Blackwood"),
            "Type": select("NPC"),
            "Tier": select("Secondary"),
            "Events": relation(&["event-id-1"]),
            "Character Puzzles": relation(&["puzzle-id-1"]),
            "Owned Elements": relation(&["element-id-2"]),
            "Associated Elements": relation(&[])
        }
    }))
}

pub(crate) fn memory_element_page() -> Page {
    page(json!({
        "id": "element-id-1",
        "properties": {
            "Name": title("Alex's Memory Token"),
            "Basic Type": select("Memory Token Image"),
            "Description/Text": text("SF_RFID: [ABC123]\nSF_ValueRating: [4]\nSF_MemoryType: [Core]\nSF_Group: [Ephemeral Echo (x2.5)]"),
            "Status": select("Done"),
            "Narrative Threads": { "type": "multi_select", "multi_select": [{ "name": "Funding" }] },
            "Owner": relation(&["char-id-1"]),
            "Rewarded_by_(Puzzle)": relation(&["puzzle-id-1"])
        }
    }))
}

pub(crate) fn prop_element_page() -> Page {
    page(json!({
        "id": "element-id-2",
        "properties": {
            "Name": title("Torn Contract"),
            "Basic Type": select("Prop"),
            "Description/Text": text("SF_RFID: [SHOULD-NOT-PARSE]"),
            "Owner": relation(&["char-id-2"]),
            "Timeline Event": relation(&["event-id-1"]),
            "Required For (Puzzle)": relation(&["puzzle-id-1"])
        }
    }))
}

pub(crate) fn puzzle_page() -> Page {
    page(json!({
        "id": "puzzle-id-1",
        "properties": {
            "Puzzle": title("Safe Combination"),
            "Description/Solution": text("Dial 3-1-4"),
            "Timing": select("Act 1"),
            "Asset Link": { "type": "url", "url": "https://example.com/safe.png" },
            "Narrative Threads": { "type": "multi_select", "multi_select": [{ "name": "Funding" }, { "name": "Underground Parties" }] },
            "Owner": relation(&["char-id-2"]),
            "Locked Item": relation(&[]),
            "Puzzle Elements": relation(&[]),
            "Rewards": relation(&["element-id-1"]),
            "Parent item": relation(&[]),
            "Sub-Puzzles": relation(&[])
        }
    }))
}

pub(crate) fn event_page() -> Page {
    page(json!({
        "id": "event-id-1",
        "properties": {
            "Description": title("Alex confronts Marcus"),
            "Date": { "type": "date", "date": { "start": "2023-06-01", "end": null } },
            "mem type": select("Prop"),
            "Characters Involved": relation(&["char-id-1", "char-id-2"]),
            "Memory/Evidence": relation(&["element-id-2"])
        }
    }))
}

pub(crate) fn mention_event_page() -> Page {
    page(json!({
        "id": "event-id-2",
        "properties": {
            "Description": title("@John Doe meets @Jane Smith at the party"),
            "Date": { "type": "date", "date": { "start": "2022-12-31" } },
            "Characters Involved": relation(&[]),
            "Memory/Evidence": relation(&[])
        }
    }))
}

pub(crate) fn bare_page() -> Page {
    Page::bare("bare-id-1")
}

/// Store holding every fixture page, listed under collection-named databases.
pub(crate) fn fixture_store() -> InMemoryPageStore {
    let mut store = InMemoryPageStore::new();
    store.insert_database("characters", vec![character_page(), second_character_page()]);
    store.insert_database("elements", vec![memory_element_page(), prop_element_page()]);
    store.insert_database("puzzles", vec![puzzle_page()]);
    store.insert_database("timeline", vec![mention_event_page(), event_page()]);
    store.insert(bare_page());
    store
}
