//! Page -> entity mapping, one mapper per kind, plus the two free-text parsers
//! (memory-token directives and `@Name` mentions).
//!
//! Mappers never fail: a page without a property bag maps to `None`, and
//! missing fields fall back to empty values.

mod character;
mod element;
pub mod entity;
pub mod memory;
pub mod mentions;
mod puzzle;
mod timeline;

pub use character::{map_character, map_character_overview};
pub use element::{map_element, map_element_overview};
pub use entity::{
    Character, Element, Entity, EntityKind, MinimalEntity, Overview, Puzzle, RelationField,
    TimelineEvent,
};
pub use memory::{is_memory_token, parse_memory_fields, MemoryProperties};
pub use mentions::extract_mentions;
pub use puzzle::{map_puzzle, map_puzzle_overview};
pub use timeline::{map_timeline_event, map_timeline_event_overview};

use crate::notion::Page;

pub(crate) fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Map `page` as an entity of `kind`.
pub fn map_entity(kind: EntityKind, page: &Page) -> Option<Entity> {
    match kind {
        EntityKind::Character => map_character(page).map(Entity::Character),
        EntityKind::Element => map_element(page).map(Entity::Element),
        EntityKind::Puzzle => map_puzzle(page).map(Entity::Puzzle),
        EntityKind::TimelineEvent => map_timeline_event(page).map(Entity::TimelineEvent),
    }
}

/// Like [`map_entity`], degrading to an id-only entity for unmappable pages.
pub fn map_entity_or_minimal(kind: EntityKind, page: &Page) -> Entity {
    map_entity(kind, page).unwrap_or_else(|| {
        log::warn!("{} page {} has no properties, using minimal node", kind, page.id);
        Entity::Minimal(MinimalEntity {
            id: page.id.clone(),
        })
    })
}

pub fn map_overview(kind: EntityKind, page: &Page) -> Option<Overview> {
    match kind {
        EntityKind::Character => map_character_overview(page),
        EntityKind::Element => map_element_overview(page),
        EntityKind::Puzzle => map_puzzle_overview(page),
        EntityKind::TimelineEvent => map_timeline_event_overview(page),
    }
}
