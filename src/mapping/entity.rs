//! Typed domain entities produced from upstream pages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::memory::MemoryProperties;

/// The four entity kinds the workspace stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Character,
    Element,
    Puzzle,
    TimelineEvent,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Character,
        EntityKind::Element,
        EntityKind::Puzzle,
        EntityKind::TimelineEvent,
    ];

    /// Human-readable name used in error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            EntityKind::Character => "Character",
            EntityKind::Element => "Element",
            EntityKind::Puzzle => "Puzzle",
            EntityKind::TimelineEvent => "Timeline event",
        }
    }

    /// URL collection segment, e.g. `/api/characters`.
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::Character => "characters",
            EntityKind::Element => "elements",
            EntityKind::Puzzle => "puzzles",
            EntityKind::TimelineEvent => "timeline",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "character" | "characters" => Ok(EntityKind::Character),
            "element" | "elements" => Ok(EntityKind::Element),
            "puzzle" | "puzzles" => Ok(EntityKind::Puzzle),
            "timeline" | "timelineevent" | "timelineevents" | "event" | "events" => {
                Ok(EntityKind::TimelineEvent)
            }
            other => Err(format!("unknown entity kind '{}'", other)),
        }
    }
}

/// Every relation field across the four kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationField {
    CharacterEvents,
    CharacterPuzzles,
    CharacterOwnedElements,
    CharacterAssociatedElements,
    ElementOwner,
    ElementContainer,
    ElementContents,
    ElementTimelineEvent,
    ElementRequiredForPuzzle,
    ElementRewardedByPuzzle,
    ElementContainerPuzzle,
    PuzzleOwner,
    PuzzleLockedItem,
    PuzzleElements,
    PuzzleRewards,
    PuzzleParentItem,
    PuzzleSubPuzzles,
    EventCharactersInvolved,
    EventMemoryEvidence,
}

impl RelationField {
    /// Kind of the pages this field points at.
    pub fn target_kind(self) -> EntityKind {
        use RelationField::*;
        match self {
            ElementOwner | PuzzleOwner | EventCharactersInvolved => EntityKind::Character,
            CharacterOwnedElements
            | CharacterAssociatedElements
            | ElementContainer
            | ElementContents
            | PuzzleLockedItem
            | PuzzleElements
            | PuzzleRewards
            | EventMemoryEvidence => EntityKind::Element,
            CharacterPuzzles
            | ElementRequiredForPuzzle
            | ElementRewardedByPuzzle
            | ElementContainerPuzzle
            | PuzzleParentItem
            | PuzzleSubPuzzles => EntityKind::Puzzle,
            CharacterEvents | ElementTimelineEvent => EntityKind::TimelineEvent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub character_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion_towards_ceo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections: Option<f64>,
    pub events: Vec<String>,
    pub character_puzzles: Vec<String>,
    pub owned_elements: Vec<String>,
    pub associated_elements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_type: Option<String>,
    pub description_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_available: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_link: Option<String>,
    pub narrative_threads: Vec<String>,
    pub owner: Vec<String>,
    pub container: Vec<String>,
    pub contents: Vec<String>,
    pub timeline_event: Vec<String>,
    pub required_for_puzzle: Vec<String>,
    pub rewarded_by_puzzle: Vec<String>,
    pub container_puzzle: Vec<String>,
    /// Parsed memory-token directives; only present on memory-token elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<MemoryProperties>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Puzzle {
    pub id: String,
    pub puzzle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_reveals: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_link: Option<String>,
    pub narrative_threads: Vec<String>,
    pub owner: Vec<String>,
    pub locked_item: Vec<String>,
    pub puzzle_elements: Vec<String>,
    pub rewards: Vec<String>,
    pub parent_item: Vec<String>,
    pub sub_puzzles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mem_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub characters_involved: Vec<String>,
    pub memory_evidence: Vec<String>,
}

/// Page that carried an id but nothing mappable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinimalEntity {
    pub id: String,
}

/// `{id, name}` projection used by listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entity {
    Character(Character),
    Element(Element),
    Puzzle(Puzzle),
    TimelineEvent(TimelineEvent),
    Minimal(MinimalEntity),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Entity::Character(c) => &c.id,
            Entity::Element(e) => &e.id,
            Entity::Puzzle(p) => &p.id,
            Entity::TimelineEvent(t) => &t.id,
            Entity::Minimal(m) => &m.id,
        }
    }

    /// Relation fields of this entity with their target ids, in declaration order.
    pub fn relations(&self) -> Vec<(RelationField, &[String])> {
        use RelationField::*;
        match self {
            Entity::Character(c) => vec![
                (CharacterEvents, c.events.as_slice()),
                (CharacterPuzzles, c.character_puzzles.as_slice()),
                (CharacterOwnedElements, c.owned_elements.as_slice()),
                (CharacterAssociatedElements, c.associated_elements.as_slice()),
            ],
            Entity::Element(e) => vec![
                (ElementOwner, e.owner.as_slice()),
                (ElementContainer, e.container.as_slice()),
                (ElementContents, e.contents.as_slice()),
                (ElementTimelineEvent, e.timeline_event.as_slice()),
                (ElementRequiredForPuzzle, e.required_for_puzzle.as_slice()),
                (ElementRewardedByPuzzle, e.rewarded_by_puzzle.as_slice()),
                (ElementContainerPuzzle, e.container_puzzle.as_slice()),
            ],
            Entity::Puzzle(p) => vec![
                (PuzzleOwner, p.owner.as_slice()),
                (PuzzleLockedItem, p.locked_item.as_slice()),
                (PuzzleElements, p.puzzle_elements.as_slice()),
                (PuzzleRewards, p.rewards.as_slice()),
                (PuzzleParentItem, p.parent_item.as_slice()),
                (PuzzleSubPuzzles, p.sub_puzzles.as_slice()),
            ],
            Entity::TimelineEvent(t) => vec![
                (EventCharactersInvolved, t.characters_involved.as_slice()),
                (EventMemoryEvidence, t.memory_evidence.as_slice()),
            ],
            Entity::Minimal(_) => Vec::new(),
        }
    }
}
