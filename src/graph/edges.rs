//! Relation field -> canonical labeled edge.
//!
//! Both ends of a relation usually carry it (a character's "Owned Elements"
//! and the element's "Owner"), so every field maps to one canonical direction
//! and label. Seen from either side, the same relation yields the same edge.

use serde::Serialize;

use crate::mapping::RelationField;

/// Directed, labeled connection between two graph nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub label: &'static str,
}

pub const OWNS: &str = "owns";
pub const ASSOCIATED_WITH: &str = "associated with";
pub const INVOLVED_IN: &str = "involved in";
pub const EVIDENCE_OF: &str = "evidence of";
pub const CONTAINS: &str = "contains";
pub const REQUIRED_FOR: &str = "required for";
pub const REWARDS: &str = "rewards";
pub const LOCKS: &str = "locks";
pub const HAS_SUB_PUZZLE: &str = "has sub-puzzle";

/// Label of `field`, and whether the field's holder is the edge source.
fn edge_kind(field: RelationField) -> (&'static str, bool) {
    use RelationField::*;
    match field {
        CharacterOwnedElements | CharacterPuzzles => (OWNS, true),
        ElementOwner | PuzzleOwner => (OWNS, false),
        CharacterAssociatedElements => (ASSOCIATED_WITH, true),
        CharacterEvents => (INVOLVED_IN, true),
        EventCharactersInvolved => (INVOLVED_IN, false),
        ElementTimelineEvent => (EVIDENCE_OF, true),
        EventMemoryEvidence => (EVIDENCE_OF, false),
        ElementContents => (CONTAINS, true),
        ElementContainer => (CONTAINS, false),
        ElementRequiredForPuzzle => (REQUIRED_FOR, true),
        PuzzleElements => (REQUIRED_FOR, false),
        PuzzleRewards => (REWARDS, true),
        ElementRewardedByPuzzle => (REWARDS, false),
        PuzzleLockedItem => (LOCKS, true),
        ElementContainerPuzzle => (LOCKS, false),
        PuzzleSubPuzzles => (HAS_SUB_PUZZLE, true),
        PuzzleParentItem => (HAS_SUB_PUZZLE, false),
    }
}

/// Edge for a reference from `holder` (through `field`) to `target`.
pub fn canonical_edge(holder: &str, field: RelationField, target: &str) -> Edge {
    let (label, holder_is_source) = edge_kind(field);
    let (source, target) = if holder_is_source {
        (holder, target)
    } else {
        (target, holder)
    };
    Edge {
        source: source.to_string(),
        target: target.to_string(),
        label,
    }
}
