use crate::notion::Page;
use crate::properties::{
    extract_number_by_name, extract_relation_by_name, extract_rich_text_by_name,
    extract_select_by_name, extract_title_by_name,
};

use super::entity::{Character, Overview};
use super::non_empty;

/// Map a character page. `None` when the page carries no property bag.
pub fn map_character(page: &Page) -> Option<Character> {
    let props = page.properties.as_ref()?;

    Some(Character {
        id: page.id.clone(),
        name: extract_title_by_name(props, "Name"),
        character_type: extract_select_by_name(props, "Type"),
        tier: extract_select_by_name(props, "Tier"),
        logline: non_empty(extract_rich_text_by_name(props, "Character Logline")),
        overview: non_empty(extract_rich_text_by_name(props, "Overview & Key Relationships")),
        emotion_towards_ceo: non_empty(extract_rich_text_by_name(props, "Emotion towards CEO & others")),
        primary_action: non_empty(extract_rich_text_by_name(props, "Primary Action")),
        connections: extract_number_by_name(props, "Connections"),
        events: extract_relation_by_name(props, "Events"),
        character_puzzles: extract_relation_by_name(props, "Character Puzzles"),
        owned_elements: extract_relation_by_name(props, "Owned Elements"),
        associated_elements: extract_relation_by_name(props, "Associated Elements"),
    })
}

/// `{id, name}` only; every other field is dropped.
pub fn map_character_overview(page: &Page) -> Option<Overview> {
    let props = page.properties.as_ref()?;
    Some(Overview {
        id: page.id.clone(),
        name: extract_title_by_name(props, "Name"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::character_page;
    use serde_json::json;

    #[test]
    fn test_map_full_character() {
        let page = character_page();
        let c = map_character(&page).unwrap();
        assert_eq!(c.id, "char-id-1");
        assert_eq!(c.name, "Alex Reeves");
        assert_eq!(c.character_type.as_deref(), Some("Player"));
        assert_eq!(c.tier.as_deref(), Some("Core"));
        assert_eq!(c.logline.as_deref(), Some("A founder with something to hide"));
        assert_eq!(c.connections, Some(0.0));
        assert_eq!(c.events, vec!["event-id-1"]);
        assert_eq!(c.owned_elements, vec!["element-id-1"]);
        assert!(c.character_puzzles.is_empty());
        assert!(c.associated_elements.is_empty());
    }

    #[test]
    fn test_absent_bag_maps_to_none() {
        let page: Page = serde_json::from_value(json!({ "id": "char-id-1" })).unwrap();
        assert!(map_character(&page).is_none());
        assert!(map_character_overview(&page).is_none());
    }

    #[test]
    fn test_empty_bag_yields_empty_relations() {
        let page: Page = serde_json::from_value(json!({ "id": "c9", "properties": {} })).unwrap();
        let c = map_character(&page).unwrap();
        assert_eq!(c.name, "");
        assert!(c.events.is_empty());
        assert!(c.owned_elements.is_empty());
        assert_eq!(c.tier, None);
        assert_eq!(c.logline, None);
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let page = character_page();
        assert_eq!(map_character(&page), map_character(&page));
    }

    #[test]
    fn test_overview_drops_other_fields() {
        let overview = map_character_overview(&character_page()).unwrap();
        let json = serde_json::to_value(&overview).unwrap();
        assert_eq!(json, json!({ "id": "char-id-1", "name": "Alex Reeves" }));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(map_character(&character_page()).unwrap()).unwrap();
        assert_eq!(json["type"], "Player");
        assert_eq!(json["ownedElements"], json!(["element-id-1"]));
        assert_eq!(json["characterPuzzles"], json!([]));
        assert!(json.get("overview").is_none());
    }
}
