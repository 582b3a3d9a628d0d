use crate::notion::Page;
use crate::properties::{
    extract_multi_select_by_name, extract_relation_by_name, extract_rich_text_by_name,
    extract_select_by_name, extract_title_by_name, extract_url_by_name,
};

use super::entity::{Element, Overview};
use super::memory::memory_properties_for;
use super::non_empty;

/// Map an element page. Memory-token elements also get their directive block parsed.
pub fn map_element(page: &Page) -> Option<Element> {
    let props = page.properties.as_ref()?;

    let basic_type = extract_select_by_name(props, "Basic Type");
    let description_text = extract_rich_text_by_name(props, "Description/Text");
    let properties = memory_properties_for(basic_type.as_deref(), &description_text);

    Some(Element {
        id: page.id.clone(),
        name: extract_title_by_name(props, "Name"),
        basic_type,
        description_text,
        status: extract_select_by_name(props, "Status"),
        first_available: extract_select_by_name(props, "First Available"),
        production_notes: non_empty(extract_rich_text_by_name(props, "Production/Puzzle Notes")),
        content_link: extract_url_by_name(props, "Content Link"),
        narrative_threads: extract_multi_select_by_name(props, "Narrative Threads"),
        owner: extract_relation_by_name(props, "Owner"),
        container: extract_relation_by_name(props, "Container"),
        contents: extract_relation_by_name(props, "Contents"),
        timeline_event: extract_relation_by_name(props, "Timeline Event"),
        required_for_puzzle: extract_relation_by_name(props, "Required For (Puzzle)"),
        rewarded_by_puzzle: extract_relation_by_name(props, "Rewarded by (Puzzle)"),
        container_puzzle: extract_relation_by_name(props, "Container Puzzle"),
        properties,
    })
}

pub fn map_element_overview(page: &Page) -> Option<Overview> {
    let props = page.properties.as_ref()?;
    Some(Overview {
        id: page.id.clone(),
        name: extract_title_by_name(props, "Name"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{memory_element_page, prop_element_page};

    #[test]
    fn test_memory_token_gets_properties() {
        let e = map_element(&memory_element_page()).unwrap();
        assert_eq!(e.basic_type.as_deref(), Some("Memory Token Image"));
        let props = e.properties.unwrap();
        assert_eq!(props.parsed_sf_rfid.as_deref(), Some("ABC123"));
        assert_eq!(props.sf_value_rating, Some(4.0));
        assert_eq!(props.sf_memory_type.as_deref(), Some("Core"));
        assert_eq!(props.sf_group.as_deref(), Some("Ephemeral Echo (x2.5)"));
        assert_eq!(props.sf_group_multiplier, 2.5);
    }

    #[test]
    fn test_non_memory_element_has_no_properties() {
        let e = map_element(&prop_element_page()).unwrap();
        assert!(e.description_text.contains("SF_RFID"));
        assert!(e.properties.is_none());
        let json = serde_json::to_value(&e).unwrap();
        assert!(json.get("properties").is_none());
    }

    #[test]
    fn test_relation_fields_resolve_across_spellings() {
        let e = map_element(&memory_element_page()).unwrap();
        assert_eq!(e.owner, vec!["char-id-1"]);
        // Stored as "Rewarded_by_(Puzzle)" upstream
        assert_eq!(e.rewarded_by_puzzle, vec!["puzzle-id-1"]);
        assert!(e.container.is_empty());
        assert!(e.contents.is_empty());
        assert_eq!(e.narrative_threads, vec!["Funding"]);
    }

    #[test]
    fn test_overview() {
        let o = map_element_overview(&prop_element_page()).unwrap();
        assert_eq!(o.id, "element-id-2");
        assert_eq!(o.name, "Torn Contract");
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let page = memory_element_page();
        assert_eq!(map_element(&page), map_element(&page));
    }
}
