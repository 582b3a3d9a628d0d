use crate::notion::Page;
use crate::properties::{
    extract_date_by_name, extract_relation_by_name, extract_rich_text_by_name,
    extract_select_by_name, extract_title_by_name,
};

use super::entity::{Overview, TimelineEvent};
use super::non_empty;

pub fn map_timeline_event(page: &Page) -> Option<TimelineEvent> {
    let props = page.properties.as_ref()?;

    Some(TimelineEvent {
        id: page.id.clone(),
        description: extract_title_by_name(props, "Description"),
        date: extract_date_by_name(props, "Date"),
        mem_type: extract_select_by_name(props, "mem type"),
        notes: non_empty(extract_rich_text_by_name(props, "Notes")),
        characters_involved: extract_relation_by_name(props, "Characters Involved"),
        memory_evidence: extract_relation_by_name(props, "Memory/Evidence"),
    })
}

pub fn map_timeline_event_overview(page: &Page) -> Option<Overview> {
    let props = page.properties.as_ref()?;
    Some(Overview {
        id: page.id.clone(),
        name: extract_title_by_name(props, "Description"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{event_page, mention_event_page};

    #[test]
    fn test_map_event() {
        let t = map_timeline_event(&event_page()).unwrap();
        assert_eq!(t.description, "Alex confronts Marcus");
        assert_eq!(t.date.as_deref(), Some("2023-06-01"));
        assert_eq!(t.mem_type.as_deref(), Some("Prop"));
        assert_eq!(t.characters_involved, vec!["char-id-1", "char-id-2"]);
        assert_eq!(t.memory_evidence, vec!["element-id-2"]);
        assert_eq!(t.notes, None);
    }

    #[test]
    fn test_mentions_are_not_relations() {
        let t = map_timeline_event(&mention_event_page()).unwrap();
        assert!(t.characters_involved.is_empty());
    }

    #[test]
    fn test_absent_bag() {
        assert!(map_timeline_event(&Page::bare("e")).is_none());
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let page = event_page();
        assert_eq!(map_timeline_event(&page), map_timeline_event(&page));
    }
}
