use crate::notion::Page;
use crate::properties::{
    extract_multi_select_by_name, extract_relation_by_name, extract_rich_text_by_name,
    extract_select_by_name, extract_title_by_name, extract_url_by_name,
};

use super::entity::{Overview, Puzzle};
use super::non_empty;

pub fn map_puzzle(page: &Page) -> Option<Puzzle> {
    let props = page.properties.as_ref()?;

    Some(Puzzle {
        id: page.id.clone(),
        puzzle: extract_title_by_name(props, "Puzzle"),
        description: non_empty(extract_rich_text_by_name(props, "Description/Solution")),
        timing: extract_select_by_name(props, "Timing"),
        story_reveals: non_empty(extract_rich_text_by_name(props, "Story Reveals")),
        asset_link: extract_url_by_name(props, "Asset Link"),
        narrative_threads: extract_multi_select_by_name(props, "Narrative Threads"),
        owner: extract_relation_by_name(props, "Owner"),
        locked_item: extract_relation_by_name(props, "Locked Item"),
        puzzle_elements: extract_relation_by_name(props, "Puzzle Elements"),
        rewards: extract_relation_by_name(props, "Rewards"),
        parent_item: extract_relation_by_name(props, "Parent item"),
        sub_puzzles: extract_relation_by_name(props, "Sub-Puzzles"),
    })
}

pub fn map_puzzle_overview(page: &Page) -> Option<Overview> {
    let props = page.properties.as_ref()?;
    Some(Overview {
        id: page.id.clone(),
        name: extract_title_by_name(props, "Puzzle"),
    })
}
