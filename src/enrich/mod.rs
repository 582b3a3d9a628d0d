//! Relation enrichment: resolve relation id lists into `{id, name}` pairs.
//!
//! Each entity's non-empty relation fields are fetched as one batch per field,
//! all batches concurrently, with a single timeout on the join. Empty fields
//! never touch the store. If any batch fails or the window elapses, the
//! scalar fields are still returned, the unresolved relation fields are left
//! out, and `error` says why.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::future::try_join_all;
use serde::Serialize;

use crate::error::StorygraphError;
use crate::mapping::mentions::characters_or_mentions;
use crate::mapping::{
    map_character, map_element, map_puzzle, map_timeline_event, EntityKind, MemoryProperties,
};
use crate::notion::{Page, PageStore};

/// A resolved relation target. `id` is `None` only for names parsed from text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationRef {
    pub id: Option<String>,
    pub name: String,
}

/// Resolved relation fields; `None` marks a field whose lookup did not complete.
type Resolved<const N: usize> = [Option<Vec<RelationRef>>; N];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterWithNames {
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<RelationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_puzzles: Option<Vec<RelationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned_elements: Option<Vec<RelationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associated_elements: Option<Vec<RelationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementWithNames {
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<MemoryProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Vec<RelationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<Vec<RelationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<RelationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline_event: Option<Vec<RelationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_for_puzzle: Option<Vec<RelationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewarded_by_puzzle: Option<Vec<RelationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_puzzle: Option<Vec<RelationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleWithNames {
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Vec<RelationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_item: Option<Vec<RelationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub puzzle_elements: Option<Vec<RelationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewards: Option<Vec<RelationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_item: Option<Vec<RelationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_puzzles: Option<Vec<RelationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEventWithNames {
    pub id: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mem_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characters_involved: Option<Vec<RelationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_evidence: Option<Vec<RelationRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EnrichedEntity {
    Character(CharacterWithNames),
    Element(ElementWithNames),
    Puzzle(PuzzleWithNames),
    TimelineEvent(TimelineEventWithNames),
}

/// Resolves relation names against a page store.
pub struct RelationEnricher<'a> {
    store: &'a dyn PageStore,
    window: Duration,
}

impl<'a> RelationEnricher<'a> {
    /// `window` bounds the whole concurrent fetch group of one entity.
    pub fn new(store: &'a dyn PageStore, window: Duration) -> Self {
        Self { store, window }
    }

    pub async fn map_with_names(&self, kind: EntityKind, page: &Page) -> Option<EnrichedEntity> {
        match kind {
            EntityKind::Character => self
                .map_character_with_names(page)
                .await
                .map(EnrichedEntity::Character),
            EntityKind::Element => self
                .map_element_with_names(page)
                .await
                .map(EnrichedEntity::Element),
            EntityKind::Puzzle => self
                .map_puzzle_with_names(page)
                .await
                .map(EnrichedEntity::Puzzle),
            EntityKind::TimelineEvent => self
                .map_timeline_event_with_names(page)
                .await
                .map(EnrichedEntity::TimelineEvent),
        }
    }

    pub async fn map_character_with_names(&self, page: &Page) -> Option<CharacterWithNames> {
        let c = map_character(page)?;
        let ([events, character_puzzles, owned_elements, associated_elements], error) = self
            .resolve_groups([
                c.events.as_slice(),
                c.character_puzzles.as_slice(),
                c.owned_elements.as_slice(),
                c.associated_elements.as_slice(),
            ])
            .await;

        Some(CharacterWithNames {
            id: c.id,
            name: c.name,
            character_type: c.character_type,
            tier: c.tier,
            logline: c.logline,
            overview: c.overview,
            emotion_towards_ceo: c.emotion_towards_ceo,
            primary_action: c.primary_action,
            connections: c.connections,
            events,
            character_puzzles,
            owned_elements,
            associated_elements,
            error,
        })
    }

    pub async fn map_element_with_names(&self, page: &Page) -> Option<ElementWithNames> {
        let e = map_element(page)?;
        let (
            [owner, container, contents, timeline_event, required_for_puzzle, rewarded_by_puzzle, container_puzzle],
            error,
        ) = self
            .resolve_groups([
                e.owner.as_slice(),
                e.container.as_slice(),
                e.contents.as_slice(),
                e.timeline_event.as_slice(),
                e.required_for_puzzle.as_slice(),
                e.rewarded_by_puzzle.as_slice(),
                e.container_puzzle.as_slice(),
            ])
            .await;

        Some(ElementWithNames {
            id: e.id,
            name: e.name,
            basic_type: e.basic_type,
            description_text: e.description_text,
            status: e.status,
            first_available: e.first_available,
            production_notes: e.production_notes,
            content_link: e.content_link,
            narrative_threads: e.narrative_threads,
            properties: e.properties,
            owner,
            container,
            contents,
            timeline_event,
            required_for_puzzle,
            rewarded_by_puzzle,
            container_puzzle,
            error,
        })
    }

    pub async fn map_puzzle_with_names(&self, page: &Page) -> Option<PuzzleWithNames> {
        let p = map_puzzle(page)?;
        let ([owner, locked_item, puzzle_elements, rewards, parent_item, sub_puzzles], error) = self
            .resolve_groups([
                p.owner.as_slice(),
                p.locked_item.as_slice(),
                p.puzzle_elements.as_slice(),
                p.rewards.as_slice(),
                p.parent_item.as_slice(),
                p.sub_puzzles.as_slice(),
            ])
            .await;

        Some(PuzzleWithNames {
            id: p.id,
            puzzle: p.puzzle,
            description: p.description,
            timing: p.timing,
            story_reveals: p.story_reveals,
            asset_link: p.asset_link,
            narrative_threads: p.narrative_threads,
            owner,
            locked_item,
            puzzle_elements,
            rewards,
            parent_item,
            sub_puzzles,
            error,
        })
    }

    /// Characters fall back to `@Name` mentions in the description and notes
    /// only when the event has no structured character relations at all.
    pub async fn map_timeline_event_with_names(&self, page: &Page) -> Option<TimelineEventWithNames> {
        let t = map_timeline_event(page)?;
        let ([characters_involved, memory_evidence], error) = self
            .resolve_groups([
                t.characters_involved.as_slice(),
                t.memory_evidence.as_slice(),
            ])
            .await;

        let characters_involved = if t.characters_involved.is_empty() {
            let texts = [t.description.as_str(), t.notes.as_deref().unwrap_or_default()];
            Some(characters_or_mentions(Vec::new(), &texts))
        } else {
            characters_involved
        };

        Some(TimelineEventWithNames {
            id: t.id,
            description: t.description,
            date: t.date,
            mem_type: t.mem_type,
            notes: t.notes,
            characters_involved,
            memory_evidence,
            error,
        })
    }

    /// Fetch every non-empty id group concurrently and name its targets.
    async fn resolve_groups<const N: usize>(
        &self,
        groups: [&[String]; N],
    ) -> (Resolved<N>, Option<String>) {
        let mut resolved: Resolved<N> =
            std::array::from_fn(|slot| groups[slot].is_empty().then(Vec::new));

        let fetches = groups
            .iter()
            .enumerate()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(slot, ids)| async move {
                self.store
                    .get_pages_by_ids(ids)
                    .await
                    .map(|pages| (slot, pages))
            });

        match tokio::time::timeout(self.window, try_join_all(fetches)).await {
            Ok(Ok(batches)) => {
                for (slot, pages) in batches {
                    resolved[slot] = Some(refs_in_order(groups[slot], &pages));
                }
                (resolved, None)
            }
            Ok(Err(e)) => {
                log::warn!("Relation name lookup failed: {}", e);
                (resolved, Some(e.to_string()))
            }
            Err(_) => {
                let e = StorygraphError::UpstreamTimeout(format!(
                    "relation name lookup exceeded {:?}",
                    self.window
                ));
                log::warn!("{}", e);
                (resolved, Some(e.to_string()))
            }
        }
    }
}

/// Pair each requested id with its page title, keeping request order and
/// dropping ids the store could not resolve.
fn refs_in_order(ids: &[String], pages: &[Page]) -> Vec<RelationRef> {
    let by_id: HashMap<&str, &Page> = pages.iter().map(|p| (p.id.as_str(), p)).collect();
    ids.iter()
        .filter_map(|id| {
            by_id.get(id.as_str()).map(|page| RelationRef {
                id: Some(id.clone()),
                name: page.title(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::*;

    const WINDOW: Duration = Duration::from_secs(2);

    fn named(id: &str, name: &str) -> RelationRef {
        RelationRef {
            id: Some(id.to_string()),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_puzzle_fetches_only_non_empty_fields() {
        let store = fixture_store();
        let enricher = RelationEnricher::new(&store, WINDOW);
        let p = enricher.map_puzzle_with_names(&puzzle_page()).await.unwrap();

        assert_eq!(store.batch_calls(), 2);
        let mut batches = store.batches();
        batches.sort();
        assert_eq!(
            batches,
            vec![vec!["char-id-2".to_string()], vec!["element-id-1".to_string()]]
        );

        assert_eq!(p.owner, Some(vec![named("char-id-2", "Marcus Blackwood")]));
        assert_eq!(p.rewards, Some(vec![named("element-id-1", "Alex's Memory Token")]));
        assert_eq!(p.locked_item, Some(vec![]));
        assert_eq!(p.puzzle_elements, Some(vec![]));
        assert_eq!(p.parent_item, Some(vec![]));
        assert_eq!(p.sub_puzzles, Some(vec![]));
        assert_eq!(p.error, None);
    }

    #[tokio::test]
    async fn test_rejected_fetch_keeps_scalars() {
        let store = fixture_store();
        store.fail_batches_with("notion unavailable");
        let enricher = RelationEnricher::new(&store, WINDOW);
        let p = enricher.map_puzzle_with_names(&puzzle_page()).await.unwrap();

        assert_eq!(p.puzzle, "Safe Combination");
        assert_eq!(p.timing.as_deref(), Some("Act 1"));
        assert!(p.error.as_deref().unwrap().contains("notion unavailable"));
        assert_eq!(p.owner, None);
        assert_eq!(p.rewards, None);

        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("owner").is_none());
        assert!(json.get("rewards").is_none());
        assert_eq!(json["puzzle"], "Safe Combination");
    }

    #[tokio::test]
    async fn test_timed_out_fetch_reports_timeout() {
        let store = fixture_store();
        store.stall_batches_for(Duration::from_millis(500));
        let enricher = RelationEnricher::new(&store, Duration::from_millis(20));
        let p = enricher.map_puzzle_with_names(&puzzle_page()).await.unwrap();

        assert_eq!(p.timing.as_deref(), Some("Act 1"));
        assert!(p.error.as_deref().unwrap().to_lowercase().contains("timeout"));
        assert_eq!(p.owner, None);
    }

    #[tokio::test]
    async fn test_character_names_resolved() {
        let store = fixture_store();
        let enricher = RelationEnricher::new(&store, WINDOW);
        let c = enricher.map_character_with_names(&character_page()).await.unwrap();

        assert_eq!(c.events, Some(vec![named("event-id-1", "Alex confronts Marcus")]));
        assert_eq!(c.owned_elements, Some(vec![named("element-id-1", "Alex's Memory Token")]));
        assert_eq!(c.character_puzzles, Some(vec![]));
        assert_eq!(store.batch_calls(), 2);
    }

    #[tokio::test]
    async fn test_unresolvable_ids_are_dropped() {
        let store = fixture_store();
        let page: Page = serde_json::from_value(serde_json::json!({
            "id": "p7",
            "properties": {
                "Puzzle": { "type": "title", "title": [{ "plain_text": "Ghost" }] },
                "Rewards": { "type": "relation", "relation": [{ "id": "missing" }, { "id": "element-id-2" }] }
            }
        }))
        .unwrap();
        let enricher = RelationEnricher::new(&store, WINDOW);
        let p = enricher.map_puzzle_with_names(&page).await.unwrap();
        assert_eq!(p.rewards, Some(vec![named("element-id-2", "Torn Contract")]));
    }

    #[tokio::test]
    async fn test_mentions_used_without_structured_characters() {
        let store = fixture_store();
        let enricher = RelationEnricher::new(&store, WINDOW);
        let t = enricher
            .map_timeline_event_with_names(&mention_event_page())
            .await
            .unwrap();

        assert_eq!(
            t.characters_involved,
            Some(vec![
                RelationRef { id: None, name: "John Doe".into() },
                RelationRef { id: None, name: "Jane Smith".into() },
            ])
        );
        assert_eq!(store.batch_calls(), 0);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["charactersInvolved"][0]["id"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_structured_characters_beat_mentions() {
        let store = fixture_store();
        let enricher = RelationEnricher::new(&store, WINDOW);
        let mut page = event_page();
        if let Some(bag) = page.properties.as_mut() {
            bag.insert(
                "Notes".into(),
                crate::notion::PropertyValue::from(serde_json::json!({
                    "type": "rich_text",
                    "rich_text": [{ "plain_text": "@John Doe meets @Jane Smith at the party" }]
                })),
            );
        }
        let t = enricher.map_timeline_event_with_names(&page).await.unwrap();
        assert_eq!(
            t.characters_involved,
            Some(vec![
                named("char-id-1", "Alex Reeves"),
                named("char-id-2", "Marcus Blackwood"),
            ])
        );
    }

    #[tokio::test]
    async fn test_absent_bag_is_none() {
        let store = fixture_store();
        let enricher = RelationEnricher::new(&store, WINDOW);
        assert!(enricher
            .map_with_names(EntityKind::Element, &bare_page())
            .await
            .is_none());
        assert_eq!(store.batch_calls(), 0);
    }

    #[tokio::test]
    async fn test_memory_element_keeps_properties() {
        let store = fixture_store();
        let enricher = RelationEnricher::new(&store, WINDOW);
        let e = enricher
            .map_element_with_names(&memory_element_page())
            .await
            .unwrap();
        assert_eq!(e.properties.unwrap().sf_group_multiplier, 2.5);
        assert_eq!(e.owner, Some(vec![named("char-id-1", "Alex Reeves")]));
        assert_eq!(e.rewarded_by_puzzle, Some(vec![named("puzzle-id-1", "Safe Combination")]));
    }
}
