//! Depth-bounded BFS over relation fields.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use futures_util::future::try_join_all;
use serde::Serialize;

use crate::error::{Result, StorygraphError};
use crate::graph::edges::{canonical_edge, Edge};
use crate::mapping::{map_entity_or_minimal, Entity, EntityKind};
use crate::notion::{Page, PageStore};

pub const DEFAULT_DEPTH: usize = 1;

/// Parse a `depth` query value. Anything that is not a non-negative integer
/// falls back to [`DEFAULT_DEPTH`].
pub fn normalize_depth(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_DEPTH)
}

/// A graph vertex: the mapped entity plus the kind it was fetched as.
///
/// The kind is kept even when the page degraded to a minimal entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    #[serde(rename = "entityType")]
    pub kind: EntityKind,
    #[serde(flatten)]
    pub entity: Entity,
}

impl GraphNode {
    pub fn new(kind: EntityKind, entity: Entity) -> Self {
        Self { kind, entity }
    }

    pub fn id(&self) -> &str {
        self.entity.id()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Graph {
    pub center: GraphNode,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<Edge>,
    /// Set when a level could not be fetched and expansion stopped early.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Builds relationship graphs around a center entity.
pub struct GraphBuilder<'a> {
    store: &'a dyn PageStore,
    window: Duration,
}

impl<'a> GraphBuilder<'a> {
    /// `window` bounds the center lookup and each level's fetch group.
    pub fn new(store: &'a dyn PageStore, window: Duration) -> Self {
        Self { store, window }
    }

    /// Traverse up to `depth` relation hops from `id`.
    ///
    /// Fails only when the center cannot be fetched or does not exist. A level
    /// whose batch fetch fails or times out ends the traversal; the graph built
    /// so far is returned with `error` set.
    pub async fn build(&self, kind: EntityKind, id: &str, depth: usize) -> Result<Graph> {
        let center_page = match tokio::time::timeout(self.window, self.store.get_page(id)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(StorygraphError::UpstreamTimeout(format!(
                    "fetching {} {} exceeded {:?}",
                    kind, id, self.window
                )))
            }
        }
        .ok_or_else(|| StorygraphError::NotFound {
            kind,
            id: id.to_string(),
        })?;

        let center = map_entity_or_minimal(kind, &center_page);
        let mut nodes = vec![GraphNode::new(kind, center.clone())];
        let mut visited: HashSet<String> = HashSet::from([center.id().to_string()]);
        let mut edges: Vec<Edge> = Vec::new();
        let mut seen_edges: HashSet<Edge> = HashSet::new();
        let mut frontier = vec![center];
        let mut error = None;

        for level in 1..=depth {
            let mut pending: HashMap<EntityKind, Vec<String>> = HashMap::new();
            let mut pending_ids: HashSet<String> = HashSet::new();

            for entity in &frontier {
                for (field, targets) in entity.relations() {
                    for target in targets {
                        let edge = canonical_edge(entity.id(), field, target);
                        if seen_edges.insert(edge.clone()) {
                            edges.push(edge);
                        }
                        if !visited.contains(target) && pending_ids.insert(target.clone()) {
                            pending
                                .entry(field.target_kind())
                                .or_default()
                                .push(target.clone());
                        }
                    }
                }
            }

            if pending.is_empty() {
                break;
            }

            let started = Instant::now();
            let fetched = match self.fetch_level(pending).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    log::warn!("Graph around {} stopped at level {}: {}", id, level, e);
                    error = Some(e.to_string());
                    break;
                }
            };
            log::debug!(
                "Graph level {} around {}: {} ids, {} pages in {:?}",
                level,
                id,
                pending_ids.len(),
                fetched.len(),
                started.elapsed()
            );

            visited.extend(pending_ids);
            frontier = Vec::with_capacity(fetched.len());
            for (kind, page) in fetched {
                let entity = map_entity_or_minimal(kind, &page);
                nodes.push(GraphNode::new(kind, entity.clone()));
                frontier.push(entity);
            }
        }

        let node_ids: HashSet<&str> = nodes.iter().map(GraphNode::id).collect();
        edges.retain(|e| node_ids.contains(e.source.as_str()) && node_ids.contains(e.target.as_str()));

        Ok(Graph {
            center: nodes[0].clone(),
            nodes,
            edges,
            error,
        })
    }

    /// Fetch one level: one batch per target kind, joined under a single timeout.
    async fn fetch_level(
        &self,
        pending: HashMap<EntityKind, Vec<String>>,
    ) -> Result<Vec<(EntityKind, Page)>> {
        let batches = EntityKind::ALL.into_iter().filter_map(|kind| {
            let ids = pending.get(&kind)?;
            Some(async move {
                self.store
                    .get_pages_by_ids(ids)
                    .await
                    .map(|pages| pages.into_iter().map(move |p| (kind, p)))
            })
        });

        let results = tokio::time::timeout(self.window, try_join_all(batches))
            .await
            .map_err(|_| {
                StorygraphError::UpstreamTimeout(format!("graph level fetch exceeded {:?}", self.window))
            })??;

        Ok(results.into_iter().flatten().collect())
    }
}
