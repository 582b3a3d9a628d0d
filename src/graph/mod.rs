//! Relationship graph module: canonical edges and depth-bounded BFS.
//!
//! Starting from one center entity, each level collects the relation targets
//! of the current frontier, fetches the unvisited ones in one concurrent group
//! per level, and records an edge for every reference seen. Levels run strictly
//! in sequence so the visited set always reflects everything found so far.

mod builder;
pub mod edges;

pub use builder::{normalize_depth, Graph, GraphBuilder, GraphNode, DEFAULT_DEPTH};
pub use edges::{canonical_edge, Edge};
