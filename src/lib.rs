pub mod cache;
pub mod config;
pub mod enrich;
pub mod error;
pub mod graph;
pub mod http;
pub mod mapping;
pub mod notion;
pub mod properties;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use config::Config;
pub use error::{Result, StorygraphError};
pub use graph::{Graph, GraphBuilder};
pub use enrich::RelationEnricher;
