use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use storygraph::cache::{CachedPageStore, PageCache};
use storygraph::config::{CacheConfig, GraphConfig};
use storygraph::graph::{GraphBuilder, DEFAULT_DEPTH};
use storygraph::http::{AppState, HttpServer};
use storygraph::mapping::EntityKind;
use storygraph::notion::{InMemoryPageStore, NotionClient, PageStore};
use storygraph::Config;

#[derive(Parser, Debug)]
#[command(name = "storygraph")]
#[command(about = "Normalized entities and relationship graphs over a Notion game-production workspace")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API backed by the configured Notion workspace
    Serve,

    /// Serve the JSON API from a fixture file (offline UI development)
    ServeFixtures {
        /// JSON document mapping collection names to page arrays
        file: PathBuf,

        #[arg(short, long, default_value_t = 3001)]
        port: u16,
    },

    /// Print the relationship graph around one entity as JSON
    Graph {
        /// characters, elements, puzzles or timeline
        #[arg(short, long)]
        kind: EntityKind,

        #[arg(short, long)]
        id: String,

        #[arg(short, long, default_value_t = DEFAULT_DEPTH)]
        depth: usize,

        /// Read pages from a fixture file instead of Notion
        #[arg(short, long)]
        fixtures: Option<PathBuf>,
    },
}

/// Wrap `inner` in the read-through page cache when one is configured.
fn with_cache<S: PageStore + 'static>(inner: S, cache: Option<Arc<PageCache>>) -> Arc<dyn PageStore> {
    match cache {
        Some(cache) => Arc::new(CachedPageStore::new(inner, cache)),
        None => Arc::new(inner),
    }
}

fn build_cache(config: &CacheConfig) -> Option<Arc<PageCache>> {
    if config.enabled {
        Some(Arc::new(PageCache::new(
            config.capacity,
            Duration::from_secs(config.ttl_secs),
        )))
    } else {
        None
    }
}

fn load_fixtures(path: &Path) -> Result<InMemoryPageStore> {
    InMemoryPageStore::from_fixture_file(path)
        .with_context(|| format!("Failed to load fixtures from {}", path.display()))
}

/// Initialize logger from RUST_LOG, falling back to `default_level`
fn init_logger(default_level: &str) {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", default_level)
    ).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => run_server().await,
        Command::ServeFixtures { file, port } => run_fixture_server(&file, port).await,
        Command::Graph {
            kind,
            id,
            depth,
            fixtures,
        } => print_graph(kind, &id, depth, fixtures.as_deref()).await,
    }
}

/// Run the Notion-backed HTTP server
async fn run_server() -> Result<()> {
    let config = Config::load()?;
    init_logger(&config.storygraph.log_level);
    log::info!("Starting storygraph v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Configuration loaded successfully");

    let client = NotionClient::from_config(&config.notion)?;
    let cache = build_cache(&config.cache);
    if let Some(cache) = &cache {
        log::info!(
            "Page cache enabled ({} entries, ttl {:?})",
            config.cache.capacity,
            cache.ttl()
        );
    }

    let store = with_cache(client, cache.clone());
    let state = AppState::from_config(store, cache, &config);
    let server = HttpServer::new(state, config.http_server.allowed_origins.clone());
    server.run(config.http_server.port).await?;

    Ok(())
}

/// Run the HTTP server over a fixture file
async fn run_fixture_server(file: &Path, port: u16) -> Result<()> {
    init_logger("info");
    log::info!("Starting storygraph v{} (fixtures)", env!("CARGO_PKG_VERSION"));

    let store = load_fixtures(file)?;
    let state = AppState::with_collection_databases(
        Arc::new(store),
        None,
        GraphConfig::default().fetch_timeout(),
    );
    HttpServer::new(state, vec![]).run(port).await?;

    Ok(())
}

async fn print_graph(kind: EntityKind, id: &str, depth: usize, fixtures: Option<&Path>) -> Result<()> {
    let (store, fetch_timeout) = match fixtures {
        Some(path) => {
            init_logger("info");
            (
                Arc::new(load_fixtures(path)?) as Arc<dyn PageStore>,
                GraphConfig::default().fetch_timeout(),
            )
        }
        None => {
            let config = Config::load()?;
            init_logger(&config.storygraph.log_level);
            let client = NotionClient::from_config(&config.notion)?;
            (with_cache(client, None), config.graph.fetch_timeout())
        }
    };

    let graph = GraphBuilder::new(store.as_ref(), fetch_timeout)
        .build(kind, id, depth)
        .await?;
    if let Some(error) = &graph.error {
        log::warn!("Graph is partial: {}", error);
    }
    println!("{}", serde_json::to_string_pretty(&graph)?);

    Ok(())
}
