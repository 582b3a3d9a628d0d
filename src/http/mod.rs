//! JSON API consumed by the dashboard UI.
//!
//! Per collection (`characters`, `elements`, `puzzles`, `timeline`):
//! `GET /api/<collection>` lists mapped entities, `GET /api/<collection>/:id`
//! returns one relation-enriched entity, and `GET /api/<collection>/:id/graph`
//! returns the relationship graph around it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cache::PageCache;
use crate::config::Config;
use crate::enrich::{EnrichedEntity, RelationEnricher};
use crate::error::{Result, StorygraphError};
use crate::graph::{normalize_depth, Graph, GraphBuilder};
use crate::mapping::{map_entity, map_overview, map_timeline_event, Entity, EntityKind, Overview, TimelineEvent};
use crate::notion::PageStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn PageStore>,
    cache: Option<Arc<PageCache>>,
    databases: Arc<HashMap<EntityKind, String>>,
    fetch_timeout: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PageStore>,
        cache: Option<Arc<PageCache>>,
        databases: HashMap<EntityKind, String>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            databases: Arc::new(databases),
            fetch_timeout,
        }
    }

    /// State whose database ids come from the `[notion]` section.
    pub fn from_config(store: Arc<dyn PageStore>, cache: Option<Arc<PageCache>>, config: &Config) -> Self {
        let databases = EntityKind::ALL
            .into_iter()
            .map(|kind| (kind, config.database_id(kind).to_string()))
            .collect();
        Self::new(store, cache, databases, config.graph.fetch_timeout())
    }

    /// State for fixture documents, whose databases are named after the collections.
    pub fn with_collection_databases(
        store: Arc<dyn PageStore>,
        cache: Option<Arc<PageCache>>,
        fetch_timeout: Duration,
    ) -> Self {
        let databases = EntityKind::ALL
            .into_iter()
            .map(|kind| (kind, kind.collection().to_string()))
            .collect();
        Self::new(store, cache, databases, fetch_timeout)
    }

    fn database_id(&self, kind: EntityKind) -> &str {
        self.databases.get(&kind).map(String::as_str).unwrap_or_default()
    }
}

/// Handler error, rendered as a JSON `{error}` body
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Internal(StorygraphError),
}

impl From<StorygraphError> for ApiError {
    fn from(err: StorygraphError) -> Self {
        match err {
            StorygraphError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(err) => {
                log::error!("Request failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Something went wrong!" })),
                )
                    .into_response()
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    view: Option<String>,
}

/// First `depth` value of a raw query string; later repeats are ignored.
fn depth_param(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "depth")
        .map(|(_, value)| value.into_owned())
}

/// HTTP API server
pub struct HttpServer {
    state: AppState,
    allowed_origins: Vec<String>,
}

impl HttpServer {
    pub fn new(state: AppState, allowed_origins: Vec<String>) -> Self {
        Self {
            state,
            allowed_origins,
        }
    }

    /// Run the HTTP server
    pub async fn run(&self, port: u16) -> Result<()> {
        let app = self.router();

        let addr = format!("127.0.0.1:{}", port);
        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            StorygraphError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to bind to {}: {}. Set http_server.port in config.toml to use another port.",
                    addr, e
                ),
            ))
        })?;

        log::info!("Starting storygraph API on http://{}", addr);

        axum::serve(listener, app).await.map_err(|e| {
            StorygraphError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("HTTP server error: {}", e),
            ))
        })?;

        Ok(())
    }

    /// Create the axum router
    pub fn router(&self) -> Router {
        // Empty allowed_origins means local development: allow any origin.
        let cors = if self.allowed_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<axum::http::HeaderValue> = self
                .allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        let mut router = Router::new()
            .route("/api/health", get(handle_health))
            .route("/api/cache/clear", post(handle_cache_clear));
        for kind in EntityKind::ALL {
            router = router.merge(collection_routes(kind));
        }

        router
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors),
            )
            .with_state(self.state.clone())
    }
}

fn collection_routes(kind: EntityKind) -> Router<AppState> {
    let base = format!("/api/{}", kind.collection());
    Router::new()
        .route(
            &base,
            get(move |state: State<AppState>, query: Query<ListQuery>| {
                handle_list(kind, state, query)
            }),
        )
        .route(
            &format!("{}/:id", base),
            get(move |state: State<AppState>, id: Path<String>| handle_detail(kind, state, id)),
        )
        .route(
            &format!("{}/:id/graph", base),
            get(
                move |state: State<AppState>, id: Path<String>, query: RawQuery| {
                    handle_graph(kind, state, id, query)
                },
            ),
        )
}

/// Handle health check endpoint
async fn handle_health() -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "storygraph",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
        .into_response()
}

async fn handle_cache_clear(State(state): State<AppState>) -> Response {
    let cleared = state.cache.as_ref().map(|cache| cache.clear()).unwrap_or(0);
    log::info!("Page cache cleared ({} entries)", cleared);
    (StatusCode::OK, Json(json!({ "cleared": cleared }))).into_response()
}

async fn handle_list(
    kind: EntityKind,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> std::result::Result<Response, ApiError> {
    let pages = state
        .store
        .query_database(state.database_id(kind), None)
        .await?;

    if query.view.as_deref() == Some("overview") {
        let overviews: Vec<Overview> = pages.iter().filter_map(|p| map_overview(kind, p)).collect();
        return Ok(Json(overviews).into_response());
    }

    if kind == EntityKind::TimelineEvent {
        let mut events: Vec<TimelineEvent> = pages.iter().filter_map(map_timeline_event).collect();
        sort_by_date(&mut events);
        return Ok(Json(events).into_response());
    }

    let entities: Vec<Entity> = pages.iter().filter_map(|p| map_entity(kind, p)).collect();
    Ok(Json(entities).into_response())
}

async fn handle_detail(
    kind: EntityKind,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<Json<EnrichedEntity>, ApiError> {
    let not_found = || ApiError::NotFound(format!("{} not found", kind));

    let page = match tokio::time::timeout(state.fetch_timeout, state.store.get_page(&id)).await {
        Ok(page) => page?.ok_or_else(not_found)?,
        Err(_) => {
            return Err(ApiError::Internal(StorygraphError::UpstreamTimeout(format!(
                "fetching {} {}",
                kind, id
            ))))
        }
    };

    RelationEnricher::new(state.store.as_ref(), state.fetch_timeout)
        .map_with_names(kind, &page)
        .await
        .map(Json)
        .ok_or_else(not_found)
}

async fn handle_graph(
    kind: EntityKind,
    State(state): State<AppState>,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
) -> std::result::Result<Json<Graph>, ApiError> {
    let depth = normalize_depth(depth_param(query.as_deref()).as_deref());
    let graph = GraphBuilder::new(state.store.as_ref(), state.fetch_timeout)
        .build(kind, &id, depth)
        .await?;
    Ok(Json(graph))
}

/// Upstream dates are either plain dates or RFC 3339 timestamps.
fn parse_event_date(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Ascending by date; undated or unparseable events last, original order otherwise.
fn sort_by_date(events: &mut [TimelineEvent]) {
    events.sort_by_cached_key(|e| {
        let date = e.date.as_deref().and_then(parse_event_date);
        (date.is_none(), date)
    });
}
