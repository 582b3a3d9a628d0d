use crate::config::NotionConfig;
use crate::error::{Result, StorygraphError};
use crate::notion::{Page, PageStore};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const NOTION_API_VERSION: &str = "2022-06-28";

/// Response page of a database query
#[derive(Deserialize)]
struct QueryResponse {
    results: Vec<Page>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Error object returned by the Notion API
#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    code: String,
}

/// Final non-success response, after retries
struct ApiFailure {
    status: StatusCode,
    code: String,
    body: String,
}

impl ApiFailure {
    async fn read(response: Response) -> Self {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        let code = serde_json::from_str::<ErrorBody>(&body)
            .unwrap_or_default()
            .code;
        Self { status, code, body }
    }

    /// Notion answers 404 `object_not_found` for unknown ids and
    /// 400 `validation_error` for ids that are not well-formed uuids.
    fn is_missing_page(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
            || (self.status == StatusCode::BAD_REQUEST && self.code == "validation_error")
    }
}

impl From<ApiFailure> for StorygraphError {
    fn from(failure: ApiFailure) -> Self {
        StorygraphError::Upstream(format!(
            "Notion API error {}: {}",
            failure.status, failure.body
        ))
    }
}

/// Notion REST client
///
/// Implements [`PageStore`] over the Notion v1 API. Batch lookups fan out to
/// per-page requests with bounded concurrency; rate limits and server errors
/// are retried with exponential backoff.
pub struct NotionClient {
    client: Client,
    api_key: String,
    base_url: String,
    max_concurrent_fetches: usize,
    max_retries: usize,
}

impl NotionClient {
    /// Create a new Notion client
    ///
    /// # Arguments
    ///
    /// * `api_key` - Notion integration secret
    /// * `base_url` - API root, e.g. "https://api.notion.com/v1"
    /// * `max_concurrent_fetches` - Upper bound on in-flight page requests per batch
    /// * `max_retries` - Retries for 429 and 5xx responses
    /// * `request_timeout` - Per-request HTTP timeout
    pub fn new(
        api_key: String,
        base_url: &str,
        max_concurrent_fetches: usize,
        max_retries: usize,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("storygraph/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_concurrent_fetches: max_concurrent_fetches.max(1),
            max_retries,
        })
    }

    /// Build a client from the `[notion]` config section.
    ///
    /// The API key is read from the environment variable named by `api_key_env`.
    pub fn from_config(config: &NotionConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            StorygraphError::Config(format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable with your Notion integration secret.",
                config.api_key_env
            ))
        })?;

        Self::new(
            api_key,
            &config.base_url,
            config.max_concurrent_fetches,
            config.max_retries,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn page_url(&self, id: &str) -> String {
        format!("{}/pages/{}", self.base_url, id)
    }

    fn database_query_url(&self, database_id: &str) -> String {
        format!("{}/databases/{}/query", self.base_url, database_id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_API_VERSION)
    }

    /// Send a request, retrying rate limits and server errors.
    ///
    /// Returns the first response that is not retried; callers check its status.
    async fn send_with_retry<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        let mut delay = Duration::from_millis(500);

        loop {
            let response = self.authorized(build()).send().await?;
            let status = response.status();

            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if !retryable || attempt >= self.max_retries {
                return Ok(response);
            }

            let wait = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(delay);
            log::warn!(
                "Notion API returned {}, retry {}/{} in {:?}",
                status,
                attempt + 1,
                self.max_retries,
                wait
            );
            tokio::time::sleep(wait).await;
            delay *= 2;
            attempt += 1;
        }
    }
}

#[async_trait]
impl PageStore for NotionClient {
    async fn get_page(&self, id: &str) -> Result<Option<Page>> {
        let url = self.page_url(id);
        let response = self.send_with_retry(|| self.client.get(&url)).await?;
        if !response.status().is_success() {
            let failure = ApiFailure::read(response).await;
            if failure.is_missing_page() {
                log::debug!("Page {} not found ({} {})", id, failure.status, failure.code);
                return Ok(None);
            }
            return Err(failure.into());
        }
        let page: Page = response.json().await?;
        Ok(Some(page))
    }

    async fn get_pages_by_ids(&self, ids: &[String]) -> Result<Vec<Page>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let start = std::time::Instant::now();
        let fetches: Vec<_> = ids.iter().map(|id| self.get_page(id)).collect();
        let results: Vec<Result<Option<Page>>> = stream::iter(fetches)
            .buffered(self.max_concurrent_fetches)
            .collect()
            .await;

        let mut pages = Vec::with_capacity(ids.len());
        let mut last_error = None;
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(Some(page)) => pages.push(page),
                Ok(None) => log::debug!("Page {} not found, dropped from batch", id),
                Err(e) => {
                    log::warn!("Failed to fetch page {}: {}", id, e);
                    last_error = Some(e);
                }
            }
        }
        log::debug!(
            "Fetched {}/{} pages in {:?}",
            pages.len(),
            ids.len(),
            start.elapsed()
        );

        // Only a batch that resolved nothing surfaces its transport failure.
        match last_error {
            Some(e) if pages.is_empty() => Err(e),
            _ => Ok(pages),
        }
    }

    async fn query_database(&self, database_id: &str, filter: Option<Value>) -> Result<Vec<Page>> {
        let url = self.database_query_url(database_id);
        let mut all_pages = Vec::new();
        let mut start_cursor: Option<String> = None;

        loop {
            let mut payload = serde_json::json!({ "page_size": 100 });
            if let Some(cursor) = start_cursor.take() {
                payload["start_cursor"] = Value::String(cursor);
            }
            if let Some(filter) = &filter {
                payload["filter"] = filter.clone();
            }

            let response = self
                .send_with_retry(|| self.client.post(&url).json(&payload))
                .await?;
            if response.status() == StatusCode::NOT_FOUND {
                return Err(StorygraphError::Upstream(format!(
                    "Database {} not found",
                    database_id
                )));
            }
            if !response.status().is_success() {
                return Err(ApiFailure::read(response).await.into());
            }
            let data: QueryResponse = response.json().await?;
            all_pages.extend(data.results);

            match data.next_cursor {
                Some(cursor) if data.has_more => start_cursor = Some(cursor),
                _ => break,
            }
        }

        log::debug!("Queried {} pages from database {}", all_pages.len(), database_id);
        Ok(all_pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Local listener answering every request with `status` and a JSON `body`.
    async fn stub_api(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let response = format!(
                        "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{}/v1", addr)
    }

    fn client(base_url: &str, concurrency: usize) -> NotionClient {
        NotionClient::new(
            "secret_test".to_string(),
            base_url,
            concurrency,
            3,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_client_trims_base_url() {
        let c = client("https://api.notion.com/v1/", 4);
        assert_eq!(c.page_url("abc"), "https://api.notion.com/v1/pages/abc");
        assert_eq!(
            c.database_query_url("db1"),
            "https://api.notion.com/v1/databases/db1/query"
        );
    }

    #[test]
    fn test_concurrency_floor() {
        let c = client("https://api.notion.com/v1", 0);
        assert_eq!(c.max_concurrent_fetches, 1);
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = NotionConfig {
            api_key_env: "STORYGRAPH_TEST_MISSING_KEY".to_string(),
            ..NotionConfig::default()
        };
        std::env::remove_var("STORYGRAPH_TEST_MISSING_KEY");
        let err = NotionClient::from_config(&config).err().unwrap();
        assert!(err.to_string().contains("STORYGRAPH_TEST_MISSING_KEY"));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_network() {
        // Unroutable base URL: any request would fail, so success proves no request was made.
        let c = client("http://127.0.0.1:9", 4);
        let pages = c.get_pages_by_ids(&[]).await.unwrap();
        assert!(pages.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_id_is_missing_page() {
        let base = stub_api(
            "400 Bad Request",
            r#"{"object":"error","status":400,"code":"validation_error","message":"path failed validation: path.page_id should be a valid uuid, instead was `\"nope\"`."}"#,
        )
        .await;
        let c = client(&base, 4);
        assert!(c.get_page("nope").await.unwrap().is_none());
        let pages = c.get_pages_by_ids(&["nope".into(), "also-nope".into()]).await.unwrap();
        assert!(pages.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_id_is_missing_page() {
        let base = stub_api(
            "404 Not Found",
            r#"{"object":"error","status":404,"code":"object_not_found","message":"Could not find page"}"#,
        )
        .await;
        assert!(client(&base, 4).get_page("59833787-2cf9-4fdf-8782-e53db20768a5").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_other_client_errors_surface() {
        let base = stub_api(
            "401 Unauthorized",
            r#"{"object":"error","status":401,"code":"unauthorized","message":"API token is invalid."}"#,
        )
        .await;
        let err = client(&base, 4).get_page("nope").await.unwrap_err();
        assert!(matches!(err, StorygraphError::Upstream(_)));
        assert!(err.to_string().contains("401"));

        let base = stub_api(
            "400 Bad Request",
            r#"{"object":"error","status":400,"code":"invalid_json","message":"Body failed validation"}"#,
        )
        .await;
        assert!(client(&base, 4).get_page("nope").await.is_err());
    }

    #[tokio::test]
    async fn test_page_is_decoded() {
        let base = stub_api(
            "200 OK",
            r#"{"object":"page","id":"p1","properties":{"Name":{"type":"title","title":[{"plain_text":"Ada"}]}}}"#,
        )
        .await;
        let page = client(&base, 4).get_page("p1").await.unwrap().unwrap();
        assert_eq!(page.id, "p1");
        assert_eq!(page.title(), "Ada");
    }
}
