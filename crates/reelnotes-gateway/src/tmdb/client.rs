use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::error::GatewayError;
use crate::tmdb::api;
use crate::traits::MetadataSource;

const USER_AGENT: &str = concat!("reelnotes/", env!("CARGO_PKG_VERSION"));

/// TMDB-backed metadata source. Every call carries the configured api key.
#[derive(Clone)]
pub struct TmdbClient {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, GatewayError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[async_trait]
impl MetadataSource for TmdbClient {
    fn source_name(&self) -> &str {
        "tmdb"
    }

    async fn popular(&self) -> Result<Value, GatewayError> {
        info!("Fetching popular movies from TMDB");
        let payload = api::get_popular(&self.client, &self.base_url, &self.api_key).await?;
        info!(
            "Loaded {} popular movies",
            payload["results"].as_array().map(|r| r.len()).unwrap_or(0)
        );
        Ok(payload)
    }

    async fn movie(&self, id: &str) -> Result<Value, GatewayError> {
        info!("Fetching movie details for id {}", id);
        let payload = api::get_movie(&self.client, &self.base_url, &self.api_key, id).await?;
        info!("Loaded movie {}", payload["title"].as_str().unwrap_or("<untitled>"));
        Ok(payload)
    }

    async fn search(&self, query: &str) -> Result<Value, GatewayError> {
        info!("Searching movies: {:?}", query);
        let payload = api::search_movies(&self.client, &self.base_url, &self.api_key, query).await?;
        info!(
            "Search found {} results",
            payload["results"].as_array().map(|r| r.len()).unwrap_or(0)
        );
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{StatusCode, Uri};
    use axum::response::{IntoResponse, Response};
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    enum Mode {
        Ok,
        Fail(u16),
        Garbage,
    }

    struct Upstream {
        mode: Mode,
        hits: Mutex<Vec<String>>,
    }

    impl Upstream {
        fn hits(&self) -> Vec<String> {
            self.hits.lock().unwrap().clone()
        }
    }

    async fn handle(State(upstream): State<Arc<Upstream>>, uri: Uri) -> Response {
        upstream.hits.lock().unwrap().push(uri.to_string());
        match upstream.mode {
            Mode::Ok => Json(json!({
                "page": 1,
                "results": [{"id": 550, "title": "Fight Club"}, {"id": 680, "title": "Pulp Fiction"}],
                "title": "Fight Club",
            }))
            .into_response(),
            Mode::Fail(code) => (
                StatusCode::from_u16(code).unwrap(),
                Json(json!({"status_code": 7, "status_message": "Invalid API key"})),
            )
                .into_response(),
            Mode::Garbage => "<html>maintenance</html>".into_response(),
        }
    }

    async fn spawn_upstream(mode: Mode) -> (String, Arc<Upstream>) {
        let upstream = Arc::new(Upstream {
            mode,
            hits: Mutex::new(Vec::new()),
        });
        let app = Router::new().fallback(handle).with_state(upstream.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/", addr), upstream)
    }

    #[tokio::test]
    async fn test_popular_passes_payload_through_with_key() {
        let (base, upstream) = spawn_upstream(Mode::Ok).await;
        let client = TmdbClient::new(base, "test-key").unwrap();

        let payload = client.popular().await.unwrap();

        assert_eq!(payload["results"][0]["title"], "Fight Club");
        assert_eq!(upstream.hits(), vec!["/movie/popular?api_key=test-key".to_string()]);
    }

    #[tokio::test]
    async fn test_movie_by_id() {
        let (base, upstream) = spawn_upstream(Mode::Ok).await;
        let client = TmdbClient::new(base, "test-key").unwrap();

        client.movie("550").await.unwrap();

        assert_eq!(upstream.hits(), vec!["/movie/550?api_key=test-key".to_string()]);
    }

    #[tokio::test]
    async fn test_search_encodes_query() {
        let (base, upstream) = spawn_upstream(Mode::Ok).await;
        let client = TmdbClient::new(base, "test-key").unwrap();

        client.search("fight club & co").await.unwrap();
        client.search("").await.unwrap();

        assert_eq!(
            upstream.hits(),
            vec![
                "/search/movie?api_key=test-key&query=fight+club+%26+co".to_string(),
                "/search/movie?api_key=test-key&query=".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_upstream_error_is_surfaced_once_without_retry() {
        let (base, upstream) = spawn_upstream(Mode::Fail(401)).await;
        let client = TmdbClient::new(base, "bad-key").unwrap();

        let err = client.popular().await.unwrap_err();

        assert!(matches!(err, GatewayError::Status { status: 401, .. }));
        assert_eq!(err.upstream_status(), Some(401));
        assert_eq!(upstream.hits().len(), 1);
    }

    #[tokio::test]
    async fn test_non_json_body_is_decode_error() {
        let (base, _upstream) = spawn_upstream(Mode::Garbage).await;
        let client = TmdbClient::new(base, "test-key").unwrap();

        let err = client.movie("550").await.unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_request_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = TmdbClient::new(format!("http://{}", addr), "test-key").unwrap();
        let err = client.popular().await.unwrap_err();
        assert!(matches!(err, GatewayError::Request(_)));
    }

    #[tokio::test]
    async fn test_probe_counts_results() {
        let (base, _upstream) = spawn_upstream(Mode::Ok).await;
        let client = TmdbClient::new(base, "test-key").unwrap();
        assert_eq!(client.probe().await.unwrap(), 2);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = TmdbClient::new("https://api.themoviedb.org/3/", "").unwrap();
        assert_eq!(client.base_url(), "https://api.themoviedb.org/3");
        assert!(!client.has_api_key());
    }
}
