use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::error::GatewayError;
use crate::traits::MetadataSource;

const RUNNING_MESSAGE: &str = "Movie Review Platform API is running!";
const CHECK_KEY_DETAILS: &str = "Check your TMDB API key configuration";

/// Result of the startup connectivity check, reported on `/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamStatus {
    Connected,
    Disconnected,
}

impl UpstreamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamStatus::Connected => "connected",
            UpstreamStatus::Disconnected => "disconnected",
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn MetadataSource>,
    upstream_status: UpstreamStatus,
}

impl AppState {
    pub fn new(source: Arc<dyn MetadataSource>, upstream_status: UpstreamStatus) -> Self {
        Self {
            source,
            upstream_status,
        }
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub message: String,
    pub tmdb_status: String,
}

/// First value of `name` in a raw query string. Missing means empty; repeated
/// keys and malformed percent escapes never reject the request.
fn query_param(raw: Option<&str>, name: &str) -> String {
    raw.unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(key, _)| decode_component(key) == name)
        .map(|(_, value)| decode_component(value))
        .unwrap_or_default()
}

fn decode_component(component: &str) -> String {
    let spaced = component.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}

/// Generic 500 sent to clients; the upstream error itself only goes to the log.
#[derive(Debug, Serialize)]
pub struct UpstreamFailure {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<&'static str>,
}

impl UpstreamFailure {
    fn log(self, cause: &GatewayError) -> Self {
        error!("TMDB API error: {}", cause);
        self
    }
}

impl IntoResponse for UpstreamFailure {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/api/movies/popular", get(popular))
        .route("/api/movies/search", get(search))
        .route("/api/movies/:id", get(movie))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        message: RUNNING_MESSAGE.to_string(),
        tmdb_status: state.upstream_status.as_str().to_string(),
    })
}

async fn popular(State(state): State<AppState>) -> Result<Json<Value>, UpstreamFailure> {
    state.source.popular().await.map(Json).map_err(|e| {
        UpstreamFailure {
            error: "Failed to fetch movies from TMDB",
            details: Some(CHECK_KEY_DETAILS),
        }
        .log(&e)
    })
}

async fn movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, UpstreamFailure> {
    state.source.movie(&id).await.map(Json).map_err(|e| {
        UpstreamFailure {
            error: "Failed to fetch movie details",
            details: Some(CHECK_KEY_DETAILS),
        }
        .log(&e)
    })
}

async fn search(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Value>, UpstreamFailure> {
    let query = query_param(raw.as_deref(), "query");
    state.source.search(&query).await.map(Json).map_err(|e| {
        UpstreamFailure {
            error: "Failed to search movies",
            details: None,
        }
        .log(&e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use std::sync::Mutex;
    use tower::ServiceExt; // for oneshot

    /// Records every call and answers from canned data.
    #[derive(Default)]
    struct FakeSource {
        fail: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn record(&self, call: String) -> Result<(), GatewayError> {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                return Err(GatewayError::Status {
                    status: 401,
                    body: "Invalid API key: You must be granted a valid key.".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl MetadataSource for FakeSource {
        fn source_name(&self) -> &str {
            "fake"
        }

        async fn popular(&self) -> Result<Value, GatewayError> {
            self.record("popular".to_string())?;
            Ok(json!({"page": 1, "results": [{"id": 550, "title": "Fight Club"}]}))
        }

        async fn movie(&self, id: &str) -> Result<Value, GatewayError> {
            self.record(format!("movie:{}", id))?;
            Ok(json!({"id": id, "title": "Fight Club"}))
        }

        async fn search(&self, query: &str) -> Result<Value, GatewayError> {
            self.record(format!("search:{}", query))?;
            Ok(json!({"results": [], "query": query}))
        }
    }

    fn app(source: Arc<FakeSource>) -> Router {
        build_router(AppState::new(source, UpstreamStatus::Connected))
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_root_reports_status() {
        let router = build_router(AppState::new(Arc::new(FakeSource::default()), UpstreamStatus::Disconnected));
        let (status, body) = get_json(router, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Movie Review Platform API is running!");
        assert_eq!(body["tmdb_status"], "disconnected");
    }

    #[tokio::test]
    async fn test_popular_passthrough() {
        let source = Arc::new(FakeSource::default());
        let (status, body) = get_json(app(source.clone()), "/api/movies/popular").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"page": 1, "results": [{"id": 550, "title": "Fight Club"}]}));
        assert_eq!(*source.calls.lock().unwrap(), vec!["popular".to_string()]);
    }

    #[tokio::test]
    async fn test_movie_by_id() {
        let source = Arc::new(FakeSource::default());
        let (status, body) = get_json(app(source.clone()), "/api/movies/550").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "550");
    }

    #[tokio::test]
    async fn test_search_is_not_captured_as_movie_id() {
        let source = Arc::new(FakeSource::default());
        let (status, body) = get_json(app(source.clone()), "/api/movies/search?query=fight%20club").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["query"], "fight club");
        assert_eq!(*source.calls.lock().unwrap(), vec!["search:fight club".to_string()]);
    }

    #[tokio::test]
    async fn test_search_without_query_forwards_empty() {
        let source = Arc::new(FakeSource::default());
        let (status, _) = get_json(app(source.clone()), "/api/movies/search").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(*source.calls.lock().unwrap(), vec!["search:".to_string()]);
    }

    #[tokio::test]
    async fn test_search_tolerates_odd_query_strings() {
        let source = Arc::new(FakeSource::default());
        let (status, _) = get_json(app(source.clone()), "/api/movies/search?query=a&query=b").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = get_json(app(source.clone()), "/api/movies/search?query=100%25+pure%zz").await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(
            *source.calls.lock().unwrap(),
            vec!["search:a".to_string(), "search:100% pure%zz".to_string()]
        );
    }

    #[test]
    fn test_query_param() {
        assert_eq!(query_param(None, "query"), "");
        assert_eq!(query_param(Some("page=2&query=fight+club"), "query"), "fight club");
        assert_eq!(query_param(Some("query"), "query"), "");
        assert_eq!(query_param(Some("q%75ery=%C3%A9t%C3%A9"), "query"), "été");
    }

    #[tokio::test]
    async fn test_popular_failure_is_single_generic_error() {
        let source = Arc::new(FakeSource::failing());
        let (status, body) = get_json(app(source.clone()), "/api/movies/popular").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({
                "error": "Failed to fetch movies from TMDB",
                "details": "Check your TMDB API key configuration",
            })
        );
        assert_eq!(source.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_movie_failure_body() {
        let (status, body) = get_json(app(Arc::new(FakeSource::failing())), "/api/movies/0").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch movie details");
        assert!(body["details"].is_string());
    }

    #[tokio::test]
    async fn test_search_failure_has_no_details() {
        let (status, body) = get_json(app(Arc::new(FakeSource::failing())), "/api/movies/search?query=x").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to search movies"}));
    }

    #[tokio::test]
    async fn test_cors_headers_present() {
        let req = Request::builder()
            .uri("/api/movies/popular")
            .header("origin", "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let response = app(Arc::new(FakeSource::default())).oneshot(req).await.unwrap();
        assert!(response.headers().contains_key("access-control-allow-origin"));
    }
}
