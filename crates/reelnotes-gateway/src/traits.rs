use async_trait::async_trait;
use serde_json::Value;

use crate::error::GatewayError;

/// Read-only access to a movie metadata service.
///
/// Payloads are the upstream JSON, passed through untouched.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Currently popular movies.
    async fn popular(&self) -> Result<Value, GatewayError>;

    /// Details of one movie. The id is forwarded without validation.
    async fn movie(&self, id: &str) -> Result<Value, GatewayError>;

    /// Free-text title search. Empty queries are forwarded as-is.
    async fn search(&self, query: &str) -> Result<Value, GatewayError>;

    /// Connectivity check: fetch the popular list once and count its results.
    async fn probe(&self) -> Result<usize, GatewayError> {
        let payload = self.popular().await?;
        Ok(payload["results"].as_array().map(|r| r.len()).unwrap_or(0))
    }
}

/// Title of a movie-details payload, if it carries one.
pub fn movie_title(payload: &Value) -> Option<String> {
    payload["title"]
        .as_str()
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_movie_title() {
        assert_eq!(movie_title(&json!({"title": "Fight Club"})).as_deref(), Some("Fight Club"));
        assert_eq!(movie_title(&json!({"title": ""})), None);
        assert_eq!(movie_title(&json!({"status_code": 34})), None);
    }
}
