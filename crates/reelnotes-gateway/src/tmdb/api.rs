use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::GatewayError;

/// One GET against TMDB with the api key attached. Exactly one attempt.
async fn get_json(
    client: &Client,
    url: &str,
    api_key: &str,
    query: &[(&str, &str)],
) -> Result<Value, GatewayError> {
    debug!("GET {}", url);

    let response = client
        .get(url)
        .query(&[("api_key", api_key)])
        .query(query)
        .header("Accept", "application/json")
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        warn!("TMDB returned {} for {}", status, url);
        return Err(GatewayError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Fetch the popular movies list
pub async fn get_popular(client: &Client, base_url: &str, api_key: &str) -> Result<Value, GatewayError> {
    let url = format!("{}/movie/popular", base_url);
    get_json(client, &url, api_key, &[]).await
}

/// Fetch details for a single movie
pub async fn get_movie(client: &Client, base_url: &str, api_key: &str, id: &str) -> Result<Value, GatewayError> {
    // Keep odd ids inside one path segment; TMDB decides whether they exist
    let url = format!("{}/movie/{}", base_url, urlencoding::encode(id));
    get_json(client, &url, api_key, &[]).await
}

/// Search movies by title
pub async fn search_movies(client: &Client, base_url: &str, api_key: &str, query: &str) -> Result<Value, GatewayError> {
    let url = format!("{}/search/movie", base_url);
    get_json(client, &url, api_key, &[("query", query)]).await
}
