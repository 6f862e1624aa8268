//! Recipe research through the DuckDuckGo Instant Answer API.
//!
//! The API needs no key. It returns an abstract plus related topics rather
//! than a full result listing; both are used as research snippets.

use async_trait::async_trait;
use mise_common::CookingError;

use super::RecipeSearch;

/// DuckDuckGo Instant Answer API endpoint (no API key required).
const DDG_API_URL: &str = "https://api.duckduckgo.com/";

pub struct DuckDuckGoSearch {
    endpoint: String,
    client: reqwest::Client,
}

impl DuckDuckGoSearch {
    pub fn new(client: reqwest::Client) -> Self {
        Self { endpoint: DDG_API_URL.to_string(), client }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl RecipeSearch for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, CookingError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| CookingError::Search(format!("Search request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CookingError::Search(format!(
                "Search API returned error: {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CookingError::Search(format!("Failed to parse search results: {e}")))?;

        let snippets = extract_snippets(&body, max_results);
        tracing::debug!(query, n = snippets.len(), "DuckDuckGo search finished");
        Ok(snippets)
    }

    fn name(&self) -> &str { "duckduckgo" }
}

/// Pull text snippets out of an Instant Answer document: the abstract first,
/// then the instant answer, then related topics (nested topic groups are
/// flattened in order).
fn extract_snippets(data: &serde_json::Value, max_results: usize) -> Vec<String> {
    let mut snippets: Vec<String> = Vec::new();

    for key in ["AbstractText", "Answer"] {
        if let Some(text) = data[key].as_str() {
            snippets.push(text.to_string());
        }
    }

    if let Some(topics) = data["RelatedTopics"].as_array() {
        for topic in topics {
            match topic["Topics"].as_array() {
                Some(group) => snippets.extend(
                    group.iter().filter_map(|t| t["Text"].as_str()).map(String::from),
                ),
                None => {
                    if let Some(text) = topic["Text"].as_str() {
                        snippets.push(text.to_string());
                    }
                }
            }
        }
    }

    snippets
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(max_results)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_abstract_comes_first() {
        let data = serde_json::json!({
            "AbstractText": "Carbonara is an Italian pasta dish from Rome.",
            "Answer": "",
            "RelatedTopics": [
                { "Text": "Spaghetti alla carbonara uses guanciale.", "FirstURL": "https://example.com/1" }
            ]
        });
        assert_eq!(
            extract_snippets(&data, 3),
            vec![
                "Carbonara is an Italian pasta dish from Rome.",
                "Spaghetti alla carbonara uses guanciale.",
            ]
        );
    }

    #[test]
    fn test_nested_topic_groups_are_flattened_and_capped() {
        let data = serde_json::json!({
            "AbstractText": "",
            "RelatedTopics": [
                { "Text": "Risotto basics" },
                { "Name": "Variants", "Topics": [
                    { "Text": "Mushroom risotto" },
                    { "Text": "Seafood risotto" }
                ]},
                { "Text": "Arborio rice" }
            ]
        });
        assert_eq!(
            extract_snippets(&data, 3),
            vec!["Risotto basics", "Mushroom risotto", "Seafood risotto"]
        );
    }

    #[test]
    fn test_empty_document_yields_nothing() {
        let data = serde_json::json!({ "AbstractText": "", "Answer": "", "RelatedTopics": [] });
        assert!(extract_snippets(&data, 3).is_empty());
        assert!(extract_snippets(&serde_json::json!({}), 3).is_empty());
    }

    use std::collections::HashMap;

    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn search_at(endpoint: String) -> DuckDuckGoSearch {
        DuckDuckGoSearch::new(reqwest::Client::new()).with_endpoint(endpoint)
    }

    #[tokio::test]
    async fn test_query_is_sent_encoded_and_results_extracted() {
        let endpoint = serve(Router::new().route(
            "/",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                Json(serde_json::json!({
                    "AbstractText": params.get("q").cloned().unwrap_or_default(),
                    "Answer": format!("format={}", params.get("format").cloned().unwrap_or_default()),
                    "RelatedTopics": [{ "Text": "Baked macaroni" }, { "Text": "Never returned" }]
                }))
            }),
        ))
        .await;

        let results = search_at(endpoint).search("recipe pasta & cheese", 3).await.unwrap();
        assert_eq!(results, vec!["recipe pasta & cheese", "format=json", "Baked macaroni"]);
    }

    #[tokio::test]
    async fn test_error_status_is_a_search_error() {
        let endpoint = serve(Router::new().route(
            "/",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
        ))
        .await;

        let err = search_at(endpoint).search("recipe soup", 3).await.unwrap_err();
        match err {
            CookingError::Search(msg) => assert!(msg.contains("503"), "{msg}"),
            other => panic!("expected a search error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_a_search_error() {
        let endpoint = serve(Router::new().route("/", get(|| async { "<html>captcha</html>" }))).await;

        let err = search_at(endpoint).search("recipe soup", 3).await.unwrap_err();
        assert!(matches!(err, CookingError::Search(_)));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_search() {
        let search = DuckDuckGoSearch::new(reqwest::Client::new());
        let results = search.search("recipe pancakes", 3).await.unwrap();
        assert!(results.len() <= 3);
    }
}
