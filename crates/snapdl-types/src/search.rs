//! Structures produced by a search front end.
//!
//! Searching itself lives outside this workspace; these types only describe
//! the hand-over shape so results can be turned into download requests.

use serde::{Deserialize, Serialize};

/// One video found by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SearchResult {
    /// Video title.
    pub title: String,
    /// Channel or uploader name.
    pub uploader: String,
    /// Watch URL.
    pub url: String,
    /// Thumbnail URL.
    pub thumbnail: String,
    /// Display duration, as reported by the search source.
    pub duration: String,
    /// Display view count, as reported by the search source.
    pub views: String,
}

/// The outcome of one search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SearchResponse {
    /// The query as typed.
    pub query: String,
    /// Whether the search ran.
    pub success: bool,
    /// Failure description when `success` is false.
    pub error: Option<String>,
    /// Results in source order.
    pub results: Vec<SearchResult>,
}

impl SearchResponse {
    /// Parses a response from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a valid response document.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Returns the result at `index`, if any.
    #[must_use]
    pub fn pick(&self, index: usize) -> Option<&SearchResult> {
        self.results.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_with_missing_fields() {
        let json = r#"{
            "query": "lofi",
            "success": true,
            "results": [
                {"title": "Lofi Mix", "url": "https://www.youtube.com/watch?v=1"},
                {"title": "Rain", "uploader": "Nature", "url": "https://www.youtube.com/watch?v=2", "views": "12"}
            ]
        }"#;

        let response = SearchResponse::from_json(json).unwrap();
        assert!(response.success);
        assert!(response.error.is_none());
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.pick(0).unwrap().uploader, "");
        assert_eq!(response.pick(1).unwrap().views, "12");
        assert!(response.pick(2).is_none());
    }
}
