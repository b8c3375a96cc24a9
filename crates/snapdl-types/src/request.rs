//! Download requests and title sanitization.

use crate::{Result, SearchResult, SnapdlError};
use serde::{Deserialize, Serialize};

/// Parameters for a new download job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DownloadRequest {
    /// Source locator.
    pub url: String,
    /// Media title; also the basis of the output file name.
    pub title: String,
    /// Uploader or channel name.
    #[serde(default)]
    pub uploader: String,
    /// Thumbnail locator.
    #[serde(default)]
    pub thumbnail: String,
    /// Extract audio only.
    #[serde(default)]
    pub only_audio: bool,
}

impl DownloadRequest {
    /// Creates a video request for `url` titled `title`.
    #[must_use]
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Builds a request from one search result.
    #[must_use]
    pub fn from_search_result(result: &SearchResult, only_audio: bool) -> Self {
        Self {
            url: result.url.clone(),
            title: result.title.clone(),
            uploader: result.uploader.clone(),
            thumbnail: result.thumbnail.clone(),
            only_audio,
        }
    }

    /// Sets the uploader.
    #[must_use]
    pub fn with_uploader(mut self, uploader: impl Into<String>) -> Self {
        self.uploader = uploader.into();
        self
    }

    /// Sets the thumbnail locator.
    #[must_use]
    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = thumbnail.into();
        self
    }

    /// Selects audio-only extraction.
    #[must_use]
    pub const fn audio_only(mut self, only_audio: bool) -> Self {
        self.only_audio = only_audio;
        self
    }

    /// Checks that the request names a source.
    ///
    /// # Errors
    ///
    /// Returns [`SnapdlError::InvalidRequest`] if the URL is blank.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(SnapdlError::InvalidRequest("url is empty".to_string()));
        }
        Ok(())
    }
}

/// Reduces a title to a filesystem-safe file stem.
///
/// Keeps alphanumerics, spaces, `.`, `_` and `-`, trims surrounding
/// whitespace, and returns `fallback` when nothing is left.
#[must_use]
pub fn sanitize_title(title: &str, fallback: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-'))
        .collect();
    let trimmed = kept.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_allowed(c: char) -> bool {
        c.is_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-')
    }

    #[test]
    fn test_sanitize_strips_path_characters() {
        let safe = sanitize_title("Weird/Name:??.mp4", "fallback");
        assert_eq!(safe, "WeirdName.mp4");
        assert!(!safe.is_empty());
        assert!(safe.chars().all(is_allowed));
    }

    #[test]
    fn test_sanitize_keeps_unicode_letters() {
        assert_eq!(sanitize_title("  Canção_n 1 - ao vivo  ", "x"), "Canção_n 1 - ao vivo");
    }

    #[test]
    fn test_sanitize_falls_back_when_empty() {
        assert_eq!(sanitize_title("///:::", "job-id"), "job-id");
        assert_eq!(sanitize_title("   ", "job-id"), "job-id");
    }

    #[test]
    fn test_request_from_search_result() {
        let result = SearchResult {
            title: "Song".to_string(),
            uploader: "Band".to_string(),
            url: "https://www.youtube.com/watch?v=xyz".to_string(),
            thumbnail: "https://i.ytimg.com/xyz.jpg".to_string(),
            duration: "3:12".to_string(),
            views: "1000".to_string(),
        };

        let request = DownloadRequest::from_search_result(&result, true);
        assert_eq!(request.url, result.url);
        assert_eq!(request.uploader, "Band");
        assert!(request.only_audio);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_blank_url_is_rejected() {
        let request = DownloadRequest::new("  ", "title");
        assert!(matches!(
            request.validate(),
            Err(SnapdlError::InvalidRequest(_))
        ));
    }
}
