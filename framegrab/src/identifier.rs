//! Video identifier extraction.
//!
//! Identifiers are extracted syntactically. Nothing here talks to the
//! network, so an identifier that parses may still be rejected later by the
//! downloader.

use crate::errors::FramegrabError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Short-link, `/v/`, `/vi/`, user, embed, and `watch?v=` style URLs.
/// The token runs up to the first `#`, `&`, or `?`.
static VIDEO_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^.*(?:(?:youtu\.be/|v/|vi/|u/\w/|embed/)|(?:(?:watch|movie|channel)/?\?v=))([^#&?]*)",
    )
    .expect("video id pattern is a valid regex")
});

/// A video identifier extracted from a URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for VideoId {
    type Err = FramegrabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_video_id(s)
    }
}

/// Extracts the video identifier from `url`.
///
/// Fails with [`FramegrabError::InvalidUrl`] when no supported URL shape
/// matches or the extracted token is empty.
pub fn parse_video_id(url: &str) -> Result<VideoId, FramegrabError> {
    let url = url.trim();
    let token = VIDEO_ID_PATTERN
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| FramegrabError::invalid_url(url))?;

    Ok(VideoId(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_url() {
        let id = parse_video_id("https://www.youtube.com/watch?v=2FsGsiCSjH0").unwrap();
        assert_eq!(id.as_str(), "2FsGsiCSjH0");
    }

    #[test]
    fn test_short_link() {
        assert_eq!(parse_video_id("https://youtu.be/abc123").unwrap().as_str(), "abc123");
    }

    #[test]
    fn test_embed_and_v_forms() {
        assert_eq!(
            parse_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ").unwrap().as_str(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            parse_video_id("https://www.youtube.com/v/dQw4w9WgXcQ?version=3").unwrap().as_str(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            parse_video_id("https://www.youtube.com/vi/dQw4w9WgXcQ").unwrap().as_str(),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_channel_qualified_form() {
        assert_eq!(
            parse_video_id("https://www.youtube.com/channel?v=XyZ_-09").unwrap().as_str(),
            "XyZ_-09"
        );
    }

    #[test]
    fn test_token_stops_at_delimiters() {
        assert_eq!(
            parse_video_id("https://www.youtube.com/watch?v=abc&t=42s").unwrap().as_str(),
            "abc"
        );
        assert_eq!(parse_video_id("https://youtu.be/abc?t=1").unwrap().as_str(), "abc");
        assert_eq!(parse_video_id("https://youtu.be/abc#frag").unwrap().as_str(), "abc");
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(parse_video_id("  https://youtu.be/abc123\n").unwrap().as_str(), "abc123");
    }

    #[test]
    fn test_unsupported_url_is_rejected() {
        let err = parse_video_id("https://example.com/").unwrap_err();
        assert!(matches!(err, FramegrabError::InvalidUrl { .. }));
    }

    #[test]
    fn test_empty_token_is_rejected() {
        assert!(parse_video_id("https://youtu.be/").is_err());
        assert!(parse_video_id("https://www.youtube.com/watch?v=&list=x").is_err());
        assert!(parse_video_id("").is_err());
    }

    #[test]
    fn test_nonexistent_id_is_accepted() {
        // Syntactic extraction only.
        assert_eq!(parse_video_id("https://youtu.be/zzzzzzzz").unwrap().as_str(), "zzzzzzzz");
    }

    #[test]
    fn test_from_str() {
        let id: VideoId = "https://youtu.be/abc123".parse().unwrap();
        assert_eq!(id.to_string(), "abc123");
    }
}
