use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Extensions we keep from a direct URL path. Anything else is
/// remuxed into mp4 downstream anyway.
const KNOWN_MEDIA_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "webm", "m4v", "avi"];

/// A single clip source from the manifest.
///
/// A source is either a directly fetchable URL or an opaque asset id
/// that must be resolved through the lookup API first. Classification
/// happens once, at parse time, and is purely syntactic: a source is a
/// URL exactly when it parses as one with a supported scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// Directly fetchable location (http, https or file scheme).
    Url(String),
    /// Opaque asset id, resolved via the lookup API.
    AssetId(String),
}

impl SourceRef {
    /// Classifies a raw manifest source string.
    pub fn parse(raw: &str) -> Self {
        if let Ok(url) = Url::parse(raw) {
            if matches!(url.scheme(), "http" | "https" | "file") {
                return Self::Url(raw.to_string());
            }
        }
        Self::AssetId(raw.to_string())
    }

    /// The raw source string as it appeared in the manifest.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Url(s) => s,
            Self::AssetId(s) => s,
        }
    }

    /// File extension for the downloaded clip.
    ///
    /// Direct URLs keep a recognized media extension from their path;
    /// everything else defaults to mp4.
    pub fn preferred_extension(&self) -> &'static str {
        if let Self::Url(raw) = self {
            if let Ok(url) = Url::parse(raw) {
                let ext = PathBuf::from(url.path())
                    .extension()
                    .map(|e| e.to_string_lossy().to_lowercase());
                if let Some(ext) = ext {
                    if let Some(known) = KNOWN_MEDIA_EXTENSIONS.iter().find(|k| **k == ext) {
                        return known;
                    }
                }
            }
        }
        "mp4"
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(s) => write!(f, "url:{}", s),
            Self::AssetId(s) => write!(f, "asset:{}", s),
        }
    }
}

/// Outcome of fetching a single clip to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedClip {
    /// Where the clip was written.
    pub path: PathBuf,
    /// Bytes actually received.
    pub bytes_received: u64,
    /// Bytes the server advertised, when known.
    pub expected_bytes: Option<u64>,
}

impl FetchedClip {
    /// True when the server advertised a length and we received less.
    pub fn is_incomplete(&self) -> bool {
        matches!(self.expected_bytes, Some(expected) if self.bytes_received < expected)
    }
}

/// A fetched clip together with its position in the batch.
///
/// `sequence_index` is 1-based and matches the index embedded in the
/// destination file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub sequence_index: usize,
    pub path: PathBuf,
    pub bytes_received: u64,
    pub expected_bytes: Option<u64>,
}

impl DownloadResult {
    pub fn is_incomplete(&self) -> bool {
        matches!(self.expected_bytes, Some(expected) if self.bytes_received < expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_url_classified_as_url() {
        let source = SourceRef::parse("https://cdn.example.com/clips/intro.mp4");
        assert_eq!(
            source,
            SourceRef::Url("https://cdn.example.com/clips/intro.mp4".to_string())
        );
    }

    #[test]
    fn test_file_url_classified_as_url() {
        let source = SourceRef::parse("file:///srv/media/clip.mp4");
        assert!(matches!(source, SourceRef::Url(_)));
    }

    #[test]
    fn test_opaque_id_classified_as_asset() {
        let source = SourceRef::parse("9f8e7d6c5b4a");
        assert_eq!(source, SourceRef::AssetId("9f8e7d6c5b4a".to_string()));
    }

    #[test]
    fn test_scheme_like_substring_is_not_a_url() {
        // Contains "https" but does not parse as a URL with that scheme
        let source = SourceRef::parse("xhttpsy-not-a-url");
        assert!(matches!(source, SourceRef::AssetId(_)));
    }

    #[test]
    fn test_unsupported_scheme_is_treated_as_asset_id() {
        let source = SourceRef::parse("ftp://example.com/clip.mp4");
        assert!(matches!(source, SourceRef::AssetId(_)));
    }

    #[test]
    fn test_preferred_extension_from_url_path() {
        let source = SourceRef::parse("https://cdn.example.com/a/b/clip.webm");
        assert_eq!(source.preferred_extension(), "webm");
    }

    #[test]
    fn test_preferred_extension_ignores_query_string() {
        let source = SourceRef::parse("https://cdn.example.com/clip.mov?sig=abc123");
        assert_eq!(source.preferred_extension(), "mov");
    }

    #[test]
    fn test_preferred_extension_defaults_to_mp4() {
        assert_eq!(
            SourceRef::parse("https://cdn.example.com/stream").preferred_extension(),
            "mp4"
        );
        assert_eq!(
            SourceRef::parse("https://cdn.example.com/page.html").preferred_extension(),
            "mp4"
        );
        assert_eq!(
            SourceRef::parse("9f8e7d6c5b4a").preferred_extension(),
            "mp4"
        );
    }

    #[test]
    fn test_incomplete_detection() {
        let complete = FetchedClip {
            path: PathBuf::from("/d/a-001.mp4"),
            bytes_received: 100,
            expected_bytes: Some(100),
        };
        assert!(!complete.is_incomplete());

        let short = FetchedClip {
            path: PathBuf::from("/d/a-002.mp4"),
            bytes_received: 50,
            expected_bytes: Some(100),
        };
        assert!(short.is_incomplete());

        let unknown_length = FetchedClip {
            path: PathBuf::from("/d/a-003.mp4"),
            bytes_received: 50,
            expected_bytes: None,
        };
        assert!(!unknown_length.is_incomplete());
    }
}
