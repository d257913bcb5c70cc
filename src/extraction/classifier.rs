//! Media classification
//!
//! Decides whether a URL (optionally with a MIME hint) denotes a media
//! resource and of which kind. The deterministic rules (extension, MIME,
//! embed shapes) are kept apart from the keyword heuristic, which only the
//! script-literal strategy consults and which can be switched off in
//! [`ExtractorConfig`].

use crate::config::ExtractorConfig;
use crate::error::{ExtractionError, Result};
use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Kind of detected media resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaKind {
    /// Progressive container file (mp4, webm, ...)
    DirectFile,
    /// HLS playlist (m3u8)
    HlsManifest,
    /// DASH manifest (mpd)
    DashManifest,
    /// Single chunk of a segmented stream
    TransportSegment,
    /// Third-party iframe player
    EmbeddedPlayer,
    /// Browser-held object handle that cannot be fetched over HTTP
    UnresolvableHandle,
}

impl MediaKind {
    /// Stable string form, identical to the serialized value
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::DirectFile => "direct-file",
            MediaKind::HlsManifest => "hls-manifest",
            MediaKind::DashManifest => "dash-manifest",
            MediaKind::TransportSegment => "transport-segment",
            MediaKind::EmbeddedPlayer => "embedded-player",
            MediaKind::UnresolvableHandle => "unresolvable-handle",
        }
    }

    /// Extension every name of this kind must carry, if fixed
    pub fn forced_extension(&self) -> Option<&'static str> {
        match self {
            MediaKind::HlsManifest => Some("m3u8"),
            MediaKind::DashManifest => Some("mpd"),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Detected kind
    pub kind: MediaKind,
    /// Lower-case extension without leading dot; empty when not applicable
    pub extension: String,
}

impl Classification {
    fn new(kind: MediaKind, extension: &str) -> Self {
        Self {
            kind,
            extension: extension.to_string(),
        }
    }
}

/// Known media extensions and their kinds
pub const MEDIA_EXTENSIONS: &[(&str, MediaKind)] = &[
    ("mp4", MediaKind::DirectFile),
    ("webm", MediaKind::DirectFile),
    ("mkv", MediaKind::DirectFile),
    ("mov", MediaKind::DirectFile),
    ("avi", MediaKind::DirectFile),
    ("flv", MediaKind::DirectFile),
    ("m4v", MediaKind::DirectFile),
    ("ogv", MediaKind::DirectFile),
    ("3gp", MediaKind::DirectFile),
    ("wmv", MediaKind::DirectFile),
    ("f4v", MediaKind::DirectFile),
    ("mpg", MediaKind::DirectFile),
    ("mpeg", MediaKind::DirectFile),
    ("m3u8", MediaKind::HlsManifest),
    ("m3u", MediaKind::HlsManifest),
    ("mpd", MediaKind::DashManifest),
    ("ts", MediaKind::TransportSegment),
    ("m4s", MediaKind::TransportSegment),
];

/// MIME types and the kind/extension they imply
pub const MIME_TYPES: &[(&str, MediaKind, &str)] = &[
    ("video/mp4", MediaKind::DirectFile, "mp4"),
    ("video/webm", MediaKind::DirectFile, "webm"),
    ("video/ogg", MediaKind::DirectFile, "ogv"),
    ("video/quicktime", MediaKind::DirectFile, "mov"),
    ("video/x-flv", MediaKind::DirectFile, "flv"),
    ("video/x-matroska", MediaKind::DirectFile, "mkv"),
    ("video/x-msvideo", MediaKind::DirectFile, "avi"),
    ("video/3gpp", MediaKind::DirectFile, "3gp"),
    ("video/mpeg", MediaKind::DirectFile, "mpg"),
    ("application/x-mpegurl", MediaKind::HlsManifest, "m3u8"),
    ("application/vnd.apple.mpegurl", MediaKind::HlsManifest, "m3u8"),
    ("audio/mpegurl", MediaKind::HlsManifest, "m3u8"),
    ("audio/x-mpegurl", MediaKind::HlsManifest, "m3u8"),
    ("application/dash+xml", MediaKind::DashManifest, "mpd"),
    ("video/mp2t", MediaKind::TransportSegment, "ts"),
];

/// Host+path shapes of third-party embedded players
pub const EMBED_PATTERNS: &[&str] = &[
    r"^(?:www\.)?youtube(?:-nocookie)?\.com/embed/[^/]+",
    r"^player\.vimeo\.com/video/\d+",
    r"^(?:www\.)?dailymotion\.com/embed/video/[^/]+",
    r"^(?:geo\.)?dailymotion\.com/player",
    r"^player\.bilibili\.com/player\.html",
    r"^(?:www\.)?streamable\.com/e/[^/]+",
    r"^(?:www\.)?facebook\.com/plugins/video\.php",
    r"^player\.twitch\.tv/?",
    r"^(?:www\.)?ok\.ru/videoembed/\d+",
    r"^(?:www\.)?rutube\.ru/play/embed/[^/]+",
    r"^(?:www\.)?vk\.com/video_ext\.php",
];

/// Page assets the heuristic must never report
const IGNORED_ASSET_EXTENSIONS: &[&str] = &[
    "js", "mjs", "css", "json", "map", "png", "jpg", "jpeg", "gif", "webp", "avif", "svg", "ico",
    "bmp", "woff", "woff2", "ttf", "otf", "eot", "html", "htm", "php", "txt", "xml", "vtt", "srt",
];

/// URL/MIME classifier built from immutable lookup tables
#[derive(Debug)]
pub struct Classifier {
    extensions: Vec<(String, MediaKind)>,
    mime_types: Vec<(String, MediaKind, String)>,
    embeds: RegexSet,
    heuristics_enabled: bool,
    keywords: Vec<String>,
    query_params: Vec<String>,
    extension_token: Regex,
}

impl Classifier {
    /// Build a classifier from the engine configuration
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        let embeds = RegexSet::new(EMBED_PATTERNS.iter().map(|p| format!("(?i){}", p)))
            .map_err(|e| ExtractionError::InvalidPattern {
                context: "embedded player shapes".to_string(),
                reason: e.to_string(),
            })?;

        let alternation = MEDIA_EXTENSIONS
            .iter()
            .map(|(ext, _)| regex::escape(ext))
            .collect::<Vec<_>>()
            .join("|");
        let extension_token = Regex::new(&format!(r"(?i)\.({})(?:$|[^a-z0-9])", alternation))
            .map_err(|e| ExtractionError::InvalidPattern {
                context: "media extension token".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            extensions: MEDIA_EXTENSIONS
                .iter()
                .map(|(ext, kind)| (ext.to_string(), *kind))
                .collect(),
            mime_types: MIME_TYPES
                .iter()
                .map(|(mime, kind, ext)| (mime.to_string(), *kind, ext.to_string()))
                .collect(),
            embeds,
            heuristics_enabled: config.heuristics_enabled,
            keywords: config
                .heuristic_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            query_params: config
                .heuristic_query_params
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
            extension_token,
        })
    }

    /// Extension test, then MIME test, then embedded-player test
    pub fn classify(&self, url: &str, mime_hint: Option<&str>) -> Option<Classification> {
        self.classify_extension(url)
            .or_else(|| mime_hint.and_then(|m| self.classify_mime(m)))
            .or_else(|| self.classify_embed(url))
    }

    /// Match the final path segment's extension against the allow-list
    pub fn classify_extension(&self, url: &str) -> Option<Classification> {
        let ext = path_extension(url)?;
        self.kind_for_extension(&ext)
            .map(|kind| Classification::new(kind, &ext))
    }

    /// Look up a MIME type, ignoring parameters such as `codecs`
    pub fn classify_mime(&self, mime: &str) -> Option<Classification> {
        let essence = mime.split(';').next()?.trim().to_ascii_lowercase();
        self.mime_types
            .iter()
            .find(|(m, _, _)| *m == essence)
            .map(|(_, kind, ext)| Classification::new(*kind, ext))
    }

    /// Match host+path against known embedded player shapes
    pub fn classify_embed(&self, url: &str) -> Option<Classification> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        let target = format!("{}{}", host, parsed.path());
        if self.embeds.is_match(&target) {
            Some(Classification::new(MediaKind::EmbeddedPlayer, ""))
        } else {
            None
        }
    }

    /// Keyword match corroborated by an extension token or query parameter
    pub fn classify_heuristic(&self, url: &str) -> Option<Classification> {
        if !self.heuristics_enabled {
            return None;
        }

        let lower = url.to_ascii_lowercase();
        if !self.keywords.iter().any(|k| lower.contains(k.as_str())) {
            return None;
        }
        if let Some(ext) = path_extension(url) {
            if IGNORED_ASSET_EXTENSIONS.contains(&ext.as_str()) {
                return None;
            }
        }

        if let Some(caps) = self.extension_token.captures(&lower) {
            let ext = caps[1].to_string();
            let kind = self.kind_for_extension(&ext)?;
            return Some(Classification::new(kind, &ext));
        }

        let parsed = Url::parse(url).ok()?;
        let mut corroborated = false;
        let mut format_hint = None;
        for (key, value) in parsed.query_pairs() {
            let key = key.to_ascii_lowercase();
            if self.query_params.iter().any(|p| *p == key) {
                corroborated = true;
            }
            if key == "format" {
                format_hint = Some(value.to_ascii_lowercase());
            }
        }
        if !corroborated {
            return None;
        }

        match format_hint.and_then(|f| self.kind_for_extension(&f).map(|k| (k, f))) {
            Some((kind, ext)) => Some(Classification::new(kind, &ext)),
            None => Some(Classification::new(MediaKind::DirectFile, "mp4")),
        }
    }

    fn kind_for_extension(&self, ext: &str) -> Option<MediaKind> {
        self.extensions
            .iter()
            .find(|(e, _)| e == ext)
            .map(|(_, kind)| *kind)
    }
}

/// Lower-case extension of the final path segment, ignoring query and fragment
pub fn path_extension(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(&ExtractorConfig::default()).unwrap()
    }

    #[test]
    fn test_extension_case_insensitive() {
        let c = classifier();
        let hit = c
            .classify_extension("https://cdn.example.com/Movie.MP4?token=1")
            .unwrap();
        assert_eq!(hit.kind, MediaKind::DirectFile);
        assert_eq!(hit.extension, "mp4");
    }

    #[test]
    fn test_manifest_extensions() {
        let c = classifier();
        assert_eq!(
            c.classify_extension("https://a.com/live/index.m3u8").unwrap().kind,
            MediaKind::HlsManifest
        );
        assert_eq!(
            c.classify_extension("https://a.com/live/manifest.mpd").unwrap().kind,
            MediaKind::DashManifest
        );
        assert_eq!(
            c.classify_extension("https://a.com/live/seg-001.ts").unwrap().kind,
            MediaKind::TransportSegment
        );
    }

    #[test]
    fn test_extension_only_checks_path() {
        let c = classifier();
        assert!(c
            .classify_extension("https://a.com/watch?file=clip.mp4")
            .is_none());
        assert!(c.classify_extension("https://a.com/app.js").is_none());
    }

    #[test]
    fn test_mime_fallback() {
        let c = classifier();
        let hit = c
            .classify(
                "https://a.com/stream",
                Some("application/vnd.apple.mpegURL"),
            )
            .unwrap();
        assert_eq!(hit.kind, MediaKind::HlsManifest);
        assert_eq!(hit.extension, "m3u8");

        let hit = c
            .classify_mime("video/webm; codecs=\"vp9\"")
            .unwrap();
        assert_eq!(hit.extension, "webm");
        assert!(c.classify_mime("text/html").is_none());
    }

    #[test]
    fn test_extension_wins_over_mime() {
        let c = classifier();
        let hit = c
            .classify("https://a.com/x.webm", Some("video/mp4"))
            .unwrap();
        assert_eq!(hit.extension, "webm");
    }

    #[test]
    fn test_embed_shapes() {
        let c = classifier();
        for url in [
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube-nocookie.com/embed/abc",
            "https://player.vimeo.com/video/123456",
            "https://player.bilibili.com/player.html?bvid=BV1xx",
        ] {
            let hit = c.classify_embed(url).unwrap();
            assert_eq!(hit.kind, MediaKind::EmbeddedPlayer, "{}", url);
        }
        assert!(c.classify_embed("https://www.youtube.com/watch?v=abc").is_none());
        assert!(c.classify_embed("https://example.com/embed/abc").is_none());
    }

    #[test]
    fn test_heuristic_requires_corroboration() {
        let c = classifier();
        // Keyword alone never fires
        assert!(c
            .classify_heuristic("https://video.example.com/watch/123")
            .is_none());

        let hit = c
            .classify_heuristic("https://cdn.example.com/get?id=9&quality=720")
            .unwrap();
        assert_eq!(hit.kind, MediaKind::DirectFile);
        assert_eq!(hit.extension, "mp4");

        let hit = c
            .classify_heuristic("https://stream.example.com/play/abc.m3u8/token")
            .unwrap();
        assert_eq!(hit.kind, MediaKind::HlsManifest);
    }

    #[test]
    fn test_heuristic_format_param() {
        let c = classifier();
        let hit = c
            .classify_heuristic("https://media.example.com/v?id=1&format=webm")
            .unwrap();
        assert_eq!(hit.extension, "webm");
    }

    #[test]
    fn test_heuristic_ignores_page_assets() {
        let c = classifier();
        assert!(c
            .classify_heuristic("https://cdn.example.com/thumb.jpg?format=webp&quality=80")
            .is_none());
        assert!(c
            .classify_heuristic("https://cdn.example.com/player.js?video=1")
            .is_none());
    }

    #[test]
    fn test_heuristic_can_be_disabled() {
        let config = ExtractorConfig::builder().heuristics(false).build();
        let c = Classifier::new(&config).unwrap();
        assert!(c
            .classify_heuristic("https://cdn.example.com/get?quality=720")
            .is_none());
    }

    #[test]
    fn test_path_extension() {
        assert_eq!(path_extension("https://a.com/b/c.MKV#t=1"), Some("mkv".to_string()));
        assert_eq!(path_extension("/relative/clip.webm?x=1"), Some("webm".to_string()));
        assert_eq!(path_extension("https://a.com/.hidden"), None);
        assert_eq!(path_extension("https://a.com/dir/"), None);
    }

    #[test]
    fn test_media_kind_serialization() {
        let json = serde_json::to_string(&MediaKind::HlsManifest).unwrap();
        assert_eq!(json, "\"hls-manifest\"");
        assert_eq!(MediaKind::UnresolvableHandle.to_string(), "unresolvable-handle");
    }
}
