//! Aggregation and deduplication
//!
//! Merges the per-strategy candidate batches into the final item list:
//! fixed strategy order, unresolved references dropped, duplicates collapsed,
//! then every survivor named and given request hints.

use crate::config::ExtractorConfig;
use crate::extraction::candidate::{MediaCandidate, MediaItem};
use crate::extraction::classifier::MediaKind;
use crate::extraction::strategies::StrategyKind;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, trace};
use url::Url;

/// Candidates reported by one strategy
pub type Batch = (StrategyKind, Vec<MediaCandidate>);

const UNSAFE_NAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Turns candidate batches into named, deduplicated items
#[derive(Debug)]
pub struct Aggregator<'a> {
    config: &'a ExtractorConfig,
}

impl<'a> Aggregator<'a> {
    /// Create an aggregator for one extraction call
    pub fn new(config: &'a ExtractorConfig) -> Self {
        Self { config }
    }

    /// Merge `batches` into the final item list for `page_url`
    pub fn aggregate(&self, mut batches: Vec<Batch>, page_url: &Url) -> Vec<MediaItem> {
        batches.sort_by_key(|(kind, _)| *kind);

        let kept = self.dedup(batches);
        let mut used_names = HashSet::new();

        kept.iter()
            .enumerate()
            .map(|(i, candidate)| self.finalize(candidate, i + 1, &mut used_names, page_url))
            .collect()
    }

    fn dedup(&self, batches: Vec<Batch>) -> Vec<MediaCandidate> {
        let mut kept: Vec<MediaCandidate> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for candidate in batches.into_iter().flat_map(|(_, batch)| batch) {
            let Some(key) = candidate.dedup_key().map(str::to_string) else {
                debug!(
                    strategy = %candidate.strategy,
                    reference = %candidate.raw_reference,
                    "dropping unresolved reference"
                );
                continue;
            };

            match index.get(&key) {
                Some(&at) => {
                    let existing = &mut kept[at];
                    if existing.suggested_name.is_none() {
                        existing.suggested_name = candidate.suggested_name;
                    }
                    if existing.fallback_label.is_none() {
                        existing.fallback_label = candidate.fallback_label;
                    }
                    trace!(url = %key, strategy = %candidate.strategy, "duplicate merged");
                }
                None => {
                    index.insert(key, kept.len());
                    kept.push(candidate);
                }
            }
        }

        kept
    }

    fn finalize(
        &self,
        candidate: &MediaCandidate,
        ordinal: usize,
        used_names: &mut HashSet<String>,
        page_url: &Url,
    ) -> MediaItem {
        let extension = candidate
            .kind
            .forced_extension()
            .map(str::to_string)
            .unwrap_or_else(|| candidate.extension_hint.clone());

        let mut name = sanitize(&self.base_name(candidate, ordinal));
        if name.is_empty() {
            name = format!("video_{}", ordinal);
        }
        name = with_extension(name, candidate.kind, &extension);
        if self.config.unique_names {
            name = disambiguate(name, used_names);
        }

        let mut headers = BTreeMap::new();
        if candidate.kind != MediaKind::UnresolvableHandle {
            headers.insert("Referer".to_string(), page_url.to_string());
            if let Some(ua) = &self.config.user_agent {
                headers.insert("User-Agent".to_string(), ua.clone());
            }
        }

        MediaItem {
            url: candidate
                .resolved_url
                .clone()
                .unwrap_or_else(|| candidate.raw_reference.clone()),
            name,
            kind: candidate.kind,
            extension,
            headers,
            note: candidate.note.clone(),
        }
    }

    /// First available of: page hint, path segment, name-like query
    /// parameter, labelled ordinal, generic ordinal
    fn base_name(&self, candidate: &MediaCandidate, ordinal: usize) -> String {
        if let Some(name) = &candidate.suggested_name {
            return name.clone();
        }

        let parsed = candidate
            .resolved_url
            .as_deref()
            .and_then(|u| Url::parse(u).ok());

        if let Some(url) = &parsed {
            if let Some(segment) = last_segment(url) {
                return segment;
            }
            if let Some(value) = self.query_name(url) {
                return value;
            }
        }

        match &candidate.fallback_label {
            Some(label) => format!("{} {}", label, ordinal),
            None => format!("video_{}", ordinal),
        }
    }

    fn query_name(&self, url: &Url) -> Option<String> {
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        self.config.name_query_params.iter().find_map(|param| {
            pairs
                .iter()
                .find(|(k, v)| k.eq_ignore_ascii_case(param) && !v.trim().is_empty())
                .map(|(_, v)| v.trim().to_string())
        })
    }
}

/// Percent-decoded final path segment, if non-empty
fn last_segment(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    if segment.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    let decoded = decoded.trim().to_string();
    (!decoded.is_empty()).then_some(decoded)
}

/// Replace characters that are unsafe in file names
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_control() || UNSAFE_NAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Extension already present on a file name
fn name_extension(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 5 {
        return None;
    }
    ext.chars().all(|c| c.is_ascii_alphanumeric()).then_some(ext)
}

fn with_extension(name: String, kind: MediaKind, extension: &str) -> String {
    if extension.is_empty() {
        return name;
    }
    match (kind.forced_extension(), name_extension(&name)) {
        (Some(forced), Some(ext)) if ext.eq_ignore_ascii_case(forced) => name,
        (Some(forced), _) => format!("{}.{}", name, forced),
        (None, Some(_)) => name,
        (None, None) => format!("{}.{}", name, extension),
    }
}

/// Insert `_<n>` before the extension until the name is unused
fn disambiguate(name: String, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_lowercase()) {
        return name;
    }

    let (stem, ext) = match name_extension(&name) {
        Some(ext) => (&name[..name.len() - ext.len() - 1], Some(ext)),
        None => (name.as_str(), None),
    };

    let mut n = 2;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{}_{}.{}", stem, n, ext),
            None => format!("{}_{}", stem, n),
        };
        if used.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::classifier::Classification;
    use pretty_assertions::assert_eq;

    fn page() -> Url {
        Url::parse("https://example.com/watch?v=1").unwrap()
    }

    fn cand(strategy: StrategyKind, url: &str, kind: MediaKind, ext: &str) -> MediaCandidate {
        MediaCandidate::new(
            strategy,
            url,
            Some(url.to_string()),
            Classification {
                kind,
                extension: ext.to_string(),
            },
        )
    }

    fn direct(strategy: StrategyKind, url: &str) -> MediaCandidate {
        cand(strategy, url, MediaKind::DirectFile, "mp4")
    }

    fn names(items: &[MediaItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_batches_merge_in_strategy_order() {
        let config = ExtractorConfig::default();
        let batches = vec![
            (
                StrategyKind::AnchorLink,
                vec![direct(StrategyKind::AnchorLink, "https://cdn.x/b.mp4")],
            ),
            (
                StrategyKind::Container,
                vec![direct(StrategyKind::Container, "https://cdn.x/a.mp4")],
            ),
        ];
        let items = Aggregator::new(&config).aggregate(batches, &page());
        assert_eq!(names(&items), vec!["a.mp4", "b.mp4"]);
    }

    #[test]
    fn test_unresolved_dropped_and_duplicates_collapsed() {
        let config = ExtractorConfig::default();
        let mut unresolved = direct(StrategyKind::ScriptLiteral, "http://[bad/x.mp4");
        unresolved.resolved_url = None;
        let batches = vec![
            (
                StrategyKind::Container,
                vec![direct(StrategyKind::Container, "https://cdn.x/a.mp4")],
            ),
            (
                StrategyKind::ScriptLiteral,
                vec![
                    unresolved,
                    direct(StrategyKind::ScriptLiteral, "https://cdn.x/a.mp4"),
                ],
            ),
        ];
        let items = Aggregator::new(&config).aggregate(batches, &page());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://cdn.x/a.mp4");
    }

    #[test]
    fn test_later_duplicate_fills_missing_name_only() {
        let config = ExtractorConfig::default();
        let first = direct(StrategyKind::Container, "https://cdn.x/v/abc");
        let named = direct(StrategyKind::AnchorLink, "https://cdn.x/v/abc")
            .with_suggested_name(Some("Trailer".to_string()));
        let renamed = direct(StrategyKind::SegmentHandle, "https://cdn.x/v/abc")
            .with_suggested_name(Some("Other".to_string()));
        let batches = vec![
            (StrategyKind::Container, vec![first]),
            (StrategyKind::AnchorLink, vec![named]),
            (StrategyKind::SegmentHandle, vec![renamed]),
        ];
        let items = Aggregator::new(&config).aggregate(batches, &page());
        assert_eq!(names(&items), vec!["Trailer.mp4"]);
    }

    #[test]
    fn test_naming_chain() {
        let config = ExtractorConfig::default();
        let batch = vec![
            direct(StrategyKind::ScriptLiteral, "https://cdn.x/My%20Clip.mp4"),
            direct(StrategyKind::ScriptLiteral, "https://cdn.x/?filename=holiday.webm"),
            cand(
                StrategyKind::ScriptLiteral,
                "https://cdn.x/",
                MediaKind::HlsManifest,
                "m3u8",
            )
            .with_fallback_label("HLS stream"),
            direct(StrategyKind::ScriptLiteral, "https://cdn2.x/"),
        ];
        let items =
            Aggregator::new(&config).aggregate(vec![(StrategyKind::ScriptLiteral, batch)], &page());
        assert_eq!(
            names(&items),
            vec!["My Clip.mp4", "holiday.webm", "HLS stream 3.m3u8", "video_4.mp4"]
        );
    }

    #[test]
    fn test_sanitize_and_forced_manifest_extension() {
        let config = ExtractorConfig::default();
        let batch = vec![
            direct(StrategyKind::AnchorLink, "https://cdn.x/1.mp4")
                .with_suggested_name(Some("a/b: c?".to_string())),
            cand(
                StrategyKind::AnchorLink,
                "https://cdn.x/live/playlist.php",
                MediaKind::HlsManifest,
                "m3u8",
            ),
            cand(
                StrategyKind::AnchorLink,
                "https://cdn.x/manifest.MPD",
                MediaKind::DashManifest,
                "mpd",
            ),
        ];
        let items =
            Aggregator::new(&config).aggregate(vec![(StrategyKind::AnchorLink, batch)], &page());
        assert_eq!(
            names(&items),
            vec!["a_b_ c_.mp4", "playlist.php.m3u8", "manifest.MPD"]
        );
        assert_eq!(items[1].extension, "m3u8");
    }

    #[test]
    fn test_disambiguation() {
        let batch = vec![
            direct(StrategyKind::ScriptLiteral, "https://a.x/video.mp4"),
            direct(StrategyKind::ScriptLiteral, "https://b.x/video.mp4"),
            direct(StrategyKind::ScriptLiteral, "https://c.x/VIDEO.mp4"),
        ];

        let config = ExtractorConfig::default();
        let items = Aggregator::new(&config)
            .aggregate(vec![(StrategyKind::ScriptLiteral, batch.clone())], &page());
        assert_eq!(names(&items), vec!["video.mp4", "video_2.mp4", "VIDEO_3.mp4"]);

        let config = ExtractorConfig::builder().unique_names(false).build();
        let items =
            Aggregator::new(&config).aggregate(vec![(StrategyKind::ScriptLiteral, batch)], &page());
        assert_eq!(names(&items), vec!["video.mp4", "video.mp4", "VIDEO.mp4"]);
    }

    #[test]
    fn test_headers_and_handles() {
        let config = ExtractorConfig::builder().user_agent("rk-test/1.0").build();
        let batch = vec![
            direct(StrategyKind::SegmentHandle, "https://cdn.x/a.mp4"),
            MediaCandidate::handle(StrategyKind::SegmentHandle, "blob:https://example.com/42"),
        ];
        let items = Aggregator::new(&config)
            .aggregate(vec![(StrategyKind::SegmentHandle, batch)], &page());

        assert_eq!(
            items[0].headers.get("Referer").map(String::as_str),
            Some("https://example.com/watch?v=1")
        );
        assert_eq!(
            items[0].headers.get("User-Agent").map(String::as_str),
            Some("rk-test/1.0")
        );

        let handle = &items[1];
        assert_eq!(handle.url, "blob:https://example.com/42");
        assert_eq!(handle.kind, MediaKind::UnresolvableHandle);
        assert_eq!(handle.name, "video_2");
        assert!(handle.headers.is_empty());
        assert!(handle.note.is_some());
    }

    #[test]
    fn test_sanitize_control_chars() {
        assert_eq!(sanitize("a\tb\u{7}c|d"), "a_b_c_d");
        assert_eq!(sanitize("  spaced  "), "spaced");
    }
}
