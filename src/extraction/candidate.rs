//! Candidate and result types
//!
//! A [`MediaCandidate`] is what a strategy reports; the aggregator turns the
//! surviving candidates into [`MediaItem`]s inside a [`ResultSet`].

use crate::extraction::classifier::{Classification, MediaKind};
use crate::extraction::strategies::StrategyKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Note attached to browser-held handles
pub const HANDLE_NOTE: &str =
    "in-memory browser handle; requires a live browser context to resolve";

/// A detected, not-yet-finalized media reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCandidate {
    /// Reference as found in the page text
    pub raw_reference: String,
    /// Absolute URL, or None when resolution failed
    pub resolved_url: Option<String>,
    /// Detected kind
    pub kind: MediaKind,
    /// Name hint from the page (link text, download attribute)
    pub suggested_name: Option<String>,
    /// Default label that outranks the generic ordinal name
    pub fallback_label: Option<String>,
    /// Lower-case extension without leading dot
    pub extension_hint: String,
    /// Human-readable note for consumers
    pub note: Option<String>,
    /// Strategy that produced this candidate
    pub strategy: StrategyKind,
}

impl MediaCandidate {
    /// Candidate for a classified reference
    pub fn new(
        strategy: StrategyKind,
        raw_reference: impl Into<String>,
        resolved_url: Option<String>,
        classification: Classification,
    ) -> Self {
        Self {
            raw_reference: raw_reference.into(),
            resolved_url,
            kind: classification.kind,
            suggested_name: None,
            fallback_label: None,
            extension_hint: classification.extension,
            note: None,
            strategy,
        }
    }

    /// Candidate for a browser-held object handle
    pub fn handle(strategy: StrategyKind, raw_reference: impl Into<String>) -> Self {
        Self {
            raw_reference: raw_reference.into(),
            resolved_url: None,
            kind: MediaKind::UnresolvableHandle,
            suggested_name: None,
            fallback_label: None,
            extension_hint: String::new(),
            note: Some(HANDLE_NOTE.to_string()),
            strategy,
        }
    }

    /// Attach a name hint; blank hints are ignored
    pub fn with_suggested_name(mut self, name: Option<String>) -> Self {
        self.suggested_name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self
    }

    /// Attach a default label
    pub fn with_fallback_label(mut self, label: impl Into<String>) -> Self {
        self.fallback_label = Some(label.into());
        self
    }

    /// Key used for deduplication
    pub fn dedup_key(&self) -> Option<&str> {
        match (&self.resolved_url, self.kind) {
            (Some(url), _) => Some(url.as_str()),
            (None, MediaKind::UnresolvableHandle) => Some(self.raw_reference.as_str()),
            (None, _) => None,
        }
    }
}

/// A finalized entry handed to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Absolute URL (raw reference for handles)
    pub url: String,
    /// Suggested file name
    pub name: String,
    /// Detected kind
    pub kind: MediaKind,
    /// Lower-case extension without leading dot
    pub extension: String,
    /// Suggested request headers for the follow-up GET
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Note for consumers (set for unresolvable handles)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Engine output for one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Label for the whole set
    pub title: String,
    /// Deduplicated items in first-seen order
    pub items: Vec<MediaItem>,
}

impl ResultSet {
    /// Whether nothing was found
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Items of one kind
    pub fn of_kind(&self, kind: MediaKind) -> impl Iterator<Item = &MediaItem> {
        self.items.iter().filter(move |i| i.kind == kind)
    }

    /// Suggest `user_agent` for follow-up requests that don't carry one yet.
    ///
    /// Used when the page was fetched, so downloads can present the same
    /// client. Handles have no request headers and are left alone.
    pub fn suggest_user_agent(&mut self, user_agent: &str) {
        for item in &mut self.items {
            if item.kind == MediaKind::UnresolvableHandle || item.headers.is_empty() {
                continue;
            }
            item.headers
                .entry("User-Agent".to_string())
                .or_insert_with(|| user_agent.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key() {
        let c = MediaCandidate::new(
            StrategyKind::ScriptLiteral,
            "a.mp4",
            Some("https://x.com/a.mp4".to_string()),
            Classification {
                kind: MediaKind::DirectFile,
                extension: "mp4".to_string(),
            },
        );
        assert_eq!(c.dedup_key(), Some("https://x.com/a.mp4"));

        let h = MediaCandidate::handle(StrategyKind::SegmentHandle, "blob:https://x.com/1");
        assert_eq!(h.dedup_key(), Some("blob:https://x.com/1"));
        assert!(h.note.is_some());

        let unresolved = MediaCandidate {
            resolved_url: None,
            ..c
        };
        assert_eq!(unresolved.dedup_key(), None);
    }

    #[test]
    fn test_blank_suggested_name_ignored() {
        let h = MediaCandidate::handle(StrategyKind::SegmentHandle, "blob:x")
            .with_suggested_name(Some("   ".to_string()));
        assert!(h.suggested_name.is_none());
    }

    #[test]
    fn test_media_item_serialization() {
        let item = MediaItem {
            url: "https://x.com/a.m3u8".to_string(),
            name: "a.m3u8".to_string(),
            kind: MediaKind::HlsManifest,
            extension: "m3u8".to_string(),
            headers: BTreeMap::new(),
            note: None,
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"kind\":\"hls-manifest\""));
        assert!(!json.contains("headers"));
        assert!(!json.contains("note"));
    }

    #[test]
    fn test_suggest_user_agent() {
        let item = |url: &str, kind: MediaKind, headers: &[(&str, &str)]| MediaItem {
            url: url.to_string(),
            name: "x".to_string(),
            kind,
            extension: String::new(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            note: None,
        };
        let mut result = ResultSet {
            title: "t".to_string(),
            items: vec![
                item("https://x.com/a.mp4", MediaKind::DirectFile, &[("Referer", "https://x.com/")]),
                item(
                    "https://x.com/b.mp4",
                    MediaKind::DirectFile,
                    &[("Referer", "https://x.com/"), ("User-Agent", "configured")],
                ),
                item("blob:https://x.com/1", MediaKind::UnresolvableHandle, &[]),
            ],
        };

        result.suggest_user_agent("fetch-agent");

        assert_eq!(
            result.items[0].headers.get("User-Agent").map(String::as_str),
            Some("fetch-agent")
        );
        assert_eq!(
            result.items[1].headers.get("User-Agent").map(String::as_str),
            Some("configured")
        );
        assert!(result.items[2].headers.is_empty());
    }
}
