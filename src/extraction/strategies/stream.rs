//! Streaming strategies
//!
//! A dedicated pass for HLS/DASH manifests (which also get a stronger default
//! label than the generic ordinal name) and a pass for raw transport segments
//! and browser-held `blob:` handles.

use super::{compile, inside_blob, ExtractionStrategy, ScanContext, StrategyKind};
use crate::error::Result;
use crate::extraction::candidate::MediaCandidate;
use crate::extraction::classifier::MediaKind;
use regex::Regex;

/// Default label for HLS manifests without a better name
pub const HLS_LABEL: &str = "HLS stream";

/// Default label for DASH manifests without a better name
pub const DASH_LABEL: &str = "DASH stream";

// Bare URLs end at whitespace, quotes, brackets or list punctuation.
const URL_END: &str = r#"(?:\\?["'\s<>(),;]|$)"#;

/// HLS and DASH manifest references
pub struct ManifestStrategy {
    bare: Regex,
    quoted: Regex,
}

impl ManifestStrategy {
    /// Compile the manifest patterns
    pub fn new() -> Result<Self> {
        Ok(Self {
            bare: compile(
                "bare manifest url",
                &format!(
                    r#"(?i)((?:https?:)?(?:\\?/){{2}}[^\s"'<>()]+?\.(?:m3u8|mpd)(?:[?#][^\s"'<>()]*)?){}"#,
                    URL_END
                ),
            )?,
            quoted: compile(
                "quoted manifest reference",
                r#"(?i)["']([^"'\s<>()]+?\.(?:m3u8|mpd)(?:[?#][^"'\s<>]*)?)\\?["']"#,
            )?,
        })
    }

    fn label(kind: MediaKind) -> &'static str {
        if kind == MediaKind::DashManifest {
            DASH_LABEL
        } else {
            HLS_LABEL
        }
    }
}

impl ExtractionStrategy for ManifestStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PlaylistManifest
    }

    fn scan(&self, ctx: &ScanContext<'_>) -> Result<Vec<MediaCandidate>> {
        let kind = self.kind();
        let mut sink = ctx.sink(kind);
        let classify = |u: &str| {
            ctx.classifier
                .classify_extension(u)
                .filter(|c| matches!(c.kind, MediaKind::HlsManifest | MediaKind::DashManifest))
        };

        for pattern in [&self.bare, &self.quoted] {
            for caps in pattern.captures_iter(ctx.text) {
                let Some(reference) = caps.get(1) else {
                    continue;
                };
                // handles are reported by the segment/handle scanner
                if inside_blob(ctx.text, reference.start()) {
                    continue;
                }
                let candidate = ctx
                    .candidate(kind, reference.as_str(), classify)
                    .filter(|c| c.kind != MediaKind::UnresolvableHandle)
                    .map(|c| {
                        let label = Self::label(c.kind);
                        c.with_fallback_label(label)
                    });
                if !sink.offer(candidate) {
                    return Ok(sink.into_candidates());
                }
            }
        }

        Ok(sink.into_candidates())
    }
}

/// Transport segments and in-memory `blob:` handles
pub struct SegmentHandleStrategy {
    segment: Regex,
    handle: Regex,
}

impl SegmentHandleStrategy {
    /// Compile the segment and handle patterns
    pub fn new() -> Result<Self> {
        Ok(Self {
            segment: compile(
                "transport segment url",
                &format!(
                    r#"(?i)((?:https?:)?(?:\\?/){{2}}[^\s"'<>()]+?\.(?:ts|m4s)(?:[?#][^\s"'<>()]*)?){}"#,
                    URL_END
                ),
            )?,
            handle: compile(
                "blob handle",
                r#"(?i)\bblob:(?:https?://[^\s"'<>()\\]+|null/[0-9a-f-]+)"#,
            )?,
        })
    }
}

impl ExtractionStrategy for SegmentHandleStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SegmentHandle
    }

    fn scan(&self, ctx: &ScanContext<'_>) -> Result<Vec<MediaCandidate>> {
        let kind = self.kind();
        let mut sink = ctx.sink(kind);

        for caps in self.segment.captures_iter(ctx.text) {
            let Some(reference) = caps.get(1) else {
                continue;
            };
            if inside_blob(ctx.text, reference.start()) {
                continue;
            }
            let candidate = ctx.candidate(kind, reference.as_str(), |u| {
                ctx.classifier
                    .classify_extension(u)
                    .filter(|c| c.kind == MediaKind::TransportSegment)
            });
            if !sink.offer(candidate) {
                return Ok(sink.into_candidates());
            }
        }

        for m in self.handle.find_iter(ctx.text) {
            if !sink.push(MediaCandidate::handle(kind, m.as_str())) {
                break;
            }
        }

        Ok(sink.into_candidates())
    }
}
