//! Extraction strategies
//!
//! Each strategy is an independent regex scan over the page text that yields
//! raw [`MediaCandidate`]s. Strategies never coordinate: overlapping matches
//! are expected and resolved by the aggregator. The declaration order of
//! [`StrategyKind`] is the order in which results are merged.

pub mod markup;
pub mod script;
pub mod stream;

pub use markup::{AnchorStrategy, ContainerStrategy, FrameStrategy, SourceElementStrategy};
pub use script::ScriptLiteralStrategy;
pub use stream::{ManifestStrategy, SegmentHandleStrategy};

use crate::config::ExtractorConfig;
use crate::error::{ExtractionError, Result};
use crate::extraction::candidate::MediaCandidate;
use crate::extraction::classifier::{Classification, Classifier};
use crate::extraction::resolver::{Resolved, UrlResolver};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{trace, warn};
use url::Url;

/// Identifies a strategy; ordering defines merge order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// `<video src>` and nested `<source>` elements
    Container,
    /// Standalone `<source src type>` elements
    SourceElement,
    /// `<iframe>` embedded players
    FrameEmbed,
    /// URLs inside script literals and raw text
    ScriptLiteral,
    /// `<a href>` links to media files
    AnchorLink,
    /// HLS/DASH manifest references
    PlaylistManifest,
    /// Transport segments and `blob:` handles
    SegmentHandle,
}

impl StrategyKind {
    /// All strategies in merge order
    pub const ALL: [StrategyKind; 7] = [
        StrategyKind::Container,
        StrategyKind::SourceElement,
        StrategyKind::FrameEmbed,
        StrategyKind::ScriptLiteral,
        StrategyKind::AnchorLink,
        StrategyKind::PlaylistManifest,
        StrategyKind::SegmentHandle,
    ];

    /// Short name used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Container => "container",
            StrategyKind::SourceElement => "source-element",
            StrategyKind::FrameEmbed => "frame-embed",
            StrategyKind::ScriptLiteral => "script-literal",
            StrategyKind::AnchorLink => "anchor-link",
            StrategyKind::PlaylistManifest => "playlist-manifest",
            StrategyKind::SegmentHandle => "segment-handle",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a strategy may read while scanning one page
pub struct ScanContext<'a> {
    /// Full page text
    pub text: &'a str,
    /// Base URL for resolution
    pub base: &'a Url,
    /// Reference resolver
    pub resolver: &'a UrlResolver,
    /// Media classifier
    pub classifier: &'a Classifier,
    /// Engine configuration
    pub config: &'a ExtractorConfig,
}

impl<'a> ScanContext<'a> {
    /// Resolve `raw` and classify it with `classify`.
    ///
    /// Returns None when the reference is not media. A reference that looks
    /// like media but fails to resolve yields a candidate without a URL; the
    /// aggregator drops those.
    pub fn candidate<F>(&self, strategy: StrategyKind, raw: &str, classify: F) -> Option<MediaCandidate>
    where
        F: Fn(&str) -> Option<Classification>,
    {
        match self.resolver.resolve(raw, self.base) {
            Ok(Resolved::Url(url)) => {
                let url = url.to_string();
                let classification = classify(&url)?;
                Some(MediaCandidate::new(strategy, raw, Some(url), classification))
            }
            Ok(Resolved::Handle(handle)) => Some(MediaCandidate::handle(strategy, handle)),
            Err(e) => {
                let classification = classify(&UrlResolver::clean(raw))?;
                trace!(strategy = %strategy, reference = raw, error = %e, "unresolvable reference");
                Some(MediaCandidate::new(strategy, raw, None, classification))
            }
        }
    }

    /// Empty candidate sink for one strategy run
    pub fn sink(&self, strategy: StrategyKind) -> CandidateSink {
        CandidateSink {
            strategy,
            limit: self.config.max_matches_per_strategy,
            items: Vec::new(),
            truncated: false,
        }
    }
}

/// Collects one strategy's candidates, capped at the configured limit.
///
/// Only emitted candidates count towards the cap. Once it is reached the
/// strategy keeps what it has and stops.
#[derive(Debug)]
pub struct CandidateSink {
    strategy: StrategyKind,
    limit: usize,
    items: Vec<MediaCandidate>,
    truncated: bool,
}

impl CandidateSink {
    /// Keep `candidate`; returns false once the cap is reached
    pub fn push(&mut self, candidate: MediaCandidate) -> bool {
        if self.items.len() >= self.limit {
            if !self.truncated {
                warn!(
                    strategy = %self.strategy,
                    limit = self.limit,
                    "candidate cap reached, truncating"
                );
                self.truncated = true;
            }
            return false;
        }
        self.items.push(candidate);
        true
    }

    /// Keep `candidate` if there is one; returns false once the cap is reached
    pub fn offer(&mut self, candidate: Option<MediaCandidate>) -> bool {
        match candidate {
            Some(candidate) => self.push(candidate),
            None => !self.truncated,
        }
    }

    /// Whether candidates were dropped because of the cap
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Candidates collected so far, in emission order
    pub fn into_candidates(self) -> Vec<MediaCandidate> {
        self.items
    }
}

/// Whether the match starting at `start` is the inner URL of a `blob:` handle
pub(crate) fn inside_blob(text: &str, start: usize) -> bool {
    start >= 5 && text.as_bytes()[start - 5..start].eq_ignore_ascii_case(b"blob:")
}

/// A scanner for one textual shape
pub trait ExtractionStrategy: Send + Sync {
    /// Which strategy this is
    fn kind(&self) -> StrategyKind;

    /// Scan the page and return raw candidates in document order
    fn scan(&self, ctx: &ScanContext<'_>) -> Result<Vec<MediaCandidate>>;
}

/// Build every strategy in merge order
pub fn default_strategies(config: &ExtractorConfig) -> Result<Vec<Box<dyn ExtractionStrategy>>> {
    Ok(vec![
        Box::new(ContainerStrategy::new()?),
        Box::new(SourceElementStrategy::new()?),
        Box::new(FrameStrategy::new()?),
        Box::new(ScriptLiteralStrategy::new(config)?),
        Box::new(AnchorStrategy::new()?),
        Box::new(ManifestStrategy::new()?),
        Box::new(SegmentHandleStrategy::new()?),
    ])
}

/// Compile a pattern, reporting which scanner it belongs to
pub(crate) fn compile(context: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        ExtractionError::InvalidPattern {
            context: context.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Pipe-joined, escaped alternation of extensions
pub(crate) fn alternation(extensions: &[&str]) -> String {
    let mut exts: Vec<&str> = extensions.to_vec();
    // longest first so `m3u8` is tried before `m3u`
    exts.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    exts.iter()
        .map(|e| regex::escape(e))
        .collect::<Vec<_>>()
        .join("|")
}

/// Reads attributes out of the inside of a start tag
#[derive(Debug)]
pub struct AttributeReader {
    pattern: Regex,
}

impl AttributeReader {
    /// Compile the attribute pattern
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: compile(
                "tag attributes",
                r#"(?is)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#,
            )?,
        })
    }

    /// First value of attribute `name` (case-insensitive), entity-decoded
    pub fn get(&self, attrs: &str, name: &str) -> Option<String> {
        self.pattern
            .captures_iter(attrs)
            .find(|caps| caps[1].eq_ignore_ascii_case(name))
            .and_then(|caps| {
                caps.get(2)
                    .or_else(|| caps.get(3))
                    .or_else(|| caps.get(4))
                    .map(|m| decode_entities(m.as_str()))
            })
            .filter(|v| !v.trim().is_empty())
    }

    /// First present attribute among `names`
    pub fn first_of(&self, attrs: &str, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| self.get(attrs, name))
    }
}

/// Decode HTML entities, keeping the input when it is not well-formed
pub(crate) fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    htmlescape::decode_html(value).unwrap_or_else(|_| value.to_string())
}
