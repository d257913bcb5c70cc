//! Markup strategies
//!
//! Tag-level scanners: `<video>` containers, standalone `<source>` elements,
//! `<iframe>` players and `<a>` links. These read attributes with a regex
//! instead of building a DOM, so broken markup degrades to fewer matches
//! rather than a parse failure.

use super::{compile, AttributeReader, ExtractionStrategy, ScanContext, StrategyKind};
use crate::error::Result;
use crate::extraction::candidate::MediaCandidate;
use regex::Regex;
use scraper::Html;

const SRC_ATTRS: &[&str] = &["src", "data-src"];

/// `<video src>` plus `<source>` elements nested in `<video>` bodies
pub struct ContainerStrategy {
    open_tag: Regex,
    close_tag: Regex,
    source_tag: Regex,
    attrs: AttributeReader,
}

impl ContainerStrategy {
    /// Compile the container patterns
    pub fn new() -> Result<Self> {
        Ok(Self {
            open_tag: compile("video tag", r"(?is)<video\b([^>]*)>")?,
            close_tag: compile("video close tag", r"(?i)</video\s*>")?,
            source_tag: compile("nested source tag", r"(?is)<source\b([^>]*)>")?,
            attrs: AttributeReader::new()?,
        })
    }

    /// Body of the `<video>` whose start tag ends at `from`.
    ///
    /// The body stops at the first `</video>`, or is empty when another
    /// `<video>` opens first (unclosed or self-closing tags).
    fn body<'t>(&self, text: &'t str, from: usize, next_open: usize) -> &'t str {
        let window = &text[from..next_open];
        match self.close_tag.find(window) {
            Some(close) => &window[..close.start()],
            None => "",
        }
    }
}

impl ExtractionStrategy for ContainerStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Container
    }

    fn scan(&self, ctx: &ScanContext<'_>) -> Result<Vec<MediaCandidate>> {
        let kind = self.kind();
        let mut sink = ctx.sink(kind);
        let by_extension = |u: &str| ctx.classifier.classify_extension(u);

        let tags: Vec<_> = self.open_tag.captures_iter(ctx.text).collect();
        'tags: for (i, caps) in tags.iter().enumerate() {
            let (Some(tag), Some(attrs)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if let Some(src) = self.attrs.first_of(attrs.as_str(), SRC_ATTRS) {
                if !sink.offer(ctx.candidate(kind, &src, by_extension)) {
                    break;
                }
            }

            let next_open = tags
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(ctx.text.len(), |m| m.start());
            let body = self.body(ctx.text, tag.end(), next_open);
            for source in self.source_tag.captures_iter(body) {
                if let Some(src) = self.attrs.first_of(&source[1], SRC_ATTRS) {
                    if !sink.offer(ctx.candidate(kind, &src, by_extension)) {
                        break 'tags;
                    }
                }
            }
        }

        Ok(sink.into_candidates())
    }
}

/// Standalone `<source src type>` elements
pub struct SourceElementStrategy {
    source_tag: Regex,
    attrs: AttributeReader,
}

impl SourceElementStrategy {
    /// Compile the source-element pattern
    pub fn new() -> Result<Self> {
        Ok(Self {
            source_tag: compile("source tag", r"(?is)<source\b([^>]*)>")?,
            attrs: AttributeReader::new()?,
        })
    }
}

impl ExtractionStrategy for SourceElementStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SourceElement
    }

    fn scan(&self, ctx: &ScanContext<'_>) -> Result<Vec<MediaCandidate>> {
        let kind = self.kind();
        let mut sink = ctx.sink(kind);

        for caps in self.source_tag.captures_iter(ctx.text) {
            let attrs = &caps[1];
            let Some(src) = self.attrs.first_of(attrs, SRC_ATTRS) else {
                continue;
            };
            let mime = self.attrs.get(attrs, "type");
            let candidate = ctx.candidate(kind, &src, |u| {
                ctx.classifier.classify(u, mime.as_deref())
            });
            if !sink.offer(candidate) {
                break;
            }
        }

        Ok(sink.into_candidates())
    }
}

/// `<iframe>` sources that match a known embedded player
pub struct FrameStrategy {
    frame_tag: Regex,
    attrs: AttributeReader,
}

impl FrameStrategy {
    /// Compile the iframe pattern
    pub fn new() -> Result<Self> {
        Ok(Self {
            frame_tag: compile("iframe tag", r"(?is)<iframe\b([^>]*)>")?,
            attrs: AttributeReader::new()?,
        })
    }
}

impl ExtractionStrategy for FrameStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FrameEmbed
    }

    fn scan(&self, ctx: &ScanContext<'_>) -> Result<Vec<MediaCandidate>> {
        let kind = self.kind();
        let mut sink = ctx.sink(kind);

        for caps in self.frame_tag.captures_iter(ctx.text) {
            if let Some(src) = self.attrs.first_of(&caps[1], SRC_ATTRS) {
                if !sink.offer(ctx.candidate(kind, &src, |u| ctx.classifier.classify_embed(u))) {
                    break;
                }
            }
        }

        Ok(sink.into_candidates())
    }
}

/// `<a href>` links whose target has a media extension
pub struct AnchorStrategy {
    anchor: Regex,
    attrs: AttributeReader,
}

impl AnchorStrategy {
    /// Compile the anchor pattern
    pub fn new() -> Result<Self> {
        Ok(Self {
            anchor: compile("anchor", r"(?is)<a\b([^>]*)>(.*?)</a\s*>")?,
            attrs: AttributeReader::new()?,
        })
    }

    /// Visible text of the link body, whitespace collapsed
    fn visible_text(inner: &str) -> Option<String> {
        let fragment = Html::parse_fragment(inner);
        let text = fragment
            .root_element()
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl ExtractionStrategy for AnchorStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::AnchorLink
    }

    fn scan(&self, ctx: &ScanContext<'_>) -> Result<Vec<MediaCandidate>> {
        let kind = self.kind();
        let mut sink = ctx.sink(kind);

        for caps in self.anchor.captures_iter(ctx.text) {
            let attrs = &caps[1];
            let Some(href) = self.attrs.get(attrs, "href") else {
                continue;
            };
            let Some(candidate) =
                ctx.candidate(kind, &href, |u| ctx.classifier.classify_extension(u))
            else {
                continue;
            };
            let name = self
                .attrs
                .get(attrs, "download")
                .or_else(|| Self::visible_text(&caps[2]));
            if !sink.push(candidate.with_suggested_name(name)) {
                break;
            }
        }

        Ok(sink.into_candidates())
    }
}
