//! Extraction engine
//!
//! [`MediaExtractor`] is the entry point: it validates the caller's input,
//! runs every strategy in isolation and hands the surviving batches to the
//! aggregator. It holds no mutable state, so one instance can be shared
//! behind an `Arc` by any number of concurrent callers.

use crate::config::ExtractorConfig;
use crate::error::{ExtractionError, InputError, Result};
use crate::extraction::aggregator::{Aggregator, Batch};
use crate::extraction::candidate::{MediaCandidate, ResultSet};
use crate::extraction::classifier::{Classification, Classifier, MediaKind};
use crate::extraction::resolver::UrlResolver;
use crate::extraction::strategies::{
    default_strategies, ExtractionStrategy, ScanContext, StrategyKind,
};
use crate::extraction::title::TitleExtractor;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Media extraction engine
pub struct MediaExtractor {
    config: ExtractorConfig,
    resolver: UrlResolver,
    classifier: Classifier,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    title: TitleExtractor,
}

impl MediaExtractor {
    /// Build an engine with the default strategy set
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        let strategies = default_strategies(&config)?;
        Self::with_strategies(config, strategies)
    }

    /// Build an engine with an explicit strategy set
    pub fn with_strategies(
        config: ExtractorConfig,
        strategies: Vec<Box<dyn ExtractionStrategy>>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            resolver: UrlResolver::new(),
            classifier: Classifier::new(&config)?,
            title: TitleExtractor::new(&config)?,
            strategies,
            config,
        })
    }

    /// Engine configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract media references from `page_text` fetched from `page_url`.
    ///
    /// Fails only when the input itself is unusable; a page without media
    /// yields an empty result set.
    #[instrument(skip(self, page_text), fields(len = page_text.len()))]
    pub fn extract(&self, page_text: &str, page_url: &str) -> Result<ResultSet> {
        let base = validate_page_url(page_url)?;
        self.validate_page_text(page_text)?;

        let ctx = ScanContext {
            text: page_text,
            base: &base,
            resolver: &self.resolver,
            classifier: &self.classifier,
            config: &self.config,
        };

        let mut batches: Vec<Batch> = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            let kind = strategy.kind();
            match catch_unwind(AssertUnwindSafe(|| strategy.scan(&ctx))) {
                Ok(Ok(candidates)) => {
                    debug!(strategy = %kind, count = candidates.len(), "strategy finished");
                    batches.push((kind, candidates));
                }
                Ok(Err(e)) => {
                    warn!(strategy = %kind, error = %e, "strategy failed, skipping");
                }
                Err(_) => {
                    let e = ExtractionError::StrategyPanicked(kind.name());
                    warn!(strategy = %kind, error = %e, "strategy panicked, skipping");
                }
            }
        }

        let items = Aggregator::new(&self.config).aggregate(batches, &base);
        let title = self.title.extract(page_text);

        info!(items = items.len(), title = %title, "extraction complete");
        Ok(ResultSet { title, items })
    }

    /// One-item result when `page_url` already points at a media file
    #[instrument(skip(self))]
    pub fn direct_link(&self, page_url: &str) -> Option<ResultSet> {
        let url = validate_page_url(page_url).ok()?;
        let classification = self.classifier.classify_extension(url.as_str()).filter(|c| {
            matches!(
                c.kind,
                MediaKind::DirectFile | MediaKind::HlsManifest | MediaKind::DashManifest
            )
        })?;

        let candidate = MediaCandidate::new(
            StrategyKind::AnchorLink,
            page_url,
            Some(url.to_string()),
            classification,
        );
        let items = Aggregator::new(&self.config)
            .aggregate(vec![(StrategyKind::AnchorLink, vec![candidate])], &url);
        let title = items.first()?.name.clone();

        debug!(url = %url, "page URL is itself a media file");
        Some(ResultSet { title, items })
    }

    /// Classify a single URL, with an optional MIME hint.
    ///
    /// Falls back to the keyword heuristic when it is enabled.
    pub fn classify(&self, url: &str, mime: Option<&str>) -> Option<Classification> {
        self.classifier
            .classify(url, mime)
            .or_else(|| self.classifier.classify_heuristic(url))
    }

    fn validate_page_text(&self, page_text: &str) -> Result<()> {
        let trimmed = page_text.trim();
        if trimmed.is_empty() {
            return Err(InputError::EmptyPage.into());
        }
        if trimmed.len() < self.config.min_page_length {
            return Err(InputError::PageTooShort {
                len: trimmed.len(),
                min: self.config.min_page_length,
            }
            .into());
        }
        Ok(())
    }
}

/// Parse and check the page URL the caller supplied
pub fn validate_page_url(page_url: &str) -> std::result::Result<Url, InputError> {
    let trimmed = page_url.trim();
    if trimmed.is_empty() {
        return Err(InputError::MissingPageUrl);
    }

    let url = Url::parse(trimmed).map_err(|e| InputError::InvalidPageUrl(format!("{}: {}", trimmed, e)))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(InputError::UnsupportedScheme(other.to_string())),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(InputError::InvalidPageUrl(format!("{}: missing host", trimmed)));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::Arc;

    const PAGE: &str = r#"<html><head><title>Clips</title></head><body>
        <video src="/v/intro.mp4"></video>
        <a href="/v/intro.mp4">Intro</a>
    </body></html>"#;

    fn engine() -> MediaExtractor {
        MediaExtractor::new(ExtractorConfig::default()).unwrap()
    }

    struct Exploding;

    impl ExtractionStrategy for Exploding {
        fn kind(&self) -> StrategyKind {
            StrategyKind::FrameEmbed
        }

        fn scan(&self, _ctx: &ScanContext<'_>) -> Result<Vec<MediaCandidate>> {
            panic!("scanner bug");
        }
    }

    struct Failing;

    impl ExtractionStrategy for Failing {
        fn kind(&self) -> StrategyKind {
            StrategyKind::ScriptLiteral
        }

        fn scan(&self, _ctx: &ScanContext<'_>) -> Result<Vec<MediaCandidate>> {
            Err(ExtractionError::InvalidPattern {
                context: "test".to_string(),
                reason: "always fails".to_string(),
            }
            .into())
        }
    }

    #[test]
    fn test_extract_basic() {
        let result = engine().extract(PAGE, "https://example.com/page").unwrap();
        assert_eq!(result.title, "Clips");
        assert_eq!(result.len(), 1);
        assert_eq!(result.items[0].url, "https://example.com/v/intro.mp4");
        // container runs before anchor, but the anchor text fills the name
        assert_eq!(result.items[0].name, "Intro.mp4");
    }

    #[test]
    fn test_invalid_input() {
        let e = engine();
        let cases = [
            (PAGE, ""),
            (PAGE, "not a url"),
            (PAGE, "ftp://example.com/page"),
            ("", "https://example.com/"),
            ("<p>x</p>", "https://example.com/"),
            ("\n\n        <p>x</p>        \n\n", "https://example.com/"),
        ];
        for (text, url) in cases {
            let err = e.extract(text, url).unwrap_err();
            assert!(err.is_invalid_input(), "{} / {:?}: {}", url, text, err);
        }
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let result = engine()
            .extract("<html><body><p>nothing here</p></body></html>", "https://example.com/")
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.title, "Video Resources");
    }

    #[test]
    fn test_strategy_isolation() {
        let config = ExtractorConfig::default();
        let mut strategies = default_strategies(&config).unwrap();
        strategies.push(Box::new(Exploding));
        strategies.push(Box::new(Failing));
        let engine = MediaExtractor::with_strategies(config, strategies).unwrap();

        let result = engine.extract(PAGE, "https://example.com/page").unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_direct_link() {
        let e = engine();
        let result = e
            .direct_link("https://cdn.example.com/files/My%20Movie.webm?token=1")
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.items[0].name, "My Movie.webm");
        assert_eq!(result.items[0].kind, MediaKind::DirectFile);

        let hls = e.direct_link("https://cdn.example.com/live/index.m3u8").unwrap();
        assert_eq!(hls.items[0].kind, MediaKind::HlsManifest);

        assert!(e.direct_link("https://example.com/watch?v=1").is_none());
        assert!(e.direct_link("https://cdn.example.com/seg/001.ts").is_none());
        assert!(e.direct_link("file:///tmp/a.mp4").is_none());
    }

    #[test]
    fn test_classify() {
        let e = engine();
        assert_eq!(
            e.classify("https://x.com/a", Some("video/webm")).map(|c| c.kind),
            Some(MediaKind::DirectFile)
        );
        assert_eq!(
            e.classify("https://cdn.x.com/stream?quality=hd", None).map(|c| c.kind),
            Some(MediaKind::DirectFile)
        );
        assert!(e.classify("https://x.com/about", None).is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ExtractorConfig::builder().max_matches_per_strategy(0).build();
        assert!(matches!(MediaExtractor::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_shared_across_threads() {
        let engine = Arc::new(engine());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || engine.extract(PAGE, "https://example.com/page").unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }
}
