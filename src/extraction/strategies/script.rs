//! Script-literal strategy
//!
//! Scans the raw page text, inline scripts included, for URLs held in string
//! literals. Three independent patterns feed the same resolve+classify step:
//!
//! - quoted URLs ending in a media extension,
//! - assignments to well-known video URL fields (`videoUrl: "..."`),
//! - quoted absolute URLs that pass the keyword heuristic.
//!
//! Literals inside JSON blobs are often escaped (`\"https:\/\/...\"`), so the
//! patterns tolerate a backslash before the closing quote and the resolver
//! strips the rest.

use super::{alternation, compile, ExtractionStrategy, ScanContext, StrategyKind};
use crate::config::ExtractorConfig;
use crate::error::Result;
use crate::extraction::candidate::MediaCandidate;
use crate::extraction::classifier::{Classification, MediaKind, MEDIA_EXTENSIONS};
use crate::extraction::resolver::UrlResolver;
use regex::Regex;

/// Media URLs in quoted strings and script assignments
pub struct ScriptLiteralStrategy {
    quoted_media: Regex,
    named_field: Option<Regex>,
    quoted_absolute: Regex,
}

impl ScriptLiteralStrategy {
    /// Compile patterns; field names come from the configuration
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        let exts: Vec<&str> = MEDIA_EXTENSIONS
            .iter()
            .filter(|(_, kind)| *kind != MediaKind::TransportSegment)
            .map(|(ext, _)| *ext)
            .collect();

        let quoted_media = compile(
            "quoted media literal",
            &format!(
                r#"(?i)["']([^"'\s<>]+?\.(?:{})(?:[?#][^"'\s<>]*)?)\\?["']"#,
                alternation(&exts)
            ),
        )?;

        let named_field = if config.script_field_names.is_empty() {
            None
        } else {
            let fields = config
                .script_field_names
                .iter()
                .map(|f| regex::escape(f))
                .collect::<Vec<_>>()
                .join("|");
            Some(compile(
                "named field assignment",
                &format!(
                    r#"(?i)\b(?:{})\b\\?["']?\s*[:=]\s*\\?["']([^"'\s<>]+?)\\?["']"#,
                    fields
                ),
            )?)
        };

        let quoted_absolute = compile(
            "quoted absolute literal",
            r#"(?i)["']((?:https?:)?(?:\\?/){2}[^"'\s<>]+)["']"#,
        )?;

        Ok(Self {
            quoted_media,
            named_field,
            quoted_absolute,
        })
    }

    fn looks_like_url(value: &str) -> bool {
        let cleaned = UrlResolver::clean(value);
        let lower = cleaned.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://") || cleaned.starts_with('/')
    }
}

impl ExtractionStrategy for ScriptLiteralStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ScriptLiteral
    }

    fn scan(&self, ctx: &ScanContext<'_>) -> Result<Vec<MediaCandidate>> {
        let kind = self.kind();
        let mut sink = ctx.sink(kind);
        let classifier = ctx.classifier;

        for caps in self.quoted_media.captures_iter(ctx.text) {
            if !sink.offer(ctx.candidate(kind, &caps[1], |u| classifier.classify_extension(u))) {
                return Ok(sink.into_candidates());
            }
        }

        if let Some(named_field) = &self.named_field {
            for caps in named_field.captures_iter(ctx.text) {
                let value = &caps[1];
                if !Self::looks_like_url(value) {
                    continue;
                }
                // the field name already says "video URL"
                let candidate = ctx.candidate(kind, value, |u| {
                    classifier
                        .classify_extension(u)
                        .or_else(|| classifier.classify_embed(u))
                        .or_else(|| classifier.classify_heuristic(u))
                        .or_else(|| {
                            Some(Classification {
                                kind: MediaKind::DirectFile,
                                extension: "mp4".to_string(),
                            })
                        })
                });
                if !sink.offer(candidate) {
                    return Ok(sink.into_candidates());
                }
            }
        }

        if ctx.config.heuristics_enabled {
            for caps in self.quoted_absolute.captures_iter(ctx.text) {
                let candidate = ctx.candidate(kind, &caps[1], |u| {
                    // segments belong to the segment scanner
                    classifier
                        .classify_extension(u)
                        .or_else(|| classifier.classify_heuristic(u))
                        .filter(|c| c.kind != MediaKind::TransportSegment)
                });
                if !sink.offer(candidate) {
                    break;
                }
            }
        }

        Ok(sink.into_candidates())
    }
}
