//! Result-set title

use crate::config::ExtractorConfig;
use crate::error::Result;
use crate::extraction::strategies::{compile, decode_entities};
use regex::Regex;

/// Derives the result-set label from the page `<title>`
#[derive(Debug)]
pub struct TitleExtractor {
    pattern: Regex,
    default_title: String,
    max_chars: usize,
}

impl TitleExtractor {
    /// Create a title extractor
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        Ok(Self {
            pattern: compile("title element", r"(?is)<title\b[^>]*>(.*?)</title\s*>")?,
            default_title: config.default_title.clone(),
            max_chars: config.title_max_chars,
        })
    }

    /// First `<title>` text, cleaned and truncated, or the default label
    pub fn extract(&self, page_text: &str) -> String {
        let title = self
            .pattern
            .captures(page_text)
            .map(|caps| {
                decode_entities(&caps[1])
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();

        if title.is_empty() {
            return self.default_title.clone();
        }

        match title.char_indices().nth(self.max_chars) {
            Some((cut, _)) => title[..cut].trim_end().to_string(),
            None => title,
        }
    }
}
