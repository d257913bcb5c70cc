//! Reference resolution
//!
//! Turns a reference found in page text (absolute, protocol-relative,
//! root-relative or relative, possibly escaped inside a script literal) into
//! an absolute http(s) URL, or recognises it as a browser-held `blob:` handle.

use crate::error::ResolutionError;
use url::Url;

/// Pseudo-scheme of in-memory object handles
pub const HANDLE_SCHEME: &str = "blob:";

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Absolute, fetchable http(s) URL
    Url(Url),
    /// Browser-held handle, kept verbatim
    Handle(String),
}

/// Stateless resolver for page references
#[derive(Debug, Default, Clone, Copy)]
pub struct UrlResolver;

impl UrlResolver {
    /// Create a resolver
    pub fn new() -> Self {
        Self
    }

    /// Resolve `reference` against `base`
    pub fn resolve(&self, reference: &str, base: &Url) -> Result<Resolved, ResolutionError> {
        let cleaned = Self::clean(reference);
        if cleaned.is_empty() {
            return Err(ResolutionError::Empty);
        }

        if starts_with_ignore_case(&cleaned, HANDLE_SCHEME) {
            return Ok(Resolved::Handle(cleaned));
        }

        let joined = if cleaned.starts_with("//") {
            Url::parse(&format!("{}:{}", base.scheme(), cleaned))
        } else {
            base.join(&cleaned)
        };

        let url = joined.map_err(|e| ResolutionError::Malformed {
            reference: cleaned.clone(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(ResolutionError::UnsupportedScheme(other.to_string())),
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(ResolutionError::Malformed {
                reference: cleaned,
                reason: "missing host".to_string(),
            });
        }

        Ok(Resolved::Url(url))
    }

    /// Resolve to an absolute URL string, treating handles as failures
    pub fn resolve_url(&self, reference: &str, base: &Url) -> Option<String> {
        match self.resolve(reference, base) {
            Ok(Resolved::Url(url)) => Some(url.to_string()),
            _ => None,
        }
    }

    /// Strip quoting, script escapes and stray backslashes
    pub fn clean(reference: &str) -> String {
        let trimmed = reference
            .trim()
            .trim_matches(|c| c == '"' || c == '\'' || c == '`')
            .trim();

        let mut out = trimmed
            .replace("\\u002F", "/")
            .replace("\\u002f", "/")
            .replace("\\u0026", "&")
            .replace("\\x2F", "/")
            .replace("\\x2f", "/")
            .replace("&amp;", "&");
        out.retain(|c| c != '\\');
        out
    }
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/a/b").unwrap()
    }

    fn resolved(reference: &str) -> String {
        match UrlResolver::new().resolve(reference, &base()).unwrap() {
            Resolved::Url(u) => u.to_string(),
            Resolved::Handle(h) => panic!("unexpected handle {}", h),
        }
    }

    #[test]
    fn test_protocol_relative_inherits_scheme() {
        assert_eq!(resolved("//cdn.example.net/v.mp4"), "https://cdn.example.net/v.mp4");

        let http = Url::parse("http://example.com/").unwrap();
        let r = UrlResolver::new().resolve_url("//cdn.example.net/v.mp4", &http);
        assert_eq!(r.as_deref(), Some("http://cdn.example.net/v.mp4"));
    }

    #[test]
    fn test_root_relative() {
        assert_eq!(resolved("/x/y.mp4"), "https://example.com/x/y.mp4");
    }

    #[test]
    fn test_relative() {
        assert_eq!(resolved("clip.webm"), "https://example.com/a/clip.webm");
        assert_eq!(resolved("../up.mp4"), "https://example.com/up.mp4");
    }

    #[test]
    fn test_absolute_passthrough() {
        assert_eq!(
            resolved("https://other.org/v/1.mp4?sig=abc"),
            "https://other.org/v/1.mp4?sig=abc"
        );
    }

    #[test]
    fn test_script_escapes_removed() {
        assert_eq!(
            resolved(r"https:\/\/cdn.example.net\/hls\/master.m3u8"),
            "https://cdn.example.net/hls/master.m3u8"
        );
        assert_eq!(
            resolved(r"https://cdn.example.net/v.mp4?a=1\u0026b=2"),
            "https://cdn.example.net/v.mp4?a=1&b=2"
        );
        assert_eq!(
            resolved("/v.mp4?a=1&amp;b=2"),
            "https://example.com/v.mp4?a=1&b=2"
        );
    }

    #[test]
    fn test_handle_passthrough() {
        let r = UrlResolver::new()
            .resolve("blob:https://example.com/7f1c-22", &base())
            .unwrap();
        assert_eq!(r, Resolved::Handle("blob:https://example.com/7f1c-22".to_string()));
    }

    #[test]
    fn test_failures() {
        let resolver = UrlResolver::new();
        assert_eq!(resolver.resolve("  ", &base()), Err(ResolutionError::Empty));
        assert!(matches!(
            resolver.resolve("javascript:void(0)", &base()),
            Err(ResolutionError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            resolver.resolve("data:video/mp4;base64,AAAA", &base()),
            Err(ResolutionError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            resolver.resolve("http://[::1", &base()),
            Err(ResolutionError::Malformed { .. })
        ));
    }
}
