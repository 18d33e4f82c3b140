//! Link extraction and host matching
//!
//! Shared by the domain, any-link and invite triggers. Link-shaped
//! substrings are pulled out of message content with a permissive pattern,
//! then normalized to a scheme-qualified URL so the `url` crate can parse
//! out the host.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Matches URLs with or without a scheme, including bare domains.
static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:https?://)?(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,}(?::\d{1,5})?(?:/[^\s<>]*)?",
    )
    .expect("link pattern is valid")
});

/// Matches Discord server invite links.
static INVITE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bdiscord(?:\.gg|(?:app)?\.com/invite)/[a-z0-9-]+")
        .expect("invite pattern is valid")
});

/// All link-shaped substrings in `text`, in order of appearance.
pub fn find_links(text: &str) -> Vec<&str> {
    LINK_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Whether `text` contains at least one link-shaped substring.
pub fn contains_link(text: &str) -> bool {
    LINK_RE.is_match(text)
}

/// Whether `text` contains a Discord server invite.
pub fn contains_invite(text: &str) -> bool {
    INVITE_RE.is_match(text)
}

/// Lowercased host of a link, with any port stripped. Links without a
/// scheme are qualified with `https://` before parsing.
pub fn link_host(link: &str) -> Option<String> {
    let qualified = if link.starts_with("http://") || link.starts_with("https://") {
        link.to_string()
    } else {
        format!("https://{link}")
    };

    let parsed = Url::parse(&qualified).ok()?;
    parsed.host_str().map(str::to_lowercase)
}

/// Exact-host or dot-qualified-suffix match: `sub.evil.example.com`
/// matches a listed `example.com`, `notexample.com` does not.
pub fn host_matches(host: &str, entry: &str) -> bool {
    let entry = entry.trim().to_lowercase();
    if entry.is_empty() {
        return false;
    }
    host == entry || host.ends_with(&format!(".{entry}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_links() {
        let links = find_links("go to https://example.com/page and evil.test.io now");
        assert_eq!(links, vec!["https://example.com/page", "evil.test.io"]);

        assert!(find_links("no links here, honest").is_empty());
    }

    #[test]
    fn test_contains_link() {
        assert!(contains_link("see http://a.bc"));
        assert!(contains_link("bare domain.example too"));
        assert!(!contains_link("nothing to see"));
    }

    #[test]
    fn test_contains_invite() {
        assert!(contains_invite("join discord.gg/abc123"));
        assert!(contains_invite("https://discord.com/invite/xYz-9"));
        assert!(contains_invite("https://discordapp.com/invite/old"));
        assert!(!contains_invite("discord is great"));
        assert!(!contains_invite("https://example.com/invite/abc"));
    }

    #[test]
    fn test_link_host() {
        assert_eq!(
            link_host("https://Sub.Example.COM/path?q=1"),
            Some("sub.example.com".to_string())
        );
        assert_eq!(link_host("example.com"), Some("example.com".to_string()));
        // Trailing port is stripped
        assert_eq!(
            link_host("http://example.com:8080/x"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn test_host_matches_suffix_rule() {
        assert!(host_matches("example.com", "example.com"));
        assert!(host_matches("sub.evil.example.com", "example.com"));
        assert!(host_matches("example.com", "EXAMPLE.COM"));
        assert!(!host_matches("notexample.com", "example.com"));
        assert!(!host_matches("example.com.evil.net", "example.com"));
        assert!(!host_matches("example.com", ""));
    }
}
