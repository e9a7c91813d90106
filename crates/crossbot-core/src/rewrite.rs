//! Rewriting of short-lived twitter embed URLs.
//!
//! Twitter's own link previews are generated lazily and frequently fail to
//! render video; the rewritten host serves a stable preview. Rewritten URLs
//! use a different host, so they never match the tracked prefix again.

/// Tracked source URL prefix.
pub const TWITTER_URL: &str = "https://twitter.com/";

/// Host spliced in place of the tracked host.
const ALT_HOST: &str = "https://vxtwitter.com/";

/// Everything from the first `?` on is a tracking suffix.
const TRACKING_SYMBOL: char = '?';

pub fn is_tracked(url: &str) -> bool {
    url.starts_with(TWITTER_URL)
}

/// Strip the tracking suffix and substitute the alternate host.
///
/// Total and pure: URLs outside the tracked family only lose their tracking
/// suffix and keep their host.
pub fn rewrite(url: &str) -> String {
    let stripped = match url.find(TRACKING_SYMBOL) {
        Some(idx) => &url[..idx],
        None => url,
    };

    match stripped.strip_prefix(TWITTER_URL) {
        Some(path) => format!("{ALT_HOST}{path}"),
        None => stripped.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrite_replaces_host_and_strips_tracking_suffix() {
        assert_eq!(
            rewrite("https://twitter.com/user/status/123?s=20"),
            "https://vxtwitter.com/user/status/123"
        );
    }

    #[test]
    fn rewrite_without_suffix_only_replaces_host() {
        assert_eq!(
            rewrite("https://twitter.com/user/status/123"),
            "https://vxtwitter.com/user/status/123"
        );
    }

    #[test]
    fn rewritten_urls_are_no_longer_tracked() {
        let url = "https://twitter.com/user/status/123?s=20";
        assert!(is_tracked(url));
        assert!(!is_tracked(&rewrite(url)));
    }

    #[test]
    fn untracked_urls_keep_their_host() {
        assert_eq!(
            rewrite("https://example.com/a/b?utm_source=x"),
            "https://example.com/a/b"
        );
    }

    #[test]
    fn rewrite_is_deterministic() {
        let url = "https://twitter.com/a/status/9?t=abc&s=20";
        assert_eq!(rewrite(url), rewrite(url));
    }
}
