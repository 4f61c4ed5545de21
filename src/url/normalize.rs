use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Matches a `scheme://` prefix at the start of a URL string
fn scheme_prefix() -> &'static Regex {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    SCHEME.get_or_init(|| Regex::new(r"^[^:/?#]+://").expect("scheme pattern is valid"))
}

/// Ensures a URL string starts with a scheme, prepending the default if absent
///
/// The comparator and the rest of the pipeline expect absolute URLs, but seed
/// URLs are often written without a scheme ("example.com"). Pure function.
///
/// # Examples
///
/// ```
/// use gleaner::url::ensure_default_scheme;
///
/// assert_eq!(ensure_default_scheme("example.com", "http"), "http://example.com");
/// assert_eq!(ensure_default_scheme("https://example.com", "http"), "https://example.com");
/// ```
pub fn ensure_default_scheme(url: &str, default_scheme: &str) -> String {
    if scheme_prefix().is_match(url) {
        url.to_string()
    } else {
        format!("{}://{}", default_scheme, url)
    }
}

/// Compares two URLs for equality, ignoring scheme and trailing-slash form
///
/// Both inputs have any `scheme://` prefix stripped and are forced to end
/// with `/` before an exact string comparison. Nothing else is normalized:
/// two URLs differing only in query string or path case are NOT equal.
///
/// # Examples
///
/// ```
/// use gleaner::url::same_url;
///
/// assert!(same_url("http://x.com/a", "https://x.com/a/"));
/// assert!(!same_url("http://x.com/a?p=1", "http://x.com/a"));
/// ```
pub fn same_url(url1: &str, url2: &str) -> bool {
    let strip = |url: &str| -> String {
        let mut u = scheme_prefix().replace(url, "").into_owned();
        if !u.ends_with('/') {
            u.push('/');
        }
        u
    };

    strip(url1) == strip(url2)
}

/// Resolves a possibly-relative href against an absolute base URL
///
/// Resolution follows RFC 3986 (including `.`/`..` segment handling) via
/// `url::Url::join`. The fragment is stripped since the traversal deals in
/// addressable page URLs. Returns `None` for hrefs that cannot resolve to
/// an HTTP(S) URL.
pub fn resolve_href(base: &str, href: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    let mut resolved = base.join(href.trim()).ok()?;

    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }

    resolved.set_fragment(None);
    Some(resolved.to_string())
}
