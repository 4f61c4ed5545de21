use url::{Host, Url};

/// Extracts the registrable domain of a URL
///
/// Returns the second-level label plus public suffix (e.g. "example.com" for
/// "https://blog.example.com/post"), looked up against the public suffix
/// list. Hosts that are IP addresses return the address literal; hosts with
/// no recognized suffix fall back to the host itself. The result is only
/// ever compared for equality against the crawl's own domain, never parsed
/// further.
///
/// Returns `None` when the URL cannot be parsed or has no host.
///
/// # Examples
///
/// ```
/// use gleaner::url::registrable_domain;
///
/// assert_eq!(
///     registrable_domain("https://blog.example.com/post"),
///     Some("example.com".to_string())
/// );
/// assert_eq!(
///     registrable_domain("https://example.co.uk/"),
///     Some("example.co.uk".to_string())
/// );
/// ```
pub fn registrable_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;

    match parsed.host()? {
        Host::Domain(host) => {
            let host = host.to_lowercase();
            match psl::domain_str(&host) {
                Some(domain) => Some(domain.to_string()),
                None => Some(host),
            }
        }
        Host::Ipv4(addr) => Some(addr.to_string()),
        Host::Ipv6(addr) => Some(addr.to_string()),
    }
}
