use sha2::{Digest, Sha256};

/// Computes the hash used for URL identity
///
/// URL identity is compared by digest wherever membership must be cheap: the
/// visited set, pending-record keys, and the crawl identity derived from the
/// seed URL. Two URLs with the same digest are treated as identical; hash
/// collisions are an accepted, unhandled risk at this width.
pub fn url_hash(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(url_hash("https://example.com/"), url_hash("https://example.com/"));
    }

    #[test]
    fn test_hash_is_hex_digest() {
        let hash = url_hash("https://example.com/");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_distinct_urls_distinct_hashes() {
        assert_ne!(url_hash("https://example.com/a"), url_hash("https://example.com/b"));
    }

    #[test]
    fn test_textual_form_matters() {
        // Hashing happens after normalization; the hash itself is exact
        assert_ne!(url_hash("https://example.com/a"), url_hash("https://example.com/a/"));
    }
}
