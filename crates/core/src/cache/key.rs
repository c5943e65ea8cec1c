//! Cache key generation over request identity.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request: SHA-256 over method + URL.
pub fn request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let a = request_key("GET", "https://example.com/");
        let b = request_key("GET", "https://example.com/");
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_varies_by_url() {
        let a = request_key("GET", "https://example.com/index.html");
        let b = request_key("GET", "https://example.com/about.html");
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_varies_by_method() {
        let a = request_key("GET", "https://example.com/");
        let b = request_key("HEAD", "https://example.com/");
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_format() {
        let key = request_key("GET", "https://example.com/");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
