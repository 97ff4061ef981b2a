//! Hashing utilities for store filenames and merge placeholders.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hex digest of a byte slice.
#[must_use]
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// The first 16 hex characters (64 bits) of the SHA-256 digest of `data`.
///
/// Short enough to embed in filenames and comment markers, long enough that
/// accidental collisions between distinct asset URLs are not a practical
/// concern.
#[must_use]
pub fn sha256_short(data: &[u8]) -> String {
    let full = sha256_bytes(data);
    full.get(..16).unwrap_or(&full).to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn sha256_bytes_deterministic() {
        let a = sha256_bytes(b"hello");
        let b = sha256_bytes(b"hello");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64); // 256 bits = 64 hex chars
    }

    #[test]
    fn sha256_bytes_different_input() {
        let a = sha256_bytes(b"hello");
        let b = sha256_bytes(b"world");
        assert_ne!(a, b);
    }

    #[test]
    fn sha256_bytes_empty() {
        let hash = sha256_bytes(b"");
        // Known SHA-256 of empty input
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_short_is_prefix_of_full() {
        let full = sha256_bytes(b"/site/templates/main.css");
        let short = sha256_short(b"/site/templates/main.css");
        assert_eq!(short.len(), 16);
        assert!(full.starts_with(&short));
    }

    #[test]
    fn sha256_short_distinguishes_urls() {
        let a = sha256_short(b"/site/templates/a.css");
        let b = sha256_short(b"/site/templates/b.css");
        assert_ne!(a, b);
    }
}
