//! `Digest` header computation, shared by signing and verification.

use base64::Engine;
use sha2::{Digest as _, Sha256};

/// Compute the `Digest` header value for `body` (`"sha-256=<base64>"`, per
/// the signing string convention this framework uses).
#[must_use]
pub fn compute_digest_header(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    format!("sha-256={}", base64::engine::general_purpose::STANDARD.encode(digest))
}

/// Check whether `header_value` (a `Digest` header) matches the SHA-256
/// digest of `body`. Unrecognized digest algorithms are treated as a
/// mismatch rather than skipped, matching this framework's SHA-256-only
/// support.
#[must_use]
pub fn verify_digest_header(header_value: &str, body: &[u8]) -> bool {
    let Some((algo, value)) = header_value.split_once('=') else {
        return false;
    };
    if !algo.eq_ignore_ascii_case("sha-256") {
        return false;
    }
    let expected = compute_digest_header(body);
    let Some((_, expected_value)) = expected.split_once('=') else {
        return false;
    };
    value == expected_value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(compute_digest_header(b"hello"), compute_digest_header(b"hello"));
    }

    #[test]
    fn verify_accepts_matching_digest() {
        let header = compute_digest_header(b"hello");
        assert!(verify_digest_header(&header, b"hello"));
    }

    #[test]
    fn verify_rejects_mismatched_digest() {
        let header = compute_digest_header(b"hello");
        assert!(!verify_digest_header(&header, b"goodbye"));
    }

    #[test]
    fn verify_rejects_unrecognized_algorithm() {
        assert!(!verify_digest_header("md5=deadbeef", b"hello"));
    }
}
