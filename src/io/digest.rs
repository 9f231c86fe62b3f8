//! Content hashing.

use sha2::{Digest, Sha256};

/// Computes SHA256 hash of a string, returning hex-encoded digest.
pub fn hexdigest_str(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hexdigest_str() {
        assert_eq!(
            hexdigest_str(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(hexdigest_str("369"), hexdigest_str("370"));
    }
}
