//! Message body digests

use courier_core::Digester;
use courier_domain::DigestAlgorithm;
use sha2::{Digest, Sha256};

/// [`Digester`] backed by `sha2` and `blake3`
#[derive(Debug, Clone, Copy, Default)]
pub struct HashDigester;

impl HashDigester {
    pub fn new() -> Self {
        Self
    }
}

impl Digester for HashDigester {
    fn digest(&self, algorithm: DigestAlgorithm, bytes: &[u8]) -> String {
        match algorithm {
            DigestAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
            DigestAlgorithm::Blake3 => blake3::hash(bytes).to_hex().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_matches_known_vector() {
        assert_eq!(
            HashDigester.digest(DigestAlgorithm::Sha256, b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn blake3_matches_known_vector() {
        assert_eq!(
            HashDigester.digest(DigestAlgorithm::Blake3, b""),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn digests_are_lowercase_hex() {
        for algorithm in [DigestAlgorithm::Sha256, DigestAlgorithm::Blake3] {
            let digest = HashDigester.digest(algorithm, b"hello world");
            assert_eq!(digest.len(), 64);
            assert!(digest.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }
    }
}
