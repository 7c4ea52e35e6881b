//! Content integrity descriptors and whole-file validation.
//!
//! Files in an asar index may carry an integrity descriptor: a whole-file
//! SHA-256 digest plus a sequence of per-block digests. Validation here
//! checks the whole-file digest only; the block digests are parsed and kept
//! for forward compatibility but are not verified.

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{AsarError, Result};

/// Hash algorithm declared by an integrity descriptor.
///
/// Only SHA-256 is supported. Anything else deserializes as `Unsupported`
/// and is rejected at validation time with a fatal error, never silently
/// skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "SHA256")]
    Sha256,
    #[serde(other)]
    Unsupported,
}

/// Integrity descriptor attached to a file entry in the index.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityPayload {
    pub algorithm: HashAlgorithm,
    /// Lower-case hex SHA-256 digest of the whole file.
    pub hash: String,
    /// Block length the `blocks` digests were computed over.
    pub block_size: u32,
    /// Per-block digests. Retained but not verified.
    pub blocks: Vec<String>,
}

/// Validate `data` against an integrity descriptor.
///
/// Returns a fatal-class error ([`AsarError::is_fatal`]) on digest mismatch
/// or when the descriptor declares an algorithm other than SHA-256. Callers
/// must not serve the data once this fails.
pub fn validate(data: &[u8], integrity: &IntegrityPayload) -> Result<()> {
    if integrity.algorithm != HashAlgorithm::Sha256 {
        tracing::error!("unsupported hash algorithm in integrity descriptor");
        return Err(AsarError::UnsupportedHashAlgorithm);
    }

    let actual = hex::encode(Sha256::digest(data));
    if actual != integrity.hash {
        tracing::error!(
            expected = %integrity.hash,
            actual = %actual,
            "integrity check failed for asar archive"
        );
        return Err(AsarError::IntegrityViolation {
            expected: integrity.hash.clone(),
            actual,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(hash: &str) -> IntegrityPayload {
        IntegrityPayload {
            algorithm: HashAlgorithm::Sha256,
            hash: hash.to_string(),
            block_size: 4 * 1024 * 1024,
            blocks: vec![hash.to_string()],
        }
    }

    #[test]
    fn accepts_matching_digest() {
        // SHA-256 of "Hello, World!"
        let hash = "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f";
        assert!(validate(b"Hello, World!", &payload(hash)).is_ok());
    }

    #[test]
    fn rejects_mismatched_digest() {
        let err = validate(b"Hello, World?", &payload("00ff")).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, AsarError::IntegrityViolation { .. }));
    }

    #[test]
    fn rejects_unknown_algorithm() {
        let mut p = payload("00ff");
        p.algorithm = HashAlgorithm::Unsupported;
        let err = validate(b"irrelevant", &p).unwrap_err();
        assert!(matches!(err, AsarError::UnsupportedHashAlgorithm));
    }

    #[test]
    fn unknown_algorithm_deserializes_as_unsupported() {
        let p: IntegrityPayload = serde_json::from_str(
            r#"{"algorithm": "SHA1", "hash": "aa", "blockSize": 1024, "blocks": []}"#,
        )
        .unwrap();
        assert_eq!(p.algorithm, HashAlgorithm::Unsupported);
    }
}
