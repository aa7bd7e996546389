// src/hash.rs

//! Checksums for source archives and downloaded assets
//!
//! Recipes declare checksums as prefixed strings (`sha256:abc123...`).
//! Every algorithm a recipe may name is recognized so that recipes can be
//! validated, but only the SHA-2 family can be verified locally:
//!
//! | Algorithm | Recognized | Verifiable |
//! |-----------|------------|------------|
//! | sha1      | yes        | no         |
//! | sha256    | yes        | yes        |
//! | sha512    | yes        | yes        |
//! | blake3    | yes        | no         |

use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::str::FromStr;

/// Checksum algorithm named by a recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    /// SHA-1, used by older upstream release checksums
    Sha1,
    #[default]
    Sha256,
    Sha512,
    Blake3,
}

impl HashAlgorithm {
    /// Hex digest length for this algorithm
    #[inline]
    pub const fn hex_len(&self) -> usize {
        match self {
            Self::Sha1 => 40,
            Self::Sha256 | Self::Blake3 => 64,
            Self::Sha512 => 128,
        }
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }

    /// Whether this crate can compute the digest itself
    #[inline]
    pub const fn is_verifiable(&self) -> bool {
        matches!(self, Self::Sha256 | Self::Sha512)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(Self::Sha1),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            "blake3" => Ok(Self::Blake3),
            _ => Err(HashError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Checksum parsing and verification errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    /// Unknown hash algorithm name
    UnknownAlgorithm(String),
    /// Checksum string has no `algorithm:` prefix
    MissingPrefix(String),
    /// Hash string has wrong length for algorithm
    InvalidLength { expected: usize, got: usize },
    /// Hash string contains invalid hex characters
    InvalidHex(String),
    /// Algorithm is recognized but cannot be computed here
    Unverifiable(HashAlgorithm),
    /// Data did not hash to the expected digest
    Mismatch { expected: String, actual: String },
}

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAlgorithm(name) => write!(
                f,
                "unsupported checksum algorithm: {} (supported: sha1, sha256, sha512, blake3)",
                name
            ),
            Self::MissingPrefix(s) => {
                write!(f, "checksum '{}' must be of the form algorithm:hex", s)
            }
            Self::InvalidLength { expected, got } => {
                write!(f, "invalid hash length: expected {}, got {}", expected, got)
            }
            Self::InvalidHex(s) => write!(f, "invalid hex in hash: {}", s),
            Self::Unverifiable(algo) => write!(f, "{} checksums cannot be verified locally", algo),
            Self::Mismatch { expected, actual } => {
                write!(f, "checksum mismatch: expected {}, got {}", expected, actual)
            }
        }
    }
}

impl std::error::Error for HashError {}

/// A parsed `algorithm:hex` checksum
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    pub algorithm: HashAlgorithm,
    /// Lowercase hex digest
    pub value: String,
}

impl Checksum {
    /// Parse a prefixed checksum such as `sha256:abc123...`
    pub fn parse(s: &str) -> Result<Self, HashError> {
        let (algo, value) = s
            .split_once(':')
            .ok_or_else(|| HashError::MissingPrefix(s.to_string()))?;
        let algorithm: HashAlgorithm = algo.parse()?;

        if value.len() != algorithm.hex_len() {
            return Err(HashError::InvalidLength {
                expected: algorithm.hex_len(),
                got: value.len(),
            });
        }
        if !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HashError::InvalidHex(value.to_string()));
        }

        Ok(Self {
            algorithm,
            value: value.to_lowercase(),
        })
    }

    /// Check `data` against this checksum
    pub fn verify(&self, data: &[u8]) -> Result<(), HashError> {
        let actual = hash_bytes(self.algorithm, data)?;
        if actual == self.value {
            Ok(())
        } else {
            Err(HashError::Mismatch {
                expected: self.to_string(),
                actual: format!("{}:{}", self.algorithm, actual),
            })
        }
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.value)
    }
}

/// Compute the hex digest of a byte slice
pub fn hash_bytes(algorithm: HashAlgorithm, data: &[u8]) -> Result<String, HashError> {
    match algorithm {
        HashAlgorithm::Sha256 => Ok(hex::encode(Sha256::digest(data))),
        HashAlgorithm::Sha512 => Ok(hex::encode(Sha512::digest(data))),
        other => Err(HashError::Unverifiable(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            hash_bytes(HashAlgorithm::Sha256, b"hello world").unwrap(),
            HELLO_SHA256
        );
    }

    #[test]
    fn test_parse_and_verify() {
        let checksum = Checksum::parse(&format!("sha256:{}", HELLO_SHA256.to_uppercase())).unwrap();
        assert_eq!(checksum.algorithm, HashAlgorithm::Sha256);
        assert_eq!(checksum.value, HELLO_SHA256);
        assert_eq!(checksum.verify(b"hello world"), Ok(()));
        match checksum.verify(b"goodbye") {
            Err(HashError::Mismatch { expected, actual }) => {
                assert_eq!(expected, format!("sha256:{}", HELLO_SHA256));
                assert!(actual.starts_with("sha256:"));
                assert_ne!(actual, expected);
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_sha1_recognized_but_unverifiable() {
        let checksum = Checksum::parse("sha1:cae543325dd40d8f8ed09dd58fa4504dde153382").unwrap();
        assert_eq!(checksum.algorithm, HashAlgorithm::Sha1);
        assert!(!checksum.algorithm.is_verifiable());
        assert_eq!(
            checksum.verify(b"anything"),
            Err(HashError::Unverifiable(HashAlgorithm::Sha1))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Checksum::parse("abc123"),
            Err(HashError::MissingPrefix(_))
        ));
        assert!(matches!(
            Checksum::parse("md5:abc123"),
            Err(HashError::UnknownAlgorithm(_))
        ));
        assert!(matches!(
            Checksum::parse("sha256:abc"),
            Err(HashError::InvalidLength { expected: 64, got: 3 })
        ));
        let bad_hex = format!("sha1:{}", "z".repeat(40));
        assert!(matches!(Checksum::parse(&bad_hex), Err(HashError::InvalidHex(_))));
    }

    #[test]
    fn test_sha512_verify() {
        let digest = hash_bytes(HashAlgorithm::Sha512, b"hello world").unwrap();
        assert_eq!(digest.len(), HashAlgorithm::Sha512.hex_len());

        let checksum = Checksum::parse(&format!("sha512:{}", digest)).unwrap();
        assert!(checksum.algorithm.is_verifiable());
        assert_eq!(checksum.verify(b"hello world"), Ok(()));
        assert!(matches!(
            checksum.verify(b"hello"),
            Err(HashError::Mismatch { .. })
        ));
    }
}
