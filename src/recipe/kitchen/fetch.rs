// src/recipe/kitchen/fetch.rs

//! Asset downloads
//!
//! One blocking GET per asset, no retries. A failed download aborts the
//! cook like any other step.

use crate::error::{Error, Result};
use crate::hash::{Checksum, HashError};
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

/// Downloads a URL into memory
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// HTTP(S) fetcher backed by a blocking reqwest client
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cookbook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Fetch {
                url: String::new(),
                message: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}", url);
        let fetch_err = |message: String| Error::Fetch {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_err(e.to_string()))?;

        if !response.status().is_success() {
            return Err(fetch_err(format!("HTTP {}", response.status())));
        }

        let bytes = response.bytes().map_err(|e| fetch_err(e.to_string()))?;
        debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

/// Check downloaded bytes against a declared checksum
pub fn verify_checksum(data: &[u8], checksum: &Checksum) -> Result<()> {
    checksum.verify(data).map_err(|e| match e {
        HashError::Mismatch { expected, actual } => Error::ChecksumMismatch { expected, actual },
        other => Error::Parse(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_verify_checksum() {
        let checksum = Checksum::parse(&format!("sha256:{}", HELLO.to_uppercase())).unwrap();
        assert!(verify_checksum(b"hello world", &checksum).is_ok());

        let err = verify_checksum(b"hello", &checksum).unwrap_err();
        match err {
            Error::ChecksumMismatch { expected, .. } => {
                assert_eq!(expected, format!("sha256:{}", HELLO))
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_unverifiable_algorithm() {
        let checksum = Checksum::parse("sha1:cae543325dd40d8f8ed09dd58fa4504dde153382").unwrap();
        let err = verify_checksum(b"anything", &checksum).unwrap_err();
        assert!(err.to_string().contains("cannot be verified"));
    }

    #[test]
    fn test_http_fetcher_invalid_url() {
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let err = fetcher.fetch("not a url").unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }
}
