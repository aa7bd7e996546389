// src/recipe/kitchen/config.rs

//! Configuration types for the Kitchen

use crate::recipe::plan::StepKind;
use std::path::PathBuf;
use std::time::Duration;

/// Default timeout for asset downloads
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Explicit configuration for one cook
///
/// The executor never reads ambient state; everything it needs about the
/// host (where the source tree is, where to install, how many jobs) is
/// passed in here.
#[derive(Debug, Clone)]
pub struct KitchenConfig {
    /// Root of the already-materialized source tree
    pub source_dir: PathBuf,
    /// Installation prefix supplied by the host package manager
    pub prefix: PathBuf,
    /// Default parallel jobs (overridden by a recipe's parallelism constraint)
    pub jobs: u32,
    /// Extra environment for every invocation
    pub env: Vec<(String, String)>,
    /// Verify asset downloads against declared checksums
    pub verify_assets: bool,
    /// Timeout for HTTP downloads
    pub http_timeout: Duration,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(4);

        Self {
            source_dir: PathBuf::from("."),
            prefix: PathBuf::from("/usr/local"),
            jobs,
            env: Vec::new(),
            verify_assets: true,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl KitchenConfig {
    /// Configuration for a source tree and prefix, defaults otherwise
    pub fn new(source_dir: impl Into<PathBuf>, prefix: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn with_jobs(mut self, jobs: u32) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }
}

/// Result of cooking a recipe
#[derive(Debug, Default)]
pub struct CookReport {
    /// Steps that ran, in order
    pub executed: Vec<StepKind>,
    /// Steps that were no-ops (e.g. asset already present)
    pub skipped: Vec<String>,
    /// Build log
    pub log: String,
    /// Warnings generated during the build
    pub warnings: Vec<String>,
}
