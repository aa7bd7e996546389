// src/recipe/kitchen/makedepends.rs

//! Dependency presence checks before cooking
//!
//! Installing dependencies belongs to the host package manager. The Kitchen
//! only asks whether anything declared is missing and refuses to start if so.

use crate::error::Result;
use crate::recipe::format::{Dependency, DependencyPhase};
use tracing::debug;

/// Trait for checking that declared dependencies are available
///
/// This keeps the Kitchen decoupled from whatever installs packages.
pub trait DependencyResolver: Send + Sync {
    /// Names of dependencies that are not currently available
    fn check_missing(&self, deps: &[&Dependency]) -> Result<Vec<String>>;
}

/// A no-op resolver that assumes all dependencies are satisfied
///
/// Use this when the host has already materialized the dependency closure.
pub struct NoopResolver;

impl DependencyResolver for NoopResolver {
    fn check_missing(&self, _deps: &[&Dependency]) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Checks build-only tool dependencies against the executables on PATH
///
/// Libraries and ecosystem modules cannot be detected this way and are
/// assumed present.
pub struct PathResolver;

impl DependencyResolver for PathResolver {
    fn check_missing(&self, deps: &[&Dependency]) -> Result<Vec<String>> {
        Ok(deps
            .iter()
            .filter(|d| d.phase == DependencyPhase::Build && d.provider.is_none())
            .filter(|d| {
                let found = which::which(&d.name).is_ok();
                debug!("Build tool {}: {}", d.name, if found { "found" } else { "missing" });
                !found
            })
            .map(|d| d.name.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(name: &str, phase: DependencyPhase) -> Dependency {
        Dependency {
            name: name.to_string(),
            phase,
            provider: None,
        }
    }

    #[test]
    fn test_noop_resolver() {
        let deps = [dep("cmake", DependencyPhase::Build)];
        let refs: Vec<&Dependency> = deps.iter().collect();
        assert!(NoopResolver.check_missing(&refs).unwrap().is_empty());
    }

    #[test]
    fn test_path_resolver_only_checks_build_tools() {
        let deps = [
            dep("definitely-not-a-tool-xyz", DependencyPhase::Build),
            dep("definitely-not-a-library-xyz", DependencyPhase::Runtime),
        ];
        let refs: Vec<&Dependency> = deps.iter().collect();
        assert_eq!(
            PathResolver.check_missing(&refs).unwrap(),
            vec!["definitely-not-a-tool-xyz"]
        );
    }
}
