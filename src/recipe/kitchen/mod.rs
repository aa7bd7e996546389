// src/recipe/kitchen/mod.rs

//! Kitchen: where build plans are cooked
//!
//! The Kitchen executes a [`BuildPlan`] against an already-materialized
//! source tree. It handles:
//! - Checking declared dependencies through an optional resolver
//! - Fetching conditional assets
//! - Applying patches
//! - Running configure, compile and install
//! - Post-install cleanup under the prefix
//!
//! External effects go through three seams ([`CommandRunner`], [`Fetcher`],
//! [`DependencyResolver`]) so a cook can be exercised without a network or
//! a toolchain.

mod config;
mod cook;
pub mod fetch;
pub mod makedepends;
pub mod patch;
pub mod runner;

pub use config::{CookReport, DEFAULT_HTTP_TIMEOUT, KitchenConfig};
pub use fetch::{Fetcher, HttpFetcher};
pub use makedepends::{DependencyResolver, NoopResolver, PathResolver};
pub use patch::PatchError;
pub use runner::{CommandRunner, HostRunner, RunOutput};

use cook::Cook;
use crate::error::{Error, Result};
use crate::recipe::format::{Dependency, Recipe};
use crate::recipe::options::ResolvedOptions;
use crate::recipe::plan::BuildPlan;
use crate::recipe::probe::EnvironmentFacts;
use std::sync::Arc;
use tracing::{debug, info};

/// The Kitchen: where recipes are cooked
pub struct Kitchen {
    pub(crate) config: KitchenConfig,
    runner: Box<dyn CommandRunner>,
    fetcher: Box<dyn Fetcher>,
    /// Optional dependency presence check
    resolver: Option<Arc<dyn DependencyResolver>>,
}

impl Kitchen {
    /// Create a Kitchen that runs commands and downloads on the host
    pub fn new(config: KitchenConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.http_timeout)?;
        Ok(Self {
            config,
            runner: Box::new(HostRunner),
            fetcher: Box::new(fetcher),
            resolver: None,
        })
    }

    pub fn with_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn DependencyResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    /// Fail if the resolver reports any declared dependency missing
    pub fn check_dependencies(&self, recipe: &Recipe) -> Result<()> {
        let Some(resolver) = &self.resolver else {
            debug!("No dependency resolver configured, assuming all deps are available");
            return Ok(());
        };

        let deps: Vec<&Dependency> = recipe.dependencies.iter().collect();
        if deps.is_empty() {
            return Ok(());
        }

        let missing = resolver.check_missing(&deps)?;
        if missing.is_empty() {
            info!("All dependencies are available");
            Ok(())
        } else {
            Err(Error::MissingDependencies(missing))
        }
    }

    /// Resolve the plan for this Kitchen's source tree and prefix
    pub fn plan(
        &self,
        recipe: &Recipe,
        options: &ResolvedOptions,
        facts: Option<&EnvironmentFacts>,
    ) -> Result<BuildPlan> {
        BuildPlan::new(
            recipe,
            options,
            facts,
            &self.config.source_dir,
            &self.config.prefix,
        )
    }

    /// Check dependencies, plan, then execute
    pub fn cook(
        &self,
        recipe: &Recipe,
        options: &ResolvedOptions,
        facts: Option<&EnvironmentFacts>,
    ) -> Result<CookReport> {
        info!(
            "Cooking {} version {}",
            recipe.package.name, recipe.package.version
        );

        self.check_dependencies(recipe)?;
        let plan = self.plan(recipe, options, facts)?;
        let report = self.execute(plan)?;

        info!(
            "Cooked {} ({} steps)",
            recipe.package.name,
            report.executed.len()
        );
        Ok(report)
    }

    /// Execute a plan step by step
    pub fn execute(&self, plan: BuildPlan) -> Result<CookReport> {
        Cook::new(self).run(plan)
    }
}
