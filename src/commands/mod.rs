// src/commands/mod.rs
//! Command handlers for the cookbook CLI

mod caveats;
mod cook;
mod info;

pub use caveats::cmd_caveats;
pub use cook::{cmd_cook, cmd_plan};
pub use info::{cmd_info, cmd_probe};

use anyhow::{Context, Result};
use cookbook::recipe::{
    EnvironmentFacts, EnvironmentProbe, OptionRegistry, Recipe, ResolvedOptions, builtin,
    parse_recipe_file, validate_recipe,
};
use std::path::Path;
use tracing::{debug, warn};

/// Load a recipe from a file path or by bundled name
///
/// Anything that looks like a path (exists, contains a separator or ends in
/// `.toml`) is read from disk.
pub(crate) fn load_recipe(spec: &str) -> Result<Recipe> {
    let path = Path::new(spec);
    let looks_like_path = path.exists() || spec.contains('/') || spec.ends_with(".toml");

    let recipe = if looks_like_path {
        debug!("Reading recipe: {}", path.display());
        parse_recipe_file(path)
            .with_context(|| format!("Failed to parse recipe: {}", path.display()))?
    } else {
        match builtin::load(spec) {
            Some(recipe) => {
                recipe.with_context(|| format!("Failed to load bundled recipe {}", spec))?
            }
            None => anyhow::bail!(
                "No recipe file or bundled recipe named {} (bundled: {})",
                spec,
                builtin::names().join(", ")
            ),
        }
    };

    let warnings = validate_recipe(&recipe).context("Recipe validation failed")?;
    for warning in &warnings {
        warn!("{}", warning);
    }

    Ok(recipe)
}

/// Resolve option tokens, warning about tokens the recipe does not declare
pub(crate) fn resolve_options(recipe: &Recipe, tokens: &[String]) -> ResolvedOptions {
    let resolved = OptionRegistry::from_recipe(recipe).resolve(tokens);
    for token in resolved.ignored() {
        warn!("Ignoring unknown option {}", token);
    }
    resolved
}

/// Probe the host runtime if the recipe declares one
pub(crate) fn probe_facts(recipe: &Recipe) -> Result<Option<EnvironmentFacts>> {
    let Some(runtime) = &recipe.runtime else {
        debug!("Recipe {} declares no runtime, skipping probe", recipe.package.name);
        return Ok(None);
    };

    let facts = EnvironmentProbe::host(runtime.clone())
        .and_then(|probe| probe.probe())
        .map_err(cookbook::Error::from)
        .context("Failed to probe the host runtime")?;
    Ok(Some(facts))
}
