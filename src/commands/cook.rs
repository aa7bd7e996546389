// src/commands/cook.rs

//! Cook command - build a package from a recipe in an unpacked source tree

use super::{load_recipe, probe_facts, resolve_options};
use anyhow::{Context, Result};
use cookbook::recipe::kitchen::PathResolver;
use cookbook::recipe::{BuildPlan, CaveatsRenderer, Kitchen, KitchenConfig};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Cook a package from a recipe
///
/// # Arguments
/// * `recipe_spec` - Recipe file path or bundled recipe name
/// * `prefix` - Installation prefix
/// * `source_dir` - Root of the unpacked source tree
/// * `jobs` - Number of parallel build jobs (None = auto)
/// * `no_verify` - Skip checksum verification of downloaded assets
/// * `check_deps` - Check build tools on PATH before starting
/// * `timeout` - HTTP timeout in seconds
/// * `tokens` - Raw recipe option tokens
#[allow(clippy::too_many_arguments)]
pub fn cmd_cook(
    recipe_spec: &str,
    prefix: &str,
    source_dir: &str,
    jobs: Option<u32>,
    no_verify: bool,
    check_deps: bool,
    timeout: u64,
    tokens: &[String],
) -> Result<()> {
    let recipe = load_recipe(recipe_spec)?;
    println!("Recipe: {} version {}", recipe.package.name, recipe.package.version);

    let options = resolve_options(&recipe, tokens);
    let facts = probe_facts(&recipe)?;

    let mut config = KitchenConfig::new(source_dir, prefix);
    if let Some(j) = jobs {
        config = config.with_jobs(j);
    }
    config.verify_assets = !no_verify;
    config.http_timeout = Duration::from_secs(timeout);

    let mut kitchen = Kitchen::new(config).context("Failed to set up the kitchen")?;
    if check_deps {
        kitchen = kitchen.with_resolver(Arc::new(PathResolver));
    }

    let report = kitchen
        .cook(&recipe, &options, facts.as_ref())
        .with_context(|| format!("Failed to cook {}", recipe.package.name))?;

    for warning in &report.warnings {
        println!("Warning: {}", warning);
    }
    for skipped in &report.skipped {
        info!("Skipped: {}", skipped);
    }
    println!(
        "[OK] Installed {} {} into {}",
        recipe.package.name, recipe.package.version, prefix
    );

    if let Some(text) = CaveatsRenderer::new(&recipe, Path::new(prefix)).render(facts.as_ref()) {
        println!();
        println!("==> Caveats");
        print!("{}", text);
    }

    Ok(())
}

/// Print the resolved plan without executing it
pub fn cmd_plan(recipe_spec: &str, prefix: &str, source_dir: &str, tokens: &[String]) -> Result<()> {
    let recipe = load_recipe(recipe_spec)?;
    let options = resolve_options(&recipe, tokens);
    let facts = probe_facts(&recipe)?;

    let plan = BuildPlan::new(
        &recipe,
        &options,
        facts.as_ref(),
        Path::new(source_dir),
        Path::new(prefix),
    )
    .context("Failed to build the plan")?;

    let enabled: Vec<&str> = options.enabled().collect();
    println!(
        "Plan for {} {} (options: {})",
        recipe.package.name,
        recipe.package.version,
        if enabled.is_empty() {
            "none".to_string()
        } else {
            enabled.join(" ")
        }
    );
    print!("{}", plan);
    Ok(())
}
