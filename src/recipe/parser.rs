// src/recipe/parser.rs

//! Recipe file parsing and validation

use crate::error::{Error, Result};
use crate::hash::Checksum;
use crate::recipe::format::{Recipe, is_confined};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Parse a recipe from a TOML string
pub fn parse_recipe(content: &str) -> Result<Recipe> {
    toml::from_str(content).map_err(|e| Error::Parse(e.to_string()))
}

/// Parse a recipe from a file
///
/// Patches declared with `file` are read relative to the recipe's directory
/// and stored inline, so the returned recipe is self-contained.
pub fn parse_recipe_file(path: &Path) -> Result<Recipe> {
    if !path.exists() {
        return Err(Error::RecipeNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let mut recipe = parse_recipe(&content)?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    for patch in &mut recipe.patches {
        if patch.diff.is_some() {
            continue;
        }
        if let Some(file) = &patch.file {
            let patch_path = base.join(file);
            debug!("Loading patch {} from {}", patch.name, patch_path.display());
            let text = std::fs::read_to_string(&patch_path).map_err(|e| {
                Error::Parse(format!(
                    "cannot read patch {} ({}): {}",
                    patch.name,
                    patch_path.display(),
                    e
                ))
            })?;
            patch.diff = Some(text);
        }
    }

    Ok(recipe)
}

/// Validate a recipe for completeness and correctness
///
/// Hard errors are returned as `Err`; soft problems come back as warnings.
pub fn validate_recipe(recipe: &Recipe) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if recipe.package.name.is_empty() {
        return Err(Error::Parse("package name cannot be empty".to_string()));
    }
    if recipe.package.version.is_empty() {
        return Err(Error::Parse("package version cannot be empty".to_string()));
    }

    Checksum::parse(&recipe.source.checksum)
        .map_err(|e| Error::Parse(format!("source checksum: {}", e)))?;

    // Option flags must be unique
    let mut declared = HashSet::new();
    for opt in &recipe.options {
        if !opt.flag.starts_with("--") {
            return Err(Error::Parse(format!(
                "option flag '{}' must start with --",
                opt.flag
            )));
        }
        if !declared.insert(opt.flag.as_str()) {
            return Err(Error::Parse(format!("option {} declared twice", opt.flag)));
        }
    }

    // Everything gated on an option must name a declared one
    let references = recipe
        .assets
        .iter()
        .map(|a| ("asset", a.option.as_str()))
        .chain(recipe.scripts.iter().map(|s| ("script", s.option.as_str())))
        .chain(
            recipe
                .configure
                .conditional
                .iter()
                .map(|c| ("configure flags", c.option.as_str())),
        );
    for (what, flag) in references {
        if !declared.contains(flag) {
            return Err(Error::Parse(format!(
                "{} refers to undeclared option {}",
                what, flag
            )));
        }
    }

    for patch in &recipe.patches {
        if patch.diff.is_none() && patch.file.is_none() {
            return Err(Error::Parse(format!(
                "patch {} has neither diff nor file",
                patch.name
            )));
        }
    }

    for asset in &recipe.assets {
        if let Some(checksum) = &asset.checksum {
            let parsed = Checksum::parse(checksum)
                .map_err(|e| Error::Parse(format!("checksum for {}: {}", asset.url, e)))?;
            if !parsed.algorithm.is_verifiable() {
                return Err(Error::Parse(format!(
                    "checksum for {}: {} cannot be verified after download",
                    asset.url, parsed.algorithm
                )));
            }
        }
    }

    // Paths joined onto the source tree or prefix must stay inside it
    let paths = recipe
        .assets
        .iter()
        .map(|a| ("asset destination", a.dest.as_str()))
        .chain(
            recipe
                .scripts
                .iter()
                .filter_map(|s| s.workdir.as_deref())
                .map(|w| ("script workdir", w)),
        )
        .chain(
            recipe
                .cleanup
                .globs
                .iter()
                .map(|g| ("cleanup pattern", g.as_str())),
        );
    for (what, path) in paths {
        if !is_confined(path) {
            return Err(Error::Parse(format!(
                "{} {} must be relative and stay inside its directory",
                what, path
            )));
        }
    }

    if recipe.package.summary.is_none() {
        warnings.push("Missing package summary".to_string());
    }
    if recipe.package.homepage.is_none() {
        warnings.push("Missing package homepage".to_string());
    }

    for asset in &recipe.assets {
        if asset.checksum.is_none() {
            warnings.push(format!("Asset {} has no checksum", asset.url));
        }
    }

    if let (Some(caveats), None) = (&recipe.caveats, &recipe.runtime)
        && caveats.text.contains("%(runtime_short_name)s")
    {
        warnings.push(
            "Caveats mention the runtime but no [runtime] section is declared".to_string(),
        );
    }

    Ok(warnings)
}
