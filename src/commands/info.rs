// src/commands/info.rs

//! Info and probe commands - inspect a recipe and the host

use super::{load_recipe, probe_facts};
use anyhow::Result;
use cookbook::recipe::{Dependency, HostPython, validate_recipe};

fn describe(dep: &Dependency) -> String {
    match &dep.provider {
        Some(provider) => format!("{} ({})", dep.name, provider),
        None => dep.name.clone(),
    }
}

/// Show recipe metadata
pub fn cmd_info(recipe_spec: &str, validate: bool) -> Result<()> {
    let recipe = load_recipe(recipe_spec)?;
    let pkg = &recipe.package;

    println!("{} {}", pkg.name, pkg.version);
    if let Some(summary) = &pkg.summary {
        println!("  {}", summary);
    }
    if let Some(homepage) = &pkg.homepage {
        println!("Homepage: {}", homepage);
    }
    if let Some(license) = &pkg.license {
        println!("License:  {}", license);
    }
    println!("Source:   {}", recipe.archive_url());
    println!("Archive:  {}", recipe.archive_filename());
    println!("Checksum: {}", recipe.source.checksum);
    if let Some(head) = &recipe.source.head {
        println!("Head:     {} ({})", head.url, head.vcs);
    }

    let build: Vec<String> = recipe.build_dependencies().into_iter().map(describe).collect();
    let runtime: Vec<String> = recipe.runtime_dependencies().into_iter().map(describe).collect();
    if !build.is_empty() {
        println!("Build dependencies:   {}", build.join(", "));
    }
    if !runtime.is_empty() {
        println!("Runtime dependencies: {}", runtime.join(", "));
    }

    if !recipe.options.is_empty() {
        println!("Options:");
        for opt in &recipe.options {
            println!("  {:<16} {}", opt.flag, opt.description);
        }
    }

    if !recipe.patches.is_empty() {
        let names: Vec<&str> = recipe.patches.iter().map(|p| p.name.as_str()).collect();
        println!("Patches: {}", names.join(", "));
    }

    if validate {
        let warnings = validate_recipe(&recipe)?;
        if warnings.is_empty() {
            println!("[OK] No issues found");
        } else {
            println!("[OK] {} warning(s)", warnings.len());
            for warning in &warnings {
                println!("  - {}", warning);
            }
        }
    }

    Ok(())
}

/// Show the probed runtime facts
pub fn cmd_probe(recipe_spec: &str) -> Result<()> {
    let recipe = load_recipe(recipe_spec)?;
    if let Some(runtime) = &recipe.runtime
        && let Ok(python) = HostPython::locate(&runtime.interpreters)
    {
        println!("Binary:   {}", python.interpreter().display());
    }
    match probe_facts(&recipe)? {
        Some(facts) => {
            println!("Runtime:  {} ({})", facts.short_name, facts.runtime_version);
            println!("Prefix:   {}", facts.prefix.display());
            println!("Layout:   {}", facts.layout.as_str());
            println!("Library:  {}", facts.library.display());
            println!("Include:  {}", facts.include.display());
        }
        None => println!("{} does not use a scripting runtime", recipe.package.name),
    }
    Ok(())
}
