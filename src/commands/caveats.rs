// src/commands/caveats.rs

//! Caveats command - print post-install guidance

use super::{load_recipe, probe_facts};
use anyhow::Result;
use cookbook::recipe::CaveatsRenderer;
use std::path::Path;

pub fn cmd_caveats(recipe_spec: &str, prefix: &str) -> Result<()> {
    let recipe = load_recipe(recipe_spec)?;
    let facts = probe_facts(&recipe)?;

    match CaveatsRenderer::new(&recipe, Path::new(prefix)).render(facts.as_ref()) {
        Some(text) => print!("{}", text),
        None => println!("{} has no caveats", recipe.package.name),
    }
    Ok(())
}
