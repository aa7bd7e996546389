// src/recipe/builtin.rs

//! Recipes compiled into the binary

use crate::error::{Error, Result};
use crate::recipe::format::Recipe;
use crate::recipe::parser::parse_recipe;

struct Builtin {
    name: &'static str,
    recipe: &'static str,
    /// (file name referenced by `[[patches]]`, contents)
    files: &'static [(&'static str, &'static str)],
}

const BUILTINS: &[Builtin] = &[Builtin {
    name: "rdkit",
    recipe: include_str!("../../recipes/rdkit.toml"),
    files: &[("rdkit.patch", include_str!("../../recipes/rdkit.patch"))],
}];

/// Names of the bundled recipes
pub fn names() -> Vec<&'static str> {
    BUILTINS.iter().map(|b| b.name).collect()
}

/// Load a bundled recipe by name, with its patch files inlined
pub fn load(name: &str) -> Option<Result<Recipe>> {
    let builtin = BUILTINS.iter().find(|b| b.name == name)?;
    Some(inline(builtin))
}

/// The bundled rdkit recipe
pub fn rdkit() -> Result<Recipe> {
    load("rdkit").unwrap_or_else(|| Err(Error::Parse("rdkit recipe is not bundled".to_string())))
}

fn inline(builtin: &Builtin) -> Result<Recipe> {
    let mut recipe = parse_recipe(builtin.recipe)?;
    for patch in &mut recipe.patches {
        if patch.diff.is_some() {
            continue;
        }
        let Some(file) = patch.file.as_deref() else {
            continue;
        };
        let (_, text) = builtin
            .files
            .iter()
            .find(|(name, _)| *name == file)
            .ok_or_else(|| {
                Error::Parse(format!("bundled patch file {} is missing", file))
            })?;
        patch.diff = Some(text.to_string());
    }
    Ok(recipe)
}
