// src/recipe/options.rs

//! Recipe-level boolean switches
//!
//! Options are declared up front and resolved exactly once per invocation
//! from the raw argument list handed over by the host package manager. A
//! flag is set iff its exact token appears; anything else is ignored.

use crate::recipe::format::{OptionDecl, Recipe};
use std::collections::BTreeMap;

/// Declared options for one recipe
#[derive(Debug, Clone, Default)]
pub struct OptionRegistry {
    options: Vec<OptionDecl>,
}

impl OptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a recipe's `[[options]]`
    pub fn from_recipe(recipe: &Recipe) -> Self {
        let mut registry = Self::new();
        for opt in &recipe.options {
            registry.declare(&opt.flag, &opt.description);
        }
        registry
    }

    /// Register a flag; re-declaring an existing flag updates its description
    pub fn declare(&mut self, flag: &str, description: &str) -> &mut Self {
        match self.options.iter_mut().find(|o| o.flag == flag) {
            Some(existing) => existing.description = description.to_string(),
            None => self.options.push(OptionDecl {
                flag: flag.to_string(),
                description: description.to_string(),
            }),
        }
        self
    }

    pub fn options(&self) -> &[OptionDecl] {
        &self.options
    }

    /// Resolve every declared flag against `argv`
    pub fn resolve<S: AsRef<str>>(&self, argv: &[S]) -> ResolvedOptions {
        let mut values: BTreeMap<String, bool> = self
            .options
            .iter()
            .map(|o| (o.flag.clone(), false))
            .collect();
        let mut ignored = Vec::new();

        for token in argv {
            let token = token.as_ref();
            match values.get_mut(token) {
                Some(value) => *value = true,
                None => ignored.push(token.to_string()),
            }
        }

        ResolvedOptions { values, ignored }
    }
}

/// Option values for one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedOptions {
    values: BTreeMap<String, bool>,
    ignored: Vec<String>,
}

impl ResolvedOptions {
    /// Whether `flag` was passed; undeclared flags are never set
    pub fn is_set(&self, flag: &str) -> bool {
        self.values.get(flag).copied().unwrap_or(false)
    }

    pub fn values(&self) -> &BTreeMap<String, bool> {
        &self.values
    }

    /// Tokens that matched no declared flag
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    /// Flags that are set, in sorted order
    pub fn enabled(&self) -> impl Iterator<Item = &str> {
        self.values
            .iter()
            .filter(|(_, set)| **set)
            .map(|(flag, _)| flag.as_str())
    }
}
