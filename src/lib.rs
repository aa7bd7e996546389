// src/lib.rs

//! Cookbook: a build recipe evaluator
//!
//! Recipes are declarative TOML descriptions of how to configure, build and
//! install one package from an unpacked source tree.
//!
//! # Architecture
//!
//! - Options: boolean switches resolved once from raw argument tokens
//! - Probe: host runtime facts (version, library variant, include path)
//! - Plan: a pure function of recipe, options and facts
//! - Kitchen: executes the plan in order and stops at the first failure
//! - Caveats: post-install guidance rendered from the same facts

mod error;
pub mod hash;
pub mod recipe;

pub use error::{Error, Result};
pub use hash::{Checksum, HashAlgorithm, HashError};
