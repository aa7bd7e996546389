// src/recipe/mod.rs

//! Build recipes
//!
//! A recipe declares where a package's source lives, which options it
//! accepts, what it depends on and how it is configured, built and
//! installed. Evaluating one goes through a fixed pipeline:
//!
//! 1. [`OptionRegistry`] resolves the raw option tokens
//! 2. [`EnvironmentProbe`] gathers facts about the host runtime
//! 3. [`BuildPlan`] turns recipe + options + facts into ordered steps
//! 4. the [`Kitchen`] executes the plan, failing fast
//! 5. [`CaveatsRenderer`] prints post-install guidance
//!
//! # Example Recipe
//!
//! ```toml
//! [package]
//! name = "hello"
//! version = "2.12"
//!
//! [source]
//! archive = "https://ftp.gnu.org/gnu/hello/hello-%(version)s.tar.gz"
//! checksum = "sha256:cf04af86dc085268c5f4470fbae49b18afbc221b78096aab842d934a76bad0ab"
//!
//! [[options]]
//! flag = "--with-docs"
//! description = "Build documentation"
//!
//! [configure]
//! args = ["-DCMAKE_INSTALL_PREFIX=%(prefix)s"]
//!
//! [[configure.conditional]]
//! option = "--with-docs"
//! flags = ["-DBUILD_DOCS=ON"]
//! ```

pub mod builtin;
pub mod caveats;
pub mod format;
pub mod kitchen;
pub mod options;
mod parser;
pub mod plan;
pub mod probe;

pub use caveats::CaveatsRenderer;
pub use format::{Dependency, DependencyPhase, OptionDecl, Recipe};
pub use kitchen::{CookReport, Kitchen, KitchenConfig, PatchError};
pub use options::{OptionRegistry, ResolvedOptions};
pub use parser::{parse_recipe, parse_recipe_file, validate_recipe};
pub use plan::{Action, BuildPlan, Invocation, Step, StepKind};
pub use probe::{
    EnvironmentFacts, EnvironmentProbe, HostPython, LibraryLayout, ProbeError, RuntimeQuery,
};
