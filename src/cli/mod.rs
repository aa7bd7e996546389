// src/cli/mod.rs
//! CLI definitions for cookbook
//!
//! This module contains the command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.
//!
//! Recipe option tokens (`--with-java`, ...) are passed through verbatim
//! after the command's own flags; anything clap does not recognize ends up
//! in the trailing token list. A literal `--` also starts the list.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cookbook")]
#[command(author = "Cookbook Contributors")]
#[command(version)]
#[command(about = "Evaluate and cook build recipes", long_about = None)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which recipe to load
#[derive(Args, Debug, Clone)]
pub struct RecipeArg {
    /// Recipe file path or bundled recipe name
    #[arg(long, default_value = "rdkit")]
    pub recipe: String,
}

/// Where the build happens
#[derive(Args, Debug, Clone)]
pub struct LayoutArgs {
    /// Installation prefix
    #[arg(long, default_value = "/usr/local")]
    pub prefix: String,

    /// Root of the unpacked source tree
    #[arg(long, default_value = ".")]
    pub source_dir: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe the host, build the plan and execute it
    Cook {
        #[command(flatten)]
        recipe: RecipeArg,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Number of parallel build jobs (default: all CPUs)
        #[arg(short, long)]
        jobs: Option<u32>,

        /// Skip checksum verification of downloaded assets
        #[arg(long)]
        no_verify: bool,

        /// Fail early if build tools are missing from PATH
        #[arg(long)]
        check_deps: bool,

        /// HTTP timeout in seconds for asset downloads
        #[arg(long, default_value = "300")]
        timeout: u64,

        /// Recipe option tokens, e.g. --with-java
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        options: Vec<String>,
    },

    /// Show the resolved build plan without running anything
    Plan {
        #[command(flatten)]
        recipe: RecipeArg,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Recipe option tokens, e.g. --with-java
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        options: Vec<String>,
    },

    /// Print post-install guidance
    Caveats {
        #[command(flatten)]
        recipe: RecipeArg,

        /// Installation prefix
        #[arg(long, default_value = "/usr/local")]
        prefix: String,
    },

    /// Show recipe metadata, options and dependencies
    Info {
        #[command(flatten)]
        recipe: RecipeArg,

        /// Run recipe validation and list warnings
        #[arg(long)]
        validate: bool,
    },

    /// Show the probed runtime facts
    Probe {
        #[command(flatten)]
        recipe: RecipeArg,
    },
}
