// src/main.rs

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Cook {
            recipe,
            layout,
            jobs,
            no_verify,
            check_deps,
            timeout,
            options,
        } => commands::cmd_cook(
            &recipe.recipe,
            &layout.prefix,
            &layout.source_dir,
            jobs,
            no_verify,
            check_deps,
            timeout,
            &options,
        ),
        Commands::Plan {
            recipe,
            layout,
            options,
        } => commands::cmd_plan(&recipe.recipe, &layout.prefix, &layout.source_dir, &options),
        Commands::Caveats { recipe, prefix } => commands::cmd_caveats(&recipe.recipe, &prefix),
        Commands::Info { recipe, validate } => commands::cmd_info(&recipe.recipe, validate),
        Commands::Probe { recipe } => commands::cmd_probe(&recipe.recipe),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        // Propagate the failing tool's exit status to the host
        let code = e
            .downcast_ref::<cookbook::Error>()
            .map(cookbook::Error::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}
