// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: recipe file or bundled name
fn recipe_arg() -> Arg {
    Arg::new("recipe")
        .long("recipe")
        .value_name("RECIPE")
        .default_value("rdkit")
        .help("Recipe file path or bundled recipe name")
}

/// Common argument: installation prefix
fn prefix_arg() -> Arg {
    Arg::new("prefix")
        .long("prefix")
        .default_value("/usr/local")
        .help("Installation prefix")
}

/// Common argument: unpacked source tree
fn source_dir_arg() -> Arg {
    Arg::new("source_dir")
        .long("source-dir")
        .default_value(".")
        .help("Root of the unpacked source tree")
}

/// Trailing recipe option tokens
fn options_arg() -> Arg {
    Arg::new("options")
        .num_args(0..)
        .trailing_var_arg(true)
        .allow_hyphen_values(true)
        .help("Recipe option tokens, e.g. --with-java")
}

fn build_cli() -> Command {
    Command::new("cookbook")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Cookbook Contributors")
        .about("Evaluate and cook build recipes")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging (RUST_LOG takes precedence)"),
        )
        .subcommand(
            Command::new("cook")
                .about("Probe the host, build the plan and execute it")
                .arg(recipe_arg())
                .arg(prefix_arg())
                .arg(source_dir_arg())
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .help("Number of parallel build jobs (default: all CPUs)"),
                )
                .arg(
                    Arg::new("no_verify")
                        .long("no-verify")
                        .action(ArgAction::SetTrue)
                        .help("Skip checksum verification of downloaded assets"),
                )
                .arg(
                    Arg::new("check_deps")
                        .long("check-deps")
                        .action(ArgAction::SetTrue)
                        .help("Fail early if build tools are missing from PATH"),
                )
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .default_value("300")
                        .help("HTTP timeout in seconds for asset downloads"),
                )
                .arg(options_arg()),
        )
        .subcommand(
            Command::new("plan")
                .about("Show the resolved build plan without running anything")
                .arg(recipe_arg())
                .arg(prefix_arg())
                .arg(source_dir_arg())
                .arg(options_arg()),
        )
        .subcommand(
            Command::new("caveats")
                .about("Print post-install guidance")
                .arg(recipe_arg())
                .arg(prefix_arg()),
        )
        .subcommand(
            Command::new("info")
                .about("Show recipe metadata, options and dependencies")
                .arg(recipe_arg())
                .arg(
                    Arg::new("validate")
                        .long("validate")
                        .action(ArgAction::SetTrue)
                        .help("Run recipe validation and list warnings"),
                ),
        )
        .subcommand(
            Command::new("probe")
                .about("Show the probed runtime facts")
                .arg(recipe_arg()),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=recipes");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("cookbook.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
