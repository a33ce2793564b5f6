//! vellum - compile, render and watch a Handlebars template tree.

mod cli;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    vellum::logger::set_verbose(cli.verbose);

    let config = cli::load_config(&cli)?;

    match &cli.command {
        Commands::Build => cli::build::build(&config),
        Commands::Render { name, data } => cli::render::render(&config, name, data.as_deref()),
        Commands::Watch => cli::watch::watch(&config),
        Commands::List => cli::build::list(&config),
    }
}
