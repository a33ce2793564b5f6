//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Compile, render and watch a Handlebars template tree
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: vellum.toml)
    #[arg(short = 'C', long, default_value = "vellum.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Template root directory (relative to current directory)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Template file extension, without the dot
    #[arg(short, long, global = true)]
    pub extension: Option<String>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compile once and write the static pages
    #[command(visible_alias = "b")]
    Build,

    /// Render one template to stdout
    #[command(visible_alias = "r")]
    Render {
        /// Logical template name, e.g. blog/post.tmpl
        name: String,

        /// JSON object used as render data
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        data: Option<PathBuf>,
    },

    /// Recompile on every change until Ctrl+C
    #[command(visible_alias = "w")]
    Watch,

    /// List the compiled template names
    #[command(visible_alias = "l")]
    List,
}

impl Cli {
    pub const fn is_watch(&self) -> bool {
        matches!(self.command, Commands::Watch)
    }
}
