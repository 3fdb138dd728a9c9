//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Asset build pipeline for static front-end projects
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project directory holding `pages.toml` (default: current directory)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Remove the dist and temp directories
    #[command(visible_alias = "c")]
    Clean,

    /// Clean, compile and post-process into dist
    #[command(visible_alias = "b")]
    Build,

    /// Compile, then watch sources and serve with live reload
    #[command(visible_alias = "d")]
    Develop,

    /// Run a single pipeline or task by name
    #[command(visible_alias = "t")]
    Task {
        /// style, script, page, image, font, extra, useref, clean, compile, build or develop
        name: String,
    },
}

impl Commands {
    /// Pipeline name this command runs.
    pub fn pipeline_name(&self) -> &str {
        match self {
            Self::Clean => "clean",
            Self::Build => "build",
            Self::Develop => "develop",
            Self::Task { name } => name,
        }
    }
}
