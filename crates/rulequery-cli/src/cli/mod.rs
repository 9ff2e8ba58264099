use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod args;


pub use args::{AugmentArgs, BreadcrumbsArgs, CompileArgs, SearchArgs, StrengthArgs};

#[derive(Debug, Parser)]
#[command(name = "rulequery")]
#[command(about = "Merchandising rule compiler and facet decoder", version)]
pub struct Cli {
    /// Engine configuration TOML; defaults to `RULEQUERY_*` environment variables.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Localization templates TOML; overrides `resources_path` from the configuration.
    #[arg(long, global = true)]
    pub resources: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compile a condition list into a filter expression.
    Compile(CompileArgs),
    /// Apply matching rules to a query without calling an engine.
    Augment(AugmentArgs),
    /// Run a full search against a canned engine response.
    Search(SearchArgs),
    /// Print the breadcrumbs of a navigation path.
    Breadcrumbs(BreadcrumbsArgs),
    /// Print the boost factor of a ranking strength.
    Strength(StrengthArgs),
}
