use std::path::PathBuf;

use clap::Args;

#[derive(Debug, Args)]
pub struct CompileArgs {
    /// JSON array of condition nodes.
    pub conditions: PathBuf,
    #[arg(long)]
    pub catalog: String,
    #[arg(long, default_value = "US")]
    pub country: String,
    /// JSON array of category records used for category leaves.
    #[arg(long)]
    pub categories: Option<PathBuf>,
    /// Compile the rule-based category with this id instead of the condition list.
    #[arg(long)]
    pub rule_category: Option<String>,
}

#[derive(Debug, Args)]
pub struct AugmentArgs {
    #[arg(allow_hyphen_values = true)]
    pub query: String,
    /// JSON search context (site, catalog, page type, sorts).
    #[arg(long)]
    pub context: PathBuf,
    /// JSON array of rules.
    #[arg(long)]
    pub rules: PathBuf,
    #[arg(long)]
    pub categories: Option<PathBuf>,
    /// Active navigation path, e.g. `category:1.catA.Men|gender:men`.
    #[arg(long, default_value = "")]
    pub path: String,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub request: AugmentArgs,
    /// JSON raw engine response returned for every query.
    #[arg(long)]
    pub engine_response: PathBuf,
}

#[derive(Debug, Args)]
pub struct BreadcrumbsArgs {
    pub path: String,
}

#[derive(Debug, Args)]
pub struct StrengthArgs {
    pub strength: String,
}
