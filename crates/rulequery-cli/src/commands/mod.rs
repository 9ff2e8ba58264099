use std::sync::Arc;

use anyhow::{Context, Result};
use rulequery_core::models::{ConditionNode, FilterConstraint, Rule, SearchContext};
use rulequery_core::{
    CannedSearchEngine, EngineConfig, ExpressionCompiler, InMemoryRuleSource, RequestScope,
    ResourceLocalizer, RuleMatchingEngine, SearchService, build_breadcrumbs, map_strength,
};
use tracing::debug;

use crate::cli::{AugmentArgs, Cli, Commands, CompileArgs, SearchArgs};

mod support;

use self::support::{load_catalog, load_config, load_localizer, print_json, read_json};

pub(crate) fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    debug!(
        rule_page_size = config.rule_page_size,
        max_rule_pages = config.max_rule_pages,
        "configuration loaded"
    );
    match cli.command {
        Commands::Compile(args) => run_compile(&args),
        Commands::Augment(args) => {
            let request = Request::load(&args)?;
            let catalog = load_catalog(args.categories.as_deref())?;
            let source = InMemoryRuleSource::new(request.rules);
            let engine = RuleMatchingEngine::new(&config, &source, &catalog);
            let mut scope = RequestScope::new();
            let augmented = engine.augment(
                &args.query,
                &request.constraints,
                &request.context,
                &mut scope,
            )?;
            print_json(&augmented)
        }
        Commands::Search(args) => {
            let localizer = load_localizer(cli.resources.as_deref(), &config)?;
            run_search(config, localizer, &args)
        }
        Commands::Breadcrumbs(args) => {
            let localizer = load_localizer(cli.resources.as_deref(), &config)?;
            let constraints = FilterConstraint::parse_path(&args.path)?;
            print_json(&build_breadcrumbs(&constraints, &localizer))
        }
        Commands::Strength(args) => print_json(&serde_json::json!({
            "strength": args.strength,
            "factor": map_strength(&args.strength),
        })),
    }
}

struct Request {
    context: SearchContext,
    constraints: Vec<FilterConstraint>,
    rules: Vec<Rule>,
}

impl Request {
    fn load(args: &AugmentArgs) -> Result<Self> {
        Ok(Self {
            context: read_json(&args.context)?,
            constraints: FilterConstraint::parse_path(&args.path)
                .with_context(|| format!("invalid --path '{}'", args.path))?,
            rules: read_json(&args.rules)?,
        })
    }
}

fn run_compile(args: &CompileArgs) -> Result<()> {
    let catalog = load_catalog(args.categories.as_deref())?;
    let compiler = ExpressionCompiler::new(&catalog, &args.catalog, &args.country);
    let filter = match &args.rule_category {
        Some(category_id) => compiler.compile_rule_category(category_id),
        None => {
            let conditions: Vec<ConditionNode> = read_json(&args.conditions)?;
            compiler.compile(&conditions)
        }
    };
    print_json(&serde_json::json!({ "filter": filter }))
}

fn run_search(config: EngineConfig, localizer: ResourceLocalizer, args: &SearchArgs) -> Result<()> {
    let request = Request::load(&args.request)?;
    let engine = CannedSearchEngine::from_json_file(&args.engine_response)
        .with_context(|| format!("invalid engine response {}", args.engine_response.display()))?;
    let service = SearchService::new(
        config,
        Arc::new(InMemoryRuleSource::new(request.rules)),
        Arc::new(load_catalog(args.request.categories.as_deref())?),
        Arc::new(engine),
        Arc::new(localizer),
    );
    let response = service.search(&args.request.query, &request.constraints, &request.context)?;
    print_json(&response)
}
