use std::collections::BTreeMap;

use chrono::Utc;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::catalog::CatalogSource;
use crate::config::EngineConfig;
use crate::error::{Result, RuleQueryError};
use crate::expression::ExpressionCompiler;
use crate::facets::{FacetParameterManager, prefix_param};
use crate::models::{
    AugmentedQuery, CATEGORY_FIELD, CATEGORY_SEPARATOR, CategoryToken, EngineQuery, FilterClause,
    FilterConstraint, Rule, RuleType, SearchContext, SortClause,
};

mod ranking;
mod source;
mod strategy;

pub use ranking::{NEUTRAL_BOOST, boost_value, map_strength, ranking_function};
pub use source::{InMemoryRuleSource, RulePage, RuleQuery, RuleSource, is_active_on};

use strategy::StrategyTarget;

/// Rules of one request grouped by type.
pub type RuleSet = BTreeMap<RuleType, Vec<Rule>>;

/// Per-request cache of matched rules and registered facets. Built lazily on
/// the first augmentation and dropped with the request.
#[derive(Debug, Default)]
pub struct RequestScope {
    rules: Option<RuleSet>,
    facets: FacetParameterManager,
}

impl RequestScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn rules(&self) -> Option<&RuleSet> {
        self.rules.as_ref()
    }

    #[must_use]
    pub fn facets(&self) -> &FacetParameterManager {
        &self.facets
    }

    pub fn facets_mut(&mut self) -> &mut FacetParameterManager {
        &mut self.facets
    }
}

/// Matches merchandising rules against a request and folds them into the
/// engine query.
pub struct RuleMatchingEngine<'a> {
    config: &'a EngineConfig,
    rules: &'a dyn RuleSource,
    catalog: &'a dyn CatalogSource,
}

impl<'a> RuleMatchingEngine<'a> {
    pub fn new(
        config: &'a EngineConfig,
        rules: &'a dyn RuleSource,
        catalog: &'a dyn CatalogSource,
    ) -> Self {
        Self {
            config,
            rules,
            catalog,
        }
    }

    pub fn augment(
        &self,
        text: &str,
        constraints: &[FilterConstraint],
        context: &SearchContext,
        scope: &mut RequestScope,
    ) -> Result<AugmentedQuery> {
        let text = text.trim();
        if context.is_search() && text.is_empty() {
            return Err(RuleQueryError::MalformedInput(
                "search query must not be empty".to_string(),
            ));
        }
        let category = constraints.iter().find(|constraint| constraint.is_category());

        if scope.rules.is_none() {
            let fetched = self.fetch_rules(&self.rule_query(text, category, context));
            scope.rules = Some(group_rules(fetched, text, context)?);
        }
        let no_rules = RuleSet::new();
        let rules = scope.rules.as_ref().unwrap_or(&no_rules);

        let mut query = EngineQuery::new(text);
        query.start = context.start;
        query.rows = context.rows.unwrap_or(self.config.default_rows);

        if let Some(url) = redirect_target(rules) {
            debug!(redirect = %url, "redirect rule matched");
            return Ok(AugmentedQuery {
                query,
                redirect_url: Some(url.to_string()),
            });
        }

        let user_sorted = !context.sorts.is_empty();
        self.apply_sort_policy(&mut query, context);

        let compiler = ExpressionCompiler::for_context(self.catalog, context);
        let mut target = StrategyTarget {
            query: &mut query,
            facets: &mut scope.facets,
            compiler: &compiler,
            product_id_field: &self.config.product_id_field,
            user_sorted,
        };
        for kind in RuleType::APPLY_ORDER {
            if let Some(matched) = rules.get(&kind) {
                strategy::apply(kind, matched, &mut target)?;
            }
        }
        query.params.extend(scope.facets.emit_request_params());
        query.add_sort(SortClause::desc(self.config.relevance_field.as_str()));

        query.params.set(prefix_param(CATEGORY_FIELD), category_prefix(category, context));
        query.add_filter(FilterClause::plain(format!(
            "{CATEGORY_FIELD}:0{CATEGORY_SEPARATOR}{}",
            context.catalog_id
        )));
        if context.is_rule_based_page()
            && let Some(category_id) = context.category_id.as_deref()
        {
            let filter = compiler.compile_rule_category(category_id);
            query.add_filter(FilterClause::plain(filter));
        }
        merge_constraints(&mut query, constraints, &scope.facets);

        Ok(AugmentedQuery {
            query,
            redirect_url: None,
        })
    }

    fn rule_query(
        &self,
        text: &str,
        category: Option<&FilterConstraint>,
        context: &SearchContext,
    ) -> RuleQuery {
        RuleQuery {
            query_text: context.is_search().then(|| text.to_string()),
            is_search: context.is_search(),
            category_scope: category.map(|constraint| constraint.expression.clone()),
            category_path: context.category_path.clone(),
            site_id: context.site_id.clone(),
            catalog_id: context.catalog_id.clone(),
            brand_id: context.brand_id.clone(),
            outlet: context.outlet,
            as_of: context.as_of.unwrap_or_else(Utc::now),
            start: 0,
            rows: self.config.rule_page_size,
        }
    }

    /// Pages through the rule source until every match is retrieved or the
    /// page bound is hit. A failing source degrades to no rules.
    fn fetch_rules(&self, query: &RuleQuery) -> Vec<Rule> {
        let mut query = query.clone();
        let mut rules = Vec::new();
        let mut pages = 0;
        while pages < self.config.max_rule_pages {
            query.start = rules.len();
            let page = match self.rules.find_rules(&query) {
                Ok(page) => page,
                Err(err) => {
                    warn!(
                        code = err.code(),
                        error = %err,
                        "rule source failed; continuing without rules"
                    );
                    return Vec::new();
                }
            };
            pages += 1;
            let fetched = page.rules.len();
            rules.extend(page.rules);
            if fetched == 0 || rules.len() >= page.total {
                break;
            }
        }
        debug!(pages, rules = rules.len(), "fetched rules");
        rules
    }

    fn apply_sort_policy(&self, query: &mut EngineQuery, context: &SearchContext) {
        if context.sorts.is_empty() {
            query.add_sort(SortClause::asc(self.config.out_of_stock_field.as_str()));
        }
        for sort in &context.sorts {
            if sort.field == self.config.relevance_field || query.sorts.contains(sort) {
                continue;
            }
            query.add_sort(sort.clone());
        }
    }
}

/// Groups fetched rules by type after the per-request eligibility checks.
fn group_rules(fetched: Vec<Rule>, text: &str, context: &SearchContext) -> Result<RuleSet> {
    let lowered = text.to_lowercase();
    let mut grouped = RuleSet::new();
    for rule in fetched {
        if context.is_search()
            && let Some(exact) = rule.exact_query()
            && exact != lowered
        {
            continue;
        }
        if context.exclude_rules.contains(&rule.id)
            || (rule.experimental && !context.include_rules.contains(&rule.id))
        {
            continue;
        }
        let kind = rule.kind()?;
        if context.is_rule_based_page()
            && kind != RuleType::Facet
            && let Some(path) = context.category_path.as_ref()
            && !rule.category_tokens.contains(path)
        {
            continue;
        }
        grouped.entry(kind).or_default().push(rule);
    }
    Ok(grouped)
}

fn redirect_target(rules: &RuleSet) -> Option<&str> {
    rules
        .get(&RuleType::Redirect)?
        .iter()
        .filter_map(|rule| rule.redirect_url.as_deref())
        .map(str::trim)
        .find(|url| !url.is_empty())
}

/// Prefix of the category facet values one level below the active category.
fn category_prefix(category: Option<&FilterConstraint>, context: &SearchContext) -> String {
    category
        .and_then(|constraint| CategoryToken::parse(&constraint.expression).ok())
        .map_or_else(
            || format!("1{CATEGORY_SEPARATOR}{}{CATEGORY_SEPARATOR}", context.catalog_id),
            |token| token.child_prefix(),
        )
}

/// Plain constraints become filters as-is; constraints on multi-select facets
/// are OR-joined per field into one clause tagged with the field name.
fn merge_constraints(
    query: &mut EngineQuery,
    constraints: &[FilterConstraint],
    facets: &FacetParameterManager,
) {
    let mut tagged: IndexMap<&str, Vec<String>> = IndexMap::new();
    for constraint in constraints {
        if facets.is_multi_select(&constraint.field) {
            let expressions = tagged.entry(constraint.field.as_str()).or_default();
            let expression = constraint.to_string();
            if !expressions.contains(&expression) {
                expressions.push(expression);
            }
            continue;
        }
        let expression = constraint.to_string();
        if !query.has_filter(&expression) {
            query.add_filter(FilterClause::plain(expression));
        }
    }
    for (field, expressions) in tagged {
        query.add_filter(FilterClause::tagged(field, expressions.join(" OR ")));
    }
}
