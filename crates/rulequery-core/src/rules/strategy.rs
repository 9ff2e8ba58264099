use tracing::debug;

use super::ranking::{NEUTRAL_BOOST, boost_value, ranking_function};
use crate::error::Result;
use crate::expression::ExpressionCompiler;
use crate::facets::FacetParameterManager;
use crate::models::{
    CombineMode, EngineQuery, FilterClause, Rule, RuleType, SortClause, escape_query_chars,
};

/// Everything a strategy may modify while augmenting one request.
pub(super) struct StrategyTarget<'a> {
    pub query: &'a mut EngineQuery,
    pub facets: &'a mut FacetParameterManager,
    pub compiler: &'a ExpressionCompiler<'a>,
    pub product_id_field: &'a str,
    pub user_sorted: bool,
}

/// Applies the rules of one type. Redirects never reach this point.
pub(super) fn apply(kind: RuleType, rules: &[Rule], target: &mut StrategyTarget<'_>) -> Result<()> {
    match kind {
        RuleType::Facet => apply_facet_rules(rules, target.facets),
        RuleType::Boost => {
            if !target.user_sorted {
                apply_boost_rules(rules, target.query, target.product_id_field);
            }
            Ok(())
        }
        RuleType::Block => {
            apply_block_rules(rules, target.query, target.product_id_field);
            Ok(())
        }
        RuleType::Ranking => {
            apply_ranking_rules(rules, target.query, target.compiler);
            Ok(())
        }
        RuleType::Redirect => Ok(()),
    }
}

fn apply_facet_rules(rules: &[Rule], facets: &mut FacetParameterManager) -> Result<()> {
    for rule in rules {
        if rule.combine_mode == CombineMode::Replace {
            facets.clear();
        }
        for record in &rule.facets {
            facets.register(record.to_definition()?);
        }
    }
    Ok(())
}

/// `fixedBoost(<field>,'p1','p2',...)` ranks the listed products first, in order.
fn fixed_boost_function(product_id_field: &str, products: &[String]) -> String {
    let mut function = format!("fixedBoost({product_id_field}");
    for product in products {
        function.push_str(",'");
        function.push_str(&product.replace('\'', "\\'"));
        function.push('\'');
    }
    function.push(')');
    function
}

fn apply_boost_rules(rules: &[Rule], query: &mut EngineQuery, product_id_field: &str) {
    let Some(rule) = rules.first().filter(|rule| !rule.boosted_products.is_empty()) else {
        return;
    };
    debug!(rule = %rule.id, products = rule.boosted_products.len(), "applying boost rule");
    query.add_sort(SortClause::asc(fixed_boost_function(
        product_id_field,
        &rule.boosted_products,
    )));
}

fn apply_block_rules(rules: &[Rule], query: &mut EngineQuery, product_id_field: &str) {
    for product in rules.iter().flat_map(|rule| &rule.blocked_products) {
        let expression = format!("-{product_id_field}:{}", escape_query_chars(product.trim()));
        if !query.has_filter(&expression) {
            query.add_filter(FilterClause::plain(expression));
        }
    }
}

fn apply_ranking_rules(rules: &[Rule], query: &mut EngineQuery, compiler: &ExpressionCompiler<'_>) {
    for rule in rules {
        let condition_filter = compiler.compile(&rule.conditions);
        let boost = rule
            .ranking
            .as_ref()
            .map_or_else(|| NEUTRAL_BOOST.to_string(), boost_value);
        query.boosts.push(ranking_function(&condition_filter, &boost));
    }
}

#[cfg(test)]
mod tests {
    use super::fixed_boost_function;

    #[test]
    fn fixed_boost_lists_products_in_rule_order() {
        let products = vec!["p2".to_string(), "p1".to_string(), "o'neil".to_string()];
        assert_eq!(
            fixed_boost_function("productId", &products),
            r"fixedBoost(productId,'p2','p1','o\'neil')"
        );
    }
}
