use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Days, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::{Rule, RuleTarget, SubTarget, WILDCARD, scope_matches};

/// Parameters of one page of rule retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleQuery {
    pub query_text: Option<String>,
    pub is_search: bool,
    pub category_scope: Option<String>,
    pub category_path: Option<String>,
    pub site_id: String,
    pub catalog_id: String,
    pub brand_id: Option<String>,
    pub outlet: bool,
    pub as_of: DateTime<Utc>,
    pub start: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RulePage {
    pub rules: Vec<Rule>,
    pub total: usize,
}

/// Paginated retrieval of rules matching a request, ordered by ascending sort
/// priority, then descending relevance, then rule id.
pub trait RuleSource: Send + Sync {
    fn find_rules(&self, query: &RuleQuery) -> Result<RulePage>;
}

/// Midnight ending the day of `as_of`.
fn end_of_day(as_of: DateTime<Utc>) -> DateTime<Utc> {
    as_of
        .date_naive()
        .checked_add_days(Days::new(1))
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map_or(as_of, |midnight| midnight.and_utc())
}

/// A rule is active once it has started by the end of today and until it ends
/// at or after the end of today.
#[must_use]
pub fn is_active_on(rule: &Rule, as_of: DateTime<Utc>) -> bool {
    let cutoff = end_of_day(as_of);
    rule.start_date.is_none_or(|start| start <= cutoff)
        && rule.end_date.is_none_or(|end| end >= cutoff)
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Relevance of a rule for the query text; `None` when it does not match.
fn query_relevance(rule: &Rule, query: &RuleQuery) -> Option<usize> {
    if !query.is_search || rule.matches_wildcard_query() {
        return Some(0);
    }
    let text = query.query_text.as_deref().unwrap_or_default();
    if let Some(exact) = rule.exact_query() {
        return (exact == text.trim().to_lowercase()).then_some(0);
    }
    let wanted = tokenize(text);
    let shared = rule
        .query
        .as_deref()
        .map(tokenize)
        .unwrap_or_default()
        .intersection(&wanted)
        .count();
    (shared > 0).then_some(shared)
}

fn target_matches(rule: &Rule, query: &RuleQuery) -> bool {
    match rule.target {
        RuleTarget::AllPages => true,
        RuleTarget::SearchPages => query.is_search,
        RuleTarget::CategoryPages => !query.is_search,
    }
}

fn sub_target_matches(rule: &Rule, query: &RuleQuery) -> bool {
    match rule.sub_target {
        SubTarget::All => true,
        SubTarget::Outlet => query.outlet,
        SubTarget::Retail => !query.outlet,
    }
}

fn category_matches(rule: &Rule, query: &RuleQuery) -> bool {
    rule.category_tokens.is_empty()
        || rule.category_tokens.iter().any(|token| {
            token == WILDCARD
                || query.category_scope.as_deref() == Some(token.as_str())
                || query.category_path.as_deref() == Some(token.as_str())
        })
}

/// Rule source over a fixed list of rules.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRuleSource {
    rules: Vec<Rule>,
}

impl InMemoryRuleSource {
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(Self::new(serde_json::from_str(&raw)?))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl RuleSource for InMemoryRuleSource {
    fn find_rules(&self, query: &RuleQuery) -> Result<RulePage> {
        let mut matched: Vec<(usize, &Rule)> = self
            .rules
            .iter()
            .filter(|rule| {
                target_matches(rule, query)
                    && sub_target_matches(rule, query)
                    && category_matches(rule, query)
                    && scope_matches(&rule.site_ids, Some(&query.site_id))
                    && scope_matches(&rule.catalog_ids, Some(&query.catalog_id))
                    && scope_matches(&rule.brand_ids, query.brand_id.as_deref())
                    && is_active_on(rule, query.as_of)
            })
            .filter_map(|rule| query_relevance(rule, query).map(|score| (score, rule)))
            .collect();
        matched.sort_by(|(left_score, left), (right_score, right)| {
            left.sort_priority
                .cmp(&right.sort_priority)
                .then_with(|| right_score.cmp(left_score))
                .then_with(|| left.id.cmp(&right.id))
        });

        let total = matched.len();
        let rules = matched
            .into_iter()
            .skip(query.start)
            .take(query.rows)
            .map(|(_, rule)| rule.clone())
            .collect();
        Ok(RulePage { rules, total })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::{InMemoryRuleSource, RuleQuery, RuleSource, is_active_on};
    use crate::models::Rule;

    fn rule(value: serde_json::Value) -> Rule {
        serde_json::from_value(value).expect("rule")
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 15, 30, 0).single().expect("timestamp")
    }

    fn search(text: &str) -> RuleQuery {
        RuleQuery {
            query_text: Some(text.to_string()),
            is_search: true,
            category_scope: None,
            category_path: None,
            site_id: "site".to_string(),
            catalog_id: "catA".to_string(),
            brand_id: None,
            outlet: false,
            as_of: now(),
            start: 0,
            rows: 20,
        }
    }

    fn ids(page: &super::RulePage) -> Vec<&str> {
        page.rules.iter().map(|rule| rule.id.as_str()).collect()
    }

    #[test]
    fn ordering_is_priority_then_relevance_then_id() {
        let source = InMemoryRuleSource::new(vec![
            rule(serde_json::json!({"id": "c", "type": "boostRule", "query": "rain jacket", "sort_priority": 1})),
            rule(serde_json::json!({"id": "b", "type": "boostRule", "query": "jacket", "sort_priority": 1})),
            rule(serde_json::json!({"id": "a", "type": "boostRule", "sort_priority": 1})),
            rule(serde_json::json!({"id": "z", "type": "blockRule", "sort_priority": 0})),
            rule(serde_json::json!({"id": "x", "type": "blockRule", "query": "boots"})),
        ]);
        let page = source.find_rules(&search("Rain Jacket")).expect("rules");
        assert_eq!(page.total, 4);
        assert_eq!(ids(&page), ["z", "c", "b", "a"]);
    }

    #[test]
    fn pages_are_sliced_after_sorting() {
        let source = InMemoryRuleSource::new(
            (0..5)
                .map(|idx| rule(serde_json::json!({"id": format!("r{idx}"), "type": "facetRule"})))
                .collect(),
        );
        let mut query = search("anything");
        query.start = 2;
        query.rows = 2;
        let page = source.find_rules(&query).expect("rules");
        assert_eq!(page.total, 5);
        assert_eq!(ids(&page), ["r2", "r3"]);
    }

    #[test]
    fn scope_filters_apply_to_site_catalog_brand_target_and_outlet() {
        let source = InMemoryRuleSource::new(vec![
            rule(serde_json::json!({"id": "other-site", "type": "boostRule", "site_ids": ["x"]})),
            rule(serde_json::json!({"id": "catalog", "type": "boostRule", "catalog_ids": ["catA"]})),
            rule(serde_json::json!({"id": "brand", "type": "boostRule", "brand_ids": ["88"]})),
            rule(serde_json::json!({"id": "category-only", "type": "boostRule", "target": "category_pages"})),
            rule(serde_json::json!({"id": "outlet", "type": "boostRule", "sub_target": "outlet"})),
            rule(serde_json::json!({"id": "scoped", "type": "boostRule", "category_tokens": ["1.catA.Men"]})),
        ]);
        let page = source.find_rules(&search("jacket")).expect("rules");
        assert_eq!(ids(&page), ["catalog"]);

        let mut query = search("jacket");
        query.brand_id = Some("88".to_string());
        query.outlet = true;
        query.category_scope = Some("1.catA.Men".to_string());
        let page = source.find_rules(&query).expect("rules");
        assert_eq!(ids(&page), ["brand", "catalog", "outlet", "scoped"]);
    }

    #[test]
    fn exact_match_queries_need_the_whole_text() {
        let source = InMemoryRuleSource::new(vec![rule(serde_json::json!({
            "id": "exact", "type": "redirectRule", "query": "[the bike]"
        }))]);
        assert_eq!(source.find_rules(&search("The Bike")).expect("rules").total, 1);
        assert_eq!(source.find_rules(&search("the bike shop")).expect("rules").total, 0);
    }

    #[test]
    fn date_window_uses_end_of_current_day() {
        let mut active = rule(serde_json::json!({"id": "r", "type": "boostRule"}));
        active.start_date = Some(Utc.with_ymd_and_hms(2024, 5, 10, 23, 0, 0).single().expect("ts"));
        active.end_date = Some(Utc.with_ymd_and_hms(2024, 5, 11, 0, 0, 0).single().expect("ts"));
        assert!(is_active_on(&active, now()));

        let mut expired = active.clone();
        expired.end_date = Some(Utc.with_ymd_and_hms(2024, 5, 10, 20, 0, 0).single().expect("ts"));
        assert!(!is_active_on(&expired, now()));

        let mut future = active;
        future.start_date = Some(Utc.with_ymd_and_hms(2024, 5, 11, 0, 0, 1).single().expect("ts"));
        assert!(!is_active_on(&future, now()));
    }
}
