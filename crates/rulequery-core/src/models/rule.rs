use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::facet::FacetRecord;
use crate::error::{Result, RuleQueryError};

/// Scope value matching every site, catalog, category or query.
pub const WILDCARD: &str = "__all__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Facet,
    Boost,
    Block,
    Redirect,
    Ranking,
}

impl RuleType {
    /// Order in which augmentation strategies run. Redirects short-circuit instead.
    pub const APPLY_ORDER: [Self; 4] = [Self::Facet, Self::Boost, Self::Block, Self::Ranking];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Facet => "facetRule",
            Self::Boost => "boostRule",
            Self::Block => "blockRule",
            Self::Redirect => "redirectRule",
            Self::Ranking => "rankingRule",
        }
    }
}

impl FromStr for RuleType {
    type Err = RuleQueryError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim() {
            "facetRule" | "facet" => Ok(Self::Facet),
            "boostRule" | "boost" => Ok(Self::Boost),
            "blockRule" | "block" => Ok(Self::Block),
            "redirectRule" | "redirect" => Ok(Self::Redirect),
            "rankingRule" | "ranking" => Ok(Self::Ranking),
            other => Err(RuleQueryError::Configuration(format!(
                "unknown rule type: {other}"
            ))),
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTarget {
    #[default]
    AllPages,
    SearchPages,
    CategoryPages,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubTarget {
    #[default]
    All,
    Retail,
    Outlet,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMode {
    #[default]
    Append,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoolOperator {
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
    #[serde(rename = "ANDNOT", alias = "andnot", alias = "AND NOT")]
    AndNot,
}

impl BoolOperator {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::AndNot => "AND NOT",
        }
    }
}

impl fmt::Display for BoolOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafType {
    Category,
    Brand,
    Gender,
    PctOff,
    Price,
    ShowSale,
    PastSeason,
    Outlet,
    Keyword,
}

/// One node of a condition tree flattened into a level-tagged sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionNode {
    #[serde(alias = "level")]
    pub nesting_level: u32,
    #[serde(alias = "type")]
    pub leaf: LeafType,
    pub value: String,
    #[serde(default)]
    pub operator: Option<BoolOperator>,
}

impl ConditionNode {
    pub fn new(
        nesting_level: u32,
        leaf: LeafType,
        value: impl Into<String>,
        operator: Option<BoolOperator>,
    ) -> Self {
        Self {
            nesting_level,
            leaf,
            value: value.into(),
            operator,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoostBy {
    #[default]
    Factor,
    Attribute,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RankingDirective {
    #[serde(default)]
    pub boost_by: BoostBy,
    #[serde(default)]
    pub strength: Option<String>,
    #[serde(default)]
    pub attribute: Option<String>,
}

/// A merchandising directive as stored by the rule source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub id: String,
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default)]
    pub target: RuleTarget,
    #[serde(default)]
    pub sub_target: SubTarget,
    #[serde(default)]
    pub site_ids: Vec<String>,
    #[serde(default)]
    pub catalog_ids: Vec<String>,
    #[serde(default)]
    pub category_tokens: Vec<String>,
    #[serde(default)]
    pub brand_ids: Vec<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub conditions: Vec<ConditionNode>,
    #[serde(default)]
    pub sort_priority: i32,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub experimental: bool,
    #[serde(default)]
    pub combine_mode: CombineMode,
    #[serde(default)]
    pub boosted_products: Vec<String>,
    #[serde(default)]
    pub blocked_products: Vec<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub facets: Vec<FacetRecord>,
    #[serde(default)]
    pub ranking: Option<RankingDirective>,
}

impl Rule {
    pub fn kind(&self) -> Result<RuleType> {
        self.rule_type.parse()
    }

    /// Returns the bracketed exact-match query text, lowercased.
    #[must_use]
    pub fn exact_query(&self) -> Option<String> {
        let query = self.query.as_deref()?.trim();
        let inner = query.strip_prefix('[')?.strip_suffix(']')?;
        Some(inner.trim().to_lowercase())
    }

    #[must_use]
    pub fn matches_wildcard_query(&self) -> bool {
        self.query
            .as_deref()
            .map(str::trim)
            .is_none_or(|query| query.is_empty() || query == WILDCARD)
    }
}

/// True when `values` is unscoped, holds the wildcard, or holds `candidate`.
#[must_use]
pub fn scope_matches(values: &[String], candidate: Option<&str>) -> bool {
    values.is_empty()
        || values.iter().any(|value| {
            value == WILDCARD || candidate.is_some_and(|candidate| value == candidate)
        })
}
