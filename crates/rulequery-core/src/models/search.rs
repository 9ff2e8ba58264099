use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::facet::{Breadcrumb, FacetResult};
use super::params::ParamSet;
use crate::error::{Result, RuleQueryError};

fn default_country() -> String {
    "US".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    #[default]
    Search,
    Category,
    RuleBasedCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortClause {
    pub field: String,
    pub order: SortOrder,
}

impl SortClause {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Desc)
    }

    /// Parses `"field asc"` / `"field desc"`.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.split_whitespace();
        let (Some(field), Some(order), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(RuleQueryError::MalformedInput(format!(
                "invalid sort clause: {raw}"
            )));
        };
        let order = match order.to_ascii_lowercase().as_str() {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            _ => {
                return Err(RuleQueryError::MalformedInput(format!(
                    "invalid sort order: {raw}"
                )));
            }
        };
        Ok(Self::new(field, order))
    }
}

impl fmt::Display for SortClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.order.as_str())
    }
}

/// Site, catalog and page information a request is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchContext {
    pub site_id: String,
    pub catalog_id: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub page_type: PageType,
    #[serde(default)]
    pub category_path: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub brand_id: Option<String>,
    #[serde(default)]
    pub outlet: bool,
    #[serde(default)]
    pub include_rules: Vec<String>,
    #[serde(default)]
    pub exclude_rules: Vec<String>,
    #[serde(default)]
    pub sorts: Vec<SortClause>,
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub rows: Option<usize>,
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
}

impl SearchContext {
    pub fn new(site_id: impl Into<String>, catalog_id: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            catalog_id: catalog_id.into(),
            country: default_country(),
            page_type: PageType::Search,
            category_path: None,
            category_id: None,
            brand_id: None,
            outlet: false,
            include_rules: Vec::new(),
            exclude_rules: Vec::new(),
            sorts: Vec::new(),
            start: 0,
            rows: None,
            as_of: None,
        }
    }

    #[must_use]
    pub fn with_page_type(mut self, page_type: PageType) -> Self {
        self.page_type = page_type;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.site_id.trim().is_empty() {
            return Err(RuleQueryError::MissingContext("site_id".to_string()));
        }
        if self.catalog_id.trim().is_empty() {
            return Err(RuleQueryError::MissingContext("catalog_id".to_string()));
        }
        Ok(())
    }

    #[must_use]
    pub const fn is_search(&self) -> bool {
        matches!(self.page_type, PageType::Search)
    }

    #[must_use]
    pub const fn is_rule_based_page(&self) -> bool {
        matches!(self.page_type, PageType::RuleBasedCategory)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterClause {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub expression: String,
}

impl FilterClause {
    pub fn plain(expression: impl Into<String>) -> Self {
        Self {
            tag: None,
            expression: expression.into(),
        }
    }

    pub fn tagged(tag: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            expression: expression.into(),
        }
    }
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{{!tag={tag}}}{}", self.expression),
            None => f.write_str(&self.expression),
        }
    }
}

/// Query handed to the search engine after rule augmentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineQuery {
    pub text: String,
    pub filters: Vec<FilterClause>,
    pub sorts: Vec<SortClause>,
    pub boosts: Vec<String>,
    pub params: ParamSet,
    pub start: usize,
    pub rows: usize,
}

impl EngineQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn add_filter(&mut self, clause: FilterClause) {
        self.filters.push(clause);
    }

    pub fn add_sort(&mut self, sort: SortClause) {
        self.sorts.push(sort);
    }

    #[must_use]
    pub fn has_filter(&self, expression: &str) -> bool {
        self.filters
            .iter()
            .any(|clause| clause.expression == expression)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AugmentedQuery {
    pub query: EngineQuery,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCount {
    pub name: String,
    pub count: u64,
}

impl RawCount {
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFieldFacet {
    pub field: String,
    #[serde(default)]
    pub values: Vec<RawCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRangeFacet {
    pub field: String,
    #[serde(default)]
    pub counts: Vec<RawCount>,
    #[serde(default)]
    pub before: Option<u64>,
    #[serde(default)]
    pub after: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFacetSections {
    #[serde(default)]
    pub fields: Vec<RawFieldFacet>,
    #[serde(default)]
    pub ranges: Vec<RawRangeFacet>,
    #[serde(default)]
    pub queries: Vec<RawCount>,
}

/// Engine output before facet decoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSearchResult {
    #[serde(default)]
    pub documents: Vec<serde_json::Value>,
    #[serde(default)]
    pub num_found: u64,
    #[serde(default)]
    pub facets: RawFacetSections,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub request_id: String,
    pub results: Vec<serde_json::Value>,
    pub num_found: u64,
    pub facets: Vec<FacetResult>,
    pub breadcrumbs: Vec<Breadcrumb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_query: Option<EngineQuery>,
}
