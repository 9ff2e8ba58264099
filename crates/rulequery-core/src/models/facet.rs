use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleQueryError};

pub const DEFAULT_MIN_BUCKETS: u32 = 2;
pub const UI_WIDGET_TYPE: &str = "uiWidgetType";

fn default_min_buckets() -> u32 {
    DEFAULT_MIN_BUCKETS
}

/// Numeric or textual facet parameter as stored alongside a facet rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Integer(i64),
    Text(String),
}

impl ParamValue {
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Text(value) => value.trim().parse().ok(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Facet as stored by the rule source, before its kind is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FacetRecord {
    pub field: String,
    pub kind: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub multi_select: bool,
    #[serde(default = "default_min_buckets")]
    pub min_buckets: u32,
    #[serde(default)]
    pub ui_type: Option<String>,
    #[serde(default)]
    pub blacklist: Vec<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub min_count: Option<i64>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub missing: Option<bool>,
    #[serde(default)]
    pub start: Option<ParamValue>,
    #[serde(default)]
    pub end: Option<ParamValue>,
    #[serde(default)]
    pub gap: Option<ParamValue>,
    #[serde(default)]
    pub hardened: bool,
    #[serde(default)]
    pub queries: Vec<String>,
}

impl FacetRecord {
    pub fn to_definition(&self) -> Result<FacetDefinition> {
        let field = self.field.trim();
        if field.is_empty() {
            return Err(RuleQueryError::Configuration(
                "facet field must not be empty".to_string(),
            ));
        }
        let kind = match self.kind.trim() {
            "term" | "field" | "fieldFacet" => FacetKind::Term(TermParams {
                limit: self.limit,
                min_count: self.min_count,
                sort: self.sort.clone(),
                missing: self.missing,
            }),
            "range" | "rangeFacet" => {
                let start = self.integer_param("start", self.start.as_ref())?;
                let end = self.integer_param("end", self.end.as_ref())?;
                let gap = self.integer_param("gap", self.gap.as_ref())?;
                if gap <= 0 || end < start {
                    return Err(RuleQueryError::Configuration(format!(
                        "invalid range for facet {field}: start={start} end={end} gap={gap}"
                    )));
                }
                FacetKind::Range(RangeParams {
                    start,
                    end,
                    gap,
                    hardened: self.hardened,
                })
            }
            "query" | "queryFacet" => FacetKind::Query(QueryParams {
                queries: self.queries.clone(),
            }),
            "date" | "dateFacet" => FacetKind::Date(DateParams {
                start: self.text_param("start", self.start.as_ref())?,
                end: self.text_param("end", self.end.as_ref())?,
                gap: self.text_param("gap", self.gap.as_ref())?,
                hardened: self.hardened,
            }),
            other => {
                return Err(RuleQueryError::Configuration(format!(
                    "unknown facet kind for {field}: {other}"
                )));
            }
        };
        Ok(FacetDefinition {
            field: field.to_string(),
            display_name: self
                .display_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| field.to_string()),
            multi_select: self.multi_select,
            min_buckets: self.min_buckets,
            ui_type: self.ui_type.clone(),
            blacklist: self.blacklist.clone(),
            kind,
        })
    }

    fn integer_param(&self, name: &str, value: Option<&ParamValue>) -> Result<i64> {
        value.and_then(ParamValue::as_i64).ok_or_else(|| {
            RuleQueryError::Configuration(format!(
                "facet {} requires a numeric {name}",
                self.field
            ))
        })
    }

    fn text_param(&self, name: &str, value: Option<&ParamValue>) -> Result<String> {
        value
            .map(ToString::to_string)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                RuleQueryError::Configuration(format!("facet {} requires {name}", self.field))
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TermParams {
    pub limit: Option<i64>,
    pub min_count: Option<i64>,
    pub sort: Option<String>,
    pub missing: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeParams {
    pub start: i64,
    pub end: i64,
    pub gap: i64,
    pub hardened: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryParams {
    pub queries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateParams {
    pub start: String,
    pub end: String,
    pub gap: String,
    pub hardened: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FacetKind {
    Term(TermParams),
    Range(RangeParams),
    Query(QueryParams),
    Date(DateParams),
}

/// A registered facet: what to request from the engine and how to decode it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetDefinition {
    pub field: String,
    pub display_name: String,
    pub multi_select: bool,
    pub min_buckets: u32,
    pub ui_type: Option<String>,
    pub blacklist: Vec<String>,
    #[serde(flatten)]
    pub kind: FacetKind,
}

impl FacetDefinition {
    pub fn new(field: impl Into<String>, kind: FacetKind) -> Self {
        let field = field.into();
        Self {
            display_name: field.clone(),
            field,
            multi_select: false,
            min_buckets: DEFAULT_MIN_BUCKETS,
            ui_type: None,
            blacklist: Vec::new(),
            kind,
        }
    }

    pub fn term(field: impl Into<String>) -> Self {
        Self::new(field, FacetKind::Term(TermParams::default()))
    }

    pub fn range(field: impl Into<String>, start: i64, end: i64, gap: i64, hardened: bool) -> Self {
        Self::new(
            field,
            FacetKind::Range(RangeParams {
                start,
                end,
                gap,
                hardened,
            }),
        )
    }

    pub fn query(field: impl Into<String>, queries: Vec<String>) -> Self {
        Self::new(field, FacetKind::Query(QueryParams { queries }))
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    #[must_use]
    pub const fn with_multi_select(mut self, multi_select: bool) -> Self {
        self.multi_select = multi_select;
        self
    }
}

/// One selectable (or selected) bucket of a decoded facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetFilter {
    pub display_name: String,
    pub count: u64,
    pub navigation_path: String,
    pub filter_query: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetResult {
    pub field: String,
    pub name: String,
    pub multi_select: bool,
    pub min_buckets: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    pub filters: Vec<FacetFilter>,
}

impl FacetResult {
    #[must_use]
    pub fn selected_filters(&self) -> Vec<&FacetFilter> {
        self.filters.iter().filter(|filter| filter.selected).collect()
    }

    /// Multi-select facets hide filters that are already selected.
    #[must_use]
    pub fn selectable_filters(&self) -> Vec<&FacetFilter> {
        self.filters
            .iter()
            .filter(|filter| !self.multi_select || !filter.selected)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub field_name: String,
    pub display_expression: String,
    pub removal_path: String,
}

#[cfg(test)]
mod tests {
    use super::{FacetKind, FacetRecord, RangeParams};

    fn record(value: serde_json::Value) -> FacetRecord {
        serde_json::from_value(value).expect("facet record")
    }

    #[test]
    fn range_record_accepts_numeric_and_text_bounds() {
        let definition = record(serde_json::json!({
            "field": "salePriceUS",
            "kind": "range",
            "display_name": "Price",
            "start": 0,
            "end": "200",
            "gap": 50
        }))
        .to_definition()
        .expect("definition");
        assert_eq!(definition.display_name, "Price");
        assert_eq!(definition.min_buckets, 2);
        assert_eq!(
            definition.kind,
            FacetKind::Range(RangeParams {
                start: 0,
                end: 200,
                gap: 50,
                hardened: false,
            })
        );
    }

    #[test]
    fn unknown_kind_and_bad_gap_are_configuration_errors() {
        let err = record(serde_json::json!({"field": "brand", "kind": "pivot"}))
            .to_definition()
            .expect_err("unknown kind");
        assert_eq!(err.code(), "CONFIGURATION_ERROR");

        let err = record(serde_json::json!({
            "field": "salePriceUS", "kind": "range", "start": 0, "end": 100, "gap": 0
        }))
        .to_definition()
        .expect_err("zero gap");
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn display_name_defaults_to_field() {
        let definition = record(serde_json::json!({"field": "brand", "kind": "term"}))
            .to_definition()
            .expect("definition");
        assert_eq!(definition.display_name, "brand");
        assert!(matches!(definition.kind, FacetKind::Term(_)));
    }
}
