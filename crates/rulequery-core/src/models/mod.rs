mod facet;
mod filter;
mod params;
mod rule;
mod search;

pub use facet::{
    Breadcrumb, DEFAULT_MIN_BUCKETS, DateParams, FacetDefinition, FacetFilter, FacetKind,
    FacetRecord, FacetResult, ParamValue, QueryParams, RangeParams, TermParams, UI_WIDGET_TYPE,
};
pub use filter::{
    CATEGORY_FIELD, CATEGORY_SEPARATOR, CategoryToken, FIELD_SEPARATOR, FilterConstraint,
    PATH_SEPARATOR, create_path, escape_query_chars, parse_range_expression,
    unescape_query_chars,
};
pub use params::ParamSet;
pub use rule::{
    BoolOperator, BoostBy, CombineMode, ConditionNode, LeafType, RankingDirective, Rule, RuleTarget,
    RuleType, SubTarget, WILDCARD, scope_matches,
};
pub use search::{
    AugmentedQuery, EngineQuery, FilterClause, PageType, RawCount, RawFacetSections,
    RawFieldFacet, RawRangeFacet, RawSearchResult, SearchContext, SearchResponse, SortClause,
    SortOrder,
};
