// Public fallible APIs in this crate share one concrete error contract (`RuleQueryError`).
// Repeating per-function `# Errors` boilerplate obscures behavior more than it clarifies.
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod breadcrumbs;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod expression;
pub mod facets;
pub mod localization;
pub mod models;
pub mod rules;
pub mod service;

pub use breadcrumbs::build_breadcrumbs;
pub use catalog::{CatalogSource, CategoryRecord, InMemoryCatalog};
pub use config::EngineConfig;
pub use engine::{CannedSearchEngine, SearchEngine};
pub use error::{ErrorPayload, Result, RuleQueryError};
pub use expression::ExpressionCompiler;
pub use facets::{FacetParameterManager, build_buckets};
pub use localization::{Localizer, ResourceLocalizer};
pub use rules::{
    InMemoryRuleSource, RequestScope, RuleMatchingEngine, RuleSource, map_strength,
};
pub use service::SearchService;
