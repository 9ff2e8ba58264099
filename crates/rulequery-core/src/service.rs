use std::sync::Arc;
use std::time::Instant;

use tracing::{info, info_span, warn};

use crate::breadcrumbs::build_breadcrumbs;
use crate::catalog::CatalogSource;
use crate::config::EngineConfig;
use crate::engine::SearchEngine;
use crate::error::{Result, RuleQueryError};
use crate::localization::Localizer;
use crate::models::{CategoryToken, FilterConstraint, SearchContext, SearchResponse};
use crate::rules::{RequestScope, RuleMatchingEngine, RuleSource};

/// Single search entry point: augments the query with matching rules, runs
/// it on the engine and decodes facets and breadcrumbs.
#[derive(Clone)]
pub struct SearchService {
    config: EngineConfig,
    rules: Arc<dyn RuleSource>,
    catalog: Arc<dyn CatalogSource>,
    engine: Arc<dyn SearchEngine>,
    localizer: Arc<dyn Localizer>,
}

impl std::fmt::Debug for SearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SearchService {
    pub fn new(
        config: EngineConfig,
        rules: Arc<dyn RuleSource>,
        catalog: Arc<dyn CatalogSource>,
        engine: Arc<dyn SearchEngine>,
        localizer: Arc<dyn Localizer>,
    ) -> Self {
        Self {
            config,
            rules,
            catalog,
            engine,
            localizer,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn matching_engine(&self) -> RuleMatchingEngine<'_> {
        RuleMatchingEngine::new(&self.config, self.rules.as_ref(), self.catalog.as_ref())
    }

    pub fn search(
        &self,
        text: &str,
        constraints: &[FilterConstraint],
        context: &SearchContext,
    ) -> Result<SearchResponse> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        let span = info_span!(
            "search",
            request_id = %request_id,
            site = %context.site_id,
            catalog = %context.catalog_id
        );
        let _entered = span.enter();

        let output = (|| -> Result<SearchResponse> {
            context.validate()?;
            validate_constraints(constraints)?;

            let mut scope = RequestScope::new();
            let augmented = self
                .matching_engine()
                .augment(text, constraints, context, &mut scope)?;
            if augmented.redirect_url.is_some() {
                return Ok(SearchResponse {
                    request_id: request_id.clone(),
                    results: Vec::new(),
                    num_found: 0,
                    facets: Vec::new(),
                    breadcrumbs: Vec::new(),
                    redirect_url: augmented.redirect_url,
                    applied_query: None,
                });
            }

            let raw = self.engine.execute(&augmented.query)?;
            let facets = scope.facets().decode(
                &raw.facets,
                constraints,
                &augmented.query.params,
                self.localizer.as_ref(),
            );
            let breadcrumbs = build_breadcrumbs(constraints, self.localizer.as_ref());
            Ok(SearchResponse {
                request_id: request_id.clone(),
                results: raw.documents,
                num_found: raw.num_found,
                facets,
                breadcrumbs,
                redirect_url: None,
                applied_query: Some(augmented.query),
            })
        })();

        let latency_ms = started.elapsed().as_millis();
        match &output {
            Ok(response) => info!(
                latency_ms,
                redirect = response.redirect_url.is_some(),
                num_found = response.num_found,
                facets = response.facets.len(),
                breadcrumbs = response.breadcrumbs.len(),
                "search completed"
            ),
            Err(err) => warn!(latency_ms, code = err.code(), error = %err, "search failed"),
        }
        output
    }
}

/// Category constraints must carry a parseable hierarchical token.
fn validate_constraints(constraints: &[FilterConstraint]) -> Result<()> {
    for constraint in constraints.iter().filter(|constraint| constraint.is_category()) {
        CategoryToken::parse(&constraint.expression).map_err(|_| {
            RuleQueryError::MalformedInput(format!(
                "invalid category constraint: {constraint}"
            ))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::SearchService;
    use crate::catalog::InMemoryCatalog;
    use crate::config::EngineConfig;
    use crate::engine::{CannedSearchEngine, SearchEngine};
    use crate::error::{Result, RuleQueryError};
    use crate::localization::ResourceLocalizer;
    use crate::models::{
        EngineQuery, FilterConstraint, RawCount, RawFacetSections, RawFieldFacet,
        RawSearchResult, Rule, SearchContext,
    };
    use crate::rules::InMemoryRuleSource;

    struct FailingEngine;

    impl SearchEngine for FailingEngine {
        fn execute(&self, _query: &EngineQuery) -> Result<RawSearchResult> {
            Err(RuleQueryError::Engine("engine unreachable".to_string()))
        }
    }

    fn service(rules: Vec<Rule>, engine: Arc<dyn SearchEngine>) -> SearchService {
        SearchService::new(
            EngineConfig::default(),
            Arc::new(InMemoryRuleSource::new(rules)),
            Arc::new(InMemoryCatalog::default()),
            engine,
            Arc::new(ResourceLocalizer::default()),
        )
    }

    fn gender_response() -> RawSearchResult {
        RawSearchResult {
            documents: vec![serde_json::json!({"productId": "p1"})],
            num_found: 1,
            facets: RawFacetSections {
                fields: vec![RawFieldFacet {
                    field: "gender".to_string(),
                    values: vec![RawCount::new("men", 1)],
                }],
                ..RawFacetSections::default()
            },
        }
    }

    #[test]
    fn search_decodes_facets_for_rule_registered_fields() {
        let engine = Arc::new(CannedSearchEngine::new(gender_response()));
        let rules = vec![
            serde_json::from_value(serde_json::json!({
                "id": "facets", "type": "facetRule",
                "facets": [{"field": "gender", "kind": "term", "display_name": "Gender"}]
            }))
            .expect("rule"),
        ];
        let service = service(rules, engine.clone());
        let constraints = vec![FilterConstraint::new("gender", "men")];

        let response = service
            .search("jacket", &constraints, &SearchContext::new("site", "catA"))
            .expect("search");
        assert_eq!(response.num_found, 1);
        assert_eq!(response.facets.len(), 1);
        assert_eq!(response.facets[0].name, "Gender");
        assert!(response.facets[0].filters[0].selected);
        assert_eq!(response.breadcrumbs.len(), 1);
        assert_eq!(engine.call_count(), 1);
        assert_eq!(
            response.applied_query.as_ref().map(|query| query.text.as_str()),
            Some("jacket")
        );
    }

    #[test]
    fn missing_context_is_rejected_before_the_engine() {
        let engine = Arc::new(CannedSearchEngine::new(RawSearchResult::default()));
        let service = service(Vec::new(), engine.clone());
        let err = service
            .search("jacket", &[], &SearchContext::new("", "catA"))
            .expect_err("missing site");
        assert_eq!(err.code(), "MISSING_CONTEXT");

        let constraints = vec![FilterConstraint::new("category", "Men")];
        let err = service
            .search("jacket", &constraints, &SearchContext::new("site", "catA"))
            .expect_err("bad category");
        assert_eq!(err.code(), "MALFORMED_INPUT");
        assert_eq!(engine.call_count(), 0);
    }

    #[test]
    fn redirect_skips_the_engine() {
        let engine = Arc::new(CannedSearchEngine::new(RawSearchResult::default()));
        let rules = vec![
            serde_json::from_value(serde_json::json!({
                "id": "r", "type": "redirectRule", "redirect_url": "/stores"
            }))
            .expect("rule"),
        ];
        let service = service(rules, engine.clone());
        let response = service
            .search("store hours", &[], &SearchContext::new("site", "catA"))
            .expect("search");
        assert_eq!(response.redirect_url.as_deref(), Some("/stores"));
        assert!(response.applied_query.is_none());
        assert_eq!(engine.call_count(), 0);
    }

    #[test]
    fn engine_failures_are_surfaced() {
        let service = service(Vec::new(), Arc::new(FailingEngine));
        let err = service
            .search("jacket", &[], &SearchContext::new("site", "catA"))
            .expect_err("engine down");
        assert_eq!(err.code(), "ENGINE_FAILURE");
        assert!(!err.is_bad_request());
    }
}
