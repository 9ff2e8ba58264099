use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, RuleQueryError};
use crate::models::{EngineQuery, RawSearchResult};

/// Executes an augmented query and returns the raw facet sections and documents.
pub trait SearchEngine: Send + Sync {
    fn execute(&self, query: &EngineQuery) -> Result<RawSearchResult>;
}

/// Engine stand-in that answers every query with one preloaded response.
#[derive(Debug, Default)]
pub struct CannedSearchEngine {
    response: RawSearchResult,
    last_query: Mutex<Option<EngineQuery>>,
    calls: AtomicUsize,
}

impl CannedSearchEngine {
    #[must_use]
    pub fn new(response: RawSearchResult) -> Self {
        Self {
            response,
            last_query: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let response = serde_json::from_str(&raw)?;
        Ok(Self::new(response))
    }

    #[must_use]
    pub fn last_query(&self) -> Option<EngineQuery> {
        self.last_query
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SearchEngine for CannedSearchEngine {
    fn execute(&self, query: &EngineQuery) -> Result<RawSearchResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut last = self
            .last_query
            .lock()
            .map_err(|_| RuleQueryError::Engine("canned engine mutex poisoned".to_string()))?;
        *last = Some(query.clone());
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{CannedSearchEngine, SearchEngine};
    use crate::models::{EngineQuery, RawSearchResult};

    #[test]
    fn canned_engine_records_queries() {
        let engine = CannedSearchEngine::new(RawSearchResult {
            num_found: 7,
            ..RawSearchResult::default()
        });
        assert!(engine.last_query().is_none());

        let result = engine.execute(&EngineQuery::new("jacket")).expect("execute");
        assert_eq!(result.num_found, 7);
        assert_eq!(engine.call_count(), 1);
        assert_eq!(
            engine.last_query().map(|query| query.text),
            Some("jacket".to_string())
        );
    }
}
