use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::ConditionNode;

/// Category lookups needed to expand category leaves and rule-based categories.
pub trait CatalogSource: Send + Sync {
    fn search_tokens_for(&self, category_id: &str) -> Vec<String>;
    fn child_categories_of(&self, category_id: &str) -> Vec<String>;
    /// Conditions of a rule-based category; `None` for plain categories.
    fn rule_conditions_of(&self, category_id: &str) -> Option<Vec<ConditionNode>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryRecord {
    pub id: String,
    #[serde(default)]
    pub search_tokens: Vec<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub conditions: Option<Vec<ConditionNode>>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    categories: HashMap<String, CategoryRecord>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new(records: Vec<CategoryRecord>) -> Self {
        Self {
            categories: records
                .into_iter()
                .map(|record| (record.id.clone(), record))
                .collect(),
        }
    }

    pub fn insert(&mut self, record: CategoryRecord) {
        self.categories.insert(record.id.clone(), record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl CatalogSource for InMemoryCatalog {
    fn search_tokens_for(&self, category_id: &str) -> Vec<String> {
        self.categories
            .get(category_id)
            .map(|record| record.search_tokens.clone())
            .unwrap_or_default()
    }

    fn child_categories_of(&self, category_id: &str) -> Vec<String> {
        self.categories
            .get(category_id)
            .map(|record| record.children.clone())
            .unwrap_or_default()
    }

    fn rule_conditions_of(&self, category_id: &str) -> Option<Vec<ConditionNode>> {
        self.categories
            .get(category_id)
            .and_then(|record| record.conditions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogSource, CategoryRecord, InMemoryCatalog};

    #[test]
    fn unknown_categories_have_no_tokens_or_children() {
        let catalog = InMemoryCatalog::new(vec![CategoryRecord {
            id: "cat1".to_string(),
            search_tokens: vec!["1.catA.Men".to_string()],
            children: vec!["cat2".to_string()],
            conditions: None,
        }]);
        assert_eq!(catalog.search_tokens_for("cat1"), vec!["1.catA.Men"]);
        assert_eq!(catalog.child_categories_of("cat1"), vec!["cat2"]);
        assert!(catalog.search_tokens_for("missing").is_empty());
        assert!(catalog.rule_conditions_of("cat1").is_none());
    }
}
