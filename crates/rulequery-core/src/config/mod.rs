use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleQueryError};

mod env;

use env::{read_env_usize, read_non_empty_env};

const ENV_RULE_PAGE_SIZE: &str = "RULEQUERY_RULE_PAGE_SIZE";
const ENV_MAX_RULE_PAGES: &str = "RULEQUERY_MAX_RULE_PAGES";
const ENV_OUT_OF_STOCK_FIELD: &str = "RULEQUERY_OUT_OF_STOCK_FIELD";
const ENV_RELEVANCE_FIELD: &str = "RULEQUERY_RELEVANCE_FIELD";
const ENV_PRODUCT_ID_FIELD: &str = "RULEQUERY_PRODUCT_ID_FIELD";
const ENV_DEFAULT_ROWS: &str = "RULEQUERY_DEFAULT_ROWS";
const ENV_RESOURCES: &str = "RULEQUERY_RESOURCES";

const DEFAULT_RULE_PAGE_SIZE: usize = 20;
const DEFAULT_MAX_RULE_PAGES: usize = 50;
const DEFAULT_OUT_OF_STOCK_FIELD: &str = "isToos";
const DEFAULT_RELEVANCE_FIELD: &str = "score";
const DEFAULT_PRODUCT_ID_FIELD: &str = "productId";
const DEFAULT_ROWS: usize = 20;

/// Request-independent knobs of the augmentation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub rule_page_size: usize,
    pub max_rule_pages: usize,
    pub out_of_stock_field: String,
    pub relevance_field: String,
    pub product_id_field: String,
    pub default_rows: usize,
    pub resources_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rule_page_size: DEFAULT_RULE_PAGE_SIZE,
            max_rule_pages: DEFAULT_MAX_RULE_PAGES,
            out_of_stock_field: DEFAULT_OUT_OF_STOCK_FIELD.to_string(),
            relevance_field: DEFAULT_RELEVANCE_FIELD.to_string(),
            product_id_field: DEFAULT_PRODUCT_ID_FIELD.to_string(),
            default_rows: DEFAULT_ROWS,
            resources_path: None,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            rule_page_size: read_env_usize(ENV_RULE_PAGE_SIZE, defaults.rule_page_size, 1),
            max_rule_pages: read_env_usize(ENV_MAX_RULE_PAGES, defaults.max_rule_pages, 1),
            out_of_stock_field: read_non_empty_env(ENV_OUT_OF_STOCK_FIELD)
                .unwrap_or(defaults.out_of_stock_field),
            relevance_field: read_non_empty_env(ENV_RELEVANCE_FIELD)
                .unwrap_or(defaults.relevance_field),
            product_id_field: read_non_empty_env(ENV_PRODUCT_ID_FIELD)
                .unwrap_or(defaults.product_id_field),
            default_rows: read_env_usize(ENV_DEFAULT_ROWS, defaults.default_rows, 1),
            resources_path: read_non_empty_env(ENV_RESOURCES).map(PathBuf::from),
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rule_page_size == 0 {
            return Err(RuleQueryError::Configuration(
                "rule_page_size must be at least 1".to_string(),
            ));
        }
        if self.max_rule_pages == 0 {
            return Err(RuleQueryError::Configuration(
                "max_rule_pages must be at least 1".to_string(),
            ));
        }
        if self.default_rows == 0 {
            return Err(RuleQueryError::Configuration(
                "default_rows must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("out_of_stock_field", &self.out_of_stock_field),
            ("relevance_field", &self.relevance_field),
            ("product_id_field", &self.product_id_field),
        ] {
            if value.trim().is_empty() {
                return Err(RuleQueryError::Configuration(format!(
                    "{name} must not be empty"
                )));
            }
        }
        Ok(())
    }
}
