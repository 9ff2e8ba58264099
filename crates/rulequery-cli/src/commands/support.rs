use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rulequery_core::{CategoryRecord, EngineConfig, InMemoryCatalog, ResourceLocalizer};
use serde::de::DeserializeOwned;

pub(super) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

pub(super) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

pub(super) fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_toml_file(path)
            .with_context(|| format!("invalid configuration {}", path.display())),
        None => Ok(EngineConfig::from_env()),
    }
}

pub(super) fn load_localizer(
    explicit: Option<&Path>,
    config: &EngineConfig,
) -> Result<ResourceLocalizer> {
    match explicit.or(config.resources_path.as_deref()) {
        Some(path) => ResourceLocalizer::from_toml_file(path)
            .with_context(|| format!("invalid resources {}", path.display())),
        None => Ok(ResourceLocalizer::default()),
    }
}

pub(super) fn load_catalog(path: Option<&Path>) -> Result<InMemoryCatalog> {
    match path {
        Some(path) => Ok(InMemoryCatalog::new(read_json::<Vec<CategoryRecord>>(path)?)),
        None => Ok(InMemoryCatalog::default()),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{load_catalog, load_config, load_localizer, read_json};
    use rulequery_core::localization::BucketKind;
    use rulequery_core::{CatalogSource, EngineConfig, Localizer};

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("engine.toml");
        fs::write(&path, "rule_page_size = 5\ndefault_rows = 48\n").expect("write config");
        let config = load_config(Some(path.as_path())).expect("config");
        assert_eq!(config.rule_page_size, 5);
        assert_eq!(config.default_rows, 48);
        assert_eq!(config.out_of_stock_field, "isToos");
    }

    #[test]
    fn explicit_resources_win_over_config_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let explicit = dir.path().join("explicit.toml");
        let configured = dir.path().join("configured.toml");
        fs::write(&explicit, "\"facet.range.price.inrange\" = \"from ${v1}\"\n").expect("write");
        fs::write(&configured, "\"facet.range.price.inrange\" = \"to ${v2}\"\n").expect("write");
        let config = EngineConfig {
            resources_path: Some(configured),
            ..EngineConfig::default()
        };

        let localizer = load_localizer(Some(explicit.as_path()), &config).expect("explicit");
        assert_eq!(localizer.name_for("price", BucketKind::InRange, "1", "2"), "from 1");
        let localizer = load_localizer(None, &config).expect("configured");
        assert_eq!(localizer.name_for("price", BucketKind::InRange, "1", "2"), "to 2");
    }

    #[test]
    fn catalog_loads_category_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("categories.json");
        fs::write(
            &path,
            r#"[{"id": "cat1", "search_tokens": ["1.catA.Men"], "children": ["cat2"]}]"#,
        )
        .expect("write");
        let catalog = load_catalog(Some(path.as_path())).expect("catalog");
        assert_eq!(catalog.child_categories_of("cat1"), ["cat2"]);
        assert!(load_catalog(None).expect("empty").is_empty());
    }

    #[test]
    fn invalid_json_reports_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        fs::write(&path, "{").expect("write");
        let err = read_json::<Vec<String>>(&path).expect_err("broken json");
        assert!(err.to_string().contains("broken.json"));
    }
}
