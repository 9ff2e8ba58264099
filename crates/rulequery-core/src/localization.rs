use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, RuleQueryError};
use crate::models::parse_range_expression;

pub const DEFAULT_RANGE_TEMPLATE: &str = "${v1}-${v2}";
const KEY_PREFIX: &str = "facet.range";
const OPEN_BOUND: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketKind {
    Before,
    After,
    InRange,
    Crumb,
}

impl BucketKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::InRange => "inrange",
            Self::Crumb => "crumb",
        }
    }
}

pub trait Localizer: Send + Sync {
    fn name_for(&self, field: &str, kind: BucketKind, v1: &str, v2: &str) -> String;
}

/// Templates keyed `facet.range.<field>.<kind>[.<value>]`, loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLocalizer {
    templates: HashMap<String, String>,
}

impl ResourceLocalizer {
    #[must_use]
    pub fn new(templates: HashMap<String, String>) -> Self {
        Self { templates }
    }

    /// Accepts both nested tables and quoted dotted keys.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(raw)?;
        let mut templates = HashMap::new();
        flatten_table("", &table, &mut templates)?;
        Ok(Self { templates })
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }
}

fn flatten_table(
    prefix: &str,
    table: &toml::Table,
    out: &mut HashMap<String, String>,
) -> Result<()> {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::String(template) => {
                out.insert(full_key, template.clone());
            }
            toml::Value::Table(nested) => flatten_table(&full_key, nested, out)?,
            other => {
                return Err(RuleQueryError::Configuration(format!(
                    "resource {full_key} must be a string, found {}",
                    other.type_str()
                )));
            }
        }
    }
    Ok(())
}

impl Localizer for ResourceLocalizer {
    fn name_for(&self, field: &str, kind: BucketKind, v1: &str, v2: &str) -> String {
        let key = format!("{KEY_PREFIX}.{field}.{}", kind.as_str());
        let template = self
            .lookup(&format!("{key}.{v1}"))
            .or_else(|| self.lookup(&format!("{key}.{v2}")))
            .or_else(|| self.lookup(&key))
            .unwrap_or(DEFAULT_RANGE_TEMPLATE);
        template.replace("${v1}", v1).replace("${v2}", v2)
    }
}

fn range_kind(v1: &str, v2: &str) -> BucketKind {
    if v1 == OPEN_BOUND {
        BucketKind::Before
    } else if v2 == OPEN_BOUND {
        BucketKind::After
    } else {
        BucketKind::InRange
    }
}

/// Display name of a facet expression; non-range expressions are returned as is.
pub fn range_display_name(localizer: &dyn Localizer, field: &str, expression: &str) -> String {
    match parse_range_expression(expression) {
        Some((v1, v2)) => localizer.name_for(field, range_kind(v1, v2), v1, v2),
        None => expression.to_string(),
    }
}

/// Breadcrumb text of a facet expression; ranges use the `crumb` templates.
pub fn range_crumb_name(localizer: &dyn Localizer, field: &str, expression: &str) -> String {
    match parse_range_expression(expression) {
        Some((v1, v2)) => localizer.name_for(field, BucketKind::Crumb, v1, v2),
        None => expression.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{BucketKind, Localizer, ResourceLocalizer, range_crumb_name, range_display_name};

    #[test]
    fn lookup_prefers_value_specific_templates() {
        let localizer = ResourceLocalizer::from_toml_str(
            r#"
"facet.range.discountPercentUS.inrange" = "${v1}% - ${v2}%"
"facet.range.discountPercentUS.inrange.50" = "Half off or more"
"#,
        )
        .expect("resources");
        assert_eq!(
            localizer.name_for("discountPercentUS", BucketKind::InRange, "50", "100"),
            "Half off or more"
        );
        assert_eq!(
            localizer.name_for("discountPercentUS", BucketKind::InRange, "0", "50"),
            "Half off or more"
        );
        assert_eq!(
            localizer.name_for("discountPercentUS", BucketKind::InRange, "10", "20"),
            "10% - 20%"
        );
        assert_eq!(
            localizer.name_for("other", BucketKind::InRange, "10", "20"),
            "10-20"
        );
    }

    #[test]
    fn nested_tables_flatten_into_dotted_keys() {
        let localizer = ResourceLocalizer::from_toml_str(
            r#"
[facet.range.salePriceUS]
before = "Under ${v2}"
after = "${v1} and up"
crumb = "${v1} to ${v2}"
"#,
        )
        .expect("resources");
        assert_eq!(localizer.len(), 3);
        assert_eq!(
            range_display_name(&localizer, "salePriceUS", "[* TO 50]"),
            "Under 50"
        );
        assert_eq!(
            range_display_name(&localizer, "salePriceUS", "[200 TO *]"),
            "200 and up"
        );
        assert_eq!(
            range_crumb_name(&localizer, "salePriceUS", "[50 TO 100]"),
            "50 to 100"
        );
        assert_eq!(range_display_name(&localizer, "brand", "88"), "88");
    }

    #[test]
    fn non_string_resources_are_rejected() {
        let err = ResourceLocalizer::from_toml_str("\"facet.range.x.before\" = 3")
            .expect_err("numeric template");
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn resources_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "\"facet.range.gender.crumb\" = \"${{v1}}\"").expect("write");
        let localizer = ResourceLocalizer::from_toml_file(file.path()).expect("load");
        assert_eq!(localizer.name_for("gender", BucketKind::Crumb, "a", "b"), "a");
    }
}
