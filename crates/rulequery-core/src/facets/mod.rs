use std::collections::BTreeMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::localization::{Localizer, range_display_name};
use crate::models::{
    CATEGORY_FIELD, DEFAULT_MIN_BUCKETS, FacetDefinition, FacetFilter, FacetKind, FacetResult,
    FilterConstraint, ParamSet, RawCount, RawFacetSections, RawFieldFacet, UI_WIDGET_TYPE,
    escape_query_chars, unescape_query_chars,
};

mod path;
mod range;

pub use path::{is_selected, navigation_path};
pub use range::build_buckets;

pub const CATEGORY_PATH_FIELD: &str = "categoryPath";
const LEADING_FIELDS: [&str; 2] = [CATEGORY_FIELD, CATEGORY_PATH_FIELD];

pub const PARAM_FACET: &str = "facet";
pub const PARAM_FACET_FIELD: &str = "facet.field";
pub const PARAM_FACET_RANGE: &str = "facet.range";
pub const PARAM_FACET_QUERY: &str = "facet.query";

/// `f.<field>.facet.<name>`
#[must_use]
pub fn field_param(field: &str, name: &str) -> String {
    format!("f.{field}.facet.{name}")
}

#[must_use]
pub fn prefix_param(field: &str) -> String {
    field_param(field, "prefix")
}

fn range_param(field: &str, name: &str) -> String {
    format!("f.{field}.facet.range.{name}")
}

fn exclusion_local_params(definition: &FacetDefinition) -> String {
    if definition.multi_select {
        format!("{{!ex={}}}", definition.field)
    } else {
        String::new()
    }
}

/// Request-scoped registry of facet definitions keyed by field, in
/// registration order. The first registration of a field wins.
#[derive(Debug, Clone, Default)]
pub struct FacetParameterManager {
    facets: IndexMap<String, FacetDefinition>,
}

impl FacetParameterManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the field was already registered.
    pub fn register(&mut self, definition: FacetDefinition) -> bool {
        if self.facets.contains_key(&definition.field) {
            debug!(field = %definition.field, "facet already registered; keeping first");
            return false;
        }
        self.facets.insert(definition.field.clone(), definition);
        true
    }

    pub fn clear(&mut self) {
        self.facets.clear();
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FacetDefinition> {
        self.facets.get(field)
    }

    #[must_use]
    pub fn is_multi_select(&self, field: &str) -> bool {
        self.facets
            .get(field)
            .is_some_and(|definition| definition.multi_select)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.facets.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.facets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    #[must_use]
    pub fn emit_request_params(&self) -> ParamSet {
        let mut params = ParamSet::new();
        if self.facets.is_empty() {
            return params;
        }
        params.set(PARAM_FACET, "true");
        for definition in self.facets.values() {
            let field = definition.field.as_str();
            let local = exclusion_local_params(definition);
            match &definition.kind {
                FacetKind::Term(term) => {
                    params.add(PARAM_FACET_FIELD, format!("{local}{field}"));
                    if let Some(limit) = term.limit {
                        params.set(field_param(field, "limit"), limit.to_string());
                    }
                    if let Some(min_count) = term.min_count {
                        params.set(field_param(field, "mincount"), min_count.to_string());
                    }
                    if let Some(sort) = &term.sort {
                        params.set(field_param(field, "sort"), sort.clone());
                    }
                    if let Some(missing) = term.missing {
                        params.set(field_param(field, "missing"), missing.to_string());
                    }
                }
                FacetKind::Range(range) => {
                    emit_range_params(
                        &mut params,
                        &local,
                        field,
                        [
                            range.start.to_string(),
                            range.end.to_string(),
                            range.gap.to_string(),
                        ],
                        range.hardened,
                    );
                }
                FacetKind::Date(date) => {
                    emit_range_params(
                        &mut params,
                        &local,
                        field,
                        [date.start.clone(), date.end.clone(), date.gap.clone()],
                        date.hardened,
                    );
                }
                FacetKind::Query(query) => {
                    for raw in &query.queries {
                        let raw = raw.trim();
                        let expression = if raw.starts_with('[') || raw.ends_with(']') {
                            raw.to_string()
                        } else {
                            escape_query_chars(raw)
                        };
                        params.add(PARAM_FACET_QUERY, format!("{local}{field}:{expression}"));
                    }
                }
            }
        }
        params
    }

    /// Maps raw engine counts back onto the registered facets.
    ///
    /// `request` holds the parameters the engine was queried with; facet
    /// prefixes found there are stripped from term bucket names.
    #[must_use]
    pub fn decode(
        &self,
        raw: &RawFacetSections,
        constraints: &[FilterConstraint],
        request: &ParamSet,
        localizer: &dyn Localizer,
    ) -> Vec<FacetResult> {
        let mut decoded: IndexMap<String, FacetResult> = IndexMap::new();

        for field_facet in &raw.fields {
            if self.get(&field_facet.field).is_none()
                && !LEADING_FIELDS.contains(&field_facet.field.as_str())
            {
                continue;
            }
            let result = self.decode_term(field_facet, constraints, request);
            decoded.insert(field_facet.field.clone(), result);
        }

        for range_facet in &raw.ranges {
            let Some(definition) = self.get(&range_facet.field) else {
                continue;
            };
            let mut result = self.empty_result(&range_facet.field);
            result.filters = build_buckets(range_facet, &definition.kind, constraints, localizer);
            decoded.insert(range_facet.field.clone(), result);
        }

        for count in &raw.queries {
            if count.count == 0 {
                continue;
            }
            let Some((field, expression)) = split_facet_query(&count.name) else {
                continue;
            };
            let filter_query = format!("{field}:{expression}");
            let name = unescape_query_chars(expression);
            let filter = FacetFilter {
                display_name: unescape_query_chars(&range_display_name(
                    localizer, field, expression,
                )),
                count: count.count,
                navigation_path: navigation_path(constraints, field, &name, &filter_query),
                selected: is_selected(constraints, field, &name),
                filter_query,
            };
            decoded
                .entry(field.to_string())
                .or_insert_with(|| self.empty_result(field))
                .filters
                .push(filter);
        }

        let mut ordered = Vec::with_capacity(decoded.len());
        for field in LEADING_FIELDS {
            if let Some(result) = decoded.shift_remove(field) {
                ordered.push(result);
            }
        }
        for field in self.facets.keys() {
            if let Some(result) = decoded.shift_remove(field.as_str()) {
                ordered.push(result);
            }
        }
        ordered
    }

    fn empty_result(&self, field: &str) -> FacetResult {
        let definition = self.get(field);
        let mut metadata = BTreeMap::new();
        if let Some(ui_type) = definition
            .and_then(|definition| definition.ui_type.as_deref())
            .filter(|ui_type| !ui_type.trim().is_empty())
        {
            metadata.insert(UI_WIDGET_TYPE.to_string(), ui_type.to_string());
        }
        FacetResult {
            field: field.to_string(),
            name: definition.map_or_else(|| field.to_string(), |d| d.display_name.clone()),
            multi_select: definition.is_some_and(|d| d.multi_select),
            min_buckets: definition.map_or(DEFAULT_MIN_BUCKETS, |d| d.min_buckets),
            metadata,
            filters: Vec::new(),
        }
    }

    fn decode_term(
        &self,
        raw: &RawFieldFacet,
        constraints: &[FilterConstraint],
        request: &ParamSet,
    ) -> FacetResult {
        let field = raw.field.as_str();
        let mut result = self.empty_result(field);
        let prefix = request.get(&prefix_param(field));
        let blacklist = self
            .get(field)
            .map(|definition| definition.blacklist.as_slice())
            .unwrap_or_default();

        for RawCount { name, count } in &raw.values {
            let display_name = prefix
                .and_then(|prefix| name.strip_prefix(prefix))
                .unwrap_or(name);
            if blacklist.iter().any(|hidden| hidden == display_name) {
                continue;
            }
            let filter_query = format!("{field}:{}", escape_query_chars(name));
            result.filters.push(FacetFilter {
                display_name: display_name.to_string(),
                count: *count,
                navigation_path: navigation_path(constraints, field, name, &filter_query),
                selected: is_selected(constraints, field, name),
                filter_query,
            });
        }
        result
    }
}

fn emit_range_params(
    params: &mut ParamSet,
    local: &str,
    field: &str,
    [start, end, gap]: [String; 3],
    hardened: bool,
) {
    params.add(PARAM_FACET_RANGE, format!("{local}{field}"));
    params.set(range_param(field, "start"), start);
    params.set(range_param(field, "end"), end);
    params.set(range_param(field, "gap"), gap);
    params.set(range_param(field, "hardened"), hardened.to_string());
    params.set(field_param(field, "mincount"), "1");
    params.add(range_param(field, "include"), "lower");
    params.add(range_param(field, "other"), "before");
    params.add(range_param(field, "other"), "after");
}

/// Splits `{!ex=f}f:expression` into field and expression.
fn split_facet_query(raw: &str) -> Option<(&str, &str)> {
    let (field, expression) = raw.split_once(':')?;
    let field = field.rsplit_once('}').map_or(field, |(_, field)| field).trim();
    if field.is_empty() || expression.is_empty() {
        return None;
    }
    Some((field, expression))
}
