use super::path::{is_selected, navigation_path};
use crate::localization::{BucketKind, Localizer};
use crate::models::{FacetFilter, FacetKind, FilterConstraint, RawRangeFacet};

const OPEN_BOUND: &str = "*";

/// Bounds of a range or date facet as the reconstructor needs them.
struct BucketPolicy {
    start: String,
    end: String,
    /// Terminal boundary when the last bucket is not fixed by `end`.
    computed_gap: Option<i64>,
    numeric: bool,
}

impl BucketPolicy {
    fn from_kind(kind: &FacetKind) -> Option<Self> {
        match kind {
            FacetKind::Range(params) => Some(Self {
                start: params.start.to_string(),
                end: params.end.to_string(),
                computed_gap: (!params.hardened).then_some(params.gap),
                numeric: true,
            }),
            FacetKind::Date(params) => Some(Self {
                start: params.start.clone(),
                end: params.end.clone(),
                computed_gap: None,
                numeric: false,
            }),
            FacetKind::Term(_) | FacetKind::Query(_) => None,
        }
    }

    fn terminal(&self, last_value: &str) -> String {
        match self.computed_gap {
            Some(gap) => last_value
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .and_then(|value| (value.round() as i64).checked_add(gap))
                .map_or_else(|| self.end.clone(), |terminal| terminal.to_string()),
            None => self.end.clone(),
        }
    }

    /// A start below the first reported value opens the first bucket.
    fn leading_start(&self, first_value: &str) -> Option<String> {
        if !self.numeric {
            return None;
        }
        let start = self.start.parse::<f64>().ok()?;
        let first = first_value.parse::<f64>().ok()?;
        (first > start).then(|| self.start.clone())
    }

    fn display(&self, value: &str) -> String {
        if self.numeric {
            remove_decimals(value)
        } else {
            value.to_string()
        }
    }
}

fn remove_decimals(value: &str) -> String {
    match value.split_once('.') {
        Some((whole, _)) if value.parse::<f64>().is_ok() => whole.to_string(),
        _ => value.to_string(),
    }
}

struct BucketWriter<'a> {
    field: &'a str,
    constraints: &'a [FilterConstraint],
    localizer: &'a dyn Localizer,
}

impl BucketWriter<'_> {
    fn bucket(&self, kind: BucketKind, v1: &str, v2: &str, count: u64) -> FacetFilter {
        let expression = format!("[{v1} TO {v2}]");
        let filter_query = format!("{}:{expression}", self.field);
        FacetFilter {
            display_name: self.localizer.name_for(self.field, kind, v1, v2),
            count,
            navigation_path: navigation_path(self.constraints, self.field, &expression, &filter_query),
            selected: is_selected(self.constraints, self.field, &expression),
            filter_query,
        }
    }
}

/// Converts sparse range counts into display buckets.
///
/// Boundaries are the reported values, preceded by the configured start when
/// it lies below the first value, and closed by `end` (hardened or date facets)
/// or by the rounded last value plus the gap. Bucket `i` takes the `i`-th
/// reported count. Before/after buckets appear only with a non-zero count.
#[must_use]
pub fn build_buckets(
    raw: &RawRangeFacet,
    kind: &FacetKind,
    constraints: &[FilterConstraint],
    localizer: &dyn Localizer,
) -> Vec<FacetFilter> {
    let Some(policy) = BucketPolicy::from_kind(kind) else {
        return Vec::new();
    };
    let writer = BucketWriter {
        field: &raw.field,
        constraints,
        localizer,
    };
    let mut filters = Vec::with_capacity(raw.counts.len() + 3);

    if let Some(before) = raw.before.filter(|count| *count > 0) {
        filters.push(writer.bucket(
            BucketKind::Before,
            OPEN_BOUND,
            &policy.display(&policy.start),
            before,
        ));
    }

    if let (Some(first), Some(last)) = (raw.counts.first(), raw.counts.last()) {
        let mut boundaries: Vec<String> = Vec::with_capacity(raw.counts.len() + 2);
        boundaries.extend(policy.leading_start(&first.name));
        boundaries.extend(raw.counts.iter().map(|count| count.name.clone()));
        boundaries.push(policy.terminal(&last.name));

        for (idx, pair) in boundaries.windows(2).enumerate() {
            let count = raw.counts.get(idx).map_or(0, |count| count.count);
            filters.push(writer.bucket(
                BucketKind::InRange,
                &policy.display(&pair[0]),
                &policy.display(&pair[1]),
                count,
            ));
        }
    }

    if let Some(after) = raw.after.filter(|count| *count > 0) {
        filters.push(writer.bucket(
            BucketKind::After,
            &policy.display(&policy.end),
            OPEN_BOUND,
            after,
        ));
    }
    filters
}
