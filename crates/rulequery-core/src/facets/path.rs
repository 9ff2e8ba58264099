use crate::models::{FilterConstraint, PATH_SEPARATOR, create_path};

/// Constraint that a bucket named `name` on `field` would replace or remove.
/// Any active category constraint stands in for every category bucket.
fn selected_constraint<'a>(
    constraints: &'a [FilterConstraint],
    field: &str,
    name: &str,
) -> Option<&'a FilterConstraint> {
    constraints.iter().rev().find(|constraint| {
        constraint.field == field
            && (constraint.is_category() || constraint.unescaped_expression() == name)
    })
}

#[must_use]
pub fn is_selected(constraints: &[FilterConstraint], field: &str, name: &str) -> bool {
    constraints
        .iter()
        .any(|constraint| constraint.field == field && constraint.unescaped_expression() == name)
}

/// Path reached by clicking a bucket: the removal path when the bucket is
/// already active, otherwise the other constraints plus `filter_query`.
#[must_use]
pub fn navigation_path(
    constraints: &[FilterConstraint],
    field: &str,
    name: &str,
    filter_query: &str,
) -> String {
    let selected = selected_constraint(constraints, field, name);
    let path = create_path(constraints, selected, None);
    match selected {
        Some(constraint) if !constraint.is_category() => path,
        _ if path.is_empty() => filter_query.to_string(),
        _ => format!("{path}{PATH_SEPARATOR}{filter_query}"),
    }
}
