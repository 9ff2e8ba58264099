use crate::localization::{Localizer, range_crumb_name};
use crate::models::{
    Breadcrumb, CATEGORY_FIELD, CategoryToken, FIELD_SEPARATOR, FilterConstraint, create_path,
    unescape_query_chars,
};

/// One breadcrumb per active constraint; a category constraint yields one per
/// level of its hierarchy.
#[must_use]
pub fn build_breadcrumbs(
    constraints: &[FilterConstraint],
    localizer: &dyn Localizer,
) -> Vec<Breadcrumb> {
    let mut crumbs = Vec::with_capacity(constraints.len());
    for constraint in constraints {
        if constraint.is_category()
            && let Ok(token) = CategoryToken::parse(&constraint.expression)
        {
            push_category_crumbs(constraint, &token, constraints, &mut crumbs);
            continue;
        }
        let expression = constraint.unescaped_expression();
        crumbs.push(Breadcrumb {
            field_name: constraint.field.clone(),
            display_expression: range_crumb_name(localizer, &constraint.field, &expression),
            removal_path: create_path(constraints, Some(constraint), None),
        });
    }
    crumbs
}

/// Removing a level truncates the hierarchy to its parent, in place; removing
/// the top level drops the category constraint.
fn push_category_crumbs(
    constraint: &FilterConstraint,
    token: &CategoryToken,
    constraints: &[FilterConstraint],
    crumbs: &mut Vec<Breadcrumb>,
) {
    for (level, segment) in token.segments.iter().enumerate() {
        let replacement = (level > 0)
            .then(|| format!("{CATEGORY_FIELD}{FIELD_SEPARATOR}{}", token.ancestor(level)));
        crumbs.push(Breadcrumb {
            field_name: constraint.field.clone(),
            display_expression: unescape_query_chars(segment),
            removal_path: create_path(constraints, Some(constraint), replacement.as_deref()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::build_breadcrumbs;
    use crate::localization::ResourceLocalizer;
    use crate::models::FilterConstraint;

    #[test]
    fn category_crumbs_truncate_to_parent_level() {
        let constraints = vec![FilterConstraint::new("category", "1.catA.Men.Jackets")];
        let crumbs = build_breadcrumbs(&constraints, &ResourceLocalizer::default());
        let summary: Vec<(&str, &str)> = crumbs
            .iter()
            .map(|crumb| (crumb.display_expression.as_str(), crumb.removal_path.as_str()))
            .collect();
        assert_eq!(summary, [("Men", ""), ("Jackets", "category:1.catA.Men")]);
    }

    #[test]
    fn category_truncation_keeps_other_constraints_in_order() {
        let constraints = vec![
            FilterConstraint::new("brand", "88"),
            FilterConstraint::new("category", r"3.catA.Men.Outerwear.Rain\ Jackets"),
            FilterConstraint::new("gender", "men"),
        ];
        let crumbs = build_breadcrumbs(&constraints, &ResourceLocalizer::default());
        assert_eq!(crumbs.len(), 5);
        assert_eq!(crumbs[0].removal_path, "category:3.catA.Men.Outerwear.Rain\\ Jackets|gender:men");
        assert_eq!(crumbs[1].removal_path, "brand:88|gender:men");
        assert_eq!(crumbs[2].removal_path, "brand:88|category:1.catA.Men|gender:men");
        assert_eq!(crumbs[3].display_expression, "Rain Jackets");
        assert_eq!(
            crumbs[3].removal_path,
            "brand:88|category:2.catA.Men.Outerwear|gender:men"
        );
        assert_eq!(crumbs[4].removal_path, "brand:88|category:3.catA.Men.Outerwear.Rain\\ Jackets");
    }

    #[test]
    fn range_constraints_use_crumb_templates() {
        let localizer = ResourceLocalizer::from_toml_str(
            "\"facet.range.salePriceUS.crumb\" = \"$${v1} - $${v2}\"",
        )
        .expect("resources");
        let constraints = vec![FilterConstraint::new("salePriceUS", "[100 TO 200]")];
        let crumbs = build_breadcrumbs(&constraints, &localizer);
        assert_eq!(crumbs[0].display_expression, "$100 - $200");
        assert_eq!(crumbs[0].removal_path, "");
    }

    #[test]
    fn catalog_root_token_has_no_crumbs() {
        let constraints = vec![FilterConstraint::new("category", "0.catA")];
        assert!(build_breadcrumbs(&constraints, &ResourceLocalizer::default()).is_empty());
        assert!(build_breadcrumbs(&[], &ResourceLocalizer::default()).is_empty());
    }
}
