use crate::catalog::CatalogSource;
use crate::models::{CATEGORY_FIELD, CategoryToken, LeafType, escape_query_chars};

pub(super) const CATEGORY_ID_FIELD: &str = "categoryId";
const OPEN_BOUND: &str = "*";

/// Locale and catalog a leaf is rendered for.
pub(super) struct LeafScope<'a> {
    pub catalog: &'a dyn CatalogSource,
    pub catalog_id: &'a str,
    pub country: &'a str,
}

/// Trims the value and drops one trailing list separator.
fn normalize_value(raw: &str) -> &str {
    let value = raw.trim();
    value.strip_suffix(',').map_or(value, str::trim_end)
}

pub(super) fn translate(leaf: LeafType, raw_value: &str, scope: &LeafScope<'_>) -> String {
    let value = normalize_value(raw_value);
    let country = scope.country;
    match leaf {
        LeafType::Category => category_filter(value, scope),
        LeafType::Brand => format!("brandId:{value}"),
        LeafType::Gender => format!("gender:{}", escape_query_chars(value)),
        LeafType::PctOff => format!("discountPercent{country}:[{value} TO 100]"),
        LeafType::Price => {
            let mut bounds = value.split_whitespace();
            let min = bounds.next().unwrap_or(OPEN_BOUND);
            let max = bounds.next().unwrap_or(OPEN_BOUND);
            format!("salePrice{country}:[{min} TO {max}]")
        }
        LeafType::ShowSale => format!("onsale{country}:{value}"),
        LeafType::PastSeason => format!("isPastSeason:{value}"),
        LeafType::Outlet => format!("isCloseout:{value}"),
        LeafType::Keyword => format!("keyword:{}", escape_query_chars(value)),
    }
}

/// Uses the category's search token for the current catalog, else its id.
pub(super) fn category_filter(category_id: &str, scope: &LeafScope<'_>) -> String {
    scope
        .catalog
        .search_tokens_for(category_id)
        .into_iter()
        .find(|token| {
            CategoryToken::parse(token).is_ok_and(|parsed| parsed.catalog_id == scope.catalog_id)
        })
        .map_or_else(
            || format!("{CATEGORY_ID_FIELD}:{category_id}"),
            |token| format!("{CATEGORY_FIELD}:{}", escape_query_chars(&token)),
        )
}

#[cfg(test)]
mod tests {
    use super::{LeafScope, translate};
    use crate::catalog::{CategoryRecord, InMemoryCatalog};
    use crate::models::LeafType;

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new(vec![CategoryRecord {
            id: "cat1".to_string(),
            search_tokens: vec!["1.catB.Men".to_string(), "1.catA.Men".to_string()],
            ..CategoryRecord::default()
        }])
    }

    #[test]
    fn leaves_map_to_locale_aware_fields() {
        let catalog = catalog();
        let scope = LeafScope {
            catalog: &catalog,
            catalog_id: "catA",
            country: "US",
        };
        assert_eq!(translate(LeafType::Brand, " 88, ", &scope), "brandId:88");
        assert_eq!(
            translate(LeafType::PctOff, "40", &scope),
            "discountPercentUS:[40 TO 100]"
        );
        assert_eq!(
            translate(LeafType::Price, "10 50", &scope),
            "salePriceUS:[10 TO 50]"
        );
        assert_eq!(
            translate(LeafType::Price, "10", &scope),
            "salePriceUS:[10 TO *]"
        );
        assert_eq!(translate(LeafType::ShowSale, "true", &scope), "onsaleUS:true");
        assert_eq!(translate(LeafType::PastSeason, "false", &scope), "isPastSeason:false");
        assert_eq!(translate(LeafType::Outlet, "true", &scope), "isCloseout:true");
        assert_eq!(
            translate(LeafType::Gender, "men's", &scope),
            "gender:men's"
        );
        assert_eq!(
            translate(LeafType::Keyword, "rain jacket", &scope),
            r"keyword:rain\ jacket"
        );
    }

    #[test]
    fn category_prefers_token_of_current_catalog() {
        let catalog = catalog();
        let scope = LeafScope {
            catalog: &catalog,
            catalog_id: "catA",
            country: "US",
        };
        assert_eq!(
            translate(LeafType::Category, "cat1", &scope),
            "category:1.catA.Men"
        );
        assert_eq!(
            translate(LeafType::Category, "cat9", &scope),
            "categoryId:cat9"
        );
    }
}
