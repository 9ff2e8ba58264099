use crate::models::{BoostBy, RankingDirective};

pub const NEUTRAL_BOOST: &str = "1.0";

const STRENGTH_FACTORS: [(&str, &str); 9] = [
    ("maximum_demote", "0.1"),
    ("strong_demote", "0.2"),
    ("medium_demote", "0.5"),
    ("weak_demote", "0.6666667"),
    ("neutral", NEUTRAL_BOOST),
    ("weak_boost", "1.5"),
    ("medium_boost", "2.0"),
    ("strong_boost", "5.0"),
    ("maximum_boost", "10.0"),
];

/// Maps a strength name (`maximum_boost`, `Maximum Boost`, ...) to its factor.
/// Unknown strengths are neutral.
#[must_use]
pub fn map_strength(strength: &str) -> &'static str {
    let normalized = strength
        .trim()
        .to_ascii_lowercase()
        .replace([' ', '-'], "_");
    STRENGTH_FACTORS
        .iter()
        .find(|(name, _)| *name == normalized)
        .map_or(NEUTRAL_BOOST, |(_, factor)| factor)
}

#[must_use]
pub fn boost_value(ranking: &RankingDirective) -> String {
    match ranking.boost_by {
        BoostBy::Factor => map_strength(ranking.strength.as_deref().unwrap_or_default()).to_string(),
        BoostBy::Attribute => ranking
            .attribute
            .as_deref()
            .map(str::trim)
            .filter(|attribute| !attribute.is_empty())
            .unwrap_or(NEUTRAL_BOOST)
            .to_string(),
    }
}

/// `if(matches(<filter>),<boost>,1.0)`, or the bare boost for an empty filter.
#[must_use]
pub fn ranking_function(condition_filter: &str, boost: &str) -> String {
    if condition_filter.trim().is_empty() {
        boost.to_string()
    } else {
        format!("if(matches({condition_filter}),{boost},{NEUTRAL_BOOST})")
    }
}

#[cfg(test)]
mod tests {
    use super::{boost_value, map_strength, ranking_function};
    use crate::models::{BoostBy, RankingDirective};

    #[test]
    fn strength_scale_spans_demote_to_boost() {
        assert_eq!(map_strength("maximum_boost"), "10.0");
        assert_eq!(map_strength("maximum_demote"), "0.1");
        assert_eq!(map_strength("Weak Demote"), "0.6666667");
        assert_eq!(map_strength("medium-boost"), "2.0");
        assert_eq!(map_strength("unknown"), "1.0");
        assert_eq!(map_strength(""), "1.0");
    }

    #[test]
    fn attribute_boost_uses_attribute_name() {
        let attribute = RankingDirective {
            boost_by: BoostBy::Attribute,
            strength: None,
            attribute: Some("sellRank".to_string()),
        };
        assert_eq!(boost_value(&attribute), "sellRank");
        let missing = RankingDirective {
            boost_by: BoostBy::Attribute,
            ..RankingDirective::default()
        };
        assert_eq!(boost_value(&missing), "1.0");
    }

    #[test]
    fn empty_condition_degenerates_to_boost_value() {
        assert_eq!(
            ranking_function("brandId:88", "10.0"),
            "if(matches(brandId:88),10.0,1.0)"
        );
        assert_eq!(ranking_function("", "5.0"), "5.0");
    }
}
