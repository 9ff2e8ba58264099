#[must_use]
pub(super) fn read_non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[must_use]
pub(super) fn read_env_usize(name: &str, default_value: usize, min_value: usize) -> usize {
    parse_usize_at_least(std::env::var(name).ok().as_deref(), min_value).unwrap_or(default_value)
}

#[must_use]
pub(super) fn parse_usize_at_least(raw: Option<&str>, min_value: usize) -> Option<usize> {
    raw.and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|value| *value >= min_value)
}

#[cfg(test)]
mod tests {
    use super::parse_usize_at_least;

    #[test]
    fn usize_parser_enforces_lower_bound_and_trims() {
        assert_eq!(parse_usize_at_least(Some(" 25 "), 1), Some(25));
        assert_eq!(parse_usize_at_least(Some("0"), 1), None);
        assert_eq!(parse_usize_at_least(Some("many"), 1), None);
        assert_eq!(parse_usize_at_least(None, 1), None);
    }
}
