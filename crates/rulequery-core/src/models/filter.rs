use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleQueryError};

/// Separates constraints inside a navigation path.
pub const PATH_SEPARATOR: char = '|';
pub const FIELD_SEPARATOR: char = ':';
pub const CATEGORY_SEPARATOR: char = '.';
pub const CATEGORY_FIELD: &str = "category";

const QUERY_SYNTAX_CHARS: &[char] = &[
    '\\', '+', '-', '!', '(', ')', ':', '^', '[', ']', '"', '{', '}', '~', '*', '?', '|', '&', ';',
    '/',
];

fn is_query_syntax_char(ch: char) -> bool {
    QUERY_SYNTAX_CHARS.contains(&ch) || ch.is_whitespace()
}

#[must_use]
pub fn escape_query_chars(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    for ch in raw.chars() {
        if is_query_syntax_char(ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[must_use]
pub fn unescape_query_chars(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.peek().copied()
                && is_query_syntax_char(next)
            {
                out.push(next);
                chars.next();
                continue;
            }
        }
        out.push(ch);
    }
    out
}

/// Splits `raw` on `separator` occurrences that are not preceded by a backslash.
fn split_unescaped(raw: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (idx, ch) in raw.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
        } else if ch == separator {
            parts.push(&raw[start..idx]);
            start = idx + ch.len_utf8();
        }
    }
    parts.push(&raw[start..]);
    parts
}

/// One active narrowing condition, kept in its escaped wire form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConstraint {
    pub field: String,
    pub expression: String,
}

impl FilterConstraint {
    pub fn new(field: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expression: expression.into(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let mut parts = split_unescaped(raw, FIELD_SEPARATOR).into_iter();
        let field = parts.next().unwrap_or_default();
        let consumed = field.len() + FIELD_SEPARATOR.len_utf8();
        if field.is_empty() || consumed > raw.len() {
            return Err(RuleQueryError::MalformedInput(format!(
                "invalid filter constraint: {raw}"
            )));
        }
        let expression = &raw[consumed..];
        if expression.trim().is_empty() {
            return Err(RuleQueryError::MalformedInput(format!(
                "invalid filter constraint: {raw}"
            )));
        }
        Ok(Self::new(field, expression))
    }

    /// Parses a `|`-separated navigation path; a blank path has no constraints.
    pub fn parse_path(path: &str) -> Result<Vec<Self>> {
        if path.trim().is_empty() {
            return Ok(Vec::new());
        }
        split_unescaped(path, PATH_SEPARATOR)
            .into_iter()
            .filter(|part| !part.trim().is_empty())
            .map(Self::parse)
            .collect()
    }

    #[must_use]
    pub fn unescaped_expression(&self) -> String {
        unescape_query_chars(&self.expression)
    }

    #[must_use]
    pub fn is_category(&self) -> bool {
        self.field == CATEGORY_FIELD
    }

    /// Bounds of a `[v1 TO v2]` expression.
    #[must_use]
    pub fn range_bounds(&self) -> Option<(&str, &str)> {
        parse_range_expression(&self.expression)
    }
}

impl fmt::Display for FilterConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.field, FIELD_SEPARATOR, self.expression)
    }
}

#[must_use]
pub fn parse_range_expression(expression: &str) -> Option<(&str, &str)> {
    let inner = expression.strip_prefix('[')?.strip_suffix(']')?;
    let (low, high) = inner.split_once(" TO ")?;
    let (low, high) = (low.trim(), high.trim());
    if low.is_empty() || high.is_empty() {
        return None;
    }
    Some((low, high))
}

/// Joins constraints into a navigation path, dropping `skip` and putting
/// `replacement` in its place when given.
#[must_use]
pub fn create_path(
    constraints: &[FilterConstraint],
    skip: Option<&FilterConstraint>,
    replacement: Option<&str>,
) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(constraints.len());
    for constraint in constraints {
        if Some(constraint) == skip {
            if let Some(replacement) = replacement.filter(|value| !value.is_empty()) {
                parts.push(replacement.to_string());
            }
        } else {
            parts.push(constraint.to_string());
        }
    }
    parts.join(&PATH_SEPARATOR.to_string())
}

/// Hierarchical category token `depth.catalogId.segment1.segment2...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryToken {
    pub depth: usize,
    pub catalog_id: String,
    pub segments: Vec<String>,
}

impl CategoryToken {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.split(CATEGORY_SEPARATOR);
        let depth = parts
            .next()
            .and_then(|value| value.trim().parse::<usize>().ok())
            .ok_or_else(|| {
                RuleQueryError::MalformedInput(format!("invalid category token: {raw}"))
            })?;
        let catalog_id = parts
            .next()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                RuleQueryError::MalformedInput(format!("invalid category token: {raw}"))
            })?
            .to_string();
        let segments = parts
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Self {
            depth,
            catalog_id,
            segments,
        })
    }

    /// Token for the first `len` segments, with depth equal to `len`.
    #[must_use]
    pub fn ancestor(&self, len: usize) -> String {
        let len = len.min(self.segments.len());
        let mut token = format!("{len}{CATEGORY_SEPARATOR}{}", self.catalog_id);
        for segment in &self.segments[..len] {
            token.push(CATEGORY_SEPARATOR);
            token.push_str(segment);
        }
        token
    }

    /// Prefix shared by the children of this token in the category facet.
    /// Facet values come back unescaped, so the segments are unescaped too.
    #[must_use]
    pub fn child_prefix(&self) -> String {
        let mut prefix = format!("{}{CATEGORY_SEPARATOR}{}", self.depth + 1, self.catalog_id);
        for segment in &self.segments {
            prefix.push(CATEGORY_SEPARATOR);
            prefix.push_str(&unescape_query_chars(segment));
        }
        prefix.push(CATEGORY_SEPARATOR);
        prefix
    }
}
