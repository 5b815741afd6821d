// ── Normalization helpers ──
//
// Bridges the two value vocabularies every resource deals with: the
// device's wire forms (`enabled`/`disabled` strings, sentinel numerics,
// `/Partition/name` references) and the user-facing forms in a
// declaration (booleans, keywords like "indefinite", bare names).

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::CoreError;

pub use bigsync_api::rest::transform_name;

/// Qualify a bare object name with a partition: `foo` → `/Common/foo`.
///
/// Names that already carry a folder path pass through untouched.
pub fn fq_name(partition: &str, name: &str) -> String {
    if name.starts_with('/') {
        name.to_owned()
    } else {
        format!("/{partition}/{name}")
    }
}

/// Render a bool in the device's `enabled`/`disabled` vocabulary.
pub fn on_off(value: bool) -> &'static str {
    if value { "enabled" } else { "disabled" }
}

/// Parse a device flag string (`enabled`/`disabled`, `yes`/`no`,
/// `true`/`false`) into a bool. Unknown strings map to `None`.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw {
        "enabled" | "yes" | "true" => Some(true),
        "disabled" | "no" | "false" => Some(false),
        _ => None,
    }
}

/// `""` and `"none"` are equivalent "unset" markers, both in user input
/// and in values the device reports.
pub fn is_none_marker(raw: &str) -> bool {
    raw.is_empty() || raw == "none"
}

/// Order-insensitive list comparison.
///
/// Returns the desired list when the value sets differ, `None` when they
/// match. A desired list consisting of a single `""`/`"none"` entry means
/// "clear the attribute": it yields an empty list if the device has
/// values, and no change if it has none.
pub fn cmp_simple_list(want: Option<&[String]>, have: Option<&[String]>) -> Option<Vec<String>> {
    let want = want?;
    let clearing = want.len() == 1 && is_none_marker(&want[0]);
    let want_set: BTreeSet<&str> = if clearing {
        BTreeSet::new()
    } else {
        want.iter().map(String::as_str).collect()
    };
    let have_set: BTreeSet<&str> = have
        .map(|h| h.iter().map(String::as_str).collect())
        .unwrap_or_default();

    if want_set == have_set {
        return None;
    }
    if clearing {
        Some(Vec::new())
    } else {
        Some(want.to_vec())
    }
}

/// A numeric parameter that also accepts a device keyword
/// (`"indefinite"`, `"default"`) in user input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NumericOrKeyword {
    Number(u64),
    Keyword(String),
}

impl NumericOrKeyword {
    /// Resolve to the wire value: the keyword maps to its sentinel, a
    /// number must fall inside `range`.
    pub fn resolve(
        &self,
        field: &str,
        keyword: &str,
        sentinel: u64,
        range: RangeInclusive<u64>,
    ) -> Result<u64, CoreError> {
        let out_of_range = || {
            CoreError::validation(
                field,
                format!(
                    "must be in range {} - {}, or '{keyword}'",
                    range.start(),
                    range.end()
                ),
            )
        };
        match self {
            Self::Number(n) if range.contains(n) => Ok(*n),
            Self::Number(_) => Err(out_of_range()),
            Self::Keyword(k) if k == keyword => Ok(sentinel),
            Self::Keyword(_) => Err(out_of_range()),
        }
    }
}

/// Validate a plain numeric range, mirroring the device's own limits.
pub fn check_range(field: &str, value: u64, range: RangeInclusive<u64>) -> Result<u64, CoreError> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(CoreError::validation(
            field,
            format!("must be in range {} - {}", range.start(), range.end()),
        ))
    }
}

// ── Report rendering ────────────────────────────────────────────────

/// Render an optional flag as `yes`/`no` for change reports.
pub(crate) fn flag_report(value: Option<bool>) -> Value {
    match value {
        Some(true) => json!("yes"),
        Some(false) => json!("no"),
        None => Value::Null,
    }
}

/// Render an optional string for change reports.
pub(crate) fn str_report(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |s| json!(s))
}

/// Render an optional number for change reports, substituting a keyword
/// for its sentinel value.
pub(crate) fn sentinel_report(value: Option<u64>, sentinel: u64, keyword: &str) -> Value {
    match value {
        Some(v) if v == sentinel => json!(keyword),
        Some(v) => json!(v),
        None => Value::Null,
    }
}

/// Render an optional number for change reports.
pub(crate) fn num_report(value: Option<u64>) -> Value {
    value.map_or(Value::Null, |v| json!(v))
}

/// Render an optional list for change reports.
pub(crate) fn list_report(value: Option<&[String]>) -> Value {
    value.map_or(Value::Null, |v| json!(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fq_name_qualifies_bare_names() {
        assert_eq!(fq_name("Common", "foo"), "/Common/foo");
        assert_eq!(fq_name("Tenant1", "foo"), "/Tenant1/foo");
    }

    #[test]
    fn fq_name_passes_qualified_names_through() {
        assert_eq!(fq_name("Common", "/Tenant1/foo"), "/Tenant1/foo");
    }

    #[test]
    fn parse_flag_covers_device_vocabularies() {
        assert_eq!(parse_flag("enabled"), Some(true));
        assert_eq!(parse_flag("disabled"), Some(false));
        assert_eq!(parse_flag("yes"), Some(true));
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag("sometimes"), None);
    }

    #[test]
    fn cmp_simple_list_ignores_order() {
        let want = vec!["b".to_owned(), "a".to_owned()];
        let have = vec!["a".to_owned(), "b".to_owned()];
        assert_eq!(cmp_simple_list(Some(&want), Some(&have)), None);
    }

    #[test]
    fn cmp_simple_list_returns_want_on_difference() {
        let want = vec!["a".to_owned(), "c".to_owned()];
        let have = vec!["a".to_owned(), "b".to_owned()];
        assert_eq!(
            cmp_simple_list(Some(&want), Some(&have)),
            Some(want.clone())
        );
    }

    #[test]
    fn cmp_simple_list_clears_with_none_marker() {
        let want = vec![String::new()];
        let have = vec!["a".to_owned()];
        assert_eq!(cmp_simple_list(Some(&want), Some(&have)), Some(Vec::new()));
        assert_eq!(cmp_simple_list(Some(&want), None), None);
    }

    #[test]
    fn numeric_or_keyword_resolves() {
        let n = NumericOrKeyword::Number(300);
        assert_eq!(
            n.resolve("idle_timeout", "indefinite", 4_294_967_295, 1..=4_294_967_295)
                .ok(),
            Some(300)
        );

        let k = NumericOrKeyword::Keyword("indefinite".into());
        assert_eq!(
            k.resolve("idle_timeout", "indefinite", 4_294_967_295, 1..=4_294_967_295)
                .ok(),
            Some(4_294_967_295)
        );

        let bad = NumericOrKeyword::Keyword("forever".into());
        assert!(
            bad.resolve("idle_timeout", "indefinite", 4_294_967_295, 1..=4_294_967_295)
                .is_err()
        );
    }
}
