//! Name normalization — snake/kebab identifiers to PascalCase.
//!
//! Results are memoized process-wide. The memo is keyed by raw field name and
//! never evicted; its size is bounded by the number of distinct field names the
//! application declares on its entities.

use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};

/// Prefix of derived setter method names.
pub const DEFAULT_SETTER_PREFIX: &str = "set";

static STUDLY_CACHE: LazyLock<RwLock<HashMap<String, String>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Convert `first_name` / `first-name` / `first name` to `FirstName`.
///
/// Idempotent: an already PascalCase token is returned unchanged.
pub fn studly(name: &str) -> String {
    {
        let cache = STUDLY_CACHE.read().unwrap_or_else(|e| e.into_inner());
        if let Some(hit) = cache.get(name) {
            return hit.clone();
        }
    }

    let converted = convert(name);
    tracing::trace!(name, converted = %converted, "studly cache miss");

    // Racing writers insert identical values.
    STUDLY_CACHE
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .insert(name.to_string(), converted.clone());
    converted
}

/// Derive a setter method name: `setter_name("set", "first_name") == "setFirstName"`.
pub fn setter_name(prefix: &str, field: &str) -> String {
    format!("{prefix}{}", studly(field))
}

fn convert(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut word_start = true;

    for ch in name.chars() {
        match ch {
            '-' | '_' | ' ' => word_start = true,
            c if c.is_whitespace() => {
                out.push(c);
                word_start = true;
            }
            c if word_start => {
                out.push(c.to_ascii_uppercase());
                word_start = false;
            }
            c => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_becomes_pascal() {
        assert_eq!(studly("first_name"), "FirstName");
    }

    #[test]
    fn kebab_case_becomes_pascal() {
        assert_eq!(studly("already-dashed"), "AlreadyDashed");
    }

    #[test]
    fn pascal_case_is_unchanged() {
        assert_eq!(studly("FirstName"), "FirstName");
        assert_eq!(studly(&studly("created_at")), studly("created_at"));
    }

    #[test]
    fn inner_capitals_are_preserved() {
        assert_eq!(studly("customerID"), "CustomerID");
        assert_eq!(studly("mixed_caseName"), "MixedCaseName");
    }

    #[test]
    fn repeated_and_edge_separators_collapse() {
        assert_eq!(studly("__id"), "Id");
        assert_eq!(studly("a__b--c"), "ABC");
        assert_eq!(studly(""), "");
    }

    #[test]
    fn setter_name_uses_prefix() {
        assert_eq!(setter_name(DEFAULT_SETTER_PREFIX, "first_name"), "setFirstName");
        assert_eq!(setter_name("with", "total"), "withTotal");
    }

    #[test]
    fn memo_is_consistent_across_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| studly("line_item_count")))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), "LineItemCount");
        }
    }
}
