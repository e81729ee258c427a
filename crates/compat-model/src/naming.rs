//! Display-name derivation and truncation
//!
//! The identity store keeps a human-readable name for every model. Names are
//! derived from the model's object name and must stay under
//! [`DISPLAY_NAME_LIMIT`] characters.

use std::borrow::Cow;

/// Names with this many characters or more are truncated
pub const DISPLAY_NAME_LIMIT: usize = 40;

/// Characters kept from a truncated name
pub const TRUNCATED_PREFIX_LEN: usize = 36;

/// Suffix appended to truncated names
pub const ELLIPSIS: &str = "...";

/// Convert a `CamelCase` object name into a lowercase, space separated name
///
/// A space is inserted before an uppercase letter that follows a lowercase
/// one, or that starts a new word inside an acronym run
/// (`HTTPRequest` → `http request`).
#[must_use]
pub fn camel_case_to_spaces(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev_lower = chars[i - 1].is_lowercase();
            let next_lower = chars.get(i + 1).is_some_and(|n| !n.is_uppercase());
            if prev_lower || next_lower {
                out.push(' ');
            }
        }
        out.extend(c.to_lowercase());
    }

    out.trim().to_string()
}

/// Truncate a display name so it always fits the identity schema
///
/// Names of [`DISPLAY_NAME_LIMIT`] characters or more keep their first
/// [`TRUNCATED_PREFIX_LEN`] characters followed by [`ELLIPSIS`]; shorter
/// names are returned unchanged. Lengths count `char`s, not bytes.
#[must_use]
pub fn truncate_display_name(name: &str) -> Cow<'_, str> {
    if name.chars().count() < DISPLAY_NAME_LIMIT {
        return Cow::Borrowed(name);
    }

    let mut truncated: String = name.chars().take(TRUNCATED_PREFIX_LEN).collect();
    truncated.push_str(ELLIPSIS);
    Cow::Owned(truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn camel_case_simple() {
        assert_eq!(camel_case_to_spaces("Article"), "article");
        assert_eq!(camel_case_to_spaces("BlogArticle"), "blog article");
    }

    #[test]
    fn camel_case_acronym() {
        assert_eq!(camel_case_to_spaces("HTTPRequest"), "http request");
        assert_eq!(camel_case_to_spaces("ModelURL"), "model url");
    }

    #[test]
    fn short_name_is_borrowed() {
        let name = "article";
        assert!(matches!(truncate_display_name(name), Cow::Borrowed("article")));
    }

    #[test]
    fn limit_minus_one_passes_through() {
        let name = "a".repeat(DISPLAY_NAME_LIMIT - 1);
        assert_eq!(truncate_display_name(&name), name);
    }

    #[test]
    fn exactly_at_limit_is_truncated() {
        let name = "b".repeat(DISPLAY_NAME_LIMIT);
        let out = truncate_display_name(&name);
        assert_eq!(out, format!("{}...", "b".repeat(36)));
        assert_eq!(out.chars().count(), 39);
    }

    #[test]
    fn multibyte_names_count_chars() {
        let name = "é".repeat(45);
        let out = truncate_display_name(&name);
        assert_eq!(out.chars().count(), 39);
        assert!(out.starts_with(&"é".repeat(36)));
    }

    proptest! {
        #[test]
        fn prop_truncation_contract(name in "\\PC{0,80}") {
            let len = name.chars().count();
            let out = truncate_display_name(&name);

            prop_assert!(out.chars().count() <= 39);
            if len >= DISPLAY_NAME_LIMIT {
                let expected: String = name.chars().take(36).chain("...".chars()).collect();
                prop_assert_eq!(&*out, expected.as_str());
            } else {
                prop_assert_eq!(&*out, name.as_str());
            }
        }
    }
}
