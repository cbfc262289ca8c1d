//! Display name → URL-safe identifier.

use unicode_normalization::UnicodeNormalization;

/// Convert a display name into a lowercase, underscore-separated slug.
///
/// Compatibility-decomposes the input, drops anything that is not ASCII,
/// removes characters outside `[A-Za-z0-9_ -]`, and collapses runs of
/// whitespace and hyphens into a single `_`. Never fails: empty or fully
/// non-ASCII input yields an empty string.
///
/// ```rust
/// use tacofancy_core::slug::slugify;
///
/// assert_eq!(slugify("Salsa Verde"), "salsa_verde");
/// assert_eq!(slugify("Jalapeño-Lime  Crema"), "jalapeno_lime_crema");
/// ```
pub fn slugify(value: &str) -> String {
    let ascii: String = value.nfkd().filter(char::is_ascii).collect();
    let cleaned: String = ascii
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let mut slug = String::with_capacity(cleaned.len());
    let mut in_separator = false;
    for c in cleaned.chars() {
        if c == '-' || c.is_whitespace() {
            if !in_separator {
                slug.push('_');
                in_separator = true;
            }
        } else {
            slug.push(c);
            in_separator = false;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_and_case_are_normalized() {
        assert_eq!(slugify("Carnitas!"), slugify("carnitas"));
        assert_eq!(slugify("Carnitas!"), "carnitas");
    }

    #[test]
    fn empty_input_yields_empty_slug() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("   "), "");
    }

    #[test]
    fn non_ascii_is_decomposed_or_dropped() {
        assert_eq!(slugify("Pico de Gallo à la Señora"), "pico_de_gallo_a_la_senora");
        assert_eq!(slugify("タコス"), "");
    }

    #[test]
    fn separator_runs_collapse_to_one_underscore() {
        assert_eq!(slugify("Black -- Bean   Mash"), "black_bean_mash");
        assert_eq!(slugify("already_snake_case"), "already_snake_case");
        assert_eq!(slugify("Black\u{0B}Bean\t\u{0C}Mash"), "black_bean_mash");
    }

    #[test]
    fn deterministic() {
        let name = "Baja Fish (Beer-Battered)";
        assert_eq!(slugify(name), slugify(name));
        assert_eq!(slugify(name), "baja_fish_beer_battered");
    }
}
