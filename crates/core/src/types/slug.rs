//! URL slug generation for reference data.
//!
//! City slugs are derived from the city name and state abbreviation at
//! import time (e.g. "Brooklyn" + "NY" becomes `brooklyn-ny`) and are
//! unique across the catalog.

/// Turn arbitrary text into a lowercase hyphen-separated slug.
///
/// ASCII alphanumerics are kept, everything else collapses into a single
/// hyphen. Leading and trailing hyphens are trimmed.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn test_basic() {
        assert_eq!(slugify("Brooklyn NY"), "brooklyn-ny");
    }

    #[test]
    fn test_punctuation_collapses() {
        assert_eq!(slugify("Coeur d'Alene, ID"), "coeur-d-alene-id");
    }

    #[test]
    fn test_repeated_separators() {
        assert_eq!(slugify("  Salt   Lake  City UT "), "salt-lake-city-ut");
    }

    #[test]
    fn test_non_ascii_dropped() {
        assert_eq!(slugify("São Paulo"), "s-o-paulo");
    }

    #[test]
    fn test_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("---"), "");
    }
}
