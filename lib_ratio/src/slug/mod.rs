//! # Slug Codec
//!
//! Bidirectional mapping between entity names and URL-safe slugs.
//!
//! - [`entity_to_slug`] is pure and total. It is not injective: two names
//!   may collapse to the same slug, and the resolver decides who wins.
//! - [`STATIC_SLUGS`] is the curated override table for names that do not
//!   round-trip through the lowercase/hyphen transform.
//! - [`resolver`] builds the data-derived table and answers slug lookups.

#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use regex::Regex;
use static_init::dynamic;

/// Data-derived slug table and slug lookup.
pub mod resolver;

pub use resolver::{SlugResolver, SlugTable};

/// Curated slug -> entity overrides. These always win over the table
/// derived from the data.
pub const STATIC_SLUGS: &[(&str, &str)] = &[
    ("south-korea", "South Korea"),
    ("sweden", "Sweden"),
    ("japan", "Japan"),
    ("united-states", "United States"),
    ("united-kingdom", "United Kingdom"),
    ("europe", "Europe (UN)"),
];

#[dynamic]
static WHITESPACE_RUNS: Regex = Regex::new(r"\s+").expect("valid whitespace pattern");

#[dynamic]
static PARENTHESES: Regex = Regex::new(r"[()]").expect("valid parentheses pattern");

#[dynamic]
static HYPHEN_RUNS: Regex = Regex::new(r"--+").expect("valid hyphen pattern");

/// Converts an entity name to its URL slug.
///
/// Lower-cases, turns whitespace runs into a single hyphen, drops
/// parentheses, collapses repeated hyphens and trims hyphens at both ends.
///
/// ```
/// use lib_ratio::slug::entity_to_slug;
///
/// assert_eq!(entity_to_slug("South Korea"), "south-korea");
/// assert_eq!(entity_to_slug("Europe (UN)"), "europe-un");
/// ```
pub fn entity_to_slug(entity: &str) -> String {
    let lowered = entity.to_lowercase();
    let hyphenated = WHITESPACE_RUNS.replace_all(&lowered, "-");
    let bare = PARENTHESES.replace_all(&hyphenated, "");
    let collapsed = HYPHEN_RUNS.replace_all(&bare, "-");
    collapsed.trim_matches('-').to_string()
}

/// Looks a slug up in the curated override table.
pub fn static_entity(slug: &str) -> Option<&'static str> {
    STATIC_SLUGS
        .iter()
        .find(|(s, _)| *s == slug)
        .map(|(_, entity)| *entity)
}

/// Best-effort reconstruction of an entity name from a slug: hyphens become
/// spaces and each word is capitalised. The result may not name any real
/// entity.
///
/// ```
/// use lib_ratio::slug::title_case;
///
/// assert_eq!(title_case("atlantis"), "Atlantis");
/// assert_eq!(title_case("new-zealand"), "New Zealand");
/// ```
pub fn title_case(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Uppercases the first letter only when the result lowercases back to it,
/// so `entity_to_slug` inverts the change. `ß` (uppercase `SS`) and dotless
/// `ı` (uppercase `I`) are left as they are.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut upper = first.to_uppercase();
    let head = match (upper.next(), upper.next()) {
        (Some(single), None) if single.to_lowercase().eq(first.to_lowercase()) => single,
        _ => first,
    };
    std::iter::once(head).chain(chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_for_plain_and_qualified_names() {
        assert_eq!(entity_to_slug("South Korea"), "south-korea");
        assert_eq!(entity_to_slug("Europe (UN)"), "europe-un");
        assert_eq!(entity_to_slug("Japan"), "japan");
        assert_eq!(entity_to_slug("Guinea-Bissau"), "guinea-bissau");
    }

    #[test]
    fn slug_normalises_whitespace_and_hyphens() {
        assert_eq!(entity_to_slug("  Upper   middle\tincome  "), "upper-middle-income");
        assert_eq!(entity_to_slug("Less developed regions, excluding China (UN)"), "less-developed-regions,-excluding-china-un");
        assert_eq!(entity_to_slug("(Low) - income"), "low-income");
        assert_eq!(entity_to_slug("---"), "");
        assert_eq!(entity_to_slug(""), "");
    }

    #[test]
    fn slug_is_stable_under_reapplication() {
        for name in ["South Korea", "Europe (UN)", "Côte d'Ivoire", "Bosnia and Herzegovina"] {
            let slug = entity_to_slug(name);
            assert_eq!(entity_to_slug(&slug), slug);
        }
    }

    #[test]
    fn title_case_round_trips_machine_slugs() {
        for name in [
            "South Korea",
            "Europe (UN)",
            "Guinea-Bissau",
            "Côte d'Ivoire",
            "Latin America and the Caribbean (UN)",
            "Timor",
        ] {
            let slug = entity_to_slug(name);
            assert_eq!(entity_to_slug(&title_case(&slug)), slug, "round trip of {name}");
        }
    }

    #[test]
    fn title_case_keeps_letters_without_a_reversible_capital() {
        assert_eq!(title_case("ßtraße-ıstanbul"), "ßtraße ıstanbul");
        for slug in ["ßtraße", "ıstanbul", "ŉorth-ßea", "éire"] {
            assert_eq!(entity_to_slug(&title_case(slug)), slug, "round trip of {slug}");
        }
        assert_eq!(title_case("éire"), "Éire");
    }

    #[test]
    fn title_case_capitalises_each_word() {
        assert_eq!(title_case("atlantis"), "Atlantis");
        assert_eq!(title_case("north-macedonia"), "North Macedonia");
        assert_eq!(title_case("europe-un"), "Europe Un");
    }

    #[test]
    fn static_table_lookups() {
        assert_eq!(static_entity("europe"), Some("Europe (UN)"));
        assert_eq!(static_entity("south-korea"), Some("South Korea"));
        assert_eq!(static_entity("atlantis"), None);
    }
}
