//! Input normalization: structured address parsing and municipality-name
//! canonicalization.
//!
//! Work orders carry addresses in the `"<City>,<AREA>,<STREET NUMBER>"`
//! convention. Anything else is treated as an opaque name — usually a
//! municipality typed by hand, often with Serbian diacritics degraded to
//! plain ASCII (c for č, s for š, z for ž).

use super::types::ParsedAddress;

/// Word-level corrections for common Latin/Serbian diacritic degradations.
/// Keyed by the degraded ASCII form; applied case-insensitively per word.
const DIACRITIC_FIXES: &[(&str, &str)] = &[
    ("cukarica", "čukarica"),
    ("vracar", "vračar"),
    ("borca", "borča"),
    ("krnjaca", "krnjača"),
    ("surcin", "surčin"),
    ("zarkovo", "žarkovo"),
    ("zeleznik", "železnik"),
    ("bezanija", "bežanija"),
    ("visnjica", "višnjica"),
    ("sremcica", "sremčica"),
    ("kaludjerica", "kaluđerica"),
    ("rusanj", "rušanj"),
    ("becmen", "bečmen"),
    ("ovca", "ovča"),
];

/// Parse the comma-delimited address convention, case-insensitively.
///
/// Returns `None` when the input does not match the convention; the caller
/// then treats the whole string as an opaque name. Not an error.
pub fn parse_address(input: &str) -> Option<ParsedAddress> {
    let parts: Vec<&str> = input.split(',').collect();
    if parts.len() < 3 {
        return None;
    }

    let area = parts[1].trim().to_lowercase();
    let street_segment = parts[2].trim();
    if area.is_empty() || street_segment.is_empty() {
        return None;
    }

    let house_number = street_segment
        .split_whitespace()
        .find_map(|tok| leading_number(tok));

    // Street name is the segment with digit runs removed.
    let street = street_segment
        .chars()
        .filter(|c| !c.is_ascii_digit())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if street.is_empty() {
        return None;
    }

    Some(ParsedAddress {
        area,
        street,
        house_number,
    })
}

/// Parse the leading digit run of a token ("10", "10a" → 10).
fn leading_number(tok: &str) -> Option<u32> {
    let digits: String = tok.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

/// Canonicalize an opaque municipality name: fix degraded diacritics per
/// word, then title-case each word.
pub fn canonical_municipality(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let fixed = DIACRITIC_FIXES
                .iter()
                .find(|(ascii, _)| *ascii == lower)
                .map(|(_, proper)| (*proper).to_string())
                .unwrap_or(lower);
            title_case(&fixed)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Normalized cache key: lowercase, trimmed, single-spaced.
pub fn normalize_key(input: &str) -> String {
    input
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_convention() {
        let parsed = parse_address("Beograd,BORČA,BORSKA 10").unwrap();
        assert_eq!(parsed.area, "borča");
        assert_eq!(parsed.street, "borska");
        assert_eq!(parsed.house_number, Some(10));
    }

    #[test]
    fn test_parse_address_no_house_number() {
        let parsed = parse_address("Beograd,KOTEŽ,TRAJKA GRKOVIĆA").unwrap();
        assert_eq!(parsed.street, "trajka grkovića");
        assert_eq!(parsed.house_number, None);
    }

    #[test]
    fn test_parse_address_house_number_with_suffix() {
        let parsed = parse_address("Beograd,KRNJAČA,PANČEVAČKI PUT 35a").unwrap();
        assert_eq!(parsed.street, "pančevački put a");
        assert_eq!(parsed.house_number, Some(35));
    }

    #[test]
    fn test_parse_address_rejects_plain_names() {
        assert!(parse_address("Vračar").is_none());
        assert!(parse_address("Beograd, Vračar").is_none());
        assert!(parse_address("").is_none());
    }

    #[test]
    fn test_parse_address_rejects_empty_segments() {
        assert!(parse_address("Beograd,,BORSKA 10").is_none());
        assert!(parse_address("Beograd,BORČA,").is_none());
        assert!(parse_address("Beograd,BORČA,12").is_none());
    }

    #[test]
    fn test_canonical_municipality_diacritics() {
        assert_eq!(canonical_municipality("cukarica"), "Čukarica");
        assert_eq!(canonical_municipality("VRACAR"), "Vračar");
        assert_eq!(canonical_municipality("stari grad"), "Stari Grad");
    }

    #[test]
    fn test_canonical_municipality_already_proper() {
        assert_eq!(canonical_municipality("Čukarica"), "Čukarica");
        assert_eq!(canonical_municipality("novi beograd"), "Novi Beograd");
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  BORSKA   10 "), "borska 10");
        assert_eq!(normalize_key("Vračar"), "vračar");
    }
}
