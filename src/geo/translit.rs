//! Latin→Cyrillic retry support.
//!
//! OpenStreetMap coverage of the Belgrade periphery is indexed mostly in
//! Cyrillic; a Latin-script query that finds nothing often succeeds once
//! the known names in it are swapped to Cyrillic. The table covers the
//! place and street names the knowledge base knows, in both proper and
//! ASCII-degraded Latin spellings.

/// Whole-phrase substitutions, matched case-insensitively.
const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("padinska skela", "падинска скела"),
    ("zrenjaninski put", "зрењанински пут"),
    ("pančevački put", "панчевачки пут"),
    ("pancevacki put", "панчевачки пут"),
    ("borska", "борска"),
    ("borča", "борча"),
    ("borca", "борча"),
    ("krnjača", "крњача"),
    ("krnjaca", "крњача"),
    ("ovča", "овча"),
    ("ovca", "овча"),
    ("kotež", "котеж"),
    ("kotez", "котеж"),
    ("batajnica", "батајница"),
    ("mirijevo", "миријево"),
    ("višnjica", "вишњица"),
    ("visnjica", "вишњица"),
    ("zemun", "земун"),
    ("beograd", "београд"),
    ("srbija", "србија"),
];

/// Apply the substitution table to a lowercased copy of the input.
/// Returns `Some` only when at least one substitution fired — `None` means
/// the retry tier has nothing new to try and is skipped.
pub fn transliterate(input: &str) -> Option<String> {
    let mut out = input.to_lowercase();
    let mut changed = false;
    for (latin, cyrillic) in SUBSTITUTIONS {
        if out.contains(latin) {
            out = out.replace(latin, cyrillic);
            changed = true;
        }
    }
    changed.then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_street_is_substituted() {
        let out = transliterate("borska 10, borča, beograd").unwrap();
        assert_eq!(out, "борска 10, борча, београд");
    }

    #[test]
    fn test_case_insensitive() {
        let out = transliterate("BORSKA 10, Beograd").unwrap();
        assert!(out.contains("борска"));
        assert!(out.contains("београд"));
    }

    #[test]
    fn test_multi_word_phrase() {
        let out = transliterate("zrenjaninski put 84").unwrap();
        assert_eq!(out, "зрењанински пут 84");
    }

    #[test]
    fn test_ascii_degraded_alias() {
        let out = transliterate("pancevacki put 35").unwrap();
        assert_eq!(out, "панчевачки пут 35");
    }

    #[test]
    fn test_unknown_input_is_skipped() {
        assert!(transliterate("vračar").is_none());
        assert!(transliterate("???###").is_none());
        assert!(transliterate("").is_none());
    }
}
