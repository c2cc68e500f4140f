// 🧹 Text Normalizer
// Qualification year markers and ethnic-group synonyms

use regex::Regex;
use std::sync::OnceLock;

/// Label every "Black/African" value is folded into
pub const CANONICAL_BLACK: &str = "Black";

const BLACK_AFRICAN: &str = "Black/African";

fn year_suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // One or more trailing "(1st Year)" style markers
        Regex::new(r"(?:\s*\(\d{1,4}(?:st|nd|rd|th) Year\))+\s*$")
            .expect("year suffix pattern is valid")
    })
}

/// Strip a trailing "(Nth Year)" marker from a qualification name.
///
/// "Diploma (1st Year)" and "Diploma (2nd Year)" both become "Diploma".
/// Names without a trailing marker come back unchanged, whitespace included.
pub fn strip_year_suffix(qualification: &str) -> String {
    let pattern = year_suffix_pattern();
    match pattern.find(qualification) {
        Some(m) => qualification[..m.start()].trim().to_string(),
        None => qualification.to_string(),
    }
}

/// Fold ethnic-group synonyms into one label
pub fn canonical_ethnic_group(group: &str) -> String {
    if group == BLACK_AFRICAN {
        CANONICAL_BLACK.to_string()
    } else {
        group.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strip_year_suffix() {
        assert_eq!(strip_year_suffix("Diploma (1st Year)"), "Diploma");
        assert_eq!(strip_year_suffix("Diploma (2nd Year)"), "Diploma");
        assert_eq!(strip_year_suffix("BSc Nursing (3rd Year)"), "BSc Nursing");
        assert_eq!(strip_year_suffix("BCom(4th Year)"), "BCom");
        assert_eq!(strip_year_suffix("  MBChB   (11th Year)  "), "MBChB");
    }

    #[test]
    fn test_strip_year_suffix_passthrough() {
        assert_eq!(strip_year_suffix("Diploma"), "Diploma");
        assert_eq!(strip_year_suffix("  B Ed  Foundation "), "  B Ed  Foundation ");
        // Not trailing
        assert_eq!(
            strip_year_suffix("Diploma (1st Year) Extended"),
            "Diploma (1st Year) Extended"
        );
        // Not a year marker
        assert_eq!(strip_year_suffix("Diploma (Part Time)"), "Diploma (Part Time)");
        assert_eq!(strip_year_suffix("Diploma (1xx Year)"), "Diploma (1xx Year)");
        assert_eq!(strip_year_suffix("Diploma (12345th Year)"), "Diploma (12345th Year)");
    }

    #[test]
    fn test_strip_repeated_markers_is_idempotent() {
        let once = strip_year_suffix("Diploma (1st Year) (2nd Year)");
        assert_eq!(once, "Diploma");
        assert_eq!(strip_year_suffix(&once), once);
    }

    #[test]
    fn test_canonical_ethnic_group() {
        assert_eq!(canonical_ethnic_group("Black/African"), "Black");
        assert_eq!(canonical_ethnic_group("Black"), "Black");
        assert_eq!(canonical_ethnic_group("Coloured"), "Coloured");
        assert_eq!(canonical_ethnic_group("black/african"), "black/african");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_marker_removed(
            base in "[A-Za-z][A-Za-z ]{0,20}[A-Za-z]",
            n in 1u32..100,
            suffix in prop::sample::select(vec!["st", "nd", "rd", "th"]),
            gap in " {0,3}"
        ) {
            let input = format!("{}{}({}{} Year)", base, gap, n, suffix);
            prop_assert_eq!(strip_year_suffix(&input), base.trim().to_string());
        }

        #[test]
        fn prop_without_marker_unchanged(s in "[A-Za-z0-9 ]{0,30}") {
            prop_assert_eq!(strip_year_suffix(&s), s);
        }

        #[test]
        fn prop_idempotent(s in "[A-Za-z ]{0,20}( ?\\([0-9]{1,4}(st|nd|rd|th) Year\\))?") {
            let once = strip_year_suffix(&s);
            prop_assert_eq!(strip_year_suffix(&once), once.clone());
        }
    }
}
