// ============================================================
// Layer 4 — Title Normalizer
// ============================================================
// Turns a raw job title into the cleaned form every matcher input
// shares, or rejects it.
//
// Steps (applied in this order; later steps rely on earlier ones):
//   0. Reject titles longer than max_title_len characters
//   1. Lowercase
//   2. Replace / , . & ; : ( ) - with a space
//   3. Drop anything that is not an ASCII letter, digit or space
//   4. Collapse runs of spaces and trim
//   5. Expand whole-word abbreviations (vp → vice president, ...)
//   6. Reject the result if it is empty or now too long
//
// Digits are kept ("tier 2 support" stays "tier 2 support").
// Abbreviations are matched on word boundaries only, so the "cto"
// inside "director" and the "it" inside "italy" are left alone.
//
// The final length check keeps normalize idempotent: an output is
// always short enough, and already clean, to pass through again
// unchanged.
//
// Reference: Rust Book §8.2 (Storing UTF-8 Encoded Text with Strings)

use once_cell::sync::Lazy;
use regex::Regex;

/// Titles longer than this are rejected by default.
pub const DEFAULT_MAX_TITLE_LEN: usize = 60;

/// Characters that separate words in raw titles.
const WORD_SEPARATORS: [char; 9] = ['/', ',', '.', '&', ';', ':', '(', ')', '-'];

/// Abbreviation pattern → expansion, in application order.
/// Patterns are wrapped in \b...\b when compiled.
const ABBREVIATIONS: [(&str, &str); 21] = [
    ("vp",   "vice president"),
    ("exec?", "executive"),
    ("cmo",  "chief marketing officer"),
    ("cto",  "chief technology officer"),
    ("ceo",  "chief executive officer"),
    ("cfo",  "chief financial officer"),
    ("avp",  "assistant vice president"),
    ("evp",  "executive vice president"),
    ("svp",  "senior vice president"),
    ("coo",  "chief operating officer"),
    ("cio",  "chief information officer"),
    ("cpo",  "chief product officer"),
    ("cro",  "chief revenue officer"),
    ("cxo",  "chief experience officer"),
    ("cdo",  "chief data officer"),
    ("pm",   "project manager"),
    ("gm",   "general manager"),
    ("hr",   "human resources"),
    ("it",   "information technology"),
    ("ai",   "artificial intelligence"),
    ("sdr",  "sales development representative"),
];

static EXPANSIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    ABBREVIATIONS
        .iter()
        .map(|(pattern, expansion)| {
            let re = Regex::new(&format!(r"\b{pattern}\b"))
                .expect("abbreviation patterns are valid regexes");
            (re, *expansion)
        })
        .collect()
});

/// One pure cleaning step.
type Step = fn(&str) -> String;

/// Cleaning steps between the two length checks, in order.
const STEPS: [(&str, Step); 5] = [
    ("lowercase",          lowercase),
    ("separate_words",     separate_words),
    ("strip_disallowed",   strip_disallowed),
    ("collapse_whitespace", collapse_whitespace),
    ("expand_abbreviations", expand_abbreviations),
];

#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    max_title_len: usize,
}

impl Normalizer {
    pub fn new(max_title_len: usize) -> Self {
        Self { max_title_len }
    }

    /// Clean a raw title, or None if it is rejected.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        if self.too_long(raw) {
            return None;
        }

        let cleaned = STEPS
            .iter()
            .fold(raw.to_string(), |title, (_, step)| step(&title));

        if cleaned.is_empty() || self.too_long(&cleaned) {
            None
        } else {
            Some(cleaned)
        }
    }

    fn too_long(&self, title: &str) -> bool {
        title.chars().count() > self.max_title_len
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TITLE_LEN)
    }
}

pub fn lowercase(title: &str) -> String {
    title.to_lowercase()
}

pub fn separate_words(title: &str) -> String {
    title
        .chars()
        .map(|c| if WORD_SEPARATORS.contains(&c) { ' ' } else { c })
        .collect()
}

pub fn strip_disallowed(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect()
}

pub fn collapse_whitespace(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn expand_abbreviations(title: &str) -> String {
    EXPANSIONS
        .iter()
        .fold(title.to_string(), |acc, (re, expansion)| {
            re.replace_all(&acc, *expansion).into_owned()
        })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> Option<String> {
        Normalizer::default().normalize(raw)
    }

    #[test]
    fn test_vp_of_marketing() {
        assert_eq!(norm("VP of Marketing!!").as_deref(), Some("vice president of marketing"));
    }

    #[test]
    fn test_whitespace_only_is_rejected() {
        assert_eq!(norm(" "), None);
        assert_eq!(norm(""), None);
    }

    #[test]
    fn test_rejected_when_empty_after_strip() {
        assert_eq!(norm("!!! ### ***"), None);
        assert_eq!(norm("—"), None);
    }

    #[test]
    fn test_separators_become_spaces() {
        assert_eq!(norm("Sales/Marketing-Director").as_deref(), Some("sales marketing director"));
        assert_eq!(norm("R&D (Lead)").as_deref(), Some("r d lead"));
    }

    #[test]
    fn test_digits_are_kept() {
        assert_eq!(norm("Tier 2 Support").as_deref(), Some("tier 2 support"));
    }

    #[test]
    fn test_word_boundary_safety() {
        assert_eq!(norm("Director").as_deref(), Some("director"));
        assert_eq!(norm("PMO Lead").as_deref(), Some("pmo lead"));
        assert_eq!(norm("Italy Sales").as_deref(), Some("italy sales"));
        assert_eq!(norm("Sailing Coach").as_deref(), Some("sailing coach"));
    }

    #[test]
    fn test_abbreviations_expand() {
        assert_eq!(norm("CMO").as_deref(), Some("chief marketing officer"));
        assert_eq!(norm("SVP, HR").as_deref(), Some("senior vice president human resources"));
        assert_eq!(norm("Exec Assistant").as_deref(), Some("executive assistant"));
        assert_eq!(norm("exe assistant").as_deref(), Some("executive assistant"));
        assert_eq!(norm("Head of IT").as_deref(), Some("head of information technology"));
    }

    #[test]
    fn test_abbreviation_inside_punctuation_still_expands() {
        assert_eq!(norm("(CEO)").as_deref(), Some("chief executive officer"));
    }

    #[test]
    fn test_length_bound_on_raw() {
        let long = "a".repeat(DEFAULT_MAX_TITLE_LEN + 1);
        assert_eq!(norm(&long), None);
        let exact = "a".repeat(DEFAULT_MAX_TITLE_LEN);
        assert_eq!(norm(&exact), Some(exact));
    }

    #[test]
    fn test_length_bound_after_expansion() {
        // short raw, long once every abbreviation is spelled out
        assert_eq!(norm("svp evp avp cmo"), None);
    }

    #[test]
    fn test_custom_max_len() {
        let n = Normalizer::new(5);
        assert_eq!(n.normalize("sales"), Some("sales".to_string()));
        assert_eq!(n.normalize("sales!"), None);
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "VP of Marketing!!",
            "  Sr. Software   Engineer (Backend) ",
            "CTO / Co-Founder",
            "Head of HR & Ops",
            "exe assistant to the CEO",
            "Director, AI Research",
            "Tier 2 Support",
            "Ünïcödé Manager",
            "svp evp avp cmo",
            " ",
        ];
        for raw in samples {
            let once = norm(raw);
            let twice = once.as_deref().and_then(norm);
            assert_eq!(once, twice, "not idempotent for {raw:?}");
        }
    }

    // ─── Properties over generated titles ────────────────────────────────────
    use proptest::prelude::*;
    use proptest::test_runner::Config as ProptestConfig;

    /// Raw titles built from abbreviations, words, separators and
    /// non-ASCII letters whose lowercase form changes length.
    fn raw_title() -> impl Strategy<Value = String> {
        let piece = prop_oneof![
            prop::sample::select(vec!["vp", "exec", "exe", "it", "cmo", "svp", "hr", "CTO", "Ai", "pm"])
                .prop_map(|s| s.to_string()),
            "[a-zA-Z0-9]{1,10}",
            "[ /,.&;:()!\\-]{1,3}",
            prop::sample::select(vec!["é", "İ", "\u{212A}", "ß", "ﬀ", "Ü", "\t", "\u{00A0}"])
                .prop_map(|s| s.to_string()),
            any::<char>().prop_map(|c| c.to_string()),
        ];
        prop::collection::vec(piece, 0..16).prop_map(|pieces| pieces.concat())
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            failure_persistence: None,
            .. ProptestConfig::default()
        })]

        #[test]
        fn test_normalize_twice_equals_once(raw in raw_title(), max in 1usize..80) {
            let n = Normalizer::new(max);
            if let Some(once) = n.normalize(&raw) {
                prop_assert_eq!(n.normalize(&once), Some(once.clone()));
            }
        }

        #[test]
        fn test_raw_over_the_limit_is_rejected(raw in raw_title(), under in 1usize..10) {
            let len = raw.chars().count();
            prop_assume!(len > 0);
            let max = len - under.min(len);
            prop_assert_eq!(Normalizer::new(max).normalize(&raw), None);
        }

        #[test]
        fn test_output_is_clean_and_bounded(raw in raw_title(), max in 1usize..80) {
            if let Some(title) = Normalizer::new(max).normalize(&raw) {
                prop_assert!(title.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' '));
                prop_assert!(!title.is_empty());
                prop_assert!(!title.starts_with(' ') && !title.ends_with(' '));
                prop_assert!(!title.contains("  "));
                prop_assert!(title.chars().count() <= max);
            }
        }
    }

    #[test]
    fn test_steps_are_ordered() {
        let names: Vec<&str> = STEPS.iter().map(|(name, _)| *name).collect();
        assert_eq!(names.last(), Some(&"expand_abbreviations"));
        assert_eq!(names.iter().position(|n| *n == "collapse_whitespace"), Some(3));
    }
}
