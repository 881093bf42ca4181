use std::sync::LazyLock;

use regex::Regex;

/// Phrases every disclaimer should carry.
const DISCLAIMER_PHRASES: &[&str] = &[
    "educational purposes",
    "not constitute medical advice",
    "healthcare provider",
];

/// Next steps should point at a provider and use a discuss/consult verb.
static NEXT_STEPS_ELEMENTS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        (
            "provider reference",
            Regex::new(r"(?i)healthcare provider|doctor|physician").expect("valid regex"),
        ),
        (
            "discuss/consult verb",
            Regex::new(r"(?i)discuss|consult|talk").expect("valid regex"),
        ),
    ]
});

/// Advisory only: one warning per recommended phrase the disclaimer lacks.
pub fn check_disclaimer(disclaimer: &str) -> Vec<String> {
    let lower = disclaimer.to_lowercase();
    DISCLAIMER_PHRASES
        .iter()
        .filter(|phrase| !lower.contains(*phrase))
        .map(|phrase| format!("Disclaimer missing required phrase: \"{phrase}\""))
        .collect()
}

/// Advisory only: one warning per required element next steps lacks.
pub fn check_next_steps(next_steps: &str) -> Vec<String> {
    NEXT_STEPS_ELEMENTS
        .iter()
        .filter(|(_, pattern)| !pattern.is_match(next_steps))
        .map(|(element, _)| format!("Next steps missing required element: {element}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::safety::types::{SAFE_DISCLAIMER, SAFE_NEXT_STEPS};

    #[test]
    fn safe_defaults_raise_no_warnings() {
        assert!(check_disclaimer(SAFE_DISCLAIMER).is_empty());
        assert!(check_next_steps(SAFE_NEXT_STEPS).is_empty());
    }

    #[test]
    fn disclaimer_phrase_match_is_case_insensitive() {
        let text = "For EDUCATIONAL PURPOSES. This does NOT CONSTITUTE MEDICAL ADVICE. Ask your Healthcare Provider.";
        assert!(check_disclaimer(text).is_empty());
    }

    #[test]
    fn disclaimer_reports_each_missing_phrase() {
        let warnings = check_disclaimer("For educational purposes only.");
        assert_eq!(
            warnings,
            vec![
                "Disclaimer missing required phrase: \"not constitute medical advice\"",
                "Disclaimer missing required phrase: \"healthcare provider\"",
            ]
        );
    }

    #[test]
    fn next_steps_missing_elements() {
        assert_eq!(
            check_next_steps("Keep this report."),
            vec![
                "Next steps missing required element: provider reference",
                "Next steps missing required element: discuss/consult verb",
            ]
        );
        assert_eq!(
            check_next_steps("Show this to your physician."),
            vec!["Next steps missing required element: discuss/consult verb"]
        );
        assert!(check_next_steps("Talk to your doctor.").is_empty());
    }
}
