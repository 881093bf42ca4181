//! Pattern catalog: the detection and rewrite rules, grouped by category.
//!
//! The builtin catalog is compiled once per process and is read-only after
//! that. Every rule is case-insensitive. Rewrite templates must never
//! reintroduce text that a detection rule matches; the tests at the bottom
//! hold the builtin table to that.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use super::types::{SafetyError, Severity, ViolationCategory};

/// Alternation of named conditions shared by the disease and inference rules.
macro_rules! condition_terms {
    () => {
        "diabetes|diabetic|prediabetes|cancer|carcinoma|tumou?r|malignancy|\
         kidney\\s+disease|renal\\s+failure|nephropathy|heart\\s+disease|cardiac|\
         cardiovascular\\s+disease|liver\\s+disease|hepatitis|cirrhosis|infection|sepsis|\
         anemia|anaemia|anemic|hypertension|hypotension|thyroid\\s+disorder|\
         hypothyroid(?:ism)?|hyperthyroid(?:ism)?"
    };
}

/// Detection rules: (category, pattern).
const DETECTION_RULES: &[(ViolationCategory, &str)] = &[
    // --- Diagnostic ---
    (ViolationCategory::DiagnosticLanguage, r"\byou\s+have\s+\w+"),
    (ViolationCategory::DiagnosticLanguage, r"\b(?:(?:you\s+(?:are|were)|been)\s+)?diagnosed\s+with\b"),
    (ViolationCategory::DiagnosticLanguage, r"\b(?:diagnosis\s+of|suffering\s+from|condition\s+of)\b"),
    (ViolationCategory::DiagnosticLanguage, r"\bthis\s+(?:indicates|means\s+you\s+have|suggests\s+you\s+have)\b"),
    (ViolationCategory::DiagnosticLanguage, r"\b(?:positive\s+for|negative\s+for|consistent\s+with)\b"),
    (
        ViolationCategory::DiagnosticLanguage,
        concat!(
            r"\b(?:indicates?|suggests?|confirms?)\s+(?:that\s+you\s+have\s+)?(?:an?\s+)?(?:",
            condition_terms!(),
            r")\b"
        ),
    ),
    // --- Disease names ---
    (ViolationCategory::DiseaseName, r"\b(?:diabetes|diabetic|prediabetes)\b"),
    (ViolationCategory::DiseaseName, r"\b(?:cancer|carcinoma|tumou?r|malignancy)\b"),
    (ViolationCategory::DiseaseName, r"\b(?:kidney\s+disease|renal\s+failure|nephropathy)\b"),
    (ViolationCategory::DiseaseName, r"\b(?:heart\s+disease|cardiac|cardiovascular\s+disease)\b"),
    (ViolationCategory::DiseaseName, r"\b(?:liver\s+disease|hepatitis|cirrhosis)\b"),
    (ViolationCategory::DiseaseName, r"\b(?:infection|bacterial|viral|sepsis)\b"),
    (ViolationCategory::DiseaseName, r"\b(?:anemia|anaemia|anemic)\b"),
    (ViolationCategory::DiseaseName, r"\b(?:hypertension|hypotension)\b"),
    (ViolationCategory::DiseaseName, r"\b(?:thyroid\s+disorder|hypothyroid(?:ism)?|hyperthyroid(?:ism)?)\b"),
    (ViolationCategory::DiseaseName, r"\b(?:syndrome|disease|disorder|condition)\s+(?:of|affecting)\b"),
    // --- Treatment ---
    (ViolationCategory::TreatmentAdvice, r"\b(?:you\s+should\s+take|recommend\s+taking|prescribe|medications?)\b"),
    (ViolationCategory::TreatmentAdvice, r"\b(?:treatment|therapy|intervention|procedure)\s+(?:is|would\s+be)\b"),
    (ViolationCategory::TreatmentAdvice, r"\b(?:change\s+your\s+diet|exercise\s+more|lose\s+weight|stop\s+smoking)\b"),
    (ViolationCategory::TreatmentAdvice, r"\b(?:consult\s+immediately|go\s+to\s+(?:the\s+)?ER|seek\s+urgent\s+care)\b"),
    // --- Alarming ---
    (ViolationCategory::AlarmingLanguage, r"\b(?:dangerous|critical|severe|alarming|emergency)\b"),
    (ViolationCategory::AlarmingLanguage, r"\b(?:life[-\s]threatening|serious\s+concern|major\s+problem)\b"),
    (ViolationCategory::AlarmingLanguage, r"\b(?:urgent|urgently|immediately|right\s+away|as\s+soon\s+as\s+possible)\b"),
    // --- Dismissive ---
    (ViolationCategory::DismissiveLanguage, r"\b(?:nothing\s+to\s+worry\s+about|don['’]t\s+worry|perfectly\s+fine|completely\s+normal)\b"),
    (ViolationCategory::DismissiveLanguage, r"\b(?:ignore\s+this|not\s+important|no\s+concern|no\s+need\s+to)\b"),
    (ViolationCategory::DismissiveLanguage, r"\b(?:you['’]re\s+healthy|everything\s+is\s+fine|all\s+good)\b"),
    // --- Directive ---
    (ViolationCategory::DirectiveMedicalAdvice, r"\b(?:you\s+must|you\s+should|you\s+need\s+to)\b"),
    (ViolationCategory::DirectiveMedicalAdvice, r"\b(?:it\s+is\s+recommended\s+that\s+you|I\s+recommend|I\s+suggest)\b"),
];

/// Ordinary phrasing that a rule would otherwise match. A match whose whole
/// text is one of these is neither reported nor rewritten.
const ALLOWED_PHRASES: &[&str] = &[r"^you\s+have\s+(?:about|for|with|regarding)$"];

/// Rewrite rules: (category, pattern, template). Applied top to bottom, each
/// as one global substitution over the output of the previous rule.
const REWRITE_RULES: &[(ViolationCategory, &str, &str)] = &[
    // --- Diagnostic → what the test evaluates ---
    (ViolationCategory::DiagnosticLanguage, r"\bthis\s+(?:means|suggests)\s+you\s+have\s+(?:an?\s+)?(\w+)", "this relates to ${1}"),
    (ViolationCategory::DiagnosticLanguage, r"\byou\s+(?:have\s+been|are|were)\s+diagnosed\s+with\s+(?:an?\s+)?(\w+)", "this report references ${1}"),
    (ViolationCategory::DiagnosticLanguage, r"\bdiagnosed\s+with\s+(?:an?\s+)?(\w+)", "evaluated for ${1}"),
    (ViolationCategory::DiagnosticLanguage, r"\byou\s+have\s+(?:an?\s+)?(\w+)", "this test evaluates ${1} levels"),
    (ViolationCategory::DiagnosticLanguage, r"\bdiagnosis\s+of\s+(\w+)", "evaluation of ${1} parameters"),
    (ViolationCategory::DiagnosticLanguage, r"\bsuffering\s+from\s+(\w+)", "with ${1} values"),
    (ViolationCategory::DiagnosticLanguage, r"\bthis\s+indicates\s+(\w+)", "this measures ${1}"),
    (
        ViolationCategory::DiagnosticLanguage,
        concat!(
            r"\b(?:indicates?|suggests?|confirms?)\s+(?:that\s+you\s+have\s+)?(?:an?\s+)?(",
            condition_terms!(),
            r")\b"
        ),
        "relates to ${1}",
    ),
    (ViolationCategory::DiagnosticLanguage, r"\bpositive\s+for\s+(\w+)", "detected ${1}"),
    (ViolationCategory::DiagnosticLanguage, r"\bnegative\s+for\s+(\w+)", "did not detect ${1}"),
    (ViolationCategory::DiagnosticLanguage, r"\bconsistent\s+with\s+(\w+)", "showing ${1}"),
    // --- Treatment → discuss with provider ---
    (ViolationCategory::TreatmentAdvice, r"\byou\s+should\s+take\s+(\w+)", "your provider may discuss ${1}"),
    (ViolationCategory::TreatmentAdvice, r"\b(?:I\s+)?recommend\s+taking\s+(\w+)", "providers may consider ${1}"),
    (ViolationCategory::TreatmentAdvice, r"\bprescribe\s+(\w+)", "discuss ${1} with your provider"),
    (ViolationCategory::TreatmentAdvice, r"\b(?:treatment|therapy)\s+(?:is|would\s+be)\s+(\w+)", "providers evaluate ${1}"),
    (ViolationCategory::TreatmentAdvice, r"\bchange\s+your\s+diet\b", "discuss dietary options with your provider"),
    (ViolationCategory::TreatmentAdvice, r"\bexercise\s+more\b", "discuss activity levels with your provider"),
    (ViolationCategory::TreatmentAdvice, r"\bconsult\s+immediately\b", "consult your healthcare provider"),
    (ViolationCategory::TreatmentAdvice, r"\bgo\s+to\s+(?:the\s+)?ER\b", "contact your healthcare provider"),
    // --- Alarming → neutral range language ---
    (ViolationCategory::AlarmingLanguage, r"\bdangerous\b", "outside typical range"),
    (ViolationCategory::AlarmingLanguage, r"\bcritical\b", "significantly different"),
    (ViolationCategory::AlarmingLanguage, r"\bsevere\b", "notably different"),
    (ViolationCategory::AlarmingLanguage, r"\balarming\b", "noteworthy"),
    (ViolationCategory::AlarmingLanguage, r"\bemergency\b", "important matter"),
    (ViolationCategory::AlarmingLanguage, r"\blife[-\s]threatening\b", "requires medical evaluation"),
    (ViolationCategory::AlarmingLanguage, r"\bserious\s+concern\b", "worth discussing"),
    (ViolationCategory::AlarmingLanguage, r"\bmajor\s+problem\b", "notable finding"),
    (ViolationCategory::AlarmingLanguage, r"\burgently\b", "promptly"),
    (ViolationCategory::AlarmingLanguage, r"\burgent\b", "timely"),
    (ViolationCategory::AlarmingLanguage, r"\bimmediately\b", "soon"),
    (ViolationCategory::AlarmingLanguage, r"\bright\s+away\b", "promptly"),
    (ViolationCategory::AlarmingLanguage, r"\bas\s+soon\s+as\s+possible\b", "in a timely way"),
    // --- Dismissive → defer to provider ---
    (ViolationCategory::DismissiveLanguage, r"\bnothing\s+to\s+worry\s+about\b", "worth discussing with your provider"),
    (ViolationCategory::DismissiveLanguage, r"\bdon['’]t\s+worry\b", "discuss with your provider"),
    (ViolationCategory::DismissiveLanguage, r"\bperfectly\s+fine\b", "within expected range"),
    (ViolationCategory::DismissiveLanguage, r"\bcompletely\s+normal\b", "within reference range"),
    (ViolationCategory::DismissiveLanguage, r"\bignore\s+this\b", "discuss this with your provider"),
    (ViolationCategory::DismissiveLanguage, r"\bnot\s+important\b", "something your provider can explain"),
    (ViolationCategory::DismissiveLanguage, r"\bno\s+concern\b", "something to review with your provider"),
    (ViolationCategory::DismissiveLanguage, r"\bno\s+need\s+to\b", "your provider can advise whether to"),
    (ViolationCategory::DismissiveLanguage, r"\byou['’]re\s+healthy\b", "your provider can interpret your overall results"),
    (ViolationCategory::DismissiveLanguage, r"\beverything\s+is\s+fine\b", "your provider can review these results"),
    (ViolationCategory::DismissiveLanguage, r"\ball\s+good\b", "ready to review with your provider"),
    // --- Directive → provider-led ---
    (ViolationCategory::DirectiveMedicalAdvice, r"\bit\s+is\s+recommended\s+that\s+you\b", "your provider may advise whether you"),
    (ViolationCategory::DirectiveMedicalAdvice, r"\byou\s+must\b", "your provider will advise whether to"),
    (ViolationCategory::DirectiveMedicalAdvice, r"\byou\s+should\b", "your provider may discuss whether to"),
    (ViolationCategory::DirectiveMedicalAdvice, r"\byou\s+need\s+to\b", "your provider can evaluate whether to"),
    (ViolationCategory::DirectiveMedicalAdvice, r"\bI\s+recommend\b", "providers may consider"),
    (ViolationCategory::DirectiveMedicalAdvice, r"\bI\s+suggest\b", "providers may discuss"),
];

/// Uncompiled rule, for building a catalog other than the builtin one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    pub category: ViolationCategory,
    pub pattern: String,
    /// `Some` makes this a rewrite rule; `None` a detection rule.
    pub rewrite: Option<String>,
}

impl RuleSpec {
    pub fn detect(category: ViolationCategory, pattern: impl Into<String>) -> Self {
        Self {
            category,
            pattern: pattern.into(),
            rewrite: None,
        }
    }

    pub fn rewrite(
        category: ViolationCategory,
        pattern: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            category,
            pattern: pattern.into(),
            rewrite: Some(template.into()),
        }
    }
}

/// A compiled detection rule.
#[derive(Debug, Clone)]
pub struct DetectionRule {
    pub category: ViolationCategory,
    pub regex: Regex,
}

impl DetectionRule {
    pub fn severity(&self) -> Severity {
        self.category.severity()
    }
}

/// A compiled rewrite rule. `template` uses `${n}` capture references.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pub category: ViolationCategory,
    pub regex: Regex,
    pub template: String,
}

/// The full rule set. Detection and rewrite rules are both held in category
/// order so that scans and rewrites are deterministic.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    detection: Vec<DetectionRule>,
    rewrites: Vec<RewriteRule>,
    allowed: Vec<Regex>,
}

static BUILTIN: LazyLock<PatternCatalog> = LazyLock::new(|| {
    let specs = DETECTION_RULES
        .iter()
        .map(|(category, pattern)| RuleSpec::detect(*category, *pattern))
        .chain(
            REWRITE_RULES
                .iter()
                .map(|(category, pattern, template)| RuleSpec::rewrite(*category, *pattern, *template)),
        )
        .collect();
    PatternCatalog::from_rules(specs)
        .and_then(|catalog| catalog.with_allowed_phrases(ALLOWED_PHRASES))
        .expect("Invalid builtin safety regex pattern")
});

impl PatternCatalog {
    /// The process-wide builtin catalog.
    pub fn builtin() -> &'static PatternCatalog {
        &BUILTIN
    }

    /// Compile a catalog from rule specs.
    ///
    /// Rules are stably sorted by category, so rules within one category keep
    /// the order they were given in.
    pub fn from_rules(mut specs: Vec<RuleSpec>) -> Result<Self, SafetyError> {
        specs.sort_by_key(|spec| spec.category);

        let mut detection = Vec::new();
        let mut rewrites = Vec::new();

        for spec in specs {
            let regex = compile(spec.category, &spec.pattern)?;
            match spec.rewrite {
                None => detection.push(DetectionRule {
                    category: spec.category,
                    regex,
                }),
                Some(template) => rewrites.push(RewriteRule {
                    category: spec.category,
                    regex,
                    template,
                }),
            }
        }

        Ok(Self {
            detection,
            rewrites,
            allowed: Vec::new(),
        })
    }

    /// Add allowed phrases. Each pattern is tested against the full text of a
    /// rule match, so anchor it with `^...$`.
    pub fn with_allowed_phrases(mut self, patterns: &[&str]) -> Result<Self, SafetyError> {
        for pattern in patterns {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(SafetyError::AllowedPhraseCompilation)?;
            self.allowed.push(regex);
        }
        Ok(self)
    }

    /// Whether a rule match is allowed phrasing.
    pub fn is_allowed(&self, matched: &str) -> bool {
        self.allowed.iter().any(|regex| regex.is_match(matched))
    }

    pub fn detection_rules(&self) -> &[DetectionRule] {
        &self.detection
    }

    pub fn rewrite_rules(&self) -> &[RewriteRule] {
        &self.rewrites
    }

    pub fn rules_for(&self, category: ViolationCategory) -> impl Iterator<Item = &DetectionRule> {
        self.detection.iter().filter(move |r| r.category == category)
    }
}

fn compile(category: ViolationCategory, pattern: &str) -> Result<Regex, SafetyError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| SafetyError::RegexCompilation { category, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_compiles_every_rule() {
        let catalog = PatternCatalog::builtin();
        assert_eq!(catalog.detection_rules().len(), DETECTION_RULES.len());
        assert_eq!(catalog.rewrite_rules().len(), REWRITE_RULES.len());
    }

    #[test]
    fn every_category_has_detection_rules() {
        let catalog = PatternCatalog::builtin();
        for category in ViolationCategory::ALL {
            assert!(catalog.rules_for(category).next().is_some(), "no rules for {category}");
        }
    }

    #[test]
    fn every_high_severity_category_has_rewrites() {
        let catalog = PatternCatalog::builtin();
        for category in ViolationCategory::ALL {
            if category.severity() == Severity::High {
                assert!(
                    catalog.rewrite_rules().iter().any(|r| r.category == category),
                    "no rewrites for {category}"
                );
            }
        }
    }

    #[test]
    fn rules_held_in_category_order() {
        let catalog = PatternCatalog::builtin();
        let detection: Vec<_> = catalog.detection_rules().iter().map(|r| r.category).collect();
        let mut sorted = detection.clone();
        sorted.sort();
        assert_eq!(detection, sorted);

        let rewrites: Vec<_> = catalog.rewrite_rules().iter().map(|r| r.category).collect();
        let mut sorted = rewrites.clone();
        sorted.sort();
        assert_eq!(rewrites, sorted);
    }

    #[test]
    fn no_template_matches_a_detection_rule() {
        let catalog = PatternCatalog::builtin();
        for rewrite in catalog.rewrite_rules() {
            // Substitute a neutral word for capture references.
            let text = rewrite.template.replace("${1}", "glucose");
            for rule in catalog.detection_rules() {
                assert!(
                    !rule.regex.is_match(&text),
                    "template {:?} matches {} rule {}",
                    rewrite.template,
                    rule.category,
                    rule.regex
                );
            }
        }
    }

    #[test]
    fn custom_catalog_sorted_by_category() {
        let catalog = PatternCatalog::from_rules(vec![
            RuleSpec::detect(ViolationCategory::DirectiveMedicalAdvice, r"\bgo\s+see\b"),
            RuleSpec::detect(ViolationCategory::DiseaseName, r"\bgout\b"),
            RuleSpec::rewrite(ViolationCategory::DirectiveMedicalAdvice, r"\bgo\s+see\b", "consider seeing"),
        ])
        .unwrap();
        assert_eq!(catalog.detection_rules()[0].category, ViolationCategory::DiseaseName);
        assert_eq!(catalog.rewrite_rules().len(), 1);
        assert!(catalog.detection_rules()[0].regex.is_match("GOUT"));
        assert_eq!(catalog.detection_rules()[0].severity(), Severity::Critical);
    }

    #[test]
    fn allowed_phrasing_is_exempt() {
        let catalog = PatternCatalog::builtin();
        for matched in ["you have about", "You Have for", "you  have regarding", "you have with"] {
            assert!(catalog.is_allowed(matched), "{matched:?} not allowed");
        }
        for matched in ["you have anemia", "you have about anemia", "diagnosed with"] {
            assert!(!catalog.is_allowed(matched), "{matched:?} allowed");
        }
    }

    #[test]
    fn custom_catalog_has_no_allowed_phrases_until_added() {
        let specs = || vec![RuleSpec::detect(ViolationCategory::DiseaseName, r"\bgout\b")];
        let catalog = PatternCatalog::from_rules(specs()).unwrap();
        assert!(!catalog.is_allowed("gout"));

        let catalog = PatternCatalog::from_rules(specs())
            .unwrap()
            .with_allowed_phrases(&[r"^gout$"])
            .unwrap();
        assert!(catalog.is_allowed("GOUT"));

        let err = PatternCatalog::from_rules(specs())
            .unwrap()
            .with_allowed_phrases(&[r"(unclosed"])
            .unwrap_err();
        assert!(matches!(err, SafetyError::AllowedPhraseCompilation(_)));
    }

    #[test]
    fn custom_catalog_rejects_bad_regex() {
        let err = PatternCatalog::from_rules(vec![RuleSpec::detect(
            ViolationCategory::AlarmingLanguage,
            r"(unclosed",
        )])
        .unwrap_err();
        assert!(matches!(
            err,
            SafetyError::RegexCompilation { category: ViolationCategory::AlarmingLanguage, .. }
        ));
    }
}
