use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::pipeline::record::InterpretationRecord;

/// How bad a violation is. Drives the remediation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Never patched textually; the owning field or interpretation is replaced.
    Critical,
    /// Rewritten in place by the text sanitizer.
    High,
}

/// Classification of unsafe content. Each category has exactly one severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationCategory {
    /// "you have ...", "diagnosed with ...", "consistent with ...".
    DiagnosticLanguage,
    /// Named conditions and generic disease phrasing.
    DiseaseName,
    /// Medication, lifestyle or urgent-care directives.
    TreatmentAdvice,
    /// "dangerous", "emergency", "immediately".
    AlarmingLanguage,
    /// "nothing to worry about", "perfectly fine".
    DismissiveLanguage,
    /// "you must", "you should", "I recommend".
    DirectiveMedicalAdvice,
}

impl ViolationCategory {
    /// Catalog order. Detection and rewriting both iterate in this order.
    pub const ALL: [ViolationCategory; 6] = [
        Self::DiagnosticLanguage,
        Self::DiseaseName,
        Self::TreatmentAdvice,
        Self::AlarmingLanguage,
        Self::DismissiveLanguage,
        Self::DirectiveMedicalAdvice,
    ];

    pub fn severity(self) -> Severity {
        match self {
            Self::DiagnosticLanguage | Self::DiseaseName | Self::TreatmentAdvice => {
                Severity::Critical
            }
            Self::AlarmingLanguage | Self::DismissiveLanguage | Self::DirectiveMedicalAdvice => {
                Severity::High
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DiagnosticLanguage => "diagnostic-language",
            Self::DiseaseName => "disease-name",
            Self::TreatmentAdvice => "treatment-advice",
            Self::AlarmingLanguage => "alarming-language",
            Self::DismissiveLanguage => "dismissive-language",
            Self::DirectiveMedicalAdvice => "directive-medical-advice",
        }
    }
}

impl fmt::Display for ViolationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViolationCategory {
    type Err = SafetyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| SafetyError::UnknownCategory(s.to_string()))
    }
}

/// Stable pointer into an `InterpretationRecord`.
///
/// Renders as `disclaimer`, `nextSteps`, `interpretations[2]`,
/// `interpretations[2].context`, `interpretations[0].terminology[1].definition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldPath {
    Disclaimer,
    NextSteps,
    /// A whole interpretation entry. Only produced by field replacement.
    Interpretation(usize),
    Explanation(usize),
    Context(usize),
    /// (interpretation index, terminology index)
    TermDefinition(usize, usize),
}

impl FieldPath {
    /// The unit the field replacer discards: the top-level field itself, or
    /// the whole interpretation owning a nested surface.
    pub fn top_level(self) -> FieldPath {
        match self {
            Self::Disclaimer | Self::NextSteps | Self::Interpretation(_) => self,
            Self::Explanation(i) | Self::Context(i) | Self::TermDefinition(i, _) => {
                Self::Interpretation(i)
            }
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disclaimer => f.write_str("disclaimer"),
            Self::NextSteps => f.write_str("nextSteps"),
            Self::Interpretation(i) => write!(f, "interpretations[{i}]"),
            Self::Explanation(i) => write!(f, "interpretations[{i}].explanation"),
            Self::Context(i) => write!(f, "interpretations[{i}].context"),
            Self::TermDefinition(i, t) => {
                write!(f, "interpretations[{i}].terminology[{t}].definition")
            }
        }
    }
}

impl FromStr for FieldPath {
    type Err = SafetyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SafetyError::InvalidFieldPath(s.to_string());

        match s {
            "disclaimer" => return Ok(Self::Disclaimer),
            "nextSteps" => return Ok(Self::NextSteps),
            _ => {}
        }

        let rest = s.strip_prefix("interpretations[").ok_or_else(invalid)?;
        let (index, rest) = rest.split_once(']').ok_or_else(invalid)?;
        let i: usize = index.parse().map_err(|_| invalid())?;

        match rest {
            "" => Ok(Self::Interpretation(i)),
            ".explanation" => Ok(Self::Explanation(i)),
            ".context" => Ok(Self::Context(i)),
            _ => {
                let inner = rest
                    .strip_prefix(".terminology[")
                    .and_then(|r| r.strip_suffix("].definition"))
                    .ok_or_else(invalid)?;
                let t: usize = inner.parse().map_err(|_| invalid())?;
                Ok(Self::TermDefinition(i, t))
            }
        }
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One located match of a detection rule. Produced fresh on every scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentViolation {
    pub category: ViolationCategory,
    pub severity: Severity,
    /// The exact substring that matched.
    pub matched_text: String,
    /// Match padded by `CONTEXT_PADDING` characters each side. Audit only.
    pub context: String,
    pub location: FieldPath,
    /// Byte offset of the match within the scanned field.
    pub offset: usize,
}

impl ContentViolation {
    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

/// Aggregate verdict of one validation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Structure is sound and the content verdict for the mode holds.
    pub is_valid: bool,
    /// No critical content risk is being passed on.
    pub is_safe: bool,
    /// Violations found in the payload as received.
    pub violations: Vec<ContentViolation>,
    /// Violations still present after remediation and re-verification.
    pub residual_violations: Vec<ContentViolation>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Remediated (or pass-through) record; `None` when auto-sanitize is off
    /// or strict mode stopped at the structure check.
    pub sanitized: Option<InterpretationRecord>,
    pub modifications: Vec<FieldPath>,
}

impl ValidationResult {
    pub fn critical_violation_count(&self) -> usize {
        self.violations.iter().filter(|v| v.is_critical()).count()
    }
}

/// A record produced by either remediation path, plus what changed.
#[derive(Debug, Clone, PartialEq)]
pub struct RemediatedRecord {
    pub record: InterpretationRecord,
    pub modified: Vec<FieldPath>,
}

/// Safety pipeline errors. Content problems are never errors; see
/// `ValidationResult`.
#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Regex compilation failed for {category} rule: {source}")]
    RegexCompilation {
        category: ViolationCategory,
        #[source]
        source: regex::Error,
    },

    #[error("Regex compilation failed for allowed phrase: {0}")]
    AllowedPhraseCompilation(#[source] regex::Error),

    #[error("Unknown violation category: {0}")]
    UnknownCategory(String),

    #[error("Invalid field path: {0}")]
    InvalidFieldPath(String),
}

/// Characters of surrounding text kept on each side of a match.
pub const CONTEXT_PADDING: usize = 50;

/// Replacement for a disclaimer that carried critical content.
pub const SAFE_DISCLAIMER: &str = "This interpretation is for educational purposes only. \
It does not constitute medical advice, diagnosis, or treatment. Please discuss these results \
with your healthcare provider for proper medical interpretation and guidance.";

/// Replacement for next steps that carried critical content.
pub const SAFE_NEXT_STEPS: &str = "Schedule a consultation with your healthcare provider to \
discuss these results in detail. Bring this report and any questions you have.";

/// Recorded when critical content survives field replacement.
pub const SANITIZATION_FAILED: &str = "Sanitization failed to remove all critical violations";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_severity_mapping() {
        assert_eq!(ViolationCategory::DiagnosticLanguage.severity(), Severity::Critical);
        assert_eq!(ViolationCategory::DiseaseName.severity(), Severity::Critical);
        assert_eq!(ViolationCategory::TreatmentAdvice.severity(), Severity::Critical);
        assert_eq!(ViolationCategory::AlarmingLanguage.severity(), Severity::High);
        assert_eq!(ViolationCategory::DismissiveLanguage.severity(), Severity::High);
        assert_eq!(ViolationCategory::DirectiveMedicalAdvice.severity(), Severity::High);
    }

    #[test]
    fn category_serializes_kebab_case() {
        for category in ViolationCategory::ALL {
            let json = serde_json::to_value(category).unwrap();
            assert_eq!(json, category.as_str());
            assert_eq!(category.as_str().parse::<ViolationCategory>().unwrap(), category);
        }
        assert!("diagnostic".parse::<ViolationCategory>().is_err());
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Severity::Critical).unwrap(), "critical");
        assert_eq!(serde_json::to_value(Severity::High).unwrap(), "high");
    }

    #[test]
    fn field_path_display() {
        assert_eq!(FieldPath::Disclaimer.to_string(), "disclaimer");
        assert_eq!(FieldPath::NextSteps.to_string(), "nextSteps");
        assert_eq!(FieldPath::Interpretation(3).to_string(), "interpretations[3]");
        assert_eq!(FieldPath::Context(2).to_string(), "interpretations[2].context");
        assert_eq!(
            FieldPath::TermDefinition(0, 1).to_string(),
            "interpretations[0].terminology[1].definition"
        );
    }

    #[test]
    fn field_path_parse() {
        let paths = [
            FieldPath::Disclaimer,
            FieldPath::NextSteps,
            FieldPath::Interpretation(4),
            FieldPath::Explanation(0),
            FieldPath::Context(12),
            FieldPath::TermDefinition(1, 3),
        ];
        for path in paths {
            assert_eq!(path.to_string().parse::<FieldPath>().unwrap(), path);
        }
        for bad in ["", "interpretations", "interpretations[x]", "interpretations[1].value", "summary"] {
            assert!(bad.parse::<FieldPath>().is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn field_path_top_level() {
        assert_eq!(FieldPath::Disclaimer.top_level(), FieldPath::Disclaimer);
        assert_eq!(FieldPath::Explanation(2).top_level(), FieldPath::Interpretation(2));
        assert_eq!(FieldPath::TermDefinition(5, 0).top_level(), FieldPath::Interpretation(5));
    }

    #[test]
    fn violation_serializes_location_as_string() {
        let v = ContentViolation {
            category: ViolationCategory::AlarmingLanguage,
            severity: Severity::High,
            matched_text: "dangerous".into(),
            context: "is dangerous here".into(),
            location: FieldPath::Explanation(1),
            offset: 3,
        };
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["location"], "interpretations[1].explanation");
        assert_eq!(json["category"], "alarming-language");
        assert_eq!(json["matchedText"], "dangerous");
        let back: ContentViolation = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn defaults_carry_required_phrases() {
        assert!(SAFE_DISCLAIMER.contains("educational purposes"));
        assert!(SAFE_DISCLAIMER.contains("not constitute medical advice"));
        assert!(SAFE_DISCLAIMER.contains("healthcare provider"));
        assert!(SAFE_NEXT_STEPS.contains("healthcare provider"));
        assert!(SAFE_NEXT_STEPS.starts_with("Schedule a consultation"));
    }
}
