use serde_json::Value;

use crate::config::ValidationOptions;
use crate::pipeline::record::InterpretationRecord;

use super::advisory::{check_disclaimer, check_next_steps};
use super::catalog::PatternCatalog;
use super::keywords::{group_by_category, has_critical_violations, scan_record_with};
use super::rephrase::sanitize_record_with;
use super::replace::replace_unsafe;
use super::structure::validate_structure;
use super::types::{
    ContentViolation, FieldPath, RemediatedRecord, Severity, ValidationResult,
    SANITIZATION_FAILED,
};

/// Pipeline stages, in order. Logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStage {
    Unchecked,
    StructureChecked,
    ContentScanned,
    Clean,
    Remediating,
    Remediated,
    ReVerified,
    Accepted,
    Rejected,
}

/// Which remediation path a violation set calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remediation {
    /// Nothing found.
    Clean,
    /// Only high-severity violations: rewrite text in place.
    Sanitize,
    /// At least one critical violation: replace or drop whole units.
    Replace,
}

impl Remediation {
    pub fn plan(violations: &[ContentViolation]) -> Self {
        if violations.is_empty() {
            Self::Clean
        } else if has_critical_violations(violations) {
            Self::Replace
        } else {
            Self::Sanitize
        }
    }
}

/// Validates interpretation records against a pattern catalog.
pub struct ResponseValidator<'c> {
    catalog: &'c PatternCatalog,
    options: ValidationOptions,
}

impl ResponseValidator<'static> {
    /// Validator over the builtin catalog.
    pub fn new(options: ValidationOptions) -> Self {
        Self::with_catalog(PatternCatalog::builtin(), options)
    }

    /// Relaxed, auto-sanitizing validator used by the client boundary.
    pub fn client() -> Self {
        Self::new(ValidationOptions::client())
    }
}

impl Default for ResponseValidator<'static> {
    fn default() -> Self {
        Self::new(ValidationOptions::default())
    }
}

impl<'c> ResponseValidator<'c> {
    pub fn with_catalog(catalog: &'c PatternCatalog, options: ValidationOptions) -> Self {
        Self { catalog, options }
    }

    pub fn options(&self) -> ValidationOptions {
        self.options
    }

    /// Validate an already-typed record. Structure is checked on its JSON form.
    pub fn validate_record(&self, record: &InterpretationRecord) -> ValidationResult {
        let value = serde_json::to_value(record).expect("InterpretationRecord serializes to JSON");
        self.validate_value(&value)
    }

    /// Run the full pipeline over an untrusted payload.
    pub fn validate_value(&self, payload: &Value) -> ValidationResult {
        let mut stage = ValidationStage::Unchecked;
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // Unchecked → StructureChecked
        let structure = validate_structure(payload);
        errors.extend(structure.errors);
        advance(&mut stage, ValidationStage::StructureChecked);

        if !structure.is_valid && self.options.strict_mode {
            advance(&mut stage, ValidationStage::Rejected);
            tracing::warn!(
                outcome = "rejected",
                error_count = errors.len(),
                "Strict validation stopped at structure check"
            );
            return ValidationResult {
                is_valid: false,
                is_safe: false,
                errors,
                warnings,
                ..Default::default()
            };
        }

        let record = InterpretationRecord::from_value_lenient(payload);

        // StructureChecked → ContentScanned
        if !record.disclaimer.is_empty() {
            warnings.extend(check_disclaimer(&record.disclaimer));
        }
        if !record.next_steps.is_empty() {
            warnings.extend(check_next_steps(&record.next_steps));
        }

        let violations = scan_record_with(self.catalog, &record);
        log_violations(&violations);
        for (category, group) in group_by_category(&violations) {
            warnings.push(format!("Found {} {category} violation(s)", group.len()));
        }
        advance(&mut stage, ValidationStage::ContentScanned);

        let plan = Remediation::plan(&violations);
        let (sanitized, modifications, residual) = if !self.options.auto_sanitize {
            (None, Vec::new(), violations.clone())
        } else if plan == Remediation::Clean {
            advance(&mut stage, ValidationStage::Clean);
            (Some(record), Vec::new(), Vec::new())
        } else {
            advance(&mut stage, ValidationStage::Remediating);
            let remediated = match plan {
                Remediation::Replace => replace_unsafe(&record, &violations),
                _ => sanitize_record_with(self.catalog, &record),
            };
            advance(&mut stage, ValidationStage::Remediated);

            let residual = self.reverify(&record, &remediated, plan, &mut errors, &mut warnings);
            advance(&mut stage, ValidationStage::ReVerified);

            let RemediatedRecord { record, modified } = remediated;
            (Some(record), modified, residual)
        };

        let remediated = plan != Remediation::Clean && self.options.auto_sanitize;
        let structurally_valid = errors.is_empty();
        let content_ok = if self.options.strict_mode {
            violations.is_empty()
        } else {
            !has_critical_violations(&residual)
        };
        let is_valid = structurally_valid && content_ok;
        let is_safe = !has_critical_violations(&residual) || (remediated && !modifications.is_empty());

        advance(
            &mut stage,
            if is_valid && is_safe {
                ValidationStage::Accepted
            } else {
                ValidationStage::Rejected
            },
        );
        log_outcome(stage, plan, &violations, &residual, &modifications);

        ValidationResult {
            is_valid,
            is_safe,
            violations,
            residual_violations: residual,
            errors,
            warnings,
            sanitized,
            modifications,
        }
    }

    /// Re-scan a remediated record. Critical residue after either path is a
    /// terminal error; high-severity residue is reported as a warning.
    fn reverify(
        &self,
        original: &InterpretationRecord,
        remediated: &RemediatedRecord,
        plan: Remediation,
        errors: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) -> Vec<ContentViolation> {
        let residual = scan_record_with(self.catalog, &remediated.record);

        if has_critical_violations(&residual) {
            tracing::error!(
                remaining = residual.iter().filter(|v| v.is_critical()).count(),
                ?plan,
                "Remediation left critical violations"
            );
            errors.push(SANITIZATION_FAILED.to_string());
        }

        let high = residual
            .iter()
            .filter(|v| v.severity == Severity::High)
            .count();
        if high > 0 && plan == Remediation::Sanitize {
            warnings.push(format!(
                "{high} high-severity violation(s) remain after sanitization"
            ));
        }

        if plan == Remediation::Replace
            && !original.interpretations.is_empty()
            && remediated.record.interpretations.is_empty()
        {
            errors.push("No interpretations remain after removing unsafe entries".to_string());
        }

        residual
    }
}

fn advance(stage: &mut ValidationStage, next: ValidationStage) {
    tracing::debug!(from = ?stage, to = ?next, "Validation stage");
    *stage = next;
}

/// Log violations for audit WITHOUT record text.
fn log_violations(violations: &[ContentViolation]) {
    for v in violations {
        tracing::debug!(
            category = %v.category,
            severity = ?v.severity,
            location = %v.location,
            "Content violation detected"
        );
    }
}

/// Log the pipeline outcome WITHOUT record text.
fn log_outcome(
    stage: ValidationStage,
    plan: Remediation,
    violations: &[ContentViolation],
    residual: &[ContentViolation],
    modifications: &[FieldPath],
) {
    match (stage, plan) {
        (ValidationStage::Accepted, Remediation::Clean) => {
            tracing::info!(outcome = "passed", "Validation: clean pass");
        }
        (ValidationStage::Accepted, _) => {
            tracing::warn!(
                outcome = "remediated",
                ?plan,
                violation_count = violations.len(),
                modified = ?modifications.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "Validation: remediated"
            );
        }
        _ => {
            tracing::warn!(
                outcome = "rejected",
                ?plan,
                violation_count = violations.len(),
                residual_count = residual.len(),
                categories = ?violations.iter().map(|v| v.category.as_str()).collect::<Vec<_>>(),
                "Validation: rejected"
            );
        }
    }
}
