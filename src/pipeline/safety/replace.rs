//! Critical-path escalation: discard units holding critical content.
//!
//! Critical content is never patched. A disclaimer or next-steps field is
//! swapped for its fixed safe default; an interpretation is dropped whole.
//! The replacer runs once and never retries; the orchestrator re-scans.

use std::collections::BTreeSet;

use crate::pipeline::record::InterpretationRecord;

use super::types::{
    ContentViolation, FieldPath, RemediatedRecord, SAFE_DISCLAIMER, SAFE_NEXT_STEPS,
};

/// Replace or drop every top-level unit named by a critical violation in a
/// copy of `record`. High-severity violations are ignored.
///
/// `modified` lists the affected units using the indices of the input record.
pub fn replace_unsafe(
    record: &InterpretationRecord,
    violations: &[ContentViolation],
) -> RemediatedRecord {
    let targets: BTreeSet<FieldPath> = violations
        .iter()
        .filter(|v| v.is_critical())
        .map(|v| v.location.top_level())
        .collect();

    let mut replaced = record.clone();
    let mut modified = Vec::with_capacity(targets.len());
    let mut dropped = BTreeSet::new();

    for target in targets {
        match target {
            FieldPath::Disclaimer => replaced.disclaimer = SAFE_DISCLAIMER.to_string(),
            FieldPath::NextSteps => replaced.next_steps = SAFE_NEXT_STEPS.to_string(),
            FieldPath::Interpretation(i) if i < record.interpretations.len() => {
                dropped.insert(i);
            }
            _ => continue,
        }
        modified.push(target);
    }

    if !dropped.is_empty() {
        replaced.interpretations = record
            .interpretations
            .iter()
            .enumerate()
            .filter(|(i, _)| !dropped.contains(i))
            .map(|(_, interp)| interp.clone())
            .collect();
    }

    if !modified.is_empty() {
        tracing::debug!(
            replaced_fields = ?modified.iter().map(ToString::to_string).collect::<Vec<_>>(),
            interpretations_dropped = dropped.len(),
            "Critical content replaced"
        );
    }

    RemediatedRecord {
        record: replaced,
        modified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::record::TestInterpretation;
    use crate::pipeline::safety::keywords::{has_critical_violations, scan_record};

    fn interp(name: &str, explanation: &str) -> TestInterpretation {
        TestInterpretation {
            test_name: name.into(),
            value: "1".into(),
            explanation: explanation.into(),
            context: "Measured in a blood sample.".into(),
            ..Default::default()
        }
    }

    fn record() -> InterpretationRecord {
        InterpretationRecord {
            disclaimer: "For educational purposes only.".into(),
            next_steps: "Discuss these results with your doctor.".into(),
            interpretations: vec![
                interp("Hemoglobin", "Hemoglobin carries oxygen."),
                interp("Ferritin", "Here you are diagnosed with anemia."),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn drops_interpretation_with_critical_content() {
        let r = record();
        let violations = scan_record(&r);
        assert!(has_critical_violations(&violations));

        let result = replace_unsafe(&r, &violations);
        assert_eq!(result.record.interpretations.len(), 1);
        assert_eq!(result.record.interpretations[0].test_name, "Hemoglobin");
        assert_eq!(result.modified, vec![FieldPath::Interpretation(1)]);
        assert!(!has_critical_violations(&scan_record(&result.record)));
    }

    #[test]
    fn replaces_top_level_fields_with_defaults() {
        let mut r = record();
        r.disclaimer = "This is consistent with diabetes.".into();
        r.next_steps = "You should take insulin.".into();
        r.interpretations.truncate(1);

        let result = replace_unsafe(&r, &scan_record(&r));
        assert_eq!(result.record.disclaimer, SAFE_DISCLAIMER);
        assert_eq!(result.record.next_steps, SAFE_NEXT_STEPS);
        assert_eq!(result.modified, vec![FieldPath::Disclaimer, FieldPath::NextSteps]);
        assert_eq!(result.record.interpretations, r.interpretations);
        assert!(scan_record(&result.record).is_empty());
    }

    #[test]
    fn multiple_critical_hits_in_one_interpretation_drop_it_once() {
        let mut r = record();
        r.interpretations[1].context = "Cardiac infection markers.".into();
        r.interpretations[1].terminology = vec![crate::pipeline::record::TerminologyDefinition {
            term: "Ferritin".into(),
            definition: "Positive for sepsis.".into(),
        }];
        let result = replace_unsafe(&r, &scan_record(&r));
        assert_eq!(result.modified, vec![FieldPath::Interpretation(1)]);
        assert_eq!(result.record.interpretations.len(), 1);
    }

    #[test]
    fn drops_non_adjacent_interpretations_by_original_index() {
        let mut r = record();
        r.interpretations.push(interp("Glucose", "Hyperglycemia signals diabetes."));
        r.interpretations.push(interp("Sodium", "Sodium balances fluids."));
        let result = replace_unsafe(&r, &scan_record(&r));
        let names: Vec<_> = result
            .record
            .interpretations
            .iter()
            .map(|i| i.test_name.as_str())
            .collect();
        assert_eq!(names, vec!["Hemoglobin", "Sodium"]);
        assert_eq!(
            result.modified,
            vec![FieldPath::Interpretation(1), FieldPath::Interpretation(2)]
        );
    }

    #[test]
    fn high_severity_is_ignored() {
        let mut r = record();
        r.interpretations.truncate(1);
        r.disclaimer = "This is dangerous.".into();
        let violations = scan_record(&r);
        assert!(!violations.is_empty());

        let result = replace_unsafe(&r, &violations);
        assert!(result.modified.is_empty());
        assert_eq!(result.record, r);
    }

    #[test]
    fn input_is_never_mutated() {
        let r = record();
        let snapshot = r.clone();
        let _ = replace_unsafe(&r, &scan_record(&r));
        assert_eq!(r, snapshot);
    }

    #[test]
    fn stale_out_of_range_index_is_skipped() {
        let r = record();
        let mut violations = scan_record(&r);
        for v in &mut violations {
            v.location = FieldPath::Explanation(9);
        }
        let result = replace_unsafe(&r, &violations);
        assert!(result.modified.is_empty());
        assert_eq!(result.record, r);
    }
}
