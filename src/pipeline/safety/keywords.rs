use std::collections::BTreeMap;

use crate::pipeline::record::InterpretationRecord;

use super::catalog::PatternCatalog;
use super::types::{ContentViolation, FieldPath, ViolationCategory, CONTEXT_PADDING};

/// Scan free text against every detection rule of the builtin catalog.
pub fn detect(text: &str, location: FieldPath) -> Vec<ContentViolation> {
    detect_with(PatternCatalog::builtin(), text, location)
}

/// Scan free text against every detection rule of `catalog`.
///
/// All non-overlapping matches of each rule are reported, in catalog order
/// then offset order. Matches are not deduplicated across rules. Matches the
/// catalog allows are skipped.
pub fn detect_with(
    catalog: &PatternCatalog,
    text: &str,
    location: FieldPath,
) -> Vec<ContentViolation> {
    let mut violations = Vec::new();

    for rule in catalog.detection_rules() {
        for mat in rule.regex.find_iter(text) {
            if catalog.is_allowed(mat.as_str()) {
                continue;
            }
            violations.push(ContentViolation {
                category: rule.category,
                severity: rule.severity(),
                matched_text: mat.as_str().to_string(),
                context: context_window(text, mat.start(), mat.end(), CONTEXT_PADDING),
                location,
                offset: mat.start(),
            });
        }
    }

    violations
}

/// Scan every validation surface of a record with the builtin catalog.
pub fn scan_record(record: &InterpretationRecord) -> Vec<ContentViolation> {
    scan_record_with(PatternCatalog::builtin(), record)
}

/// Scan every validation surface of a record.
pub fn scan_record_with(
    catalog: &PatternCatalog,
    record: &InterpretationRecord,
) -> Vec<ContentViolation> {
    let mut violations = Vec::new();
    for (path, text) in surfaces(record) {
        violations.extend(detect_with(catalog, text, path));
    }
    violations
}

/// Every human-readable free-text field, in scan order: disclaimer, next
/// steps, then per interpretation its explanation, context and terminology
/// definitions. Metadata, names and values are not surfaces.
pub fn surfaces(record: &InterpretationRecord) -> Vec<(FieldPath, &str)> {
    let mut out = vec![
        (FieldPath::Disclaimer, record.disclaimer.as_str()),
        (FieldPath::NextSteps, record.next_steps.as_str()),
    ];

    for (i, interp) in record.interpretations.iter().enumerate() {
        out.push((FieldPath::Explanation(i), interp.explanation.as_str()));
        out.push((FieldPath::Context(i), interp.context.as_str()));
        for (t, term) in interp.terminology.iter().enumerate() {
            out.push((FieldPath::TermDefinition(i, t), term.definition.as_str()));
        }
    }

    out
}

pub fn has_critical_violations(violations: &[ContentViolation]) -> bool {
    violations.iter().any(ContentViolation::is_critical)
}

/// Group violations by category, preserving scan order within each group.
pub fn group_by_category(
    violations: &[ContentViolation],
) -> BTreeMap<ViolationCategory, Vec<&ContentViolation>> {
    let mut groups: BTreeMap<ViolationCategory, Vec<&ContentViolation>> = BTreeMap::new();
    for v in violations {
        groups.entry(v.category).or_default().push(v);
    }
    groups
}

/// The match plus up to `padding` characters each side, on char boundaries.
fn context_window(text: &str, start: usize, end: usize, padding: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(padding)
        .last()
        .map_or(start, |(i, _)| i);
    let to = text[end..]
        .char_indices()
        .nth(padding)
        .map_or(text.len(), |(i, _)| end + i);
    text[from..to].to_string()
}
