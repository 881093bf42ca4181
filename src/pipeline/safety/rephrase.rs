use regex::Captures;

use crate::pipeline::record::InterpretationRecord;

use super::catalog::PatternCatalog;
use super::types::{FieldPath, RemediatedRecord};

/// Result of rewriting one piece of free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedText {
    pub text: String,
    pub was_modified: bool,
}

/// Rewrite unsafe phrasing with the builtin catalog.
pub fn sanitize_text(text: &str) -> SanitizedText {
    sanitize_text_with(PatternCatalog::builtin(), text)
}

/// Upper bound on full rewrite passes over one text.
const MAX_PASSES: usize = 16;

/// Apply the rewrite rules until the text stops changing.
///
/// A rule's trailing capture can swallow the next trigger ("diagnosed with
/// diagnosed with x"), leaving it for a later pass. Running to a fixed point
/// keeps the output stable under a second call.
pub fn sanitize_text_with(catalog: &PatternCatalog, text: &str) -> SanitizedText {
    let mut result = text.to_string();

    for _ in 0..MAX_PASSES {
        match rewrite_pass(catalog, &result) {
            Some(next) => result = next,
            None => break,
        }
    }

    SanitizedText {
        was_modified: result != text,
        text: result,
    }
}

/// One pass: every rewrite rule in catalog order, each a global substitution
/// over the output of the rule before it. `None` when nothing changed.
fn rewrite_pass(catalog: &PatternCatalog, text: &str) -> Option<String> {
    let mut result = text.to_string();
    let mut changed = false;

    for rule in catalog.rewrite_rules() {
        let replaced = rule.regex.replace_all(&result, |caps: &Captures<'_>| {
            let matched = &caps[0];
            if catalog.is_allowed(matched) {
                return matched.to_string();
            }
            let mut out = String::new();
            caps.expand(&rule.template, &mut out);
            out
        });
        if replaced != result {
            result = replaced.into_owned();
            changed = true;
        }
    }

    changed.then_some(result)
}

/// Rewrite every validation surface of a copy of `record`.
pub fn sanitize_record(record: &InterpretationRecord) -> RemediatedRecord {
    sanitize_record_with(PatternCatalog::builtin(), record)
}

/// Rewrite every validation surface of a copy of `record`, reporting the
/// paths that changed. The input is never touched.
pub fn sanitize_record_with(
    catalog: &PatternCatalog,
    record: &InterpretationRecord,
) -> RemediatedRecord {
    let mut sanitized = record.clone();
    let mut modified = Vec::new();

    let mut apply = |path: FieldPath, field: &mut String| {
        let result = sanitize_text_with(catalog, field);
        if result.was_modified {
            *field = result.text;
            modified.push(path);
        }
    };

    apply(FieldPath::Disclaimer, &mut sanitized.disclaimer);
    apply(FieldPath::NextSteps, &mut sanitized.next_steps);

    for (i, interp) in sanitized.interpretations.iter_mut().enumerate() {
        apply(FieldPath::Explanation(i), &mut interp.explanation);
        apply(FieldPath::Context(i), &mut interp.context);
        for (t, term) in interp.terminology.iter_mut().enumerate() {
            apply(FieldPath::TermDefinition(i, t), &mut term.definition);
        }
    }

    RemediatedRecord {
        record: sanitized,
        modified,
    }
}
