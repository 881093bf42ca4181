// Structural checks on the raw payload, independent of content safety.
// Every defect is collected; nothing short-circuits except a payload that is
// not an object at all.

use serde_json::{Map, Value};

use crate::pipeline::record::TestStatus;

/// Outcome of the structural pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Check the raw payload has the interpretation record shape.
pub fn validate_structure(payload: &Value) -> StructureReport {
    let mut errors = Vec::new();

    let Some(obj) = payload.as_object() else {
        errors.push("Response is not a valid object".to_string());
        return StructureReport {
            is_valid: false,
            errors,
        };
    };

    if !obj.get("reportMetadata").is_some_and(Value::is_object) {
        errors.push("Missing reportMetadata field".to_string());
    }

    let interpretations = obj.get("interpretations").and_then(Value::as_array);
    match interpretations {
        None => errors.push("Missing or invalid interpretations array".to_string()),
        Some(items) if items.is_empty() => {
            errors.push("Interpretations array is empty".to_string());
        }
        Some(_) => {}
    }

    if !is_non_empty_string(obj, "disclaimer") {
        errors.push("Missing or invalid disclaimer".to_string());
    }

    if !is_non_empty_string(obj, "nextSteps") {
        errors.push("Missing or invalid nextSteps".to_string());
    }

    for (index, item) in interpretations.into_iter().flatten().enumerate() {
        validate_interpretation(index, item, &mut errors);
    }

    if !errors.is_empty() {
        tracing::debug!(error_count = errors.len(), "Structural validation failed");
    }

    StructureReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

fn validate_interpretation(index: usize, item: &Value, errors: &mut Vec<String>) {
    let Some(interp) = item.as_object() else {
        errors.push(format!("Interpretation {index}: not an object"));
        return;
    };

    for key in ["testName", "value"] {
        if !is_non_empty_string(interp, key) {
            errors.push(format!("Interpretation {index}: missing {key}"));
        }
    }

    match interp.get("status").and_then(Value::as_str) {
        None | Some("") => errors.push(format!("Interpretation {index}: missing status")),
        Some(status) if TestStatus::from_wire(status).is_none() => {
            errors.push(format!("Interpretation {index}: invalid status \"{status}\""));
        }
        Some(_) => {}
    }

    if !is_non_empty_string(interp, "explanation") {
        errors.push(format!("Interpretation {index}: missing explanation"));
    }

    match interp.get("terminology").and_then(Value::as_array) {
        None => errors.push(format!(
            "Interpretation {index}: missing or invalid terminology array"
        )),
        Some(terms) => {
            for (t, term) in terms.iter().enumerate() {
                if !term.is_object() {
                    errors.push(format!("Interpretation {index}: terminology {t} not an object"));
                }
            }
        }
    }
}

fn is_non_empty_string(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty())
}
