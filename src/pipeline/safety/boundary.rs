//! Client boundary: turn a validation result into an accept/reject outcome.
//!
//! Callers on the end-user path get a generic message on failure. The full
//! `ValidationResult` rides along in `ClientResponse::report` for operators
//! but is never serialized, since it can quote pre-sanitization text.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pipeline::record::InterpretationRecord;

use super::orchestrator::ResponseValidator;
use super::types::{ContentViolation, FieldPath, ValidationResult};

pub const SAFETY_FAILURE: &str = "Response failed safety validation";
pub const STRUCTURE_FAILURE: &str = "Response structure validation failed";

/// Outcome handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<InterpretationRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub report: Option<ValidationResult>,
}

/// Operator-facing summary of a candidate record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateReport {
    /// Whether the client boundary would accept it.
    pub validated: bool,
    pub structure_valid: bool,
    pub content_safe: bool,
    pub violation_count: usize,
    pub critical_violation_count: usize,
    /// Whether remediation changed anything.
    pub sanitized: bool,
    pub modifications: Vec<FieldPath>,
    pub violations: Vec<ContentViolation>,
    pub sanitized_data: Option<InterpretationRecord>,
}

/// Validate a generated payload in relaxed, auto-sanitizing mode.
pub fn validate_for_client(payload: &Value) -> ClientResponse {
    let result = ResponseValidator::client().validate_value(payload);

    if !result.is_safe {
        tracing::warn!(
            critical = result.critical_violation_count(),
            "Client response rejected: unsafe content"
        );
        return reject(SAFETY_FAILURE, result);
    }

    if !result.is_valid {
        tracing::warn!(
            error_count = result.errors.len(),
            "Client response rejected: invalid structure"
        );
        return reject(STRUCTURE_FAILURE, result);
    }

    let data = result
        .sanitized
        .clone()
        .unwrap_or_else(|| InterpretationRecord::from_value_lenient(payload));

    tracing::info!(
        modified = result.modifications.len(),
        interpretations = data.interpretations.len(),
        "Client response accepted"
    );

    ClientResponse {
        success: true,
        data: Some(data),
        error: None,
        report: Some(result),
    }
}

/// Same as [`validate_for_client`] over JSON text. Text that does not parse
/// is treated as a non-object payload.
pub fn validate_for_client_str(raw: &str) -> ClientResponse {
    validate_for_client(&parse_or_null(raw))
}

/// Run a candidate through the client boundary and summarize the result.
pub fn check_candidate(payload: &Value) -> CandidateReport {
    let response = validate_for_client(payload);
    let result = response.report.unwrap_or_default();

    CandidateReport {
        validated: response.success,
        structure_valid: result.is_valid,
        content_safe: result.is_safe,
        violation_count: result.violations.len(),
        critical_violation_count: result.critical_violation_count(),
        sanitized: !result.modifications.is_empty(),
        modifications: result.modifications,
        violations: result.violations,
        sanitized_data: response.data,
    }
}

pub fn check_candidate_str(raw: &str) -> CandidateReport {
    check_candidate(&parse_or_null(raw))
}

fn reject(message: &str, result: ValidationResult) -> ClientResponse {
    ClientResponse {
        success: false,
        data: None,
        error: Some(message.to_string()),
        report: Some(result),
    }
}

fn parse_or_null(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Candidate is not valid JSON");
        Value::Null
    })
}
