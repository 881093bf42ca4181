pub mod types;
pub mod catalog;
pub mod keywords;
pub mod rephrase;
pub mod replace;
pub mod structure;
pub mod advisory;
pub mod orchestrator;
pub mod boundary;

pub use boundary::{
    check_candidate, check_candidate_str, validate_for_client, validate_for_client_str,
    CandidateReport, ClientResponse,
};
pub use catalog::{PatternCatalog, RuleSpec};
pub use keywords::{detect, group_by_category, has_critical_violations, scan_record};
pub use orchestrator::{Remediation, ResponseValidator, ValidationStage};
pub use rephrase::{sanitize_record, sanitize_text, SanitizedText};
pub use replace::replace_unsafe;
pub use structure::{validate_structure, StructureReport};
pub use types::{
    ContentViolation, FieldPath, RemediatedRecord, SafetyError, Severity, ValidationResult,
    ViolationCategory,
};
