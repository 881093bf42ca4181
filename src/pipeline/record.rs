//! Interpretation record schema.
//!
//! This is the shape the upstream generator produces and the rendering layer
//! consumes. Keys are camelCase on the wire. The safety pipeline receives the
//! record as untrusted JSON, so besides the strict serde derive there is a
//! lenient projection that never fails: missing or mistyped fields collapse to
//! their defaults and the structural validator reports them separately.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status of a test result relative to its reference range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    WithinRange,
    AboveRange,
    BelowRange,
    #[default]
    Unknown,
}

impl TestStatus {
    /// Wire names accepted by the structural validator.
    pub const WIRE_NAMES: [&'static str; 4] =
        ["within_range", "above_range", "below_range", "unknown"];

    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "within_range" => Some(Self::WithinRange),
            "above_range" => Some(Self::AboveRange),
            "below_range" => Some(Self::BelowRange),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// A medical term and its patient-friendly definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminologyDefinition {
    pub term: String,
    pub definition: String,
}

/// One test parameter, explained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestInterpretation {
    pub test_name: String,
    /// Measured value with units, e.g. "6.5%".
    pub value: String,
    #[serde(default)]
    pub reference_range: Option<String>,
    pub status: TestStatus,
    pub explanation: String,
    pub context: String,
    #[serde(default)]
    pub terminology: Vec<TerminologyDefinition>,
}

/// Metadata lifted from the report header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub report_date: Option<String>,
    pub report_type: String,
    #[serde(default)]
    pub lab_name: Option<String>,
}

/// The complete structured interpretation of a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretationRecord {
    pub report_metadata: ReportMetadata,
    pub interpretations: Vec<TestInterpretation>,
    pub disclaimer: String,
    pub next_steps: String,
}

impl InterpretationRecord {
    /// Project arbitrary JSON onto the record shape without failing.
    ///
    /// Non-object input yields an empty record. Array elements that are not
    /// objects become empty placeholders, so element indices still match the
    /// payload.
    pub fn from_value_lenient(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        Self {
            report_metadata: obj
                .get("reportMetadata")
                .and_then(Value::as_object)
                .map(metadata_lenient)
                .unwrap_or_default(),
            interpretations: array_lenient(obj.get("interpretations"), interpretation_lenient),
            disclaimer: string_field(obj, "disclaimer"),
            next_steps: string_field(obj, "nextSteps"),
        }
    }
}

fn metadata_lenient(obj: &Map<String, Value>) -> ReportMetadata {
    ReportMetadata {
        patient_name: optional_string_field(obj, "patientName"),
        report_date: optional_string_field(obj, "reportDate"),
        report_type: string_field(obj, "reportType"),
        lab_name: optional_string_field(obj, "labName"),
    }
}

fn interpretation_lenient(obj: &Map<String, Value>) -> TestInterpretation {
    TestInterpretation {
        test_name: string_field(obj, "testName"),
        value: string_field(obj, "value"),
        reference_range: optional_string_field(obj, "referenceRange"),
        status: obj
            .get("status")
            .and_then(Value::as_str)
            .and_then(TestStatus::from_wire)
            .unwrap_or_default(),
        explanation: string_field(obj, "explanation"),
        context: string_field(obj, "context"),
        terminology: array_lenient(obj.get("terminology"), |t| TerminologyDefinition {
            term: string_field(t, "term"),
            definition: string_field(t, "definition"),
        }),
    }
}

/// Map every element of an optional array. A non-object element is parsed as
/// an empty object.
fn array_lenient<T>(
    items: Option<&Value>,
    parse: impl Fn(&Map<String, Value>) -> T,
) -> Vec<T> {
    let Some(arr) = items.and_then(Value::as_array) else {
        return vec![];
    };
    let empty = Map::new();
    arr.iter()
        .map(|item| parse(item.as_object().unwrap_or(&empty)))
        .collect()
}

fn string_field(obj: &Map<String, Value>, key: &str) -> String {
    optional_string_field(obj, key).unwrap_or_default()
}

fn optional_string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}
