//! `Step` — the unit of work exchanged with the translation service.
//!
//! Defined here (in the gateway crate) so both the gateway implementations and
//! the flowchart crate can import it without a circular dependency.
//!
//! Upstream step lists come from a best-effort text-generation model, so every
//! field is optional on the way in and a numeric-string `step_id` is accepted.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// StepType
// ---------------------------------------------------------------------------

/// Kind of a step. Known kinds get their own variant; anything else the model
/// invents is carried verbatim in [`StepType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepType {
    Start,
    End,
    #[default]
    Process,
    Query,
    Condition,
    Result,
    Other(String),
}

impl StepType {
    pub fn as_str(&self) -> &str {
        match self {
            StepType::Start => "start",
            StepType::End => "end",
            StepType::Process => "process",
            StepType::Query => "query",
            StepType::Condition => "condition",
            StepType::Result => "result",
            StepType::Other(kind) => kind,
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(self, StepType::Start)
    }

    pub fn is_end(&self) -> bool {
        matches!(self, StepType::End)
    }
}

impl From<String> for StepType {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "start" => StepType::Start,
            "end" => StepType::End,
            "process" => StepType::Process,
            "query" => StepType::Query,
            "condition" => StepType::Condition,
            "result" => StepType::Result,
            _ => StepType::Other(kind),
        }
    }
}

impl From<&str> for StepType {
    fn from(kind: &str) -> Self {
        StepType::from(kind.to_owned())
    }
}

impl From<StepType> for String {
    fn from(kind: StepType) -> Self {
        match kind {
            StepType::Other(kind) => kind,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// One ordered, typed, described unit of SQL execution.
///
/// `step_id` is advisory ordering metadata: it is not guaranteed to be
/// contiguous or even present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Step {
    #[serde(
        default,
        alias = "stepId",
        deserialize_with = "lenient_step_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub step_id: Option<u64>,

    #[serde(default, alias = "stepType", skip_serializing_if = "Option::is_none")]
    pub step_type: Option<StepType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Step {
    /// A fully-populated step.
    pub fn new(step_id: u64, step_type: impl Into<StepType>, description: impl Into<String>) -> Self {
        Self {
            step_id: Some(step_id),
            step_type: Some(step_type.into()),
            description: Some(description.into()),
        }
    }

    /// True when the step is explicitly typed `start`.
    pub fn is_start(&self) -> bool {
        self.step_type.as_ref().is_some_and(StepType::is_start)
    }

    /// True when the step is explicitly typed `end`.
    pub fn is_end(&self) -> bool {
        self.step_type.as_ref().is_some_and(StepType::is_end)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStepId {
    Integer(u64),
    Float(f64),
    Text(String),
}

/// 2^64: the first float that no longer fits a `u64`.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// Accepts `3`, `3.0` and `"3"`; anything negative, fractional, out of range
/// or non-numeric becomes `None` rather than failing the whole list.
fn lenient_step_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawStepId>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| match raw {
        RawStepId::Integer(id) => Some(id),
        RawStepId::Float(id) if (0.0..U64_LIMIT).contains(&id) && id.fract() == 0.0 => {
            Some(id as u64)
        }
        RawStepId::Float(_) => None,
        RawStepId::Text(id) => id.trim().parse().ok(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_and_free_form_types_round_trip_as_plain_strings() {
        let kinds: Vec<StepType> =
            serde_json::from_value(json!(["start", "query", "join tables"])).unwrap();
        assert_eq!(
            kinds,
            vec![
                StepType::Start,
                StepType::Query,
                StepType::Other("join tables".into())
            ]
        );
        assert_eq!(serde_json::to_value(&kinds).unwrap(), json!(["start", "query", "join tables"]));
    }

    #[test]
    fn type_matching_is_case_sensitive() {
        assert_eq!(StepType::from("Start"), StepType::Other("Start".into()));
    }

    #[test]
    fn step_accepts_snake_and_camel_case_fields() {
        let snake: Step = serde_json::from_value(json!({
            "step_id": 2, "step_type": "query", "description": "scan users"
        }))
        .unwrap();
        let camel: Step = serde_json::from_value(json!({
            "stepId": 2, "stepType": "query", "description": "scan users"
        }))
        .unwrap();
        assert_eq!(snake, camel);
        assert_eq!(snake, Step::new(2, StepType::Query, "scan users"));
    }

    #[test]
    fn step_id_is_parsed_leniently() {
        let steps: Vec<Step> = serde_json::from_value(json!([
            { "step_id": "7" },
            { "step_id": 4.0 },
            { "step_id": -1 },
            { "step_id": "first" },
            { "step_id": null },
            {}
        ]))
        .unwrap();
        let ids: Vec<Option<u64>> = steps.iter().map(|s| s.step_id).collect();
        assert_eq!(ids, vec![Some(7), Some(4), None, None, None, None]);
    }

    #[test]
    fn out_of_range_step_ids_are_dropped() {
        let steps: Vec<Step> = serde_json::from_value(json!([
            { "step_id": 18446744073709551615u64 },
            { "step_id": 1e30 },
            { "step_id": "99999999999999999999" }
        ]))
        .unwrap();
        let ids: Vec<Option<u64>> = steps.iter().map(|s| s.step_id).collect();
        assert_eq!(ids, vec![Some(u64::MAX), None, None]);
    }

    #[test]
    fn absent_fields_are_not_serialized() {
        let step = Step { step_id: Some(1), ..Step::default() };
        assert_eq!(serde_json::to_value(&step).unwrap(), json!({ "step_id": 1 }));
    }
}
