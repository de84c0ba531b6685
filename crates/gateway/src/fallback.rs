//! Degraded results used when a translation call fails for good.

use crate::{Step, StepType, TranslationFailure};

/// A single commented SQL line saying what failed and why.
///
/// The reason is flattened onto one line so the result is still a valid SQL
/// comment.
pub fn placeholder_sql(action: &str, failure: &TranslationFailure) -> String {
    let reason = failure.to_string().replace(['\r', '\n'], " ");
    format!("-- {action} failed: {reason}")
}

/// Minimal decomposition shown when the SQL could not be broken into steps.
pub fn default_steps() -> Vec<Step> {
    vec![
        Step::new(1, StepType::Query, "Execute query"),
        Step::new(2, StepType::Result, "Fetch results"),
    ]
}
