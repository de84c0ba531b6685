//! Prompt construction and reply clean-up for the text-generation model.

use crate::{Step, TranslationFailure};

pub(crate) const TEXT_TO_SQL_SYSTEM: &str = "You are a professional SQL assistant. \
     Translate the user's natural-language description into an accurate SQL query.";

pub(crate) const SQL_TO_STEPS_SYSTEM: &str =
    "You are a SQL analysis assistant. You break SQL statements down into execution steps.";

pub(crate) const STEPS_TO_SQL_SYSTEM: &str =
    "You are a SQL assistant. You rebuild SQL statements from their execution steps.";

pub(crate) fn text_to_sql_prompt(natural_language: &str, schema: Option<&str>) -> String {
    let mut prompt = format!(
        "Convert the following natural-language description into a SQL query:\n\n{natural_language}\n\n"
    );
    if let Some(schema) = schema.filter(|s| !s.trim().is_empty()) {
        prompt.push_str(&format!("\nDatabase schema:\n{schema}\n\n"));
    }
    prompt.push_str("Return only the SQL statement, without any explanation.");
    prompt
}

pub(crate) fn sql_to_steps_prompt(sql: &str) -> String {
    format!(
        "Break the following SQL statement down into execution steps. Represent each step as \
         a JSON object with step_id, step_type and description:\n\n{sql}\n\n\
         Return a JSON array."
    )
}

pub(crate) fn steps_to_sql_prompt(steps: &[Step]) -> Result<String, TranslationFailure> {
    let steps = serde_json::to_string_pretty(steps)?;
    Ok(format!(
        "Rebuild the complete SQL query from the following steps:\n\n{steps}\n\n\
         Return the SQL statement without any explanation."
    ))
}

/// Remove markdown code fences the model likes to wrap SQL in.
pub fn strip_sql_fences(reply: &str) -> String {
    reply
        .replace("```sql\n", "")
        .replace("```sql", "")
        .replace("```", "")
        .trim()
        .to_owned()
}

/// Parse a step list out of a chatty reply: the slice from the first `[` to
/// the last `]` wins if there is one, otherwise the whole reply is tried.
pub fn parse_steps(reply: &str) -> Result<Vec<Step>, TranslationFailure> {
    let candidate = match (reply.find('['), reply.rfind(']')) {
        (Some(open), Some(close)) if open < close => &reply[open..=close],
        _ => reply,
    };
    Ok(serde_json::from_str(candidate)?)
}
