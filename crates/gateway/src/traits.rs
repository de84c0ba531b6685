//! The `TranslationGateway` trait — the contract every translation backend
//! must fulfil.

use async_trait::async_trait;

use crate::{Step, TranslationFailure};

/// Natural-language / SQL / step conversion, delegated to an external model.
///
/// Each call is independent and may fail on its own. Implementations hold no
/// flowchart state, so repeating a call after a failure is always safe.
#[async_trait]
pub trait TranslationGateway: Send + Sync {
    /// Translate a natural-language request into SQL. `schema` is optional
    /// free-form database structure information.
    async fn text_to_sql(
        &self,
        natural_language: &str,
        schema: Option<&str>,
    ) -> Result<String, TranslationFailure>;

    /// Decompose SQL into an ordered list of execution steps.
    async fn sql_to_steps(&self, sql: &str) -> Result<Vec<Step>, TranslationFailure>;

    /// Rebuild SQL from an ordered list of steps.
    async fn steps_to_sql(&self, steps: &[Step]) -> Result<String, TranslationFailure>;
}
