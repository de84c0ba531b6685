//! Flowchart editing orchestrator.
//!
//! `FlowEditor` owns one [`FlowChart`] and one [`TranslationGateway`] and
//! answers the editing operations:
//! 1. Validates required fields before touching the gateway.
//! 2. Serializes requests: the chart lock is held for a whole operation.
//! 3. Retries transient gateway failures with exponential back-off.
//! 4. Degrades permanent gateway failures to placeholder SQL or default steps,
//!    so the chart is never left uninitialized.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use gateway::fallback::{default_steps, placeholder_sql};
use gateway::{Step, StepType, TranslationFailure, TranslationGateway};

use crate::graph::{bracket_steps, FlowChart};
use crate::{FlowChartError, FlowChartSnapshot};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for the editor.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Maximum number of times a retryable gateway failure will be retried.
    pub max_retries: u32,
    /// Base delay for exponential back-off between retries.
    pub retry_base_delay: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_base_delay: Duration::from_millis(100),
        }
    }
}

// ---------------------------------------------------------------------------
// Operation outcomes
// ---------------------------------------------------------------------------

/// Result of [`FlowEditor::generate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generated {
    pub sql: String,
    /// The decomposition, with sentinels, as loaded into the chart.
    pub steps: Vec<Step>,
    pub flowchart: FlowChartSnapshot,
}

/// Result of the operations that regenerate SQL from the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Synced {
    pub sql: String,
    pub flowchart: FlowChartSnapshot,
}

/// Result of [`FlowEditor::add_step`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepAdded {
    pub sql: String,
    pub flowchart: FlowChartSnapshot,
    pub new_step_id: String,
}

fn require<'a>(field: &str, value: &'a str) -> Result<&'a str, FlowChartError> {
    if value.trim().is_empty() {
        Err(FlowChartError::missing_field(field))
    } else {
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// FlowEditor
// ---------------------------------------------------------------------------

/// One editable flowchart and the gateway that keeps its SQL in sync.
///
/// Shared between request handlers behind an `Arc`; there is no global
/// instance.
pub struct FlowEditor {
    gateway: Arc<dyn TranslationGateway>,
    chart: Mutex<FlowChart>,
    config: EditorConfig,
}

impl FlowEditor {
    /// Create an editor with an empty chart.
    pub fn new(gateway: Arc<dyn TranslationGateway>, config: EditorConfig) -> Self {
        Self {
            gateway,
            chart: Mutex::new(FlowChart::new()),
            config,
        }
    }

    /// Current chart snapshot.
    pub async fn snapshot(&self) -> FlowChartSnapshot {
        self.chart.lock().await.to_dict()
    }

    /// Natural language → SQL → steps → chart.
    ///
    /// # Errors
    /// [`FlowChartError::Validation`] if `natural_language` is blank.
    #[instrument(skip(self, natural_language, schema))]
    pub async fn generate(
        &self,
        natural_language: &str,
        schema: Option<&str>,
    ) -> Result<Generated, FlowChartError> {
        let natural_language = require("natural_language", natural_language)?;
        let schema = schema.filter(|s| !s.trim().is_empty());

        let mut chart = self.chart.lock().await;

        let translated = self
            .call_with_retry("text_to_sql", || self.gateway.text_to_sql(natural_language, schema))
            .await;

        let (sql, steps) = match translated {
            Ok(sql) => {
                let steps = self.decompose(&sql).await;
                (sql, steps)
            }
            Err(failure) => {
                warn!("SQL generation failed, using placeholder: {failure}");
                (placeholder_sql("SQL generation", &failure), default_steps())
            }
        };

        let steps = bracket_steps(&steps);
        chart.from_steps(&steps);
        info!(nodes = chart.len(), "flowchart generated");

        Ok(Generated {
            sql,
            steps,
            flowchart: chart.to_dict(),
        })
    }

    /// Replace the chart with `steps` and regenerate SQL from them.
    ///
    /// # Errors
    /// [`FlowChartError::Validation`] if `steps` is empty.
    #[instrument(skip(self, steps), fields(steps = steps.len()))]
    pub async fn resync(&self, steps: &[Step]) -> Result<Synced, FlowChartError> {
        if steps.is_empty() {
            return Err(FlowChartError::missing_field("steps"));
        }

        let mut chart = self.chart.lock().await;

        let steps = bracket_steps(steps);
        let sql = self.regenerate_sql(&steps).await;
        chart.from_steps(&steps);

        Ok(Synced {
            sql,
            flowchart: chart.to_dict(),
        })
    }

    /// Append a step (optionally linked from `after_id`) and regenerate SQL.
    /// A missing or blank `step_type` means `process`.
    ///
    /// # Errors
    /// [`FlowChartError::Validation`] if `description` is blank.
    #[instrument(skip(self, description))]
    pub async fn add_step(
        &self,
        step_type: Option<&str>,
        description: &str,
        after_id: Option<&str>,
    ) -> Result<StepAdded, FlowChartError> {
        let description = require("description", description)?;
        let step_type = step_type
            .filter(|kind| !kind.trim().is_empty())
            .map_or(StepType::Process, StepType::from);

        let mut chart = self.chart.lock().await;

        let new_step_id = chart.add_step(step_type, description, after_id);
        info!(%new_step_id, "step added");

        let sql = self.regenerate_sql(&chart.to_steps()).await;
        Ok(StepAdded {
            sql,
            flowchart: chart.to_dict(),
            new_step_id,
        })
    }

    /// Change a step's text (and type, when given) and regenerate SQL.
    ///
    /// # Errors
    /// [`FlowChartError::Validation`] if `step_id` or `new_text` is blank,
    /// [`FlowChartError::NotFound`] if no such step exists.
    #[instrument(skip(self, new_text))]
    pub async fn update_step(
        &self,
        step_id: &str,
        new_text: &str,
        new_type: Option<&str>,
    ) -> Result<Synced, FlowChartError> {
        let step_id = require("step_id", step_id)?;
        let new_text = require("new_text", new_text)?;
        let new_type = new_type.filter(|kind| !kind.trim().is_empty());

        let mut chart = self.chart.lock().await;

        if !chart.update_step(step_id, new_text, new_type) {
            return Err(FlowChartError::NotFound(step_id.to_owned()));
        }

        let sql = self.regenerate_sql(&chart.to_steps()).await;
        Ok(Synced {
            sql,
            flowchart: chart.to_dict(),
        })
    }

    /// Delete a step and regenerate SQL.
    ///
    /// # Errors
    /// [`FlowChartError::Validation`] if `step_id` is blank,
    /// [`FlowChartError::NotFound`] if no such step exists.
    #[instrument(skip(self))]
    pub async fn remove_step(&self, step_id: &str) -> Result<Synced, FlowChartError> {
        let step_id = require("step_id", step_id)?;

        let mut chart = self.chart.lock().await;

        if !chart.remove_step(step_id) {
            return Err(FlowChartError::NotFound(step_id.to_owned()));
        }

        let sql = self.regenerate_sql(&chart.to_steps()).await;
        Ok(Synced {
            sql,
            flowchart: chart.to_dict(),
        })
    }

    // -----------------------------------------------------------------------
    // Internal: gateway calls with fallbacks.
    // -----------------------------------------------------------------------

    /// SQL → steps; failures and empty decompositions become the default
    /// two-step list.
    async fn decompose(&self, sql: &str) -> Vec<Step> {
        match self
            .call_with_retry("sql_to_steps", || self.gateway.sql_to_steps(sql))
            .await
        {
            Ok(steps) if !steps.is_empty() => steps,
            Ok(_) => {
                warn!("SQL decomposition came back empty, using default steps");
                default_steps()
            }
            Err(failure) => {
                warn!("SQL decomposition failed, using default steps: {failure}");
                default_steps()
            }
        }
    }

    async fn regenerate_sql(&self, steps: &[Step]) -> String {
        match self
            .call_with_retry("steps_to_sql", || self.gateway.steps_to_sql(steps))
            .await
        {
            Ok(sql) => sql,
            Err(failure) => {
                warn!("SQL regeneration failed, using placeholder: {failure}");
                placeholder_sql("SQL regeneration from steps", &failure)
            }
        }
    }

    async fn call_with_retry<T, F, Fut>(
        &self,
        operation: &str,
        mut call: F,
    ) -> Result<T, TranslationFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TranslationFailure>>,
    {
        let mut attempts = 0u32;

        loop {
            match call().await {
                Ok(value) => return Ok(value),

                Err(failure) if failure.is_retryable() && attempts < self.config.max_retries => {
                    attempts += 1;
                    let delay = self.config.retry_base_delay * 2u32.pow(attempts - 1);

                    warn!(
                        "{} retryable failure (attempt {}/{}), retrying in {:?}: {}",
                        operation, attempts, self.config.max_retries, delay, failure
                    );

                    tokio::time::sleep(delay).await;
                }

                Err(failure) => return Err(failure),
            }
        }
    }
}
