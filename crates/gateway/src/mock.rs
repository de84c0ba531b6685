//! `MockGateway` — a test double for `TranslationGateway`.
//!
//! Useful in unit and integration tests where the hosted model is either
//! unavailable or irrelevant.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::{Step, TranslationFailure, TranslationGateway};

/// Behaviour injected into `MockGateway` at construction time.
pub enum MockBehaviour {
    /// Answer every call with the canned SQL / steps.
    Succeed,
    /// Fail every call with a transient (retryable) failure.
    FailTransient(String),
    /// Fail every call with a permanent failure.
    FailFatal(String),
    /// Fail the first `failures` calls transiently, then succeed.
    Flaky { failures: usize },
}

/// One recorded call, with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    TextToSql {
        natural_language: String,
        schema: Option<String>,
    },
    SqlToSteps {
        sql: String,
    },
    StepsToSql {
        steps: Vec<Step>,
    },
}

/// A mock gateway that records every call it receives and returns a
/// programmer-specified result.
pub struct MockGateway {
    /// Returned by both SQL-producing calls.
    pub sql: String,
    /// Returned by `sql_to_steps`.
    pub steps: Vec<Step>,
    pub behaviour: MockBehaviour,
    /// All calls seen by this gateway (in call order).
    pub calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockGateway {
    /// Create a mock that always succeeds with the given SQL and steps.
    pub fn returning(sql: impl Into<String>, steps: Vec<Step>) -> Self {
        Self::with_behaviour(sql, steps, MockBehaviour::Succeed)
    }

    /// Create a mock that always fails with a permanent failure.
    pub fn failing_fatal(msg: impl Into<String>) -> Self {
        Self::with_behaviour("", Vec::new(), MockBehaviour::FailFatal(msg.into()))
    }

    /// Create a mock that always fails with a retryable failure.
    pub fn failing_transient(msg: impl Into<String>) -> Self {
        Self::with_behaviour("", Vec::new(), MockBehaviour::FailTransient(msg.into()))
    }

    /// Create a mock that fails `failures` times before answering.
    pub fn flaky(failures: usize, sql: impl Into<String>, steps: Vec<Step>) -> Self {
        Self::with_behaviour(sql, steps, MockBehaviour::Flaky { failures })
    }

    fn with_behaviour(sql: impl Into<String>, steps: Vec<Step>, behaviour: MockBehaviour) -> Self {
        Self {
            sql: sql.into(),
            steps,
            behaviour,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of calls this gateway has received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock call log poisoned").len()
    }

    /// Snapshot of the recorded calls.
    pub fn recorded(&self) -> Vec<MockCall> {
        self.calls.lock().expect("mock call log poisoned").clone()
    }

    /// Record `call` and decide whether it succeeds.
    fn record(&self, call: MockCall) -> Result<(), TranslationFailure> {
        let mut calls = self.calls.lock().expect("mock call log poisoned");
        calls.push(call);

        match &self.behaviour {
            MockBehaviour::Succeed => Ok(()),
            MockBehaviour::FailTransient(msg) => Err(TranslationFailure::Unavailable(msg.clone())),
            MockBehaviour::FailFatal(msg) => Err(TranslationFailure::MalformedResponse(msg.clone())),
            MockBehaviour::Flaky { failures } if calls.len() <= *failures => Err(
                TranslationFailure::Unavailable(format!("flaky failure #{}", calls.len())),
            ),
            MockBehaviour::Flaky { .. } => Ok(()),
        }
    }
}

#[async_trait]
impl TranslationGateway for MockGateway {
    async fn text_to_sql(
        &self,
        natural_language: &str,
        schema: Option<&str>,
    ) -> Result<String, TranslationFailure> {
        self.record(MockCall::TextToSql {
            natural_language: natural_language.to_owned(),
            schema: schema.map(str::to_owned),
        })?;
        Ok(self.sql.clone())
    }

    async fn sql_to_steps(&self, sql: &str) -> Result<Vec<Step>, TranslationFailure> {
        self.record(MockCall::SqlToSteps { sql: sql.to_owned() })?;
        Ok(self.steps.clone())
    }

    async fn steps_to_sql(&self, steps: &[Step]) -> Result<String, TranslationFailure> {
        self.record(MockCall::StepsToSql { steps: steps.to_vec() })?;
        Ok(self.sql.clone())
    }
}
