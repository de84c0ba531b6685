//! Tests for the editing orchestrator.
//!
//! These tests use `MockGateway`, so no model endpoint is required. Back-off
//! sleeps run on tokio's paused clock.

use std::sync::Arc;

use gateway::mock::{MockCall, MockGateway};
use gateway::{Step, StepType};

use crate::{EditorConfig, FlowChartError, FlowEditor};

const SQL: &str = "SELECT * FROM users WHERE active";

fn decomposition() -> Vec<Step> {
    vec![
        Step::new(1, StepType::Query, "select all users"),
        Step::new(2, StepType::Condition, "keep active users"),
    ]
}

fn editor_with(mock: &Arc<MockGateway>) -> FlowEditor {
    FlowEditor::new(mock.clone(), EditorConfig::default())
}

fn node_ids(editor_snapshot: &crate::FlowChartSnapshot) -> Vec<&str> {
    editor_snapshot.nodes.iter().map(|n| n.id.as_str()).collect()
}

// ============================================================
// generate
// ============================================================

#[tokio::test]
async fn generate_translates_decomposes_and_builds_chart() {
    let mock = Arc::new(MockGateway::returning(SQL, decomposition()));
    let editor = editor_with(&mock);

    let generated = editor
        .generate("active users", Some("users(id, active)"))
        .await
        .expect("generate should succeed");

    assert_eq!(generated.sql, SQL);
    assert_eq!(generated.steps.len(), 4);
    assert!(generated.steps[0].is_start());
    assert!(generated.steps[3].is_end());
    assert_eq!(node_ids(&generated.flowchart), vec!["node_0", "node_1", "node_2", "node_4"]);
    assert_eq!(generated.flowchart.connections.len(), 3);
    assert_eq!(editor.snapshot().await, generated.flowchart);

    assert_eq!(
        mock.recorded(),
        vec![
            MockCall::TextToSql {
                natural_language: "active users".into(),
                schema: Some("users(id, active)".into()),
            },
            MockCall::SqlToSteps { sql: SQL.into() },
        ]
    );
}

#[tokio::test]
async fn generate_rejects_blank_text_before_calling_gateway() {
    let mock = Arc::new(MockGateway::returning(SQL, decomposition()));
    let editor = editor_with(&mock);

    let err = editor.generate("   ", None).await.unwrap_err();

    assert_eq!(err, FlowChartError::Validation("natural_language is required".into()));
    assert_eq!(mock.call_count(), 0);
    assert!(editor.snapshot().await.nodes.is_empty());
}

#[tokio::test]
async fn generate_degrades_on_permanent_failure() {
    let mock = Arc::new(MockGateway::failing_fatal("gibberish reply"));
    let editor = editor_with(&mock);

    let generated = editor.generate("active users", None).await.unwrap();

    assert!(generated.sql.starts_with("-- SQL generation failed"));
    let kinds: Vec<_> = generated.flowchart.nodes.iter().map(|n| n.node_type.clone()).collect();
    assert_eq!(
        kinds,
        vec![StepType::Start, StepType::Query, StepType::Result, StepType::End]
    );
    // No retry for a permanent failure, and no decomposition of a placeholder.
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried_then_degraded() {
    let mock = Arc::new(MockGateway::failing_transient("upstream overloaded"));
    let editor = editor_with(&mock);

    let generated = editor.generate("active users", None).await.unwrap();

    // 1 attempt + 3 retries.
    assert_eq!(mock.call_count(), 4);
    assert!(generated.sql.contains("upstream overloaded"));
    assert_eq!(generated.flowchart.nodes.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn flaky_gateway_recovers_within_retry_budget() {
    let mock = Arc::new(MockGateway::flaky(2, SQL, decomposition()));
    let editor = editor_with(&mock);

    let generated = editor.generate("active users", None).await.unwrap();

    assert_eq!(generated.sql, SQL);
    assert_eq!(generated.flowchart.nodes[1].text, "select all users");
    // Three text_to_sql attempts, one sql_to_steps.
    assert_eq!(mock.call_count(), 4);
}

#[tokio::test]
async fn empty_decomposition_falls_back_to_default_steps() {
    let mock = Arc::new(MockGateway::returning(SQL, Vec::new()));
    let editor = editor_with(&mock);

    let generated = editor.generate("active users", None).await.unwrap();

    assert_eq!(generated.sql, SQL);
    assert_eq!(generated.flowchart.nodes[1].text, "Execute query");
    assert_eq!(generated.flowchart.nodes[2].text, "Fetch results");
}

// ============================================================
// resync
// ============================================================

#[tokio::test]
async fn resync_rejects_empty_steps() {
    let mock = Arc::new(MockGateway::returning(SQL, decomposition()));
    let editor = editor_with(&mock);

    let err = editor.resync(&[]).await.unwrap_err();
    assert!(matches!(err, FlowChartError::Validation(_)));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn resync_sends_bracketed_steps_and_replaces_chart() {
    let mock = Arc::new(MockGateway::returning(SQL, decomposition()));
    let editor = editor_with(&mock);
    editor.add_step(None, "stale", None).await.unwrap();

    let synced = editor.resync(&decomposition()).await.unwrap();

    assert_eq!(synced.sql, SQL);
    assert_eq!(node_ids(&synced.flowchart), vec!["node_0", "node_1", "node_2", "node_4"]);
    match mock.recorded().last() {
        Some(MockCall::StepsToSql { steps }) => {
            assert_eq!(steps.len(), 4);
            assert!(steps[0].is_start() && steps[3].is_end());
        }
        other => panic!("expected StepsToSql, got {other:?}"),
    }
}

#[tokio::test]
async fn regeneration_failure_still_updates_chart() {
    let mock = Arc::new(MockGateway::failing_fatal("no SQL in reply"));
    let editor = editor_with(&mock);

    let synced = editor.resync(&decomposition()).await.unwrap();

    assert!(synced.sql.starts_with("-- SQL regeneration from steps failed"));
    assert_eq!(synced.flowchart.nodes.len(), 4);
}

// ============================================================
// add / update / remove
// ============================================================

#[tokio::test]
async fn add_step_links_from_anchor_and_regenerates_sql() {
    let mock = Arc::new(MockGateway::returning(SQL, vec![Step::new(1, "query", "select all users")]));
    let editor = editor_with(&mock);
    editor.generate("all users", None).await.unwrap();

    let added = editor
        .add_step(Some("process"), "filter active", Some("node_1"))
        .await
        .unwrap();

    assert_eq!(added.new_step_id, "node_4");
    assert_eq!(added.sql, SQL);
    assert!(added
        .flowchart
        .connections
        .iter()
        .any(|e| e.source == "node_1" && e.target == "node_4"));

    match mock.recorded().last() {
        Some(MockCall::StepsToSql { steps }) => {
            let ids: Vec<u64> = steps.iter().filter_map(|s| s.step_id).collect();
            assert_eq!(ids, vec![0, 1, 3, 4]);
        }
        other => panic!("expected StepsToSql, got {other:?}"),
    }
}

#[tokio::test]
async fn add_step_defaults_type_to_process() {
    let mock = Arc::new(MockGateway::returning(SQL, decomposition()));
    let editor = editor_with(&mock);

    let added = editor.add_step(Some(""), "loose step", None).await.unwrap();

    assert_eq!(added.new_step_id, "node_1");
    assert_eq!(added.flowchart.nodes[0].node_type, StepType::Process);
}

#[tokio::test]
async fn add_step_requires_description() {
    let mock = Arc::new(MockGateway::returning(SQL, decomposition()));
    let editor = editor_with(&mock);

    let err = editor.add_step(Some("process"), "", None).await.unwrap_err();

    assert_eq!(err, FlowChartError::Validation("description is required".into()));
    assert_eq!(mock.call_count(), 0);
    assert!(editor.snapshot().await.nodes.is_empty());
}

#[tokio::test]
async fn update_step_reports_missing_node_distinctly() {
    let mock = Arc::new(MockGateway::returning(SQL, decomposition()));
    let editor = editor_with(&mock);
    editor.generate("active users", None).await.unwrap();
    let calls_before = mock.call_count();

    let missing = editor.update_step("node_42", "ghost", None).await.unwrap_err();
    let blank = editor.update_step("node_1", "", None).await.unwrap_err();

    assert!(missing.is_not_found());
    assert!(matches!(blank, FlowChartError::Validation(_)));
    assert_eq!(mock.call_count(), calls_before);
}

#[tokio::test]
async fn update_step_changes_text_and_type() {
    let mock = Arc::new(MockGateway::returning(SQL, decomposition()));
    let editor = editor_with(&mock);
    editor.generate("active users", None).await.unwrap();

    let synced = editor
        .update_step("node_2", "keep users active this month", Some("condition"))
        .await
        .unwrap();

    let node = synced.flowchart.nodes.iter().find(|n| n.id == "node_2").unwrap();
    assert_eq!(node.text, "keep users active this month");
    assert_eq!(node.node_type, StepType::Condition);
}

#[tokio::test]
async fn update_step_with_whitespace_type_keeps_type() {
    let mock = Arc::new(MockGateway::returning(SQL, decomposition()));
    let editor = editor_with(&mock);
    editor.generate("active users", None).await.unwrap();

    let synced = editor.update_step("node_1", "select users", Some("   ")).await.unwrap();

    let node = synced.flowchart.nodes.iter().find(|n| n.id == "node_1").unwrap();
    assert_eq!(node.text, "select users");
    assert_eq!(node.node_type, StepType::Query);
}

#[tokio::test]
async fn remove_step_drops_node_and_its_edges() {
    let mock = Arc::new(MockGateway::returning(SQL, decomposition()));
    let editor = editor_with(&mock);
    editor.generate("active users", None).await.unwrap();

    let synced = editor.remove_step("node_2").await.unwrap();

    assert_eq!(node_ids(&synced.flowchart), vec!["node_0", "node_1", "node_4"]);
    assert!(synced
        .flowchart
        .connections
        .iter()
        .all(|e| e.source != "node_2" && e.target != "node_2"));

    let again = editor.remove_step("node_2").await.unwrap_err();
    assert_eq!(again, FlowChartError::NotFound("node_2".into()));
}
