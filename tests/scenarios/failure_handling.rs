//! Test: Failure Handling - generation errors are embedded, not fatal

use crate::helpers::*;
use sdlc_pipeline::agent::GenerationError;
use sdlc_pipeline::core::config::FailurePolicy;
use sdlc_pipeline::core::{DocumentField, ExecutionStatus};
use sdlc_pipeline::execution::{ExecutionEvent, RunError};

/// A failed Development stage leaves its error in `code` and the run goes on
#[tokio::test]
async fn test_development_failure_is_embedded() {
    let generator = ScriptedGenerator::new().failing_on(2, GenerationError::Timeout(300));
    let result = run_lifecycle(generator.clone(), FailurePolicy::Continue).await;

    assert_run_completed(&result);
    assert_field_degraded(&result, DocumentField::Code, "Timeout after 300 seconds");

    // Stages after the failure still ran and produced output
    assert_eq!(generator.calls(), 6);
    for field in [DocumentField::Review, DocumentField::Tests, DocumentField::Deploy] {
        assert!(result.run.document.is_set(field));
        assert!(!result.run.document.degraded_fields().contains(&field));
    }
    assert_eq!(result.run.events.len(), 12);
    assert_handover_chain(&result.run);
}

/// The embedded error text is what later stages are prompted with
#[tokio::test]
async fn test_degraded_output_flows_downstream() {
    let generator = ScriptedGenerator::new()
        .failing_on(2, GenerationError::Quota("429 Too Many Requests".to_string()));
    let result = run_lifecycle(generator.clone(), FailurePolicy::Continue).await;
    assert_run_completed(&result);

    let sentinel = "Error in code generation: Quota exceeded: 429 Too Many Requests";
    let prompts = generator.prompts();
    assert!(prompts[3].contains(sentinel), "CodeReview should see the embedded error");
    assert!(prompts[4].contains(sentinel), "Testing should see the embedded error");
}

/// Every stage failing still completes the run with six degraded fields
#[tokio::test]
async fn test_all_stages_failing() {
    let mut generator = ScriptedGenerator::new();
    for call in 0..6 {
        generator = generator.failing_on(call, GenerationError::Transport("connection reset".to_string()));
    }
    let result = run_lifecycle(generator, FailurePolicy::Continue).await;

    assert_run_completed(&result);
    assert_eq!(
        result.run.document.degraded_fields(),
        DocumentField::ALL.to_vec()
    );
    assert_eq!(result.run.events.len(), 12);

    let degraded_events = result
        .events
        .iter()
        .filter(|e| matches!(e, ExecutionEvent::StageCompleted { degraded: true, .. }))
        .count();
    assert_eq!(degraded_events, 6);
}

/// The strict policy stops at the first failure and ends `Failed`
#[tokio::test]
async fn test_strict_policy_fails_run() {
    let generator = ScriptedGenerator::new().failing_on(2, GenerationError::Timeout(300));
    let result = run_lifecycle(generator.clone(), FailurePolicy::Abort).await;

    match &result.result {
        Err(RunError::StageFailure { stage, cause }) => {
            assert_eq!(stage, "Development");
            assert_eq!(cause, &GenerationError::Timeout(300));
        }
        other => panic!("Expected stage failure, got {:?}", other),
    }
    assert_eq!(result.run.status, ExecutionStatus::Failed);
    assert!(result.run.error.is_some());
    assert!(result.run.completed_at.is_some());

    // The failing stage is recorded; nothing after it ran
    assert_eq!(generator.calls(), 3);
    assert_eq!(result.run.events.len(), 6);
    assert_field_degraded(&result, DocumentField::Code, "Timeout after 300 seconds");
    assert!(!result.run.document.is_set(DocumentField::Review));
}
