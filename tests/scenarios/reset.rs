//! Test: Reset - runs can be repeated from a clean state

use crate::helpers::*;
use sdlc_pipeline::core::{ExecutionStatus, PipelineRun};
use sdlc_pipeline::execution::ExecutionEngine;

/// Reset then start produces the same transcript shape as a fresh run
#[tokio::test]
async fn test_reset_then_start_matches_fresh_run() {
    let engine = ExecutionEngine::new(ScriptedGenerator::new(), lifecycle_pipeline());

    let mut fresh = PipelineRun::new();
    engine.start_run(&mut fresh).await.unwrap();
    let fresh_shape = fresh.events.shape();

    let mut reused = fresh.clone();
    engine.reset_run(&mut reused);
    assert_eq!(reused.status, ExecutionStatus::Pending);
    assert_eq!(reused.current_stage, 0);
    assert!(reused.events.is_empty());
    assert!(reused.document.populated_fields().is_empty());

    engine.start_run(&mut reused).await.unwrap();
    assert_eq!(reused.events.shape(), fresh_shape);
    assert_ne!(reused.run_id, fresh.run_id);
}

/// Starting a finished run again discards the previous results first
#[tokio::test]
async fn test_restart_does_not_accumulate() {
    let engine = ExecutionEngine::new(ScriptedGenerator::new(), lifecycle_pipeline());
    let mut run = PipelineRun::new();

    engine.start_run(&mut run).await.unwrap();
    engine.start_run(&mut run).await.unwrap();

    assert_eq!(run.events.len(), 12);
    assert!(run.is_complete());
    assert_handover_chain(&run);
}
