//! Test: Success Chain - every stage runs in order and feeds the next

use crate::helpers::*;
use sdlc_pipeline::core::config::FailurePolicy;
use sdlc_pipeline::core::{Document, DocumentField};
use sdlc_pipeline::execution::{ExecutionEvent, StageExecutor};

/// A full run leaves twelve transcript entries and six populated fields
#[tokio::test]
async fn test_full_run_transcript() {
    let result = run_lifecycle(ScriptedGenerator::new(), FailurePolicy::Continue).await;

    assert_run_completed(&result);
    assert_eq!(result.run.events.len(), 12);
    assert_eq!(result.run.current_stage, 6);

    // Start then handover for every stage
    for (i, event) in result.run.events.all().iter().enumerate() {
        assert_eq!(event.source, STAGE_NAMES[i / 2]);
        assert_eq!(event.is_handover, i % 2 == 1);
    }

    let last = result.run.events.last().unwrap();
    assert!(last.is_handover);
    assert_eq!(last.source, "Deployment");
    assert!(last.recipient.is_none());

    assert_eq!(
        result.run.document.populated_fields(),
        DocumentField::ALL.to_vec()
    );
    assert!(result.run.document.degraded_fields().is_empty());
}

/// Each handover names the stage that runs next
#[tokio::test]
async fn test_handover_sequence_follows_stage_order() {
    let result = run_lifecycle(ScriptedGenerator::new(), FailurePolicy::Continue).await;

    assert_handover_chain(&result.run);
}

/// Every field is written by exactly the stage that owns it
#[tokio::test]
async fn test_outputs_land_in_owned_fields() {
    let result = run_lifecycle(ScriptedGenerator::new(), FailurePolicy::Continue).await;
    let document = &result.run.document;

    for (call, field) in DocumentField::ALL.iter().enumerate() {
        assert_eq!(document.get(*field), ScriptedGenerator::response(call));
    }
}

/// Later stages are prompted with the earlier outputs they read
#[tokio::test]
async fn test_later_stages_see_earlier_outputs() {
    let generator = ScriptedGenerator::new();
    let result = run_lifecycle(generator.clone(), FailurePolicy::Continue).await;
    assert_run_completed(&result);

    let pipeline = lifecycle_pipeline();
    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 6);

    // The requirements prompt carries the scenario
    assert!(prompts[0].contains("a command-line habit tracker"));

    for (index, stage) in pipeline.stages.iter().enumerate() {
        assert!(!prompts[index].contains("{{"), "{} prompt has an unfilled placeholder", stage.name);
        for input in &stage.inputs {
            let producer = pipeline
                .stages
                .iter()
                .position(|s| s.output == *input)
                .unwrap();
            assert!(producer < index);
            assert!(
                prompts[index].contains(&ScriptedGenerator::response(producer)),
                "{} prompt is missing its '{}' input",
                stage.name,
                input
            );
        }
    }
}

/// A stage's output is empty before it runs and set once it returns
#[tokio::test]
async fn test_outputs_are_written_once_in_order() {
    let pipeline = lifecycle_pipeline();
    let executor = StageExecutor::new(ScriptedGenerator::new());
    let mut document = Document::new();

    for (index, stage) in pipeline.stages.iter().enumerate() {
        for later in &pipeline.stages[index..] {
            assert!(!document.is_set(later.output));
            assert_eq!(document.get(later.output), "");
        }

        let outcome = executor
            .execute(stage, &document, None, |_| {})
            .await;
        assert_eq!(outcome.patch.field, stage.output);
        document.apply(outcome.patch);

        for earlier in &pipeline.stages[..=index] {
            assert!(document.is_set(earlier.output));
        }
    }
}

/// Renderer events bracket each stage's transcript entries
#[tokio::test]
async fn test_execution_events() {
    let result = run_lifecycle(ScriptedGenerator::new(), FailurePolicy::Continue).await;

    assert!(matches!(
        result.events.first(),
        Some(ExecutionEvent::RunStarted { total_stages: 6, .. })
    ));
    assert!(matches!(
        result.events.last(),
        Some(ExecutionEvent::RunCompleted { .. })
    ));

    let communications = result
        .events
        .iter()
        .filter(|e| matches!(e, ExecutionEvent::Communication(_)))
        .count();
    assert_eq!(communications, result.run.events.len());

    let completed: Vec<_> = result
        .events
        .iter()
        .filter_map(|e| match e {
            ExecutionEvent::StageCompleted { stage, degraded, .. } => {
                Some((stage.as_str(), *degraded))
            }
            _ => None,
        })
        .collect();
    let expected: Vec<_> = STAGE_NAMES.iter().map(|name| (*name, false)).collect();
    assert_eq!(completed, expected);
}
