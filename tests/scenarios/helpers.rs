//! Test utilities for pipeline scenarios

use async_trait::async_trait;
use sdlc_pipeline::agent::{GenerationError, TextGenerator};
use sdlc_pipeline::core::config::{ConfigurationError, FailurePolicy};
use sdlc_pipeline::core::{DocumentField, ExecutionStatus, Pipeline, PipelineRun};
use sdlc_pipeline::execution::{ExecutionEngine, ExecutionEvent, RunError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Stage names of the lifecycle pipeline, in order
pub const STAGE_NAMES: [&str; 6] = [
    "Requirements",
    "Design",
    "Development",
    "CodeReview",
    "Testing",
    "Deployment",
];

/// Mock generator with scripted failures that records every prompt
///
/// Call `n` (zero based) answers `generated output #n` unless a failure was
/// scripted for it.
#[derive(Clone)]
pub struct ScriptedGenerator {
    failures: Arc<HashMap<usize, GenerationError>>,
    prompts: Arc<Mutex<Vec<String>>>,
    index: Arc<AtomicUsize>,
    credential: bool,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            failures: Arc::new(HashMap::new()),
            prompts: Arc::new(Mutex::new(Vec::new())),
            index: Arc::new(AtomicUsize::new(0)),
            credential: true,
        }
    }

    /// Fail the `call`-th generation with `error`
    pub fn failing_on(mut self, call: usize, error: GenerationError) -> Self {
        Arc::make_mut(&mut self.failures).insert(call, error);
        self
    }

    /// Report a missing credential from preflight
    pub fn without_credential(mut self) -> Self {
        self.credential = false;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }

    /// Expected text of a successful call
    pub fn response(call: usize) -> String {
        format!("generated output #{}", call)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let call = self.index.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        match self.failures.get(&call) {
            Some(error) => Err(error.clone()),
            None => Ok(Self::response(call)),
        }
    }

    fn preflight(&self) -> Result<(), ConfigurationError> {
        if self.credential {
            Ok(())
        } else {
            Err(ConfigurationError::MissingCredential)
        }
    }
}

/// The lifecycle pipeline with a fixed scenario
pub fn lifecycle_pipeline() -> Pipeline {
    let mut vars = HashMap::new();
    vars.insert("scenario".to_string(), "a command-line habit tracker".to_string());
    Pipeline::sdlc(&vars)
}

/// Outcome of a scenario run
pub struct RunTestResult {
    pub run: PipelineRun,
    pub result: Result<ExecutionStatus, RunError>,
    pub events: Vec<ExecutionEvent>,
}

/// Run the lifecycle pipeline once with `generator`
pub async fn run_lifecycle(generator: ScriptedGenerator, policy: FailurePolicy) -> RunTestResult {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let engine = ExecutionEngine::new(generator, lifecycle_pipeline())
        .with_failure_policy(policy)
        .with_event_handler(move |event| sink.lock().unwrap().push(event));

    let mut run = PipelineRun::new();
    let result = engine.start_run(&mut run).await;
    let events = seen.lock().unwrap().clone();

    RunTestResult { run, result, events }
}

/// Assert the run returned and ended `Completed`
pub fn assert_run_completed(result: &RunTestResult) {
    assert!(
        matches!(result.result, Ok(ExecutionStatus::Completed)),
        "Run should complete, got {:?}",
        result.result
    );
    assert_eq!(result.run.status, ExecutionStatus::Completed);
}

/// Assert a field holds the embedded error for `cause`
pub fn assert_field_degraded(result: &RunTestResult, field: DocumentField, cause: &str) {
    let text = result.run.document.get(field);
    assert_eq!(
        text,
        format!("Error in {} generation: {}", field, cause),
        "Field '{}' should hold the embedded error",
        field
    );
    assert!(result.run.document.degraded_fields().contains(&field));
}

/// Assert the handover entries follow the stage order
pub fn assert_handover_chain(run: &PipelineRun) {
    let handovers: Vec<_> = run.events.handovers().collect();
    assert_eq!(handovers.len(), STAGE_NAMES.len());

    for (i, event) in handovers.iter().enumerate() {
        assert_eq!(event.source, STAGE_NAMES[i]);
        assert_eq!(
            event.recipient.as_deref(),
            STAGE_NAMES.get(i + 1).copied(),
            "Handover {} from {} has the wrong recipient",
            i,
            event.source
        );
    }
}
