//! Main execution engine - orchestrates a run over the pipeline

use crate::{
    agent::{GenerationError, TextGenerator},
    core::{
        config::{ConfigurationError, FailurePolicy},
        CommunicationEvent, DocumentField, ExecutionStatus, Pipeline, PipelineError, PipelineRun,
    },
    execution::StageExecutor,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events that can occur during a run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
        pipeline_name: String,
        total_stages: usize,
    },
    StageStarted {
        index: usize,
        stage: String,
    },
    /// An entry was appended to the run's event log
    Communication(CommunicationEvent),
    StageCompleted {
        index: usize,
        stage: String,
        field: DocumentField,
        degraded: bool,
    },
    RunCompleted {
        run_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Errors that stop a run from starting or finishing
#[derive(Debug, Error)]
pub enum RunError {
    /// Detected before any stage runs; the run is left untouched
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("A run is already in progress")]
    AlreadyRunning,

    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(#[from] PipelineError),

    /// Only raised under `FailurePolicy::Abort`
    #[error("Stage {stage} failed: {cause}")]
    StageFailure {
        stage: String,
        cause: GenerationError,
    },
}

/// Pipeline execution engine
///
/// Runs every stage strictly in order, folding each stage's patch into the
/// run's document before the next stage starts.
pub struct ExecutionEngine<G> {
    executor: StageExecutor<G>,
    pipeline: Pipeline,
    failure_policy: FailurePolicy,
    event_handlers: Vec<EventHandler>,
}

impl<G: TextGenerator> ExecutionEngine<G> {
    pub fn new(generator: G, pipeline: Pipeline) -> Self {
        Self {
            executor: StageExecutor::new(generator),
            pipeline,
            failure_policy: FailurePolicy::default(),
            event_handlers: Vec::new(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Add an event handler
    pub fn with_event_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn generator(&self) -> &G {
        self.executor.generator()
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Emit an event to all handlers
    fn emit_event(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Execute every stage of the pipeline against `run`
    ///
    /// Configuration problems are reported before anything is mutated. A
    /// run that already finished is reset first. Under the default policy a
    /// failed stage leaves a degraded output and the run continues; under
    /// `FailurePolicy::Abort` the run ends in `Failed` and the stage failure
    /// is returned.
    pub async fn start_run(&self, run: &mut PipelineRun) -> Result<ExecutionStatus, RunError> {
        if run.is_running() {
            return Err(RunError::AlreadyRunning);
        }
        self.pipeline.validate()?;
        self.executor.generator().preflight()?;

        if run.status != ExecutionStatus::Pending || !run.events.is_empty() {
            run.reset();
        }

        let total = self.pipeline.len();
        info!(
            "Starting pipeline run: {} ({})",
            self.pipeline.name, run.run_id
        );
        run.start();
        self.emit_event(ExecutionEvent::RunStarted {
            run_id: run.run_id,
            pipeline_name: self.pipeline.name.clone(),
            total_stages: total,
        });

        while run.current_stage < total {
            let index = run.current_stage;
            let Some(stage) = self.pipeline.stage(index) else {
                break;
            };
            let next = self.pipeline.next_stage_name(index);

            self.emit_event(ExecutionEvent::StageStarted {
                index,
                stage: stage.name.clone(),
            });

            let events = &mut run.events;
            let outcome = self
                .executor
                .execute(stage, &run.document, next.as_deref(), |event| {
                    self.emit_event(ExecutionEvent::Communication(event.clone()));
                    events.append(event);
                })
                .await;

            let degraded = outcome.is_degraded();
            run.document.apply(outcome.patch);
            run.current_stage += 1;

            self.emit_event(ExecutionEvent::StageCompleted {
                index,
                stage: stage.name.clone(),
                field: stage.output,
                degraded,
            });

            if let Some(cause) = outcome.error {
                match self.failure_policy {
                    FailurePolicy::Continue => {
                        warn!("Stage {} degraded, continuing: {}", stage.name, cause);
                    }
                    FailurePolicy::Abort => {
                        let failure = RunError::StageFailure {
                            stage: stage.name.clone(),
                            cause,
                        };
                        error!("Pipeline run aborted: {}", failure);
                        run.fail(failure.to_string());
                        self.emit_event(ExecutionEvent::RunCompleted {
                            run_id: run.run_id,
                            status: run.status,
                        });
                        return Err(failure);
                    }
                }
            }
        }

        run.complete();
        info!(
            "Pipeline run completed with {} degraded stage(s)",
            run.document.degraded_fields().len()
        );
        self.emit_event(ExecutionEvent::RunCompleted {
            run_id: run.run_id,
            status: run.status,
        });

        Ok(run.status)
    }

    /// Return `run` to its initial state
    pub fn reset_run(&self, run: &mut PipelineRun) {
        info!("Resetting pipeline run {}", run.run_id);
        run.reset();
    }
}
