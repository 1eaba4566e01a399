//! Stage executor - runs a single stage against the generator

use crate::{
    agent::{GenerationError, TextGenerator},
    core::{CommunicationEvent, Deliverable, Document, Patch, Stage},
};
use tracing::{debug, info, warn};

/// Result of executing one stage
///
/// The patch is always present: a failed generation yields a degraded
/// deliverable and the error that caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutcome {
    pub patch: Patch,
    pub error: Option<GenerationError>,
}

impl StageOutcome {
    pub fn is_degraded(&self) -> bool {
        self.patch.deliverable.is_degraded()
    }
}

/// Executes single stages with a generator
pub struct StageExecutor<G> {
    generator: G,
}

impl<G: TextGenerator> StageExecutor<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Execute a stage and return its patch
    ///
    /// Announces the start of work, renders the prompt from the stage's
    /// declared inputs, calls the generator, then announces the handover to
    /// `next_stage` (none for the last stage). Both announcements go to
    /// `record` in that order, whether or not generation succeeded.
    pub async fn execute<F>(
        &self,
        stage: &Stage,
        document: &Document,
        next_stage: Option<&str>,
        mut record: F,
    ) -> StageOutcome
    where
        F: FnMut(CommunicationEvent),
    {
        info!("Executing stage: {}", stage.name);
        record(CommunicationEvent::status(&stage.name, &stage.start_message));

        let prompt = stage.build_prompt(&stage.view_of(document));
        debug!("Prompt for stage {} is {} bytes", stage.name, prompt.len());

        let result = match self.generator.generate(&prompt).await {
            Ok(text) if text.trim().is_empty() => Err(GenerationError::EmptyResponse),
            other => other,
        };

        let (deliverable, error) = match result {
            Ok(text) => {
                debug!("Stage {} produced {} bytes", stage.name, text.len());
                (Deliverable::Success(text), None)
            }
            Err(e) => {
                warn!("Generation failed for stage {}: {}", stage.name, e);
                (Deliverable::degraded(stage.output, e.to_string()), Some(e))
            }
        };

        record(CommunicationEvent::handover(
            &stage.name,
            &stage.handover_message,
            next_stage.map(str::to_string),
        ));

        StageOutcome {
            patch: Patch {
                field: stage.output,
                deliverable,
            },
            error,
        }
    }
}
