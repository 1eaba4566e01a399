//! Execution state models

use crate::core::{document::Document, event_log::EventLog};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Run has not started
    Pending,
    /// A stage is executing
    Running,
    /// Every stage returned (possibly with degraded outputs)
    Completed,
    /// Run aborted on a stage failure (strict policy only)
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

/// State of one pipeline run
///
/// Owned by whoever triggers runs; the engine only borrows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Unique run ID, regenerated on reset
    pub run_id: Uuid,

    /// Current status
    pub status: ExecutionStatus,

    /// Index of the stage executing next (equals the stage count once done)
    pub current_stage: usize,

    /// Document under construction
    pub document: Document,

    /// Communication transcript
    pub events: EventLog,

    /// Terminal error, if the run failed
    pub error: Option<String>,

    /// When the run started
    pub started_at: Option<DateTime<Utc>>,

    /// When the run reached a terminal state
    pub completed_at: Option<DateTime<Utc>>,
}

impl PipelineRun {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            status: ExecutionStatus::Pending,
            current_stage: 0,
            document: Document::new(),
            events: EventLog::new(),
            error: None,
            started_at: None,
            completed_at: None,
        }
    }

    /// Return to the initial state: empty document and log, index 0
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_complete(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }

    pub fn is_running(&self) -> bool {
        self.status == ExecutionStatus::Running
    }

    pub(crate) fn start(&mut self) {
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub(crate) fn complete(&mut self) {
        self.status = ExecutionStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    pub(crate) fn fail(&mut self, error: String) {
        self.status = ExecutionStatus::Failed;
        self.error = Some(error);
        self.completed_at = Some(Utc::now());
    }

    /// Fraction of stages finished (0.0 to 1.0)
    pub fn progress(&self, total_stages: usize) -> f64 {
        if total_stages == 0 {
            return 0.0;
        }
        self.current_stage.min(total_stages) as f64 / total_stages as f64
    }
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}
