//! Export of a finished run's deliverables to disk

use crate::core::{DocumentField, ExecutionStatus, Pipeline, PipelineRun};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Name of the transcript file
pub const TRANSCRIPT_FILE: &str = "transcript.json";

/// Name of the run summary file
pub const SUMMARY_FILE: &str = "run.json";

/// Summary of a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique run ID
    pub run_id: Uuid,

    /// Pipeline name
    pub pipeline_name: String,

    /// Run status
    pub status: ExecutionStatus,

    /// When the run started
    pub started_at: Option<DateTime<Utc>>,

    /// When the run reached a terminal state
    pub completed_at: Option<DateTime<Utc>>,

    /// Number of stages that returned
    pub completed_stages: usize,

    /// Total number of stages
    pub total_stages: usize,

    /// Fields holding a degraded output
    pub degraded: Vec<DocumentField>,

    /// Terminal error, if the run failed
    pub error: Option<String>,
}

/// Create a summary from a run
pub fn create_summary(run: &PipelineRun, pipeline: &Pipeline) -> RunSummary {
    RunSummary {
        run_id: run.run_id,
        pipeline_name: pipeline.name.clone(),
        status: run.status,
        started_at: run.started_at,
        completed_at: run.completed_at,
        completed_stages: run.current_stage.min(pipeline.len()),
        total_stages: pipeline.len(),
        degraded: run.document.degraded_fields(),
        error: run.error.clone(),
    }
}

/// File a field's deliverable is written to
pub fn file_name(field: DocumentField) -> String {
    let extension = if field.is_code() { "py" } else { "md" };
    format!("{}.{}", field.as_str(), extension)
}

/// Write every populated field, the transcript and the run summary into `dir`
///
/// Field files left in `dir` by an earlier export are removed when the
/// field is empty in `run`. Returns the paths written, in pipeline field
/// order.
pub fn export_run(run: &PipelineRun, pipeline: &Pipeline, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut written = Vec::new();
    let populated = run.document.populated_fields();

    for field in DocumentField::ALL {
        let path = dir.join(file_name(field));
        if populated.contains(&field) {
            fs::write(&path, run.document.get(field))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            debug!("Wrote {} to {}", field, path.display());
            written.push(path);
        } else if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove stale {}", path.display()))?;
            debug!("Removed stale {}", path.display());
        }
    }

    let transcript = serde_json::to_string_pretty(run.events.all())
        .context("Failed to serialize transcript")?;
    let path = dir.join(TRANSCRIPT_FILE);
    fs::write(&path, transcript).with_context(|| format!("Failed to write {}", path.display()))?;
    written.push(path);

    let summary = serde_json::to_string_pretty(&create_summary(run, pipeline))
        .context("Failed to serialize run summary")?;
    let path = dir.join(SUMMARY_FILE);
    fs::write(&path, summary).with_context(|| format!("Failed to write {}", path.display()))?;
    written.push(path);

    info!("Exported {} files to {}", written.len(), dir.display());
    Ok(written)
}
