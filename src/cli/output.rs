//! CLI output formatting

use crate::{
    core::{CommunicationEvent, DocumentField, ExecutionStatus, Stage},
    execution::ExecutionEvent,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static SPEECH: Emoji<'_, '_> = Emoji("💬 ", "- ");
pub static HANDOVER: Emoji<'_, '_> = Emoji("📨 ", "> ");

/// Create a progress bar over the stages of a run
///
/// The bar stays hidden until `show_progress_bar` is called.
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::hidden());
    if let Ok(template) =
        ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        progress.set_style(template.progress_chars("#>-"));
    }
    progress
}

/// Start drawing a bar made by `create_progress_bar` on stderr
pub fn show_progress_bar(progress: &ProgressBar) {
    progress.set_draw_target(ProgressDrawTarget::stderr());
    progress.enable_steady_tick(Duration::from_millis(100));
}

/// Horizontal rule spanning the terminal width
pub fn separator() -> String {
    let width = term_size::dimensions_stdout()
        .map(|(w, _)| w)
        .unwrap_or(80);
    "─".repeat(width.min(120))
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format a transcript entry as a chat bubble line
pub fn format_communication(event: &CommunicationEvent) -> String {
    let clock = style(format!("[{}]", event.clock())).dim();
    if event.is_handover {
        let to = match &event.recipient {
            Some(recipient) => style(recipient.as_str()).cyan().to_string(),
            None => style("done").dim().to_string(),
        };
        format!(
            "  {}{} {} → {}: {}",
            HANDOVER,
            clock,
            style(&event.source).bold(),
            to,
            event.message
        )
    } else {
        format!(
            "  {}{} {}: {}",
            SPEECH,
            clock,
            style(&event.source).bold(),
            style(&event.message).italic()
        )
    }
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::RunStarted {
            run_id,
            pipeline_name,
            total_stages,
        } => format!(
            "{} Starting {} ({} stages, run {})",
            ROCKET,
            style(pipeline_name).bold(),
            total_stages,
            style(&run_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::StageStarted { index, stage } => {
            format!("{} [{}] {}", SPINNER, index + 1, style(stage).cyan())
        }
        ExecutionEvent::Communication(event) => format_communication(event),
        ExecutionEvent::StageCompleted {
            stage,
            field,
            degraded,
            ..
        } => {
            if *degraded {
                format!(
                    "{} {} produced no {} (error embedded)",
                    WARN,
                    style(stage).yellow(),
                    field
                )
            } else {
                format!("{} {} → {}", CHECK, style(stage).green(), field)
            }
        }
        ExecutionEvent::RunCompleted { run_id, status } => format!(
            "{} Run ({}) {}",
            INFO,
            style(&run_id.to_string()[..8]).dim(),
            format_status(*status)
        ),
    }
}

/// Format a stage for the stage plan listing
pub fn format_stage_plan(index: usize, stage: &Stage) -> String {
    let inputs = if stage.inputs.is_empty() {
        style("-").dim().to_string()
    } else {
        stage
            .inputs
            .iter()
            .map(DocumentField::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "  {}. {} ({}) reads [{}] writes {}",
        index + 1,
        style(&stage.name).bold(),
        style(&stage.id).dim(),
        inputs,
        style(stage.output).cyan()
    )
}

/// Format a deliverable with a header, code fields fenced as code
pub fn format_deliverable(title: &str, field: DocumentField, text: &str, degraded: bool) -> String {
    let header = if degraded {
        format!("{} {}", WARN, style(title).yellow().bold())
    } else {
        format!("{} {}", CHECK, style(title).bold())
    };

    let body = if field.is_code() && !degraded {
        format!("```python\n{}\n```", strip_fence(text))
    } else {
        text.to_string()
    };

    format!("{}\n{}\n{}", header, style(separator()).dim(), body)
}

/// Remove a surrounding markdown code fence, if the text is fenced
pub fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening line
    match body.split_once('\n') {
        Some((_, code)) => code.trim_end(),
        None => body.trim(),
    }
}

/// Truncate long output to `max_lines`
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}
