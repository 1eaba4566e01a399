//! Live terminal rendering of a run
//!
//! `RunRenderer` receives `ExecutionEvent`s from the engine and prints stage
//! status lines and transcript bubbles above an `indicatif` progress bar.
//! The bar only appears once the run has started, so errors reported
//! before that point are never drawn over.

use crate::cli::output::{create_progress_bar, format_execution_event, show_progress_bar};
use crate::execution::ExecutionEvent;
use indicatif::ProgressBar;

/// Event handler that draws a run in the terminal
#[derive(Clone)]
pub struct RunRenderer {
    progress: ProgressBar,
    visible: bool,
}

impl RunRenderer {
    /// Create a renderer whose progress bar shows when the run starts
    pub fn new(total_stages: usize) -> Self {
        Self {
            progress: create_progress_bar(total_stages),
            visible: true,
        }
    }

    /// Create a renderer whose progress bar never draws
    pub fn hidden() -> Self {
        Self {
            progress: ProgressBar::hidden(),
            visible: false,
        }
    }

    /// Render one event
    pub fn handle(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::RunStarted { total_stages, .. } => {
                self.progress.set_length(*total_stages as u64);
                self.progress.set_position(0);
                if self.visible {
                    show_progress_bar(&self.progress);
                }
            }
            ExecutionEvent::StageStarted { stage, .. } => {
                self.progress.set_message(stage.clone());
            }
            ExecutionEvent::StageCompleted { .. } => {
                self.progress.inc(1);
            }
            ExecutionEvent::Communication(_) => {}
            ExecutionEvent::RunCompleted { .. } => {
                self.progress.finish_and_clear();
            }
        }

        // Print above the bar so the transcript scrolls while the bar stays put
        let line = format_execution_event(event);
        self.progress.suspend(|| println!("{}", line));
    }

    /// Stop drawing, e.g. when a run is interrupted
    pub fn abandon(&self) {
        self.progress.abandon();
    }

    pub fn position(&self) -> u64 {
        self.progress.position()
    }
}
