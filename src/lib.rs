//! sdlc-pipeline - drives a project description through six generated lifecycle stages

pub mod agent;
pub mod cli;
pub mod core;
pub mod execution;
pub mod export;

// Re-export commonly used types
pub use agent::{build_generator, CommandClient, GeminiClient, GenerationError, GeneratorConfig, TextGenerator};
pub use core::config::{ConfigurationError, FailurePolicy, LoadOptions, Settings};
pub use core::{
    CommunicationEvent, Deliverable, Document, DocumentField, EventLog, ExecutionStatus, Patch, Pipeline,
    PipelineError, PipelineRun, Stage,
};
pub use execution::{ExecutionEngine, ExecutionEvent, RunError, StageExecutor};
pub use export::{export_run, RunSummary};
