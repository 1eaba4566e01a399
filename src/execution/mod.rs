//! Pipeline execution engine

pub mod engine;
pub mod executor;

pub use engine::{EventHandler, ExecutionEngine, ExecutionEvent, RunError};
pub use executor::{StageExecutor, StageOutcome};
