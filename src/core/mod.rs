//! Core domain models
//!
//! This module defines the document threaded through a run, the stages that
//! fill it in, the pipeline that orders them, and the run state the
//! orchestrator owns.

pub mod config;
pub mod document;
pub mod event_log;
pub mod pipeline;
pub mod stage;
pub mod state;
pub mod templates;

pub use document::*;
pub use event_log::*;
pub use pipeline::*;
pub use stage::*;
pub use state::*;
