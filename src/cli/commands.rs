//! CLI command definitions

use crate::core::config::{ConfigurationError, FailurePolicy, Settings};
use clap::Args;
use std::path::PathBuf;

/// Run the lifecycle pipeline
#[derive(Debug, Args, Clone, Default)]
pub struct RunCommand {
    /// Project description the requirements stage starts from
    #[arg(short, long)]
    pub scenario: Option<String>,

    /// Variable overrides (key=value)
    #[arg(long, value_parser = parse_key_value)]
    pub variable: Vec<(String, String)>,

    /// Model for the HTTP backend
    #[arg(short, long)]
    pub model: Option<String>,

    /// Stop the run at the first failed stage
    #[arg(long)]
    pub strict: bool,

    /// Write deliverables, transcript and run summary into this directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Don't print the deliverables after the run
    #[arg(long)]
    pub quiet_deliverables: bool,

    /// Lines of each deliverable to print (0 prints everything)
    #[arg(long, default_value_t = 0)]
    pub max_lines: usize,
}

impl RunCommand {
    /// Apply command-line overrides on top of loaded settings
    pub fn apply(&self, settings: &mut Settings) -> Result<(), ConfigurationError> {
        for (key, value) in &self.variable {
            settings.variables.insert(key.clone(), value.clone());
        }
        if let Some(scenario) = &self.scenario {
            settings.set_scenario(scenario.clone());
        }
        if let Some(model) = &self.model {
            settings.set_model(model.clone())?;
        }
        if self.strict {
            settings.failure_policy = FailurePolicy::Abort;
        }
        Ok(())
    }
}

/// List the stage plan
#[derive(Debug, Args, Clone)]
pub struct StagesCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Validate the configuration and pipeline wiring
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Check that a run could start (credential and backend)
#[derive(Debug, Args, Clone)]
pub struct CheckCommand {}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 {
        return Err(format!("Invalid key=value pair: {}", s));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}
