//! Command-line interface

pub mod commands;
pub mod output;
pub mod renderer;

use crate::core::config::LoadOptions;
use clap::{Parser, Subcommand};
use commands::{CheckCommand, RunCommand, StagesCommand, ValidateCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Multi-stage software lifecycle generator
#[derive(Debug, Parser, Clone)]
#[command(name = "sdlc-pipeline")]
#[command(version)]
#[command(
    about = "Drive a project description through requirements, design, code, review, tests and deployment",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the .env file holding the credential
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the pipeline
    Run(RunCommand),

    /// List the stages and the fields they read and write
    Stages(StagesCommand),

    /// Validate the configuration
    Validate(ValidateCommand),

    /// Check that the credential and backend are usable
    Check(CheckCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }

    /// Where settings should be loaded from
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            env_file: self.env_file.clone(),
        }
    }
}
