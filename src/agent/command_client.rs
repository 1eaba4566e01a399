//! External command backend - runs a generator CLI per prompt

use crate::agent::{GenerationError, TextGenerator};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Client that executes a program as a subprocess
///
/// The prompt is appended as the last argument and stdout is the response.
#[derive(Debug, Clone)]
pub struct CommandClient {
    /// Program to execute
    program: String,

    /// Arguments placed before the prompt
    args: Vec<String>,

    /// Timeout for command execution in seconds
    timeout_secs: u64,

    /// Credential exported to the child as `SDLC_API_KEY`, if configured
    api_key: Option<String>,
}

impl CommandClient {
    pub fn new(program: String, args: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            program,
            args,
            timeout_secs,
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Run the command once for `prompt`
    ///
    /// # Errors
    /// Returns `GenerationError` if:
    /// - The program cannot be spawned
    /// - It exits with a non-zero status
    /// - The output is not valid UTF-8
    /// - The command times out
    pub async fn execute(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!(
            "Spawning {} with prompt length: {}",
            self.program,
            prompt.len()
        );

        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(prompt).kill_on_drop(true);
        if let Some(key) = &self.api_key {
            command.env("SDLC_API_KEY", key);
        }

        let result = timeout(Duration::from_secs(self.timeout_secs), command.output())
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout_secs))?;

        let output = result.map_err(|e| {
            GenerationError::Internal(format!("Failed to execute {}: {}", self.program, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            warn!("{} exited with code {}: {}", self.program, exit_code, stderr.trim());
            return Err(GenerationError::Api(format!(
                "{} exited with code {}: {}",
                self.program,
                exit_code,
                stderr.trim()
            )));
        }

        let content = String::from_utf8(output.stdout).map_err(|e| {
            GenerationError::Internal(format!("Failed to decode {} output: {}", self.program, e))
        })?;

        debug!("{} returned {} bytes of output", self.program, content.len());

        Ok(content)
    }
}

#[async_trait]
impl TextGenerator for CommandClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.execute(prompt).await
    }
}
