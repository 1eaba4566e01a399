//! Text generator boundary
//!
//! The pipeline only sees the `TextGenerator` trait. Retry and timeout
//! policy belong to the implementations.

pub mod client;
pub mod command_client;
pub mod error;
pub mod gemini_client;

use crate::core::config::{BackendConfig, ConfigurationError, Settings};
use async_trait::async_trait;
use std::sync::Arc;

pub use client::GeneratorConfig;
pub use command_client::CommandClient;
pub use error::GenerationError;
pub use gemini_client::GeminiClient;

/// Capability to turn a prompt into generated text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a prompt
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Check that the generator is usable at all before a run starts
    fn preflight(&self) -> Result<(), ConfigurationError> {
        Ok(())
    }
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt).await
    }

    fn preflight(&self) -> Result<(), ConfigurationError> {
        (**self).preflight()
    }
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt).await
    }

    fn preflight(&self) -> Result<(), ConfigurationError> {
        (**self).preflight()
    }
}

/// Build the generator the settings select
pub fn build_generator(settings: &Settings) -> Result<Box<dyn TextGenerator>, ConfigurationError> {
    match &settings.backend {
        BackendConfig::Gemini {
            model,
            base_url,
            timeout_secs,
            max_retries,
        } => {
            let mut config = GeneratorConfig::new()
                .with_model(model.clone())
                .with_timeout(*timeout_secs)
                .with_max_retries(*max_retries);
            if let Some(url) = base_url {
                config = config.with_endpoint(url.clone());
            }
            Ok(Box::new(GeminiClient::new(settings.api_key.clone(), config)?))
        }
        BackendConfig::Command {
            program,
            args,
            timeout_secs,
        } => Ok(Box::new(
            CommandClient::new(program.clone(), args.clone(), *timeout_secs)
                .with_api_key(settings.api_key.clone()),
        )),
    }
}
