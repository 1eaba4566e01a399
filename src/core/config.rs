//! Settings from YAML config files, `.env` and the environment

use crate::core::{
    pipeline::{Pipeline, PipelineError},
    templates::DEFAULT_SCENARIO,
};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variables checked for the credential, in order
pub const API_KEY_ENV_VARS: [&str; 3] = ["SDLC_API_KEY", "GEMINI_API_KEY", "api_key"];

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Errors in configuration, reported before any stage runs
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error(
        "API credential not found. Set SDLC_API_KEY (or GEMINI_API_KEY) in the environment, \
         add `api_key=<key>` to a .env file, or set `api_key` in the config file"
    )]
    MissingCredential,

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Variable '{name}' references file that can't be read: {path}")]
    VariableFile { name: String, path: String },

    #[error("Stage override for unknown stage '{0}'")]
    UnknownStage(String),

    #[error("Invalid pipeline: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// What to do when a stage's generation call fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Store the error as the stage's output and keep going
    #[default]
    Continue,
    /// Stop the run in the `Failed` state
    Abort,
}

/// Generator backend selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Generative Language API over HTTP
    Gemini {
        #[serde(default = "default_model")]
        model: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
        #[serde(default = "default_max_retries")]
        max_retries: u32,
    },
    /// External program; the prompt is passed as the last argument
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Gemini {
            model: default_model(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl BackendConfig {
    /// Whether this backend needs the API credential
    pub fn requires_credential(&self) -> bool {
        matches!(self, BackendConfig::Gemini { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            BackendConfig::Gemini { model, .. } => format!("gemini ({})", model),
            BackendConfig::Command { program, .. } => format!("command ({})", program),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

/// Per-stage overrides of template and messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOverride {
    #[serde(default)]
    pub prompt: Option<String>,

    #[serde(default)]
    pub start_message: Option<String>,

    #[serde(default)]
    pub handover_message: Option<String>,
}

/// Config file contents as written in YAML; every key is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Extra environment variable to read the credential from
    #[serde(default)]
    pub api_key_env: Option<String>,

    #[serde(default)]
    pub backend: Option<BackendConfig>,

    #[serde(default)]
    pub failure_policy: Option<FailurePolicy>,

    /// Template variables: plain strings or `{ path: ... }` file references
    #[serde(default)]
    pub variables: HashMap<String, Value>,

    /// Overrides keyed by stage ID
    #[serde(default)]
    pub stages: HashMap<String, StageOverride>,
}

impl SettingsFile {
    /// Load a config file from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigurationError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse config from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Resolve variables to strings, reading file references relative to `base_dir`
    fn resolve_variables(
        &self,
        base_dir: &Path,
    ) -> Result<HashMap<String, String>, ConfigurationError> {
        let mut vars = HashMap::new();

        for (name, value) in &self.variables {
            let resolved = match value {
                Value::String(s) => s.clone(),
                Value::Mapping(map) => {
                    let path = map
                        .get(&Value::String("path".to_string()))
                        .and_then(|v| v.as_str())
                        .ok_or_else(|| {
                            ConfigurationError::Invalid(format!(
                                "Variable '{}' must be a string or have a 'path' key",
                                name
                            ))
                        })?;
                    std::fs::read_to_string(base_dir.join(path)).map_err(|_| {
                        ConfigurationError::VariableFile {
                            name: name.clone(),
                            path: path.to_string(),
                        }
                    })?
                }
                other => serde_yaml::to_string(other)
                    .unwrap_or_default()
                    .trim_end()
                    .to_string(),
            };
            vars.insert(name.clone(), resolved);
        }

        Ok(vars)
    }
}

/// Effective settings after merging every source
#[derive(Debug, Clone)]
pub struct Settings {
    pub name: String,
    pub api_key: Option<String>,
    pub backend: BackendConfig,
    pub failure_policy: FailurePolicy,
    pub variables: HashMap<String, String>,
    pub stages: HashMap<String, StageOverride>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut variables = HashMap::new();
        variables.insert("scenario".to_string(), DEFAULT_SCENARIO.to_string());

        Self {
            name: "Software Lifecycle".to_string(),
            api_key: None,
            backend: BackendConfig::default(),
            failure_policy: FailurePolicy::default(),
            variables,
            stages: HashMap::new(),
        }
    }
}

/// Where to look for configuration
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file; when absent the default location is used if it exists
    pub config_path: Option<PathBuf>,

    /// `.env` file to read; defaults to `.env` in the working directory
    pub env_file: Option<PathBuf>,
}

impl Settings {
    /// Default config file location (`<config dir>/sdlc-pipeline/config.yaml`)
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sdlc-pipeline").join("config.yaml"))
    }

    /// Load settings from files and the process environment
    pub fn load(options: &LoadOptions) -> Result<Self, ConfigurationError> {
        let config_path = match &options.config_path {
            Some(path) => Some(path.clone()),
            None => Self::default_config_path().filter(|p| p.exists()),
        };

        let file = match &config_path {
            Some(path) => {
                tracing::debug!("Loading config file {}", path.display());
                Some(SettingsFile::from_file(path)?)
            }
            None => None,
        };

        let env_file = options
            .env_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(".env"));
        let dotenv = match std::fs::read_to_string(&env_file) {
            Ok(content) => parse_env_file(&content),
            Err(_) => HashMap::new(),
        };

        let base_dir = config_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Self::resolve(file, &dotenv, &base_dir, |key| std::env::var(key).ok())
    }

    /// Merge sources: defaults < config file < `.env` < environment
    pub fn resolve<F>(
        file: Option<SettingsFile>,
        dotenv: &HashMap<String, String>,
        base_dir: &Path,
        env: F,
    ) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        let mut key_vars: Vec<String> = Vec::new();

        if let Some(file) = file {
            settings.variables.extend(file.resolve_variables(base_dir)?);
            if let Some(name) = file.name {
                settings.name = name;
            }
            if let Some(backend) = file.backend {
                settings.backend = backend;
            }
            if let Some(policy) = file.failure_policy {
                settings.failure_policy = policy;
            }
            if let Some(var) = file.api_key_env {
                key_vars.push(var);
            }
            settings.api_key = file.api_key;
            settings.stages = file.stages;
        }

        key_vars.extend(API_KEY_ENV_VARS.iter().map(|s| s.to_string()));

        // Blank values count as unset so they never shadow a lower source
        let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        let from_dotenv = key_vars.iter().find_map(|k| present(dotenv.get(k).cloned()));
        let from_env = key_vars.iter().find_map(|k| present(env(k)));
        let from_file = present(settings.api_key.take());

        settings.api_key = from_env.or(from_dotenv).or(from_file);

        Ok(settings)
    }

    /// The credential, or the error that must stop a run before it starts
    pub fn require_api_key(&self) -> Result<&str, ConfigurationError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigurationError::MissingCredential)
    }

    /// Override the scenario variable
    pub fn set_scenario(&mut self, scenario: impl Into<String>) {
        self.variables.insert("scenario".to_string(), scenario.into());
    }

    /// Override the model of the HTTP backend
    pub fn set_model(&mut self, new_model: impl Into<String>) -> Result<(), ConfigurationError> {
        match &mut self.backend {
            BackendConfig::Gemini { model, .. } => {
                *model = new_model.into();
                Ok(())
            }
            BackendConfig::Command { .. } => Err(ConfigurationError::Invalid(
                "--model only applies to the gemini backend".to_string(),
            )),
        }
    }

    /// Build and validate the pipeline these settings describe
    pub fn to_pipeline(&self) -> Result<Pipeline, ConfigurationError> {
        let mut pipeline = Pipeline::sdlc(&self.variables);
        pipeline.name = self.name.clone();

        for (stage_id, overrides) in &self.stages {
            let stage = pipeline
                .stages
                .iter_mut()
                .find(|s| &s.id == stage_id)
                .ok_or_else(|| ConfigurationError::UnknownStage(stage_id.clone()))?;

            if let Some(prompt) = &overrides.prompt {
                *stage = stage.clone().with_prompt(prompt).bind_variables(&self.variables);
            }
            if let Some(start) = &overrides.start_message {
                stage.start_message = start.clone();
            }
            if let Some(handover) = &overrides.handover_message {
                stage.handover_message = handover.clone();
            }
        }

        pipeline.validate()?;
        Ok(pipeline)
    }
}

/// Parse `KEY=VALUE` lines of a `.env` file
///
/// Blank lines and `#` comments are skipped; matching quotes around the
/// value are removed.
pub fn parse_env_file(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            Some((key.trim().to_string(), value.to_string()))
        })
        .collect()
}
