//! Test: Configuration - problems surface before any stage runs

use crate::helpers::*;
use sdlc_pipeline::agent::build_generator;
use sdlc_pipeline::core::config::{
    ConfigurationError, FailurePolicy, LoadOptions, Settings, SettingsFile,
};
use sdlc_pipeline::core::{Document, DocumentField, ExecutionStatus, PipelineRun};
use sdlc_pipeline::execution::{ExecutionEngine, RunError};
use std::collections::HashMap;
use std::path::Path;

/// A missing credential fails fast: no events, no writes, no generation
#[tokio::test]
async fn test_missing_credential_runs_nothing() {
    let generator = ScriptedGenerator::new().without_credential();
    let result = run_lifecycle(generator.clone(), FailurePolicy::Continue).await;

    assert!(matches!(
        result.result,
        Err(RunError::Configuration(ConfigurationError::MissingCredential))
    ));
    assert_eq!(generator.calls(), 0);
    assert!(result.events.is_empty());
    assert!(result.run.events.is_empty());
    assert!(result.run.document.populated_fields().is_empty());
    assert_eq!(result.run.status, ExecutionStatus::Pending);
}

/// The HTTP backend without any credential source is rejected at preflight
#[tokio::test]
async fn test_gemini_backend_without_key() {
    let settings = Settings::resolve(None, &HashMap::new(), Path::new("."), |_| None).unwrap();
    assert!(settings.api_key.is_none());

    let generator = build_generator(&settings).unwrap();
    let engine = ExecutionEngine::new(generator, settings.to_pipeline().unwrap());
    let mut run = PipelineRun::new();

    let error = engine.start_run(&mut run).await.unwrap_err();
    assert!(matches!(
        error,
        RunError::Configuration(ConfigurationError::MissingCredential)
    ));
    assert!(error.to_string().contains("SDLC_API_KEY"));
    assert!(run.events.is_empty());
}

/// Config file, .env and environment merge into one pipeline
#[test]
fn test_load_from_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("scenario.txt"), "A recipe scaler").unwrap();
    std::fs::write(
        dir.path().join("pipeline.yaml"),
        r#"
name: "Recipe Lifecycle"
failure_policy: abort
variables:
  scenario:
    path: scenario.txt
stages:
  deployment:
    handover_message: "Recipe scaler ready to ship."
"#,
    )
    .unwrap();
    std::fs::write(dir.path().join(".env"), "api_key=from-dotenv\n").unwrap();

    let settings = Settings::load(&LoadOptions {
        config_path: Some(dir.path().join("pipeline.yaml")),
        env_file: Some(dir.path().join(".env")),
    })
    .unwrap();

    assert_eq!(settings.name, "Recipe Lifecycle");
    assert_eq!(settings.failure_policy, FailurePolicy::Abort);
    assert!(settings.api_key.is_some());

    let pipeline = settings.to_pipeline().unwrap();
    assert_eq!(pipeline.name, "Recipe Lifecycle");
    let deployment = pipeline.stage_by_id("deployment").unwrap();
    assert_eq!(deployment.handover_message, "Recipe scaler ready to ship.");
    assert_eq!(deployment.output, DocumentField::Deploy);
    let requirements = &pipeline.stages[0];
    assert!(requirements
        .build_prompt(&requirements.view_of(&Document::new()))
        .contains("A recipe scaler"));
}

/// Template syntax inside the scenario is passed to the generator verbatim
#[tokio::test]
async fn test_scenario_with_braces_runs() {
    let scenario = "a mustache renderer that expands {{ name }} tags from {{ requirements }}";
    let mut settings = Settings::default();
    settings.set_scenario(scenario);
    let pipeline = settings.to_pipeline().unwrap();

    let generator = ScriptedGenerator::new();
    let engine = ExecutionEngine::new(generator.clone(), pipeline);
    let mut run = PipelineRun::new();

    assert_eq!(
        engine.start_run(&mut run).await.unwrap(),
        ExecutionStatus::Completed
    );
    assert!(generator.prompts()[0].contains(scenario));
}

/// A prompt override reading a field the stage does not declare is rejected
#[test]
fn test_override_reading_undeclared_field_is_rejected() {
    let file = SettingsFile::from_yaml(
        r#"
stages:
  design:
    prompt: "Design against {{ code }}"
"#,
    )
    .unwrap();
    let settings =
        Settings::resolve(Some(file), &HashMap::new(), Path::new("."), |_| None).unwrap();

    assert!(matches!(
        settings.to_pipeline(),
        Err(ConfigurationError::Pipeline(_))
    ));
}

/// A missing config file is reported with its path
#[test]
fn test_missing_config_file() {
    let result = Settings::load(&LoadOptions {
        config_path: Some("/nonexistent/sdlc/pipeline.yaml".into()),
        env_file: None,
    });

    match result {
        Err(ConfigurationError::Io { path, .. }) => {
            assert!(path.ends_with("pipeline.yaml"))
        }
        other => panic!("Expected IO error, got {:?}", other),
    }
}
