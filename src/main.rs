use anyhow::{Context, Result};
use sdlc_pipeline::{
    agent::build_generator,
    cli::{
        commands::{RunCommand, StagesCommand, ValidateCommand},
        output::*,
        renderer::RunRenderer,
        Cli, Command,
    },
    core::{
        config::{ConfigurationError, LoadOptions, Settings},
        Pipeline, PipelineRun,
    },
    execution::{ExecutionEngine, RunError},
    export::{create_summary, export_run},
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Exit code for configuration problems found before any stage runs
const EXIT_CONFIGURATION: i32 = 2;

/// Exit code for a run that ended in failure
const EXIT_FAILURE: i32 = 1;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let options = cli.load_options();

    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd, &options).await?,
        Command::Stages(cmd) => list_stages(cmd, &options)?,
        Command::Validate(cmd) => validate_config(cmd, &options)?,
        Command::Check(_) => check_config(&options),
    }

    Ok(())
}

/// Report a configuration error once and exit
fn exit_with_configuration_error(error: &ConfigurationError) -> ! {
    eprintln!(
        "{} {} {}",
        CROSS,
        style("Configuration error:").red().bold(),
        error
    );
    std::process::exit(EXIT_CONFIGURATION);
}

fn load_settings(options: &LoadOptions) -> Settings {
    Settings::load(options).unwrap_or_else(|e| exit_with_configuration_error(&e))
}

fn load_pipeline(settings: &Settings) -> Pipeline {
    settings
        .to_pipeline()
        .unwrap_or_else(|e| exit_with_configuration_error(&e))
}

async fn run_pipeline(cmd: &RunCommand, options: &LoadOptions) -> Result<()> {
    let mut settings = load_settings(options);
    if let Err(e) = cmd.apply(&mut settings) {
        exit_with_configuration_error(&e);
    }

    let pipeline = load_pipeline(&settings);
    let generator = build_generator(&settings).unwrap_or_else(|e| exit_with_configuration_error(&e));
    if let Err(e) = generator.preflight() {
        exit_with_configuration_error(&e);
    }

    println!(
        "{} Pipeline {} with backend {}",
        INFO,
        style(&pipeline.name).bold(),
        style(settings.backend.describe()).cyan()
    );

    let renderer = Arc::new(RunRenderer::new(pipeline.len()));
    let handler = renderer.clone();
    let engine = ExecutionEngine::new(generator, pipeline)
        .with_failure_policy(settings.failure_policy)
        .with_event_handler(move |event| handler.handle(&event));

    let mut run = PipelineRun::new();
    let result = tokio::select! {
        result = engine.start_run(&mut run) => result,
        _ = tokio::signal::ctrl_c() => {
            renderer.abandon();
            println!("\n{} Interrupted", WARN);
            std::process::exit(130);
        }
    };

    match &result {
        Err(RunError::Configuration(e)) => exit_with_configuration_error(e),
        Err(RunError::InvalidPipeline(e)) => {
            exit_with_configuration_error(&ConfigurationError::Pipeline(e.clone()))
        }
        _ => {}
    }

    if !cmd.quiet_deliverables {
        print_deliverables(&run, engine.pipeline(), cmd.max_lines);
    }

    if let Some(dir) = &cmd.output_dir {
        let written = export_run(&run, engine.pipeline(), dir)
            .with_context(|| format!("Failed to export run to {}", dir.display()))?;
        println!(
            "\n{} Wrote {} files to {}",
            INFO,
            written.len(),
            style(dir.display()).cyan()
        );
    }

    let summary = create_summary(&run, engine.pipeline());
    match result {
        Ok(status) => {
            if summary.degraded.is_empty() {
                println!(
                    "\n{} {} completed {}",
                    CHECK,
                    style(&summary.pipeline_name).bold(),
                    style("successfully").green()
                );
            } else {
                let degraded: Vec<&str> = summary.degraded.iter().map(|f| f.as_str()).collect();
                println!(
                    "\n{} {} {} with errors embedded in: {}",
                    WARN,
                    style(&summary.pipeline_name).bold(),
                    format_status(status),
                    style(degraded.join(", ")).yellow()
                );
            }
            info!("Run {} finished", summary.run_id);
            Ok(())
        }
        Err(e) => {
            println!(
                "\n{} {} {}",
                CROSS,
                style(&summary.pipeline_name).bold(),
                style("failed").red()
            );
            error!("{}", e);
            std::process::exit(EXIT_FAILURE);
        }
    }
}

fn print_deliverables(run: &PipelineRun, pipeline: &Pipeline, max_lines: usize) {
    for stage in &pipeline.stages {
        let Some(deliverable) = run.document.deliverable(stage.output) else {
            continue;
        };
        let text = if max_lines == 0 {
            deliverable.text().to_string()
        } else {
            format_output(deliverable.text(), max_lines)
        };
        println!(
            "\n{}",
            format_deliverable(&stage.name, stage.output, &text, deliverable.is_degraded())
        );
    }
}

fn stage_plan_json(pipeline: &Pipeline) -> serde_json::Value {
    let stages: Vec<_> = pipeline
        .stages
        .iter()
        .map(|stage| {
            serde_json::json!({
                "id": stage.id,
                "name": stage.name,
                "inputs": stage.inputs,
                "output": stage.output,
            })
        })
        .collect();

    serde_json::json!({
        "name": pipeline.name,
        "stages": stages,
    })
}

fn list_stages(cmd: &StagesCommand, options: &LoadOptions) -> Result<()> {
    let settings = load_settings(options);
    let pipeline = load_pipeline(&settings);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&stage_plan_json(&pipeline))?);
        return Ok(());
    }

    println!("{} Stages of {}:", INFO, style(&pipeline.name).bold());
    for (index, stage) in pipeline.stages.iter().enumerate() {
        println!("{}", format_stage_plan(index, stage));
    }
    Ok(())
}

fn validate_config(cmd: &ValidateCommand, options: &LoadOptions) -> Result<()> {
    println!("{} Validating configuration...", INFO);

    let settings = load_settings(options);
    let pipeline = load_pipeline(&settings);

    println!("{} Configuration is valid!", CHECK);
    println!("  Name: {}", style(&pipeline.name).bold());
    println!("  Stages: {}", style(pipeline.len()).cyan());
    println!("  Backend: {}", style(settings.backend.describe()).cyan());
    println!("  Failure policy: {:?}", settings.failure_policy);
    println!("  Variables: {}", style(settings.variables.len()).cyan());

    if cmd.json {
        let mut plan = stage_plan_json(&pipeline);
        plan["backend"] = serde_json::to_value(&settings.backend)?;
        plan["failure_policy"] = serde_json::to_value(settings.failure_policy)?;
        println!("\n{}", serde_json::to_string_pretty(&plan)?);
    }
    Ok(())
}

fn check_config(options: &LoadOptions) {
    let settings = load_settings(options);
    let generator = build_generator(&settings).unwrap_or_else(|e| exit_with_configuration_error(&e));
    if let Err(e) = generator.preflight() {
        exit_with_configuration_error(&e);
    }

    let credential = if settings.api_key.is_some() {
        style("found").green()
    } else {
        style("not needed").dim()
    };
    println!("{} Ready to run", CHECK);
    println!("  Backend: {}", style(settings.backend.describe()).cyan());
    println!("  Credential: {}", credential);
}
