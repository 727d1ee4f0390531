//! `radflow` command line entry point.

mod logging;
mod progress;
mod report;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use logging::{init_logging, LogFormat};
use progress::StageProgress;
use radflow::config::RunnerConfig;
use radflow::core::StageId;
use radflow::errors::RunError;
use radflow::events::{EventSink, FanoutEventSink, LoggingEventSink};
use radflow::pipeline::{Gender, ImageHandle, PatientInfo, PipelineRunner, RunRequest};
use radflow::registry::{ModelCatalog, StageRegistry};
use radflow::stages::{FailStageAt, FixedDurationSource};
use radflow::utils::{format_date, now_utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "radflow")]
#[command(version)]
#[command(about = "Simulated radiology AI analysis pipeline", long_about = None)]
struct Cli {
    /// Runner configuration (JSON). `RADFLOW_*` variables override it.
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, action = ArgAction::SetTrue, global = true)]
    verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available models
    Models {
        #[arg(long)]
        json: bool,
    },

    /// List the pipeline stages
    Stages {
        #[arg(long)]
        json: bool,
    },

    /// Run one analysis
    Run(RunArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Model id (see `radflow models`)
    #[arg(short, long)]
    model: Option<String>,

    /// Image path, URL or sample name
    #[arg(short, long)]
    image: Option<String>,

    #[arg(long)]
    patient_id: Option<String>,

    #[arg(long)]
    patient_name: Option<String>,

    #[arg(long, default_value_t = 0)]
    patient_age: u32,

    #[arg(long, value_enum, default_value_t = GenderArg::Male)]
    gender: GenderArg,

    #[arg(long)]
    modality: Option<String>,

    #[arg(long)]
    accession_number: Option<String>,

    #[arg(long)]
    referring_physician: Option<String>,

    /// Print the result as JSON instead of a report
    #[arg(long)]
    json: bool,

    /// Use this duration for every stage instead of a random one
    #[arg(long, value_name = "MS")]
    fixed_duration_ms: Option<u64>,

    /// Fail this stage halfway through
    #[arg(long, value_name = "STAGE")]
    fail_stage: Option<u32>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GenderArg {
    Male,
    Female,
    Other,
}

impl From<GenderArg> for Gender {
    fn from(value: GenderArg) -> Self {
        match value {
            GenderArg::Male => Self::Male,
            GenderArg::Female => Self::Female,
            GenderArg::Other => Self::Other,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    match cli.command {
        Commands::Models { json } => cmd_models(json),
        Commands::Stages { json } => cmd_stages(json),
        Commands::Run(args) => {
            let config = load_config(cli.config.as_ref())?;
            cmd_run(config, args).await
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<RunnerConfig> {
    let config = match path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            RunnerConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => RunnerConfig::default(),
    };
    config
        .with_env_overrides()
        .context("Invalid RADFLOW_* environment override")
}

fn cmd_models(json: bool) -> Result<()> {
    let catalog = ModelCatalog::default();
    if json {
        println!("{}", serde_json::to_string_pretty(catalog.models())?);
        return Ok(());
    }
    for model in catalog.models() {
        let mask = if model.requires_mask { "mask" } else { "no mask" };
        println!("{:<20} {:<15} {:<8} {}", model.id, model.kind.to_string(), mask, model.name);
    }
    Ok(())
}

fn cmd_stages(json: bool) -> Result<()> {
    let registry = StageRegistry::default();
    if json {
        println!("{}", serde_json::to_string_pretty(registry.stages())?);
        return Ok(());
    }
    for stage in registry.stages() {
        println!("{}. {:<24} {}", stage.id, stage.name, stage.description);
    }
    Ok(())
}

fn build_request(args: &RunArgs, catalog: &ModelCatalog) -> Result<RunRequest> {
    let mut request = RunRequest::new();

    if let Some(id) = &args.model {
        let model = catalog.get(id).cloned().with_context(|| {
            format!("Unknown model '{id}' (known: {})", catalog.ids().join(", "))
        })?;
        request = request.with_model(model);
    }

    if let Some(image) = &args.image {
        request = request.with_image(ImageHandle::new(image));
    }

    if args.patient_id.is_some() || args.patient_name.is_some() {
        let mut patient = PatientInfo::new(
            args.patient_id.clone().unwrap_or_default(),
            args.patient_name.clone().unwrap_or_default(),
            args.patient_age,
        )
        .with_gender(args.gender.into())
        .with_study_date(format_date(&now_utc()));
        if let Some(modality) = &args.modality {
            patient = patient.with_modality(modality);
        }
        if let Some(accession) = &args.accession_number {
            patient = patient.with_accession_number(accession);
        }
        if let Some(physician) = &args.referring_physician {
            patient = patient.with_referring_physician(physician);
        }
        request = request.with_patient(patient);
    }

    Ok(request)
}

async fn cmd_run(config: RunnerConfig, args: RunArgs) -> Result<()> {
    let catalog = ModelCatalog::default();
    let request = build_request(&args, &catalog)?;
    let patient = request.patient().cloned();

    let registry = StageRegistry::default();
    let progress = Arc::new(StageProgress::new(&registry, args.json));
    let sink = FanoutEventSink::new()
        .with(progress.clone() as Arc<dyn EventSink>)
        .with(Arc::new(LoggingEventSink::debug()));

    let mut builder = PipelineRunner::builder()
        .config(config)
        .registry(registry)
        .event_sink(Arc::new(sink));
    if let Some(ms) = args.fixed_duration_ms {
        builder = builder.duration_source(Arc::new(FixedDurationSource::from_millis(ms)));
    }
    if let Some(stage) = args.fail_stage {
        builder = builder.fault_injector(Arc::new(FailStageAt::new(
            StageId::new(stage),
            50,
            "simulated model timeout",
        )));
    }
    let runner = builder.build().context("Invalid runner configuration")?;

    let handle = runner.start_run(request)?;
    info!(run_id = %handle.id(), model = handle.model_id(), "Analysis started");

    let wait = handle.wait();
    tokio::pin!(wait);
    let outcome = tokio::select! {
        outcome = &mut wait => outcome,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, resetting run");
            runner.reset();
            wait.await
        }
    };
    progress.clear().context("Failed to clear progress bars")?;

    match outcome {
        Ok(result) => {
            match patient {
                Some(patient) if !args.json => {
                    println!("{}", report::render(&result, &patient)?);
                }
                _ => println!("{}", serde_json::to_string_pretty(&result)?),
            }
            Ok(())
        }
        Err(RunError::Cancelled { reason }) => {
            warn!(%reason, "Analysis cancelled");
            Ok(())
        }
        Err(e) => bail!(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use radflow::errors::Requirement;

    fn parse(args: &[&str]) -> RunArgs {
        let mut argv = vec!["radflow", "run"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Commands::Run(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_complete_arguments_build_valid_request() {
        let args = parse(&[
            "--model",
            "yolo-nodule",
            "--image",
            "chest.png",
            "--patient-id",
            "PAT-1",
            "--patient-name",
            "Demo Patient",
            "--gender",
            "female",
        ]);
        let request = build_request(&args, &ModelCatalog::default()).unwrap();
        let validated = request.validate().unwrap();
        assert_eq!(validated.model.id, "yolo-nodule");
        assert_eq!(validated.patient.gender, Gender::Female);
        assert_eq!(validated.patient.study_date.len(), 10);
    }

    #[test]
    fn test_missing_arguments_reach_the_gate() {
        let args = parse(&["--model", "unet-chest", "--patient-name", "Demo Patient"]);
        let request = build_request(&args, &ModelCatalog::default()).unwrap();
        assert_eq!(request.missing(), vec![Requirement::Image, Requirement::PatientInfo]);
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        let args = parse(&["--model", "gpt-xray"]);
        let err = build_request(&args, &ModelCatalog::default()).unwrap_err();
        assert!(err.to_string().contains("Unknown model 'gpt-xray'"));
    }
}
