use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use verdict_core::ObservationRecord;
use verdict_runtime::{
    save_audit, InferenceBackend, OllamaBackend, Pipeline, PipelineConfig,
};

#[derive(Parser, Debug)]
#[command(name = "verdict", version, about = "Two-stage judgment pipeline runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline over a serialized observation record
    Run {
        /// Observation record JSON produced by the upstream observer
        #[arg(long)]
        record: PathBuf,

        /// Pipeline configuration YAML; defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Run a repeatability check with this many iterations
        /// (0 uses the configured default)
        #[arg(long)]
        repeat: Option<usize>,

        /// Write the audit record to this path
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Check that the configured inference backend is reachable
    Health {
        /// Pipeline configuration YAML; defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_yaml::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn load_record(path: &Path) -> anyhow::Result<ObservationRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading record {}", path.display()))?;
    ObservationRecord::from_json_str(&text)
        .with_context(|| format!("parsing record {}", path.display()))
}

async fn run(
    record_path: &Path,
    config_path: Option<&Path>,
    repeat: Option<usize>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let record = load_record(record_path)?;

    tracing::info!(record_id = %record.record_id, endpoint = %config.endpoint, "Loaded observation");

    let backend = Arc::new(OllamaBackend::new().with_base_url(config.endpoint.clone()));
    let default_runs = config.repeat_runs;
    let pipeline = Pipeline::new(config, backend);

    let (result, report) = match repeat {
        Some(runs) => {
            let runs = if runs == 0 { default_runs } else { runs };
            let (result, report) = pipeline.execute_with_repeatability(&record, runs).await;
            (result, Some(report))
        }
        None => (pipeline.execute(&record).await, None),
    };

    println!("Record:   {}", result.record_id);
    println!("Outcome:  {}", result.final_judgment);
    println!("Rationale: {}", result.decision.rationale);
    match &result.narration {
        Some(narration) => {
            println!("Narration: {}", narration.explanation);
            match &narration.leakage.reason {
                Some(reason) => println!("Leakage:  DETECTED ({})", reason),
                None => println!("Leakage:  none"),
            }
        }
        None => println!("Narration: skipped (early termination)"),
    }

    if let Some(path) = output {
        save_audit(&result, path).context("writing audit record")?;
        println!("Audit:    {}", path.display());
    }

    if let Some(report) = report {
        println!(
            "Repeatability: {} over {} runs",
            if report.consistent { "PASS" } else { "FAIL" },
            report.runs()
        );
        if !report.consistent {
            bail!("repeatability check failed: observed {:?}", report.observed);
        }
    }

    Ok(())
}

async fn health(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let backend = OllamaBackend::new().with_base_url(config.endpoint.clone());

    if backend.health_check().await {
        println!("Backend reachable at {}", config.endpoint);
        Ok(())
    } else {
        bail!("backend unreachable at {}", config.endpoint);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            record,
            config,
            repeat,
            output,
        } => run(&record, config.as_deref(), repeat, output.as_deref()).await,
        Commands::Health { config } => health(config.as_deref()).await,
    }
}
