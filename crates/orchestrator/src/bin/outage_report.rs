//! Generate an outage report from the command line.
//!
//! Configuration via configs/config.yaml, .env file or environment variables
//! (see `ReporterConfig`). Examples:
//!
//!   outage-report
//!   outage-report --location "Tehran, Iran" --hours 12 --stdout
//!   outage-report --image outage_map.png

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use base64::Engine as _;
use clap::Parser;
use orchestrator::{
    save_window_report, Coordinator, PromptTemplate, ReporterConfig, TimeWindow,
    DEFAULT_OUTPUT_DIR, DEFAULT_PROMPT_PATH,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "outage-report")]
#[command(about = "Summarize an internet outage from IODA signals and news coverage")]
struct Args {
    /// YAML config file (default: configs/config.yaml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Prompt template file
    #[arg(long, default_value = DEFAULT_PROMPT_PATH)]
    prompt: PathBuf,

    /// Location to report on (defaults to the configured location)
    #[arg(long)]
    location: Option<String>,

    /// Window length in hours, ending now (defaults to the configured window)
    #[arg(long)]
    hours: Option<i64>,

    /// PNG outage map to attach for the model
    #[arg(long)]
    image: Option<PathBuf>,

    /// Directory reports are written to
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Also print the report to stdout
    #[arg(long)]
    stdout: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = ReporterConfig::load(args.config.as_deref())?;
    let template = PromptTemplate::load_or_default(&args.prompt);
    let coordinator = Coordinator::from_config(&config, template)?;

    let location = args
        .location
        .unwrap_or_else(|| config.default_location.clone());
    let hours = args.hours.unwrap_or(config.default_window_hours);
    let window = TimeWindow::last_hours(hours)?;

    let image_base64 = match &args.image {
        Some(path) => {
            let bytes = fs::read(path)
                .with_context(|| format!("failed to read image {}", path.display()))?;
            Some(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        None => None,
    };

    let report = coordinator
        .run_with_image(&location, &window, image_base64.as_deref())
        .await;

    if args.stdout {
        println!("{}", report);
    }

    let path = save_window_report(&args.output_dir, &location, &window, &report)?;
    info!("Report for '{}' written", location);
    println!("{}", path.display());

    Ok(())
}
