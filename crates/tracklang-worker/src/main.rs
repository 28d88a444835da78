//! tracklang command-line tool.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tracklang_media::VadBackend;
use tracklang_models::report_schema;
use tracklang_worker::{build_oracle, render_summary, AnalyzerConfig, VideoProcessor};

/// Verify that the language tags of a video's audio tracks match the spoken language.
#[derive(Debug, Parser)]
#[command(name = "tracklang", version)]
struct Cli {
    /// Video file to analyse
    #[arg(required_unless_present = "schema")]
    video: Option<PathBuf>,

    /// Local ggml Whisper model (needs the `whisper` feature)
    #[arg(long, env = "TRACKLANG_MODEL")]
    model: Option<PathBuf>,

    /// Remote language identification service
    #[arg(long, env = "TRACKLANG_ORACLE_URL", conflicts_with = "model")]
    oracle_url: Option<String>,

    /// Print the JSON report on stdout
    #[arg(long)]
    json: bool,

    /// Print the human summary (on stderr when combined with --json)
    #[arg(long)]
    summary: bool,

    /// Transcribe valid samples
    #[arg(long)]
    transcribe: bool,

    /// Tracks analysed concurrently
    #[arg(long)]
    parallel_tracks: Option<usize>,

    /// Voice activity detector
    #[arg(long, value_parser = parse_vad)]
    vad: Option<VadBackend>,

    /// Print the JSON schema of the report and exit
    #[arg(long)]
    schema: bool,
}

fn parse_vad(value: &str) -> Result<VadBackend, String> {
    value.parse()
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.schema {
        println!("{}", serde_json::to_string_pretty(&report_schema())?);
        return Ok(());
    }

    let video = cli
        .video
        .clone()
        .ok_or_else(|| anyhow::anyhow!("missing video path"))?;

    let config = apply_cli(AnalyzerConfig::from_env(), &cli);
    config.validate()?;
    info!(video = %video.display(), "Starting tracklang");

    let oracle = build_oracle(&config.oracle)?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, cancelling");
            let _ = cancel_tx.send(true);
        }
    });

    let processor = VideoProcessor::new(config, oracle).with_cancel(cancel_rx);
    processor.check_vad()?;

    let report = processor.process(&video).await?;

    if cli.json {
        println!("{}", report.to_json_pretty()?);
        if cli.summary {
            eprint!("{}", render_summary(&report));
        }
    } else {
        print!("{}", render_summary(&report));
    }

    Ok(())
}

/// Command-line flags override environment values.
fn apply_cli(mut config: AnalyzerConfig, cli: &Cli) -> AnalyzerConfig {
    if let Some(model) = &cli.model {
        config.oracle.model_path = Some(model.clone());
        config.oracle.service_url = None;
    }
    if let Some(url) = &cli.oracle_url {
        config.oracle.service_url = Some(url.clone());
    }
    if cli.transcribe {
        config.oracle.transcribe = true;
    }
    if let Some(parallel) = cli.parallel_tracks {
        config.max_parallel_tracks = parallel;
    }
    if let Some(backend) = cli.vad {
        config.vad = config.vad.with_backend(backend);
    }
    config
}

/// Logs go to stderr so stdout carries only the report.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            "tracklang=info,tracklang_worker=info,tracklang_media=info,tracklang_oracle=info,warn",
        )
    });

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}
