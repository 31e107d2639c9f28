//! vconv: run one transcode operation on a local file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vconv_cli::{default_output_path, parse_operation, CliConfig, LogFormat};
use vconv_media::{
    EngineLifecycle, FfmpegEngineLoader, ProgressCallback, TranscodeCoordinator, TranscodeProgress,
};
use vconv_models::{Operation, TranscodeRequest, TranscodeResult};

/// Exit status when the file is too large for in-process transcoding.
const EXIT_FALLBACK: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "vconv", version, about = "Convert and edit videos with ffmpeg")]
struct Cli {
    /// Operation identifier, e.g. `mov-to-mp4` or `trim-video`.
    #[arg(value_parser = operation_id)]
    operation: String,

    /// Source media file.
    input: PathBuf,

    /// Output path. Defaults to `<operation>-output.<ext>` next to the input.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Operation parameter as `key=value`; repeatable.
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Print the engine pipeline and exit without transcoding.
    #[arg(long, default_value_t = false)]
    print_pipeline: bool,

    /// Print Prometheus metrics to stdout when done.
    #[arg(long, default_value_t = false)]
    print_metrics: bool,
}

fn operation_id(value: &str) -> Result<String, String> {
    value
        .parse::<Operation>()
        .map(|op| op.as_str().to_string())
        .map_err(|e| {
            let known: Vec<&str> = Operation::ALL.iter().map(|op| op.as_str()).collect();
            format!("{} (expected one of: {})", e, known.join(", "))
        })
}

fn init_tracing(config: &CliConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("invalid log filter")?;

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
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
            .init(),
    }
    Ok(())
}

fn progress_logger() -> ProgressCallback {
    Arc::new(|progress: TranscodeProgress| {
        debug!(
            frame = progress.frame,
            out_time_ms = progress.out_time_ms,
            speed = progress.speed,
            complete = progress.is_complete,
            "Engine progress"
        );
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = CliConfig::from_env();
    init_tracing(&config)?;

    let metrics = if cli.print_metrics {
        Some(
            PrometheusBuilder::new()
                .install_recorder()
                .context("failed to install metrics recorder")?,
        )
    } else {
        None
    };

    let params = parse_operation(&cli.operation, &cli.params)?;
    let operation = params.operation();
    let source_name = cli
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if cli.print_pipeline {
        println!(
            "ffmpeg {}",
            TranscodeCoordinator::preview_pipeline(&params, &source_name)
        );
        return Ok(());
    }

    let source = tokio::fs::read(&cli.input)
        .await
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input, operation));

    debug!("Engine resources: {:?}", config.engine);
    let loader = FfmpegEngineLoader::new(config.engine.clone()).with_progress(progress_logger());
    let coordinator = TranscodeCoordinator::new(Arc::new(EngineLifecycle::new(loader)));

    let result = coordinator
        .execute(TranscodeRequest::new(source, source_name, params))
        .await?;

    let exit_code = match result {
        TranscodeResult::Success(output) => {
            tokio::fs::write(&output_path, &output.bytes)
                .await
                .with_context(|| format!("failed to write {}", output_path.display()))?;
            info!(
                path = %output_path.display(),
                mime = output.mime,
                bytes = output.bytes.len(),
                "Wrote output"
            );
            0
        }
        TranscodeResult::Fallback { message } => {
            eprintln!("{}", message);
            EXIT_FALLBACK
        }
    };

    if let Some(handle) = metrics {
        print!("{}", handle.render());
    }

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
