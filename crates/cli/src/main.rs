mod cli;
mod metrics;
mod report;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oneshot_core::{
    discover_inputs, load_config_or_default, validate_config, BatchOrchestrator, CancelSignal,
    CommandRecognizer, FfmpegTranscoder, TextRecognizer, Transcoder,
};

use cli::Cli;

/// Some job failed.
const EXIT_JOB_FAILED: i32 = 2;
/// The operator interrupted the batch.
const EXIT_CANCELLED: i32 = 130;

/// Buffer size for progress snapshots
const PROGRESS_BUFFER_SIZE: usize = 64;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            cli.log_json
                .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            (!cli.log_json)
                .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
        .init();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    // Load configuration
    let mut config = load_config_or_default(cli.config.as_deref())
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    cli.apply_to(&mut config);
    config.converter.ffmpeg_path = resolve_tool(&config.converter.ffmpeg_path);
    config.converter.ffprobe_path = resolve_tool(&config.converter.ffprobe_path);

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;
    info!(
        mode = ?config.transcode.mode,
        target_mb_per_hour = config.transcode.target_size_mb_per_hour,
        "Configuration loaded"
    );

    let inputs = discover_inputs(&cli.sources)
        .await
        .context("Failed to collect input files")?;
    info!("Found {} input file(s)", inputs.len());

    let transcoder = Arc::new(FfmpegTranscoder::new(config.converter.clone()));
    transcoder
        .validate()
        .await
        .context("ffmpeg is not usable")?;

    let recognizer: Option<Arc<dyn TextRecognizer>> = config
        .subtitles
        .recognizer_command
        .clone()
        .and_then(CommandRecognizer::new)
        .map(|r| Arc::new(r) as Arc<dyn TextRecognizer>);
    if config.subtitles.convert_bitmap && recognizer.is_none() {
        warn!("No recognizer_command configured; bitmap subtitles will be skipped");
    }

    let cancel = CancelSignal::new();
    spawn_interrupt_handler(cancel.clone());

    let (progress_tx, progress_rx) = mpsc::channel(PROGRESS_BUFFER_SIZE);
    let progress = tokio::spawn(report::show_progress(progress_rx));

    let orchestrator = BatchOrchestrator::from_config(&config, transcoder, recognizer)
        .context("Failed to set up the batch")?
        .with_cancel(cancel)
        .with_progress(progress_tx);

    let code = if cli.dry_run {
        let planned = orchestrator.dry_run(&inputs).await;
        drop(orchestrator);
        let _ = progress.await;
        report::print_dry_run(&planned, cli.json)?;
        if planned.iter().any(|(_, r)| r.is_err()) {
            EXIT_JOB_FAILED
        } else {
            0
        }
    } else {
        let summary = orchestrator.run_batch(&inputs).await;
        drop(orchestrator);
        let _ = progress.await;
        report::print_summary(&summary, cli.json)?;
        if summary.cancelled {
            EXIT_CANCELLED
        } else if summary.failed_count() > 0 {
            EXIT_JOB_FAILED
        } else {
            0
        }
    };

    if let Some(ref path) = cli.metrics_file {
        metrics::write_metrics(path).await?;
        info!("Metrics written to {:?}", path);
    }

    Ok(code)
}

/// Looks bare tool names up on `PATH`. Anything else, or a name that is not
/// found, is returned unchanged.
fn resolve_tool(path: &Path) -> PathBuf {
    if path.components().count() != 1 {
        return path.to_path_buf();
    }
    which::which(path).unwrap_or_else(|_| path.to_path_buf())
}

/// The first ctrl-c stops the batch: running conversions are killed and the
/// job is reported as cancelled. A second one exits at once.
fn spawn_interrupt_handler(cancel: CancelSignal) {
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            return;
        }
        warn!("Interrupt received, stopping the batch (press Ctrl+C again to quit immediately)");
        cancel.cancel();

        if signal::ctrl_c().await.is_ok() {
            warn!("Second interrupt received, exiting");
            std::process::exit(EXIT_CANCELLED);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_tool_keeps_paths() {
        let path = Path::new("/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(resolve_tool(path), PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
    }

    #[test]
    fn test_resolve_tool_unknown_name() {
        let path = Path::new("definitely-not-a-real-tool-name");
        assert_eq!(resolve_tool(path), PathBuf::from("definitely-not-a-real-tool-name"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_tool_finds_sh() {
        assert!(resolve_tool(Path::new("sh")).is_absolute());
    }
}
