use anyhow::{Context, Result};
use batchscribe::config::Config;
use batchscribe::media::{check_ffmpeg, check_ffprobe, AUDIO_EXTENSIONS, VIDEO_EXTENSIONS};
use batchscribe::pipeline::{print_summary, run_batch, PipelineConfig};
use batchscribe::scan::scan_media_files;
use batchscribe::transcribe::{WhisperClient, WhisperModel};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "batchscribe")]
#[command(version, about = "Batch audio/video transcription using AI")]
#[command(
    long_about = "Transcribe every audio/video file in a folder via the OpenAI \
speech-to-text API, splitting files that exceed the per-request upload limit."
)]
struct Cli {
    /// Input folder containing audio/video files
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Results folder for the transcription text files
    #[arg(short, long)]
    results: Option<PathBuf>,

    /// Transcription model: whisper-1, gpt-4o-transcribe, gpt-4o-mini-transcribe
    #[arg(short, long)]
    model: Option<String>,

    /// Maximum upload size per request, in megabytes
    #[arg(long)]
    max_chunk_mb: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(dir) = cli.input {
        config.input_dir = dir;
    }
    if let Some(dir) = cli.results {
        config.results_dir = dir;
    }
    if let Some(model) = cli.model {
        config.model = model
            .parse::<WhisperModel>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    if let Some(max) = cli.max_chunk_mb {
        config.max_chunk_mb = max;
    }

    config
        .validate()
        .context("Configuration validation failed")?;

    std::fs::create_dir_all(&config.input_dir)
        .with_context(|| format!("Failed to create {}", config.input_dir.display()))?;
    std::fs::create_dir_all(&config.results_dir)
        .with_context(|| format!("Failed to create {}", config.results_dir.display()))?;

    if check_ffmpeg().is_err() || check_ffprobe().is_err() {
        warn!("FFmpeg/FFprobe not found; video extraction and chunk splitting are unavailable");
    }

    let files = scan_media_files(&config.input_dir)?;
    if files.is_empty() {
        info!(
            "No supported media files found in '{}'",
            config.input_dir.display()
        );
        info!(
            "Supported formats: {}",
            AUDIO_EXTENSIONS
                .iter()
                .chain(VIDEO_EXTENSIONS.iter())
                .map(|e| format!(".{e}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        return Ok(());
    }

    info!("{} file(s) ready for transcription", files.len());
    for (i, file) in files.iter().enumerate() {
        info!("  {}. {} ({:.2} MB)", i + 1, file.file_name(), file.size_mb());
    }

    let api_key = config
        .openai_api_key
        .clone()
        .context("OPENAI_API_KEY not set")?;
    let transcriber = WhisperClient::new(api_key).with_model(config.model);

    let pipeline_config = PipelineConfig {
        max_chunk_bytes: config.max_chunk_bytes(),
        show_progress: true,
    };

    let stats = run_batch(&files, &transcriber, &pipeline_config, &config.results_dir).await;

    print_summary(&stats);
    info!("Results saved to {}/", config.results_dir.display());

    Ok(())
}
