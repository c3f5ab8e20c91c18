use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn};

use crate::error::{BatchscribeError, Result};
use crate::media::{
    extract_audio, materialize_chunks, plan_chunks, MediaFile, MediaKind, TempArtifacts,
};
use crate::transcribe::Transcriber;

/// Default per-request upload ceiling (20 MB).
pub const DEFAULT_MAX_CHUNK_BYTES: u64 = 20 * 1024 * 1024;

/// Configuration for the transcription pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum upload size per request; larger audio is split.
    pub max_chunk_bytes: u64,
    /// Show a progress bar across the batch.
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chunk_bytes: DEFAULT_MAX_CHUNK_BYTES,
            show_progress: true,
        }
    }
}

/// Statistics from a batch run.
#[derive(Debug, Clone)]
pub struct BatchStats {
    pub total_files: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_time: Duration,
}

impl BatchStats {
    pub fn avg_time_per_file(&self) -> Option<Duration> {
        if self.succeeded == 0 {
            None
        } else {
            Some(self.total_time / self.succeeded as u32)
        }
    }
}

/// Join per-chunk transcripts in chunk order with a single space.
pub fn join_transcripts(texts: &[String]) -> String {
    texts.join(" ")
}

/// Transcribe one media file: classify, extract the audio track if it is a
/// video, split into chunks when over the size ceiling, transcribe each chunk
/// in order, and join the results.
///
/// Every temporary file created along the way is tracked and removed before
/// this function returns, on success and failure alike.
pub async fn transcribe_file(
    file: &MediaFile,
    transcriber: &dyn Transcriber,
    config: &PipelineConfig,
) -> Result<String> {
    let mut temps = TempArtifacts::new();
    run_stages(file, transcriber, config, &mut temps).await
    // `temps` drops here on every path, deleting whatever the run created.
}

async fn run_stages(
    file: &MediaFile,
    transcriber: &dyn Transcriber,
    config: &PipelineConfig,
    temps: &mut TempArtifacts,
) -> Result<String> {
    info!("Processing {} ({:.2} MB)", file.file_name(), file.size_mb());

    let audio_source: PathBuf = match file.kind {
        MediaKind::Audio => {
            debug!("Audio file, using directly");
            file.path.clone()
        }
        MediaKind::Video => match extract_audio(&file.path, temps) {
            Ok(path) => path,
            Err(e @ BatchscribeError::ToolNotFound(_)) => return Err(e),
            Err(e) => {
                warn!("Audio extraction failed ({e}), trying the original file");
                file.path.clone()
            }
        },
    };

    let plan = plan_chunks(&audio_source, config.max_chunk_bytes)?;
    let chunks = materialize_chunks(&audio_source, &plan, temps)?;

    let mut texts = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        info!("Transcribing chunk {}/{}", chunk.index + 1, chunks.len());
        let text = transcriber.transcribe(&chunk.path).await?;
        debug!("Chunk {} returned {} characters", chunk.index + 1, text.len());
        texts.push(text);
    }

    if texts.len() > 1 {
        info!("Merging {} chunk transcripts", texts.len());
    }

    Ok(join_transcripts(&texts))
}

/// Derive the result path for an input: `<results>/<stem>.txt`.
fn derive_output_path(input: &Path, results_dir: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    results_dir.join(format!("{}.txt", stem.to_string_lossy()))
}

/// Persist one transcription next to its siblings in the results folder.
pub fn save_transcription(input: &Path, text: &str, results_dir: &Path) -> Result<PathBuf> {
    let output = derive_output_path(input, results_dir);
    std::fs::write(&output, text)?;
    info!("Saved transcription to {}", output.display());
    Ok(output)
}

/// Process a batch of files strictly one at a time.
///
/// Each file's outcome is independent: a failure is logged and counted, and
/// the loop moves on to the next file.
pub async fn run_batch(
    files: &[MediaFile],
    transcriber: &dyn Transcriber,
    config: &PipelineConfig,
    results_dir: &Path,
) -> BatchStats {
    let start_time = Instant::now();
    let total_files = files.len();
    let mut succeeded = 0;
    let mut failed = 0;
    let mut file_times: Vec<Duration> = Vec::with_capacity(total_files);

    let progress_bar = if config.show_progress {
        let pb = ProgressBar::new(total_files as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    for (index, file) in files.iter().enumerate() {
        info!(
            "[{}/{}] Starting transcription: {}",
            index + 1,
            total_files,
            file.file_name()
        );
        let file_start = Instant::now();

        match transcribe_file(file, transcriber, config).await {
            Ok(text) => match save_transcription(&file.path, &text, results_dir) {
                Ok(_) => {
                    let file_time = file_start.elapsed();
                    file_times.push(file_time);
                    succeeded += 1;

                    info!(
                        "Completed {} in {}",
                        file.file_name(),
                        format_duration(file_time)
                    );
                    let remaining = total_files - (index + 1);
                    if remaining > 0 {
                        let avg = file_times.iter().sum::<Duration>() / file_times.len() as u32;
                        info!(
                            "Average time per file: {}, estimated remaining: {}",
                            format_duration(avg),
                            format_duration(avg * remaining as u32)
                        );
                    }
                }
                Err(e) => {
                    error!("Failed to save result for {}: {e}", file.file_name());
                    failed += 1;
                }
            },
            Err(e) => {
                error!("Failed to transcribe {}: {e}", file.file_name());
                failed += 1;
            }
        }

        if let Some(ref pb) = progress_bar {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    BatchStats {
        total_files,
        succeeded,
        failed,
        total_time: start_time.elapsed(),
    }
}

/// Format a duration as a readable time string (e.g. `45s`, `3m 20s`).
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    if total_secs < 60 {
        format!("{total_secs}s")
    } else if total_secs < 3600 {
        format!("{}m {}s", total_secs / 60, total_secs % 60)
    } else {
        format!(
            "{}h {}m {}s",
            total_secs / 3600,
            (total_secs % 3600) / 60,
            total_secs % 60
        )
    }
}

/// Print a summary of the batch results.
pub fn print_summary(stats: &BatchStats) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                  Batch Transcription Complete                  ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!(
        "  Files:      {} succeeded, {} failed, {} total",
        style(stats.succeeded).green(),
        style(stats.failed).red(),
        stats.total_files
    );
    println!("  Total time: {}", format_duration(stats.total_time));
    if let Some(avg) = stats.avg_time_per_file() {
        println!("  Average:    {} per file", format_duration(avg));
    }
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}
