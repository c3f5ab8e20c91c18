use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use tracing::info;

use crate::error::{BatchscribeError, Result};

use super::probe::spawn_error;
use super::TempArtifacts;

/// Strip the video stream and re-encode the audio track into a fresh
/// temporary `.m4a` file (AAC, 128 kbps).
///
/// The output path is registered with the tracker before FFmpeg runs, so a
/// failed extraction leaves no stray file behind. Callers treat a non-zero
/// exit as degradable and fall back to submitting the original file.
pub fn extract_audio(input: &Path, temps: &mut TempArtifacts) -> Result<PathBuf> {
    if !input.exists() {
        return Err(BatchscribeError::FileNotFound(input.display().to_string()));
    }

    info!("Extracting audio track from {}", input.display());
    let output_path = temps.create(".m4a")?;
    let started = Instant::now();

    let output = Command::new("ffmpeg")
        .args(["-y", "-i"])
        .arg(input)
        .args(["-vn", "-acodec", "aac", "-b:a", "128k", "-loglevel", "warning"])
        .arg(&output_path)
        .output()
        .map_err(|e| spawn_error("ffmpeg", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BatchscribeError::Extraction(format!(
            "FFmpeg exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let size_mb = std::fs::metadata(&output_path)?.len() as f64 / (1024.0 * 1024.0);
    info!(
        "Audio extracted in {:.1}s ({:.2} MB)",
        started.elapsed().as_secs_f64(),
        size_mb
    );

    Ok(output_path)
}
