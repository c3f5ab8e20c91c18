use std::path::Path;
use std::process::Command;
use std::time::Duration;

use tracing::debug;

use crate::error::{BatchscribeError, Result};

/// Map a subprocess spawn failure, distinguishing a missing binary from
/// other IO problems.
pub(crate) fn spawn_error(tool: &str, err: std::io::Error) -> BatchscribeError {
    if err.kind() == std::io::ErrorKind::NotFound {
        BatchscribeError::ToolNotFound(format!(
            "{tool} not found. Install FFmpeg and ensure it is in your PATH"
        ))
    } else {
        BatchscribeError::Io(err)
    }
}

/// Check if FFmpeg is installed and accessible.
pub fn check_ffmpeg() -> Result<()> {
    let output = Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map_err(|e| spawn_error("ffmpeg", e))?;

    if !output.status.success() {
        return Err(BatchscribeError::ToolNotFound(
            "ffmpeg -version returned an error".to_string(),
        ));
    }

    debug!("FFmpeg is available");
    Ok(())
}

/// Check if FFprobe is installed and accessible.
pub fn check_ffprobe() -> Result<()> {
    let output = Command::new("ffprobe")
        .arg("-version")
        .output()
        .map_err(|e| spawn_error("ffprobe", e))?;

    if !output.status.success() {
        return Err(BatchscribeError::ToolNotFound(
            "ffprobe -version returned an error".to_string(),
        ));
    }

    debug!("FFprobe is available");
    Ok(())
}

/// Read a media file's duration from its container metadata using FFprobe.
///
/// Every failure mode comes back as an error; the chunk planner treats any
/// of them as "duration unknown" and falls back to an unsplit plan.
pub fn probe_duration(input: &Path) -> Result<Duration> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(input)
        .output()
        .map_err(|e| BatchscribeError::Probe(format!("Failed to run FFprobe: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BatchscribeError::Probe(format!(
            "FFprobe failed: {}",
            stderr.trim()
        )));
    }

    let duration_str = String::from_utf8_lossy(&output.stdout);
    let duration_secs: f64 = duration_str.trim().parse().map_err(|e| {
        BatchscribeError::Probe(format!(
            "Failed to parse duration '{}': {e}",
            duration_str.trim()
        ))
    })?;

    Ok(Duration::from_secs_f64(duration_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ffprobe_available() -> bool {
        Command::new("ffprobe")
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn test_check_ffprobe() {
        if !ffprobe_available() {
            eprintln!("Skipping test: FFprobe not available or broken");
            return;
        }
        assert!(check_ffprobe().is_ok());
    }

    #[test]
    fn test_probe_duration_missing_file() {
        // Fails regardless of whether ffprobe is installed; the variant
        // differs but the caller degrades on any error.
        let result = probe_duration(Path::new("/nonexistent/file.mp3"));
        assert!(result.is_err());
    }

    #[test]
    fn test_probe_duration_invalid_data() {
        if !ffprobe_available() {
            eprintln!("Skipping test: FFprobe not available");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.mp3");
        std::fs::write(&path, b"this is not audio data").unwrap();

        let result = probe_duration(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_spawn_error_maps_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        assert!(matches!(
            spawn_error("ffmpeg", err),
            BatchscribeError::ToolNotFound(_)
        ));

        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(spawn_error("ffmpeg", err), BatchscribeError::Io(_)));
    }
}
