use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{BatchscribeError, Result};

use super::probe::{probe_duration, spawn_error};
use super::TempArtifacts;

/// One contiguous time-bounded slice of a source artifact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Duration,
    pub duration: Duration,
}

/// How a source artifact will be submitted to the transcription service.
#[derive(Debug, Clone)]
pub enum ChunkPlan {
    /// The artifact fits in a single request (or cannot be split) and is
    /// submitted unchanged.
    WholeFile,
    /// The artifact must be sliced into contiguous equal-duration segments.
    Split(Vec<Segment>),
}

impl ChunkPlan {
    pub fn chunk_count(&self) -> usize {
        match self {
            ChunkPlan::WholeFile => 1,
            ChunkPlan::Split(segments) => segments.len(),
        }
    }
}

/// A materialized chunk ready for submission, in transcription order.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub path: PathBuf,
    pub index: usize,
}

/// Slice a known duration into `floor(size / max) + 1` contiguous
/// equal-duration segments.
///
/// Equal-duration slicing approximates equal-size chunks under the
/// constant-bitrate assumption, so no per-chunk duration probe is needed.
/// Variable-bitrate input can still yield a chunk over the ceiling; the
/// service is left to reject it.
pub fn split_segments(size_bytes: u64, max_bytes: u64, duration: Duration) -> Vec<Segment> {
    let chunk_count = (size_bytes / max_bytes + 1) as usize;
    let chunk_duration = Duration::from_secs_f64(duration.as_secs_f64() / chunk_count as f64);

    (0..chunk_count)
        .map(|i| Segment {
            start: chunk_duration.mul_f64(i as f64),
            duration: chunk_duration,
        })
        .collect()
}

/// Decide whether an artifact needs splitting to respect the size ceiling.
///
/// Files at or under the ceiling are planned whole without probing. Oversized
/// files whose duration cannot be determined are also planned whole: they are
/// still attempted as-is rather than failed locally.
pub fn plan_chunks(source: &Path, max_bytes: u64) -> Result<ChunkPlan> {
    let size_bytes = std::fs::metadata(source)?.len();
    let size_mb = size_bytes as f64 / (1024.0 * 1024.0);
    let max_mb = max_bytes as f64 / (1024.0 * 1024.0);

    if size_bytes <= max_bytes {
        debug!(
            "Audio is {:.2} MB (under {:.0} MB limit), no splitting needed",
            size_mb, max_mb
        );
        return Ok(ChunkPlan::WholeFile);
    }

    info!("Audio is {:.2} MB (over {:.0} MB limit)", size_mb, max_mb);

    let duration = match probe_duration(source) {
        Ok(d) => d,
        Err(e) => {
            warn!("Could not determine duration ({e}), sending as-is");
            return Ok(ChunkPlan::WholeFile);
        }
    };

    let segments = split_segments(size_bytes, max_bytes, duration);
    info!(
        "Splitting into {} chunks of ~{:.0}s each",
        segments.len(),
        segments[0].duration.as_secs_f64()
    );

    Ok(ChunkPlan::Split(segments))
}

/// Physically create the chunk files for a plan.
///
/// A whole-file plan passes the source path through untouched, avoiding a
/// needless copy; nothing is registered with the tracker. Split plans run one FFmpeg
/// stream-copy per segment into a fresh tracked temp file; the first failure
/// aborts the whole materialization and the tracker removes anything already
/// created.
pub fn materialize_chunks(
    source: &Path,
    plan: &ChunkPlan,
    temps: &mut TempArtifacts,
) -> Result<Vec<AudioChunk>> {
    let segments = match plan {
        ChunkPlan::WholeFile => {
            return Ok(vec![AudioChunk {
                path: source.to_path_buf(),
                index: 0,
            }])
        }
        ChunkPlan::Split(segments) => segments,
    };

    let mut chunks = Vec::with_capacity(segments.len());

    for (index, segment) in segments.iter().enumerate() {
        let chunk_path = temps.create(&format!("_chunk{}.m4a", index + 1))?;

        debug!(
            "Creating chunk {}/{}: start={:.3}s duration={:.3}s",
            index + 1,
            segments.len(),
            segment.start.as_secs_f64(),
            segment.duration.as_secs_f64()
        );

        let output = Command::new("ffmpeg")
            .args(["-y", "-ss"])
            .arg(format!("{:.3}", segment.start.as_secs_f64()))
            .arg("-t")
            .arg(format!("{:.3}", segment.duration.as_secs_f64()))
            .arg("-i")
            .arg(source)
            .args(["-acodec", "copy"])
            .arg(&chunk_path)
            .output()
            .map_err(|e| spawn_error("ffmpeg", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BatchscribeError::Materialization(format!(
                "FFmpeg exited with {} for chunk {}: {}",
                output.status,
                index + 1,
                stderr.trim()
            )));
        }

        let chunk_mb = std::fs::metadata(&chunk_path)?.len() as f64 / (1024.0 * 1024.0);
        info!("Chunk {} created: {:.2} MB", index + 1, chunk_mb);

        chunks.push(AudioChunk {
            path: chunk_path,
            index,
        });
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    #[test]
    fn test_split_segments_three_equal_chunks() {
        let segments = split_segments(45 * MB, 20 * MB, Duration::from_secs(90));

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].start, Duration::ZERO);
        assert_eq!(segments[1].start, Duration::from_secs(30));
        assert_eq!(segments[2].start, Duration::from_secs(60));
        for segment in &segments {
            assert_eq!(segment.duration, Duration::from_secs(30));
        }
    }

    #[test]
    fn test_split_segments_count_is_floor_plus_one() {
        assert_eq!(split_segments(21 * MB, 20 * MB, Duration::from_secs(60)).len(), 2);
        assert_eq!(split_segments(39 * MB, 20 * MB, Duration::from_secs(60)).len(), 2);
        assert_eq!(split_segments(40 * MB, 20 * MB, Duration::from_secs(60)).len(), 3);
        assert_eq!(split_segments(95 * MB, 20 * MB, Duration::from_secs(60)).len(), 5);
    }

    #[test]
    fn test_split_segments_contiguous_full_coverage() {
        let total = Duration::from_secs_f64(3727.4);
        let segments = split_segments(133 * MB, 20 * MB, total);

        assert_eq!(segments[0].start, Duration::ZERO);
        for pair in segments.windows(2) {
            let end = pair[0].start + pair[0].duration;
            let gap = end.abs_diff(pair[1].start);
            assert!(gap < Duration::from_millis(1), "gap of {gap:?} between segments");
        }

        let covered: f64 = segments.iter().map(|s| s.duration.as_secs_f64()).sum();
        assert!((covered - total.as_secs_f64()).abs() < 0.01);
    }

    #[test]
    fn test_plan_chunks_small_file_is_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.mp3");
        std::fs::write(&path, vec![0u8; 5 * MB as usize]).unwrap();

        // Under the ceiling: planned whole without ever probing duration.
        let plan = plan_chunks(&path, 20 * MB).unwrap();
        assert!(matches!(plan, ChunkPlan::WholeFile));
        assert_eq!(plan.chunk_count(), 1);
    }

    #[test]
    fn test_plan_chunks_unknown_duration_degrades_to_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opaque.mp3");
        std::fs::write(&path, vec![0u8; 64 * 1024]).unwrap();

        // Over the ceiling but not real audio: the probe fails (or ffprobe
        // is missing entirely) and the plan degrades to send-as-is.
        let plan = plan_chunks(&path, 1024).unwrap();
        assert!(matches!(plan, ChunkPlan::WholeFile));
    }

    #[test]
    fn test_materialize_whole_file_passes_source_through() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("small.mp3");
        std::fs::write(&source, b"audio").unwrap();

        let mut temps = TempArtifacts::new();
        let chunks = materialize_chunks(&source, &ChunkPlan::WholeFile, &mut temps).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].path, source);
        assert_eq!(chunks[0].index, 0);
        assert!(temps.is_empty());
        // Dropping the tracker must not delete the original.
        drop(temps);
        assert!(source.exists());
    }

    #[test]
    fn test_materialize_split_failure_keeps_partials_tracked() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("garbage.m4a");
        std::fs::write(&source, vec![0u8; 4096]).unwrap();

        let plan = ChunkPlan::Split(split_segments(45 * MB, 20 * MB, Duration::from_secs(90)));
        let mut temps = TempArtifacts::new();
        let result = materialize_chunks(&source, &plan, &mut temps);

        // FFmpeg missing or FFmpeg rejecting the input both abort the
        // materialization; either way the tracked temps clean up on drop.
        assert!(result.is_err());
        assert!(!temps.is_empty());
    }
}
