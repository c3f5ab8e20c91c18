pub mod chunk;
pub mod extract;
pub mod probe;

pub use chunk::{materialize_chunks, plan_chunks, split_segments, AudioChunk, ChunkPlan, Segment};
pub use extract::extract_audio;
pub use probe::{check_ffmpeg, check_ffprobe, probe_duration};

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{BatchscribeError, Result};

/// Audio extensions accepted as directly submittable input.
pub const AUDIO_EXTENSIONS: [&str; 4] = ["mp3", "mpga", "m4a", "wav"];

/// Video extensions that need their audio track extracted first.
pub const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "mpeg", "webm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

/// Classify a path by extension against the supported format sets.
///
/// Returns `None` for unrecognized extensions; those files are excluded by
/// the scanner and never reach the pipeline.
pub fn classify(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Audio)
    } else {
        None
    }
}

/// An input file discovered by the scanner. Never mutated by the pipeline.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub kind: MediaKind,
}

impl MediaFile {
    pub fn from_path(path: PathBuf) -> Result<Self> {
        let kind = classify(&path)
            .ok_or_else(|| BatchscribeError::UnsupportedFormat(path.display().to_string()))?;
        let size_bytes = std::fs::metadata(&path)?.len();
        Ok(Self {
            path,
            size_bytes,
            kind,
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Tracks temporary files created during one pipeline run.
///
/// Paths are registered as they are created and removed when the tracker is
/// dropped, so cleanup runs on success and on every early-return path alike.
/// The original input file is never registered here.
#[derive(Debug, Default)]
pub struct TempArtifacts {
    paths: Vec<PathBuf>,
}

impl TempArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh temporary file with the given suffix and track it.
    ///
    /// The file is registered before any external tool writes to it, so a
    /// failed producer still leaves nothing behind.
    pub fn create(&mut self, suffix: &str) -> Result<PathBuf> {
        let file = tempfile::Builder::new()
            .prefix("batchscribe_")
            .suffix(suffix)
            .tempfile()?;
        let path = file
            .into_temp_path()
            .keep()
            .map_err(|e| BatchscribeError::Io(e.error))?;
        self.paths.push(path.clone());
        Ok(path)
    }

    pub fn register(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Drop for TempArtifacts {
    fn drop(&mut self) {
        if !self.paths.is_empty() {
            debug!("Cleaning up {} temporary file(s)", self.paths.len());
        }
        for path in self.paths.drain(..) {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(&path) {
                    warn!("Failed to remove temporary file {}: {e}", path.display());
                }
            }
        }
    }
}
