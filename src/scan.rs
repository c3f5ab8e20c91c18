use std::path::Path;

use tracing::{debug, info};

use crate::error::Result;
use crate::media::{classify, MediaFile};

/// List the supported media files directly inside `dir`, sorted by path for
/// a deterministic processing order. Subdirectories are not descended into.
pub fn scan_media_files(dir: &Path) -> Result<Vec<MediaFile>> {
    info!("Scanning '{}' for media files...", dir.display());

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if classify(&path).is_none() {
            debug!("Skipping unsupported file {}", path.display());
            continue;
        }
        files.push(MediaFile::from_path(path)?);
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    info!("Found {} media file(s)", files.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaKind;

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.mp4"), b"video").unwrap();
        std::fs::write(dir.path().join("a.mp3"), b"audio").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"not media").unwrap();
        std::fs::create_dir(dir.path().join("nested.mp3")).unwrap();

        let files = scan_media_files(dir.path()).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].file_name(), "a.mp3");
        assert_eq!(files[0].kind, MediaKind::Audio);
        assert_eq!(files[1].file_name(), "b.mp4");
        assert_eq!(files[1].kind, MediaKind::Video);
    }

    #[test]
    fn test_scan_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let files = scan_media_files(dir.path()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_scan_missing_dir_errors() {
        let result = scan_media_files(Path::new("/nonexistent/input"));
        assert!(result.is_err());
    }
}
