pub mod whisper;

pub use whisper::{WhisperClient, WhisperModel};

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// A speech-to-text backend that turns one audio artifact into text.
///
/// Implementations submit the file at `audio` and return the plain transcript
/// text. A single failure is final: the pipeline does not retry.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<String>;
    fn name(&self) -> &'static str;
}
