use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::error::{BatchscribeError, Result};
use crate::transcribe::Transcriber;

/// OpenAI audio transcriptions endpoint.
const WHISPER_API_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Transcription model variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WhisperModel {
    #[serde(rename = "whisper-1")]
    Whisper1,
    #[default]
    #[serde(rename = "gpt-4o-transcribe")]
    Gpt4oTranscribe,
    #[serde(rename = "gpt-4o-mini-transcribe")]
    Gpt4oMiniTranscribe,
}

impl WhisperModel {
    fn as_str(&self) -> &'static str {
        match self {
            WhisperModel::Whisper1 => "whisper-1",
            WhisperModel::Gpt4oTranscribe => "gpt-4o-transcribe",
            WhisperModel::Gpt4oMiniTranscribe => "gpt-4o-mini-transcribe",
        }
    }
}

impl std::fmt::Display for WhisperModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WhisperModel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "whisper-1" => Ok(WhisperModel::Whisper1),
            "gpt-4o-transcribe" => Ok(WhisperModel::Gpt4oTranscribe),
            "gpt-4o-mini-transcribe" => Ok(WhisperModel::Gpt4oMiniTranscribe),
            _ => Err(format!(
                "Unknown model: {s}. Use 'whisper-1', 'gpt-4o-transcribe', or 'gpt-4o-mini-transcribe'"
            )),
        }
    }
}

/// MIME type for the multipart file part, derived from the extension.
fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("wav") => "audio/wav",
        Some("mp3") | Some("mpga") => "audio/mpeg",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("mpeg") => "video/mpeg",
        Some("webm") => "audio/webm",
        _ => "application/octet-stream",
    }
}

/// OpenAI speech-to-text API client.
pub struct WhisperClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: WhisperModel,
    language: Option<String>,
}

impl WhisperClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: WHISPER_API_URL.to_string(),
            api_key,
            model: WhisperModel::default(),
            language: None,
        }
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: WhisperModel) -> Self {
        self.model = model;
        self
    }

    /// Set the source language (ISO 639-1 code).
    pub fn with_language(mut self, language: String) -> Self {
        self.language = Some(language);
        self
    }

    /// Override the API endpoint, e.g. for tests or a self-hosted gateway.
    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url;
        self
    }

    /// Build the multipart form for the API request.
    async fn build_form(&self, audio_path: &Path) -> Result<Form> {
        let file_bytes = fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.m4a")
            .to_string();

        let file_part = Part::bytes(file_bytes)
            .file_name(file_name)
            .mime_str(mime_for(audio_path))?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", self.model.as_str())
            .text("response_format", "text");

        if let Some(ref lang) = self.language {
            form = form.text("language", lang.clone());
        }

        Ok(form)
    }

    /// Make the API request and return the plain-text transcript body.
    async fn call_api(&self, form: Form) -> Result<String> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        debug!("Whisper API response status: {}", status);

        if status.is_success() {
            let body = response.text().await?;
            return Ok(body.trim().to_string());
        }

        let error_body = response.text().await.unwrap_or_default();

        // Error responses are JSON even when the success format is text.
        if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
            return Err(BatchscribeError::Api(format!(
                "Whisper API error: {} ({})",
                api_error.error.message, api_error.error.r#type
            )));
        }

        Err(BatchscribeError::Api(format!(
            "Whisper API error ({status}): {error_body}"
        )))
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, audio: &Path) -> Result<String> {
        debug!("Submitting {} to {}", audio.display(), self.name());

        let started = Instant::now();
        let form = self.build_form(audio).await?;
        let text = self.call_api(form).await?;

        debug!(
            "Received {} characters in {:.1}s",
            text.len(),
            started.elapsed().as_secs_f64()
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "OpenAI Whisper"
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    r#type: String,
    #[allow(dead_code)]
    code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_str() {
        assert_eq!(WhisperModel::Whisper1.as_str(), "whisper-1");
        assert_eq!(WhisperModel::Gpt4oTranscribe.as_str(), "gpt-4o-transcribe");
        assert_eq!(
            WhisperModel::Gpt4oMiniTranscribe.as_str(),
            "gpt-4o-mini-transcribe"
        );
    }

    #[test]
    fn test_model_default_matches_original_tool() {
        assert_eq!(WhisperModel::default(), WhisperModel::Gpt4oTranscribe);
    }

    #[test]
    fn test_model_parsing() {
        assert_eq!(
            "whisper-1".parse::<WhisperModel>().unwrap(),
            WhisperModel::Whisper1
        );
        assert_eq!(
            "GPT-4O-TRANSCRIBE".parse::<WhisperModel>().unwrap(),
            WhisperModel::Gpt4oTranscribe
        );
        assert!("whisper-large".parse::<WhisperModel>().is_err());
    }

    #[test]
    fn test_mime_for_known_extensions() {
        assert_eq!(mime_for(Path::new("a.wav")), "audio/wav");
        assert_eq!(mime_for(Path::new("a.mp3")), "audio/mpeg");
        assert_eq!(mime_for(Path::new("a.m4a")), "audio/mp4");
        assert_eq!(mime_for(Path::new("a.webm")), "audio/webm");
        assert_eq!(mime_for(Path::new("a.bin")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_transcribe_missing_file() {
        let client = WhisperClient::new("test-key".to_string());
        let result = client.transcribe(Path::new("/nonexistent/audio.m4a")).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_client_builders() {
        let client = WhisperClient::new("test-key".to_string())
            .with_model(WhisperModel::Whisper1)
            .with_language("en".to_string())
            .with_api_url("http://localhost:9000/v1".to_string());
        assert_eq!(client.name(), "OpenAI Whisper");
        assert_eq!(client.model, WhisperModel::Whisper1);
        assert_eq!(client.api_url, "http://localhost:9000/v1");
    }
}
