use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchscribeError {
    #[error("Required external tool not available: {0}")]
    ToolNotFound(String),

    #[error("Duration probe failed: {0}")]
    Probe(String),

    #[error("Audio extraction failed: {0}")]
    Extraction(String),

    #[error("Chunk materialization failed: {0}")]
    Materialization(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported media format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BatchscribeError>;
