use thiserror::Error;

pub type Result<T> = std::result::Result<T, AssistantError>;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("No Gemini API key configured (set GEMINI_API_KEY)")]
    MissingApiKey,

    #[error("Invalid ZIP code {0:?}: expected 5 digits")]
    InvalidZip(String),

    #[error("Unsupported image type for {0}")]
    UnsupportedImage(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Model API returned {status}: {body}")]
    StatusError { status: u16, body: String },

    #[error("Model returned no candidates")]
    EmptyResponse,

    #[error("Failed to decode model output: {0}")]
    DecodeError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
