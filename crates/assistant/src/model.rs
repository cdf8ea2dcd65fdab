use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

/// Model ids used by the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelNames {
    /// General chat, ZIP lookup.
    pub flash: String,
    /// Maps grounding is only offered on the 2.5 flash model.
    pub maps: String,
    /// Vision extraction and the thinking chat mode.
    pub pro: String,
}

impl Default for ModelNames {
    fn default() -> Self {
        Self {
            flash: "gemini-3-flash-preview".to_string(),
            maps: "gemini-2.5-flash".to_string(),
            pro: "gemini-3-pro-preview".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Read an image file, inferring the MIME type from its extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mime_type = mime_for_path(path)
            .ok_or_else(|| AssistantError::UnsupportedImage(path.display().to_string()))?;
        let data = std::fs::read(path)?;
        Ok(Self::new(mime_type, data))
    }
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        "mp4" => Some("video/mp4"),
        "mov" => Some("video/quicktime"),
        "webm" => Some("video/webm"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    Image(InlineImage),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    GoogleSearch,
    GoogleMaps,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerateRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    pub contents: Vec<Content>,
    /// When set the model is asked for `application/json` matching this schema.
    pub response_schema: Option<Value>,
    pub tools: Vec<Tool>,
    pub location: Option<LatLng>,
    pub thinking_budget: Option<u32>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, contents: Vec<Content>) -> Self {
        Self {
            model: model.into(),
            contents,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingLink {
    pub uri: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerateResponse {
    pub text: Option<String>,
    pub grounding: Vec<GroundingLink>,
}

/// The remote generative model. Treated as a black box that eventually answers or fails.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;
}

#[async_trait]
impl<M: GenerativeModel + ?Sized> GenerativeModel for Box<M> {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        (**self).generate(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn image_mime_from_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tag.JPG");
        std::fs::write(&path, [0xff, 0xd8]).unwrap();
        let image = InlineImage::from_path(&path).unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.data, vec![0xff, 0xd8]);
    }

    #[test]
    fn video_clips_are_accepted() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("exhaust.MOV");
        std::fs::write(&path, [0u8, 0, 0, 20]).unwrap();
        assert_eq!(InlineImage::from_path(&path).unwrap().mime_type, "video/quicktime");
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        std::fs::write(&path, "hi").unwrap();
        assert!(matches!(
            InlineImage::from_path(&path),
            Err(AssistantError::UnsupportedImage(_))
        ));
    }
}
