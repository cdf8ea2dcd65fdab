use crate::error::{AssistantError, Result};
use crate::model::{
    Content, GenerateRequest, GenerateResponse, GenerativeModel, GroundingLink, Part, Tool,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const FALLBACK_GROUNDING_TITLE: &str = "Reference";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// `generateContent` over HTTPS.
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{model}:generateContent",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(AssistantError::MissingApiKey)?;
        let url = self.endpoint(&request.model);
        let body = WireRequest::from_request(&request);

        log::debug!("POST {url}");
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::StatusError {
                status: status.as_u16(),
                body,
            });
        }

        let wire: WireResponse = response.json().await?;
        wire.into_response()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireSystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<Value>,
}

#[derive(Serialize)]
struct WireContent {
    role: &'static str,
    parts: Vec<WirePart>,
}

#[derive(Serialize)]
struct WireSystemInstruction {
    parts: Vec<WirePart>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum WirePart {
    Text(String),
    InlineData(WireInlineData),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireInlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<WireThinkingConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireThinkingConfig {
    thinking_budget: u32,
}

impl WireRequest {
    fn from_request(request: &GenerateRequest) -> Self {
        let contents = request.contents.iter().map(wire_content).collect();
        let system_instruction = request
            .system_instruction
            .as_ref()
            .map(|text| WireSystemInstruction {
                parts: vec![WirePart::Text(text.clone())],
            });

        let generation_config =
            if request.response_schema.is_some() || request.thinking_budget.is_some() {
                Some(WireGenerationConfig {
                    response_mime_type: request
                        .response_schema
                        .as_ref()
                        .map(|_| "application/json"),
                    response_schema: request.response_schema.clone(),
                    thinking_config: request
                        .thinking_budget
                        .map(|thinking_budget| WireThinkingConfig { thinking_budget }),
                })
            } else {
                None
            };

        let tools = request
            .tools
            .iter()
            .map(|tool| match tool {
                Tool::GoogleSearch => serde_json::json!({ "googleSearch": {} }),
                Tool::GoogleMaps => serde_json::json!({ "googleMaps": {} }),
            })
            .collect();

        let tool_config = request.location.map(|loc| {
            serde_json::json!({
                "retrievalConfig": {
                    "latLng": { "latitude": loc.latitude, "longitude": loc.longitude }
                }
            })
        });

        Self {
            contents,
            system_instruction,
            generation_config,
            tools,
            tool_config,
        }
    }
}

fn wire_content(content: &Content) -> WireContent {
    WireContent {
        role: content.role.as_str(),
        parts: content
            .parts
            .iter()
            .map(|part| match part {
                Part::Text(text) => WirePart::Text(text.clone()),
                Part::Image(image) => WirePart::InlineData(WireInlineData {
                    mime_type: image.mime_type.clone(),
                    data: BASE64.encode(&image.data),
                }),
            })
            .collect(),
    }
}

#[derive(Deserialize, Debug)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireResponseContent>,
    #[serde(default)]
    grounding_metadata: Option<WireGroundingMetadata>,
}

#[derive(Deserialize, Debug)]
struct WireResponseContent {
    #[serde(default)]
    parts: Vec<WireResponsePart>,
}

#[derive(Deserialize, Debug)]
struct WireResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct WireGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<WireGroundingChunk>,
}

#[derive(Deserialize, Debug)]
struct WireGroundingChunk {
    #[serde(default)]
    web: Option<WireGroundingSource>,
    #[serde(default)]
    maps: Option<WireGroundingSource>,
}

#[derive(Deserialize, Debug)]
struct WireGroundingSource {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl WireResponse {
    fn into_response(self) -> Result<GenerateResponse> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or(AssistantError::EmptyResponse)?;

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        let grounding = candidate
            .grounding_metadata
            .map(|meta| {
                meta.grounding_chunks
                    .into_iter()
                    .filter_map(|chunk| {
                        let source = chunk
                            .web
                            .filter(|s| s.uri.is_some())
                            .or(chunk.maps.filter(|s| s.uri.is_some()))?;
                        Some(GroundingLink {
                            uri: source.uri?,
                            title: source
                                .title
                                .unwrap_or_else(|| FALLBACK_GROUNDING_TITLE.to_string()),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(GenerateResponse {
            text: (!text.is_empty()).then_some(text),
            grounding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InlineImage, LatLng, Role};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn request_body_matches_generate_content_shape() {
        let request = GenerateRequest {
            model: "gemini-2.5-flash".to_string(),
            system_instruction: Some("be brief".to_string()),
            contents: vec![Content {
                role: Role::User,
                parts: vec![
                    Part::Image(InlineImage::new("image/png", vec![1, 2, 3])),
                    Part::Text("where?".to_string()),
                ],
            }],
            response_schema: Some(json!({"type": "OBJECT"})),
            tools: vec![Tool::GoogleMaps],
            location: Some(LatLng {
                latitude: 34.0,
                longitude: -118.0,
            }),
            thinking_budget: None,
        };
        let body = serde_json::to_value(WireRequest::from_request(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"inlineData": {"mimeType": "image/png", "data": "AQID"}},
                        {"text": "where?"}
                    ]
                }],
                "systemInstruction": {"parts": [{"text": "be brief"}]},
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": {"type": "OBJECT"}
                },
                "tools": [{"googleMaps": {}}],
                "toolConfig": {"retrievalConfig": {"latLng": {"latitude": 34.0, "longitude": -118.0}}}
            })
        );
    }

    #[test]
    fn plain_request_omits_optional_sections() {
        let request = GenerateRequest::new("m", vec![Content::user_text("hi")]);
        let body = serde_json::to_value(WireRequest::from_request(&request)).unwrap();
        assert_eq!(
            body,
            json!({"contents": [{"role": "user", "parts": [{"text": "hi"}]}]})
        );
    }

    #[test]
    fn thinking_budget_goes_into_generation_config() {
        let mut request = GenerateRequest::new("m", vec![Content::user_text("hi")]);
        request.thinking_budget = Some(2048);
        let body = serde_json::to_value(WireRequest::from_request(&request)).unwrap();
        assert_eq!(
            body["generationConfig"],
            json!({"thinkingConfig": {"thinkingBudget": 2048}})
        );
    }

    #[test]
    fn response_joins_parts_and_collects_grounding() {
        let wire: WireResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"text": "Hello "}, {"text": "there"}]},
                "groundingMetadata": {"groundingChunks": [
                    {"web": {"uri": "https://ww2.arb.ca.gov", "title": "CARB"}},
                    {"maps": {"uri": "https://maps.google.com/?cid=1"}},
                    {"web": {"title": "no uri"}}
                ]}
            }]
        }))
        .unwrap();
        let out = wire.into_response().unwrap();
        assert_eq!(out.text.as_deref(), Some("Hello there"));
        assert_eq!(
            out.grounding,
            vec![
                GroundingLink {
                    uri: "https://ww2.arb.ca.gov".to_string(),
                    title: "CARB".to_string()
                },
                GroundingLink {
                    uri: "https://maps.google.com/?cid=1".to_string(),
                    title: "Reference".to_string()
                },
            ]
        );
    }

    #[test]
    fn no_candidates_is_an_error() {
        let wire: WireResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            wire.into_response(),
            Err(AssistantError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = GeminiClient::new(GeminiConfig::default()).unwrap();
        assert!(!client.has_api_key());
        let err = client
            .generate(GenerateRequest::new("m", vec![Content::user_text("hi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::MissingApiKey));
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = GeminiClient::new(GeminiConfig {
            base_url: "http://localhost:9/".to_string(),
            ..GeminiConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.endpoint("gemini-3-flash-preview"),
            "http://localhost:9/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }
}
