use crate::error::{AssistantError, Result};
use crate::model::{
    Content, GenerateRequest, GenerativeModel, GroundingLink, InlineImage, LatLng, ModelNames,
    Part, Role, Tool,
};
use crate::offline::{offline_reply, DISPATCH_PHONE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

pub const FALLBACK_COUNTY: &str = "California County";
pub const THINKING_BUDGET: u32 = 2048;
const NO_RESPONSE: &str = "No response.";
const DEFAULT_VEHICLE_DESCRIPTION: &str = "Truck";
const UNKNOWN_FAMILY: &str = "UNKNOWN";
const UNKNOWN_MODEL_YEAR: &str = "N/A";
pub const ANALYSIS_PROMPT: &str = "Analyze this diesel component for CARB compliance.";
const NO_ANALYSIS: &str = "No analysis provided.";

pub fn system_instruction() -> String {
    format!(
        "You are VIN DIESEL, a specialized AI Compliance Officer for the California Clean Truck Check (HD I/M) Program.\n\
         Base answers strictly on official CARB data (ww2.arb.ca.gov/our-work/programs/CTC).\n\
         Scope: ONLY Heavy-Duty Diesel Trucks (>14,000 lbs GVWR).\n\
         Footer Requirement: End every response with: \"\\n\\nNeed a Certified Mobile Tester? Call Us: {DISPATCH_PHONE}\""
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    #[default]
    Standard,
    Search,
    Maps,
    Thinking,
}

impl ChatMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ChatMode::Standard => "standard",
            ChatMode::Search => "search",
            ChatMode::Maps => "maps",
            ChatMode::Thinking => "thinking",
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(ChatMode::Standard),
            "search" => Ok(ChatMode::Search),
            "maps" => Ok(ChatMode::Maps),
            "thinking" => Ok(ChatMode::Thinking),
            other => Err(format!(
                "unknown chat mode '{other}' (expected standard, search, maps or thinking)"
            )),
        }
    }
}

/// A previous exchange replayed to the model as conversation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    pub grounding: Vec<GroundingLink>,
    /// The answer came from the local knowledge base.
    pub offline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VinScan {
    pub vin: String,
    pub description: String,
}

impl VinScan {
    pub fn is_detected(&self) -> bool {
        !self.vin.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineTag {
    pub family_name: String,
    pub model_year: String,
}

pub struct Assistant<M> {
    model: M,
    names: ModelNames,
}

impl<M: GenerativeModel> Assistant<M> {
    pub fn new(model: M) -> Self {
        Self::with_models(model, ModelNames::default())
    }

    pub fn with_models(model: M, names: ModelNames) -> Self {
        Self { model, names }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Never fails: any model error degrades to the offline knowledge base.
    pub async fn ask(
        &self,
        question: &str,
        mode: ChatMode,
        history: &[ChatTurn],
        location: Option<LatLng>,
        image: Option<InlineImage>,
    ) -> ChatReply {
        let request = self.chat_request(question, mode, history, location, image);
        match self.model.generate(request).await {
            Ok(response) => ChatReply {
                text: response.text.unwrap_or_else(|| NO_RESPONSE.to_string()),
                grounding: response.grounding,
                offline: false,
            },
            Err(err) => {
                log::warn!("Assistant unavailable, answering offline: {err}");
                ChatReply {
                    text: offline_reply(question),
                    grounding: Vec::new(),
                    offline: true,
                }
            }
        }
    }

    fn chat_request(
        &self,
        question: &str,
        mode: ChatMode,
        history: &[ChatTurn],
        location: Option<LatLng>,
        image: Option<InlineImage>,
    ) -> GenerateRequest {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|turn| Content {
                role: turn.role,
                parts: vec![Part::Text(turn.text.clone())],
            })
            .collect();
        let mut parts = Vec::with_capacity(2);
        if let Some(image) = image {
            parts.push(Part::Image(image));
        }
        parts.push(Part::Text(question.to_string()));
        contents.push(Content {
            role: Role::User,
            parts,
        });

        let mut request = GenerateRequest::new(self.names.flash.clone(), contents);
        request.system_instruction = Some(system_instruction());
        match mode {
            ChatMode::Standard => {}
            ChatMode::Search => request.tools = vec![Tool::GoogleSearch],
            ChatMode::Maps => {
                request.model = self.names.maps.clone();
                request.tools = vec![Tool::GoogleMaps];
                request.location = location;
            }
            ChatMode::Thinking => {
                request.model = self.names.pro.clone();
                request.thinking_budget = Some(THINKING_BUDGET);
            }
        }
        request
    }

    /// County name for a California ZIP. Only a malformed ZIP is an error.
    pub async fn lookup_county(&self, zip: &str) -> Result<String> {
        let zip = validate_zip(zip)?;
        let prompt = format!(
            "Identify the California County for ZIP code {zip}. Return ONLY the name of the county followed by the word 'County'. No other text."
        );
        let request = GenerateRequest::new(self.names.flash.clone(), vec![Content::user_text(prompt)]);
        let county = match self.model.generate(request).await {
            Ok(response) => response
                .text
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            Err(err) => {
                log::warn!("County lookup for {zip} failed: {err}");
                None
            }
        };
        Ok(county.unwrap_or_else(|| FALLBACK_COUNTY.to_string()))
    }

    pub async fn extract_vin(&self, image: InlineImage) -> Result<VinScan> {
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "vin": { "type": "STRING" },
                "description": { "type": "STRING" }
            }
        });
        let json = self
            .extract(image, "Extract VIN and Year/Make/Model. JSON: {vin, description}", schema)
            .await?;
        let vin = string_field(&json, "vin")
            .map(|vin| vin.trim().to_uppercase())
            .unwrap_or_default();
        let description = string_field(&json, "description")
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_VEHICLE_DESCRIPTION)
            .to_string();
        Ok(VinScan { vin, description })
    }

    pub async fn extract_engine_tag(&self, image: InlineImage) -> Result<EngineTag> {
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "familyName": { "type": "STRING" },
                "modelYear": { "type": "STRING" }
            }
        });
        let json = self
            .extract(
                image,
                "Extract Engine Family Name (EFN) and Model Year. Return JSON.",
                schema,
            )
            .await?;
        let family_name = string_field(&json, "familyName")
            .filter(|f| !f.is_empty())
            .unwrap_or(UNKNOWN_FAMILY)
            .to_uppercase();
        let model_year = string_field(&json, "modelYear")
            .filter(|y| !y.is_empty())
            .unwrap_or(UNKNOWN_MODEL_YEAR)
            .to_string();
        Ok(EngineTag {
            family_name,
            model_year,
        })
    }

    /// Free-text inspection of a component photo or clip. Model errors propagate.
    pub async fn analyze_media(&self, media: InlineImage, prompt: Option<&str>) -> Result<String> {
        let prompt = prompt
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(ANALYSIS_PROMPT);
        let contents = vec![Content {
            role: Role::User,
            parts: vec![Part::Image(media), Part::Text(prompt.to_string())],
        }];
        let request = GenerateRequest::new(self.names.flash.clone(), contents);
        let response = self.model.generate(request).await?;
        Ok(response
            .text
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| NO_ANALYSIS.to_string()))
    }

    async fn extract(&self, image: InlineImage, prompt: &str, schema: Value) -> Result<Value> {
        let contents = vec![Content {
            role: Role::User,
            parts: vec![Part::Image(image), Part::Text(prompt.to_string())],
        }];
        let mut request = GenerateRequest::new(self.names.pro.clone(), contents);
        request.response_schema = Some(schema);
        let response = self.model.generate(request).await?;
        let text = response.text.unwrap_or_else(|| "{}".to_string());
        Ok(serde_json::from_str(&text)?)
    }
}

fn string_field<'a>(json: &'a Value, field: &str) -> Option<&'a str> {
    json.get(field).and_then(Value::as_str)
}

pub fn validate_zip(raw: &str) -> Result<&str> {
    let zip = raw.trim();
    if zip.len() == 5 && zip.bytes().all(|b| b.is_ascii_digit()) {
        Ok(zip)
    } else {
        Err(AssistantError::InvalidZip(raw.to_string()))
    }
}
