//! # ctc-assistant
//!
//! Generative-model boundary for the compliance coach: chat, county lookup
//! and photo extraction over the Gemini `generateContent` API.
//!
//! ```text
//! Assistant<M: GenerativeModel>
//!   ├── ask()                ──► model ──(error)──► offline knowledge base
//!   ├── lookup_county()      ──► model ──(error)──► "California County"
//!   ├── extract_vin()        ──► model (JSON schema)
//!   ├── extract_engine_tag() ──► model (JSON schema)
//!   └── analyze_media()      ──► model (free text)
//! ```
//!
//! [`guide`] holds the static pre-test checklists and notice status tags.
//!
//! [`GeminiClient`] is the production [`GenerativeModel`]; tests substitute
//! a scripted one.

mod assistant;
mod error;
mod gemini;
pub mod guide;
mod model;
pub mod offline;
pub mod vin;

pub use assistant::{
    system_instruction, validate_zip, Assistant, ChatMode, ChatReply, ChatTurn, EngineTag,
    VinScan, ANALYSIS_PROMPT, FALLBACK_COUNTY, THINKING_BUDGET,
};
pub use error::{AssistantError, Result};
pub use gemini::{GeminiClient, GeminiConfig, DEFAULT_BASE_URL};
pub use model::{
    Content, GenerateRequest, GenerateResponse, GenerativeModel, GroundingLink, InlineImage,
    LatLng, ModelNames, Part, Role, Tool,
};
pub use offline::DISPATCH_PHONE;
