use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CAPABILITIES_SCHEMA_VERSION: u32 = 1;
pub const COMMAND_API_VERSION: &str = "v1";

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct CommandRequest {
    pub action: CommandAction,
    #[serde(default = "empty_payload")]
    pub payload: Value,
}

fn empty_payload() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    RecordLookup,
    ListHistory,
    ClearHistory,
    Login,
    Register,
    Logout,
    Whoami,
    SetTheme,
    Capabilities,
}

impl CommandAction {
    pub const ALL: [CommandAction; 9] = [
        CommandAction::RecordLookup,
        CommandAction::ListHistory,
        CommandAction::ClearHistory,
        CommandAction::Login,
        CommandAction::Register,
        CommandAction::Logout,
        CommandAction::Whoami,
        CommandAction::SetTheme,
        CommandAction::Capabilities,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            CommandAction::RecordLookup => "record_lookup",
            CommandAction::ListHistory => "list_history",
            CommandAction::ClearHistory => "clear_history",
            CommandAction::Login => "login",
            CommandAction::Register => "register",
            CommandAction::Logout => "logout",
            CommandAction::Whoami => "whoami",
            CommandAction::SetTheme => "set_theme",
            CommandAction::Capabilities => "capabilities",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct RecordLookupPayload {
    pub value: String,
    /// `vin`, `entity`, `trucrs` or `owner`; defaults to `vin`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, JsonSchema)]
pub struct ListHistoryPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// `newest`, `oldest` or `value`; defaults to `newest`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct IdentityPayload {
    pub email: String,
    /// Move lookups recorded while signed out into this identity's history.
    #[serde(default)]
    pub adopt: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ThemePayload {
    /// `light`, `dark` or `toggle`.
    pub theme: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Ok,
    Error,
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct NextAction {
    pub action: String,
    pub args: Value,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_actions: Vec<NextAction>,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            hint: None,
            next_actions: Vec::new(),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_next_action(mut self, action: NextAction) -> Self {
        self.next_actions.push(action);
        self
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct CommandResponse {
    pub status: CommandStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,
    #[serde(default)]
    pub data: Value,
}

impl CommandResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            status: CommandStatus::Ok,
            error: None,
            data,
        }
    }

    pub fn error(error: ErrorEnvelope) -> Self {
        Self {
            status: CommandStatus::Error,
            error: Some(error),
            data: Value::Null,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, CommandStatus::Error)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct CapabilitiesServer {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct Capabilities {
    pub schema_version: u32,
    pub server: CapabilitiesServer,
    pub command_api: String,
    pub actions: Vec<String>,
    /// JSON schema of [`CommandRequest`].
    pub request_schema: Value,
}

pub fn capabilities(name: &str, version: &str) -> Result<Capabilities> {
    let schema = schemars::schema_for!(CommandRequest);
    Ok(Capabilities {
        schema_version: CAPABILITIES_SCHEMA_VERSION,
        server: CapabilitiesServer {
            name: name.to_string(),
            version: version.to_string(),
        },
        command_api: COMMAND_API_VERSION.to_string(),
        actions: CommandAction::ALL
            .iter()
            .map(|action| action.as_str().to_string())
            .collect(),
        request_schema: serde_json::to_value(schema)?,
    })
}

pub fn serialize_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let raw = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(raw)
}
