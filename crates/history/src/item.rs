use crate::error::HistoryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CARB status lookup page. Consumed as an outbound link only.
pub const LOOKUP_ENDPOINT: &str =
    "https://cleantruckcheck.arb.ca.gov/Fleet/Vehicle/VehicleComplianceStatusLookup";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookupKind {
    #[serde(rename = "VIN")]
    Vin,
    #[serde(rename = "ENTITY")]
    Entity,
    #[serde(rename = "TRUCRS")]
    Trucrs,
}

impl LookupKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            LookupKind::Vin => "VIN",
            LookupKind::Entity => "ENTITY",
            LookupKind::Trucrs => "TRUCRS",
        }
    }

    /// Query parameter of the status lookup page. TRUCRS ids are looked up as entities.
    pub const fn query_param(self) -> &'static str {
        match self {
            LookupKind::Vin => "vin",
            LookupKind::Entity | LookupKind::Trucrs => "entity",
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookupKind {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vin" => Ok(LookupKind::Vin),
            // The manual-entry screen calls owner/entity ids "OWNER".
            "entity" | "owner" => Ok(LookupKind::Entity),
            "trucrs" => Ok(LookupKind::Trucrs),
            _ => Err(HistoryError::UnknownKind(s.to_string())),
        }
    }
}

/// One recorded compliance lookup.
///
/// Wire shape: `{ "id", "value", "type", "timestamp" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: LookupKind,
    /// Capture time, milliseconds since the Unix epoch.
    #[serde(rename = "timestamp")]
    pub created_at: u64,
}

impl HistoryItem {
    pub fn lookup_url(&self) -> String {
        lookup_url_for(&self.value, self.kind)
    }
}

/// Trim and uppercase. `None` when nothing is left.
pub fn normalize_value(raw: &str) -> Option<String> {
    let value = raw.trim().to_uppercase();
    (!value.is_empty()).then_some(value)
}

pub fn lookup_url_for(value: &str, kind: LookupKind) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair(kind.query_param(), value)
        .finish();
    format!("{LOOKUP_ENDPOINT}?{query}")
}
