mod errors;

pub use errors::classify_error;

use anyhow::{Context, Result};
use ctc_history::{
    prefs, session, HistoryConfig, HistoryItem, HistoryManager, LookupKind, SortMode, Theme,
};
use ctc_protocol::{
    capabilities, CommandAction, CommandRequest, CommandResponse, ErrorEnvelope, IdentityPayload,
    ListHistoryPayload, RecordLookupPayload, ThemePayload,
};
use ctc_store::Store;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

pub const SERVER_NAME: &str = "ctc";

/// Executes JSON command API requests against one store.
pub struct CommandHandler<S> {
    store: S,
    config: HistoryConfig,
}

impl<S: Store> CommandHandler<S> {
    pub fn new(store: S, config: HistoryConfig) -> Self {
        Self { store, config }
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Parse and run a raw request. Malformed requests become `invalid_request` errors.
    pub fn execute_raw(&mut self, raw: &str) -> CommandResponse {
        match serde_json::from_str::<CommandRequest>(raw) {
            Ok(request) => self.execute(request),
            Err(err) => CommandResponse::error(
                ErrorEnvelope::new("invalid_request", format!("Invalid command request: {err}"))
                    .with_hint("Send {\"action\": \"capabilities\"} to list supported actions."),
            ),
        }
    }

    pub fn execute(&mut self, request: CommandRequest) -> CommandResponse {
        let CommandRequest { action, payload } = request;
        log::debug!("command action={}", action.as_str());
        match self.dispatch(action, payload) {
            Ok(data) => CommandResponse::ok(data),
            Err(err) => {
                log::debug!("command {} failed: {err:#}", action.as_str());
                CommandResponse::error(classify_error(&err, action))
            }
        }
    }

    fn dispatch(&mut self, action: CommandAction, payload: Value) -> Result<Value> {
        match action {
            CommandAction::RecordLookup => {
                let payload: RecordLookupPayload = parse_payload(payload)?;
                let kind = match payload.kind.as_deref() {
                    Some(raw) => raw.parse::<LookupKind>()?,
                    None => LookupKind::Vin,
                };
                let mut manager = self.manager();
                let history = manager.record_lookup(&payload.value, kind);
                Ok(history_data(&manager, &history))
            }
            CommandAction::ListHistory => {
                let payload: ListHistoryPayload = parse_payload(payload)?;
                let sort = match payload.sort.as_deref() {
                    Some(raw) => raw.parse::<SortMode>()?,
                    None => SortMode::default(),
                };
                let search = payload.search.unwrap_or_default();
                let manager = self.manager();
                let all = manager.history();
                let visible = ctc_history::project(&all, &search, sort);
                let mut data = history_data(&manager, &visible);
                data["total"] = json!(all.len());
                data["search"] = json!(search.trim());
                data["sort"] = json!(sort.as_str());
                Ok(data)
            }
            CommandAction::ClearHistory => {
                let mut manager = self.manager();
                let history = manager.clear();
                Ok(history_data(&manager, &history))
            }
            CommandAction::Login | CommandAction::Register => {
                let payload: IdentityPayload = parse_payload(payload)?;
                let outcome = if action == CommandAction::Register {
                    session::register(&mut self.store, &payload.email)?
                } else {
                    session::login(&mut self.store, &payload.email)?
                };
                let mut manager = self.manager();
                let history = if payload.adopt {
                    manager.adopt_global_history()
                } else {
                    manager.history()
                };
                let mut data = history_data(&manager, &history);
                data["identity"] = json!(outcome.identity);
                data["created"] = json!(outcome.created);
                Ok(data)
            }
            CommandAction::Logout => {
                let previous = session::logout(&mut self.store)?;
                Ok(json!({ "previous": previous }))
            }
            CommandAction::Whoami => {
                let manager = self.manager();
                Ok(json!({
                    "identity": session::active_identity(manager.store()),
                    "bucket": manager.bucket().to_string(),
                    "theme": prefs::load_theme(manager.store()),
                    "known_identities": session::known_identities(manager.store()),
                }))
            }
            CommandAction::SetTheme => {
                let payload: ThemePayload = parse_payload(payload)?;
                let theme = if payload.theme.trim().eq_ignore_ascii_case("toggle") {
                    prefs::toggle_theme(&mut self.store)?
                } else {
                    let theme: Theme = payload.theme.parse()?;
                    prefs::save_theme(&mut self.store, theme)?;
                    theme
                };
                Ok(json!({ "theme": theme }))
            }
            CommandAction::Capabilities => {
                let caps = capabilities(SERVER_NAME, env!("CARGO_PKG_VERSION"))?;
                Ok(serde_json::to_value(caps)?)
            }
        }
    }

    fn manager(&mut self) -> HistoryManager<&mut S> {
        HistoryManager::new(&mut self.store, self.config)
    }
}

fn parse_payload<T: DeserializeOwned>(payload: Value) -> Result<T> {
    serde_json::from_value(payload).context("Invalid payload")
}

fn history_data<S: Store>(manager: &HistoryManager<S>, items: &[HistoryItem]) -> Value {
    let history: Vec<Value> = items
        .iter()
        .map(|item| {
            json!({
                "id": item.id,
                "value": item.value,
                "type": item.kind,
                "timestamp": item.created_at,
                "url": item.lookup_url(),
            })
        })
        .collect();
    json!({
        "bucket": manager.bucket().to_string(),
        "cap": manager.config().cap,
        "history": history,
    })
}
