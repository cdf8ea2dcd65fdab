//! Local identity labels. There is no authentication: an identity only selects which
//! history bucket is active.

use crate::error::{HistoryError, Result};
use crate::item::HistoryItem;
use crate::keys::{ACTIVE_USER_KEY, USERS_KEY};
use ctc_store::{read_json_or_default, write_json, Store};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default, deserialize_with = "lenient_items")]
    pub history: Vec<HistoryItem>,
}

pub type UserDirectory = BTreeMap<String, UserRecord>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub identity: String,
    /// A new user record was created.
    pub created: bool,
}

pub fn normalize_identity(raw: &str) -> Result<String> {
    let identity = raw.trim().to_lowercase();
    let valid = identity
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
        && !identity.chars().any(char::is_whitespace);
    if valid {
        Ok(identity)
    } else {
        Err(HistoryError::InvalidIdentity(raw.to_string()))
    }
}

pub fn active_identity<S: Store + ?Sized>(store: &S) -> Option<String> {
    let stored: Option<String> = read_json_or_default(store, ACTIVE_USER_KEY);
    stored.and_then(|raw| normalize_identity(&raw).ok())
}

/// Each record decodes on its own, so one damaged identity never hides the others.
pub fn load_users<S: Store + ?Sized>(store: &S) -> UserDirectory {
    let raw: BTreeMap<String, serde_json::Value> = read_json_or_default(store, USERS_KEY);
    raw.into_iter()
        .map(|(identity, value)| {
            let record = serde_json::from_value(value).unwrap_or_else(|err| {
                log::warn!("Unreadable record for {identity}, reading it as empty: {err}");
                UserRecord::default()
            });
            (identity, record)
        })
        .collect()
}

pub fn known_identities<S: Store + ?Sized>(store: &S) -> Vec<String> {
    load_users(store).into_keys().collect()
}

pub fn register<S: Store + ?Sized>(store: &mut S, raw: &str) -> Result<SessionOutcome> {
    let outcome = sign_in(store, raw)?;
    log::info!("Registered fleet identity {}", outcome.identity);
    Ok(outcome)
}

pub fn login<S: Store + ?Sized>(store: &mut S, raw: &str) -> Result<SessionOutcome> {
    let outcome = sign_in(store, raw)?;
    if outcome.created {
        log::info!("Signed in as new identity {}", outcome.identity);
    } else {
        log::info!("Signed in as {}", outcome.identity);
    }
    Ok(outcome)
}

/// Returns the identity that was active, if any.
pub fn logout<S: Store + ?Sized>(store: &mut S) -> Result<Option<String>> {
    let previous = active_identity(store);
    store.remove(ACTIVE_USER_KEY)?;
    if let Some(identity) = &previous {
        log::info!("Signed out {identity}");
    }
    Ok(previous)
}

fn sign_in<S: Store + ?Sized>(store: &mut S, raw: &str) -> Result<SessionOutcome> {
    let identity = normalize_identity(raw)?;
    let mut users = load_users(store);
    let created = !users.contains_key(&identity);
    if created {
        users.insert(identity.clone(), UserRecord::default());
        write_json(store, USERS_KEY, &users)?;
    }
    write_json(store, ACTIVE_USER_KEY, &identity)?;
    Ok(SessionOutcome { identity, created })
}

/// Decode a stored list item by item, dropping entries that no longer match the schema.
/// A value that is not a list at all reads as empty.
pub(crate) fn lenient_items<'de, D>(deserializer: D) -> std::result::Result<Vec<HistoryItem>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(raw) => Ok(decode_items(raw)),
        serde_json::Value::Null => Ok(Vec::new()),
        other => {
            log::warn!("Expected a history list, found {other}; reading as empty");
            Ok(Vec::new())
        }
    }
}

pub(crate) fn decode_items(raw: Vec<serde_json::Value>) -> Vec<HistoryItem> {
    let total = raw.len();
    let items: Vec<HistoryItem> = raw
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();
    if items.len() != total {
        log::warn!(
            "Dropped {} malformed history entries out of {total}",
            total - items.len()
        );
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctc_store::MemoryStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn identity_is_trimmed_and_lowercased() {
        assert_eq!(
            normalize_identity("  Trucker@Example.COM ").unwrap(),
            "trucker@example.com"
        );
        for bad in ["", "   ", "no-at-sign", "@example.com", "me@", "a b@c.d"] {
            assert!(normalize_identity(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn register_then_login_reuses_record() {
        let mut store = MemoryStore::new();
        let first = register(&mut store, "fleet@example.com").unwrap();
        assert!(first.created);
        logout(&mut store).unwrap();
        let second = login(&mut store, "FLEET@example.com").unwrap();
        assert!(!second.created);
        assert_eq!(second.identity, "fleet@example.com");
        assert_eq!(known_identities(&store), vec!["fleet@example.com".to_string()]);
    }

    #[test]
    fn logout_clears_active_identity() {
        let mut store = MemoryStore::new();
        assert_eq!(logout(&mut store).unwrap(), None);
        login(&mut store, "a@b.co").unwrap();
        assert_eq!(active_identity(&store).as_deref(), Some("a@b.co"));
        assert_eq!(logout(&mut store).unwrap().as_deref(), Some("a@b.co"));
        assert_eq!(active_identity(&store), None);
    }

    #[test]
    fn corrupt_pointer_reads_as_anonymous() {
        let mut store = MemoryStore::new();
        store.set(ACTIVE_USER_KEY, "not json").unwrap();
        assert_eq!(active_identity(&store), None);
        store.set(ACTIVE_USER_KEY, "\"not-an-email\"").unwrap();
        assert_eq!(active_identity(&store), None);
    }

    #[test]
    fn user_record_drops_malformed_entries() {
        let raw = r#"{"history":[
            {"id":"1","value":"AAA","type":"VIN","timestamp":1},
            {"id":"2","value":"BBB","type":"PLATE","timestamp":2},
            {"value":"CCC"}
        ]}"#;
        let record: UserRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.history.len(), 1);
        assert_eq!(record.history[0].value, "AAA");
        let empty: UserRecord = serde_json::from_str("{}").unwrap();
        assert!(empty.history.is_empty());
        let null: UserRecord = serde_json::from_str(r#"{"history":null}"#).unwrap();
        assert!(null.history.is_empty());
    }

    #[test]
    fn damaged_record_does_not_hide_other_identities() {
        let mut store = MemoryStore::new();
        store
            .set(
                USERS_KEY,
                r#"{
                    "a@b.co":{"history":[{"id":"1","value":"AAA","type":"VIN","timestamp":1}]},
                    "x@y.co":{"history":null},
                    "z@y.co":{"history":{"value":"BBB"}},
                    "q@y.co":7
                }"#,
            )
            .unwrap();
        let users = load_users(&store);
        assert_eq!(users["a@b.co"].history.len(), 1);
        assert_eq!(users["a@b.co"].history[0].value, "AAA");
        assert_eq!(
            known_identities(&store),
            vec!["a@b.co", "q@y.co", "x@y.co", "z@y.co"]
        );

        login(&mut store, "a@b.co").unwrap();
        let mut history = crate::HistoryManager::new(&mut store, crate::HistoryConfig::default());
        let out = history.record_lookup("BBB", crate::LookupKind::Vin);
        assert_eq!(
            out.iter().map(|item| item.value.as_str()).collect::<Vec<_>>(),
            vec!["BBB", "AAA"]
        );
        drop(history);
        assert_eq!(
            known_identities(&store),
            vec!["a@b.co", "q@y.co", "x@y.co", "z@y.co"]
        );
    }
}
