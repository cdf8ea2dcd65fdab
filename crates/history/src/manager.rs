use crate::clock::{Clock, IdMint, SystemClock};
use crate::error::HistoryError;
use crate::item::{normalize_value, HistoryItem, LookupKind};
use crate::keys::{HISTORY_KEY, USERS_KEY};
use crate::session::{active_identity, decode_items, load_users};
use ctc_store::{read_json_or_default, write_json, Store, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CAP: usize = 50;

/// Where history lives while an identity is signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketPolicy {
    /// Per-identity list, global list while anonymous.
    #[default]
    PerUser,
    /// Always the global list.
    #[serde(alias = "global")]
    GlobalOnly,
}

impl FromStr for BucketPolicy {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "per_user" | "user" => Ok(BucketPolicy::PerUser),
            "global" | "global_only" => Ok(BucketPolicy::GlobalOnly),
            _ => Err(HistoryError::UnknownBucketPolicy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    pub cap: usize,
    pub bucket_policy: BucketPolicy,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            cap: DEFAULT_CAP,
            bucket_policy: BucketPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bucket {
    Global,
    User(String),
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Global => f.write_str("global"),
            Bucket::User(identity) => write!(f, "user:{identity}"),
        }
    }
}

/// Canonical, capped, de-duplicated lookup history for the active bucket.
///
/// Every mutation is a full read-modify-write of one store key. Public operations never
/// fail: unreadable data reads as empty and failed writes are logged while the updated
/// list is still returned to the caller.
pub struct HistoryManager<S> {
    store: S,
    config: HistoryConfig,
    clock: Box<dyn Clock + Send + Sync>,
    mint: IdMint,
}

impl<S: Store> HistoryManager<S> {
    pub fn new(store: S, config: HistoryConfig) -> Self {
        Self::with_clock(store, config, Box::new(SystemClock))
    }

    pub fn with_clock(
        store: S,
        mut config: HistoryConfig,
        clock: Box<dyn Clock + Send + Sync>,
    ) -> Self {
        if config.cap == 0 {
            log::warn!("History cap of 0 requested; using 1");
            config.cap = 1;
        }
        Self {
            store,
            config,
            clock,
            mint: IdMint::new(),
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn bucket(&self) -> Bucket {
        match self.config.bucket_policy {
            BucketPolicy::GlobalOnly => Bucket::Global,
            BucketPolicy::PerUser => active_identity(&self.store)
                .map(Bucket::User)
                .unwrap_or(Bucket::Global),
        }
    }

    pub fn history(&self) -> Vec<HistoryItem> {
        self.load(&self.bucket())
    }

    pub fn record_lookup(&mut self, raw: &str, kind: LookupKind) -> Vec<HistoryItem> {
        let bucket = self.bucket();
        let current = self.load(&bucket);
        let Some(value) = normalize_value(raw) else {
            log::debug!("Ignoring empty lookup value");
            return current;
        };

        for item in &current {
            self.mint.observe(&item.id);
        }
        let created_at = self.clock.now_ms();
        let item = HistoryItem {
            id: self.mint.mint(created_at),
            value,
            kind,
            created_at,
        };
        log::debug!("Recording {} {} in {bucket}", item.kind, item.value);

        let mut updated = Vec::with_capacity(current.len() + 1);
        let recorded = item.value.clone();
        updated.push(item);
        updated.extend(
            current
                .into_iter()
                .filter(|existing| !same_value(&existing.value, &recorded)),
        );
        updated.truncate(self.config.cap);

        self.persist_or_log(&bucket, &updated);
        updated
    }

    /// Drop the active bucket's history.
    pub fn clear(&mut self) -> Vec<HistoryItem> {
        let bucket = self.bucket();
        let result = match &bucket {
            Bucket::Global => self.store.remove(HISTORY_KEY),
            Bucket::User(_) => self.persist(&bucket, &[]),
        };
        if let Err(err) = result {
            log::warn!("Failed to clear {bucket} history: {err}");
        }
        Vec::new()
    }

    /// Merge items into the active bucket: newest first by capture time, one entry per
    /// value, capped.
    pub fn import(&mut self, items: impl IntoIterator<Item = HistoryItem>) -> Vec<HistoryItem> {
        let bucket = self.bucket();
        let merged = self.merge_into(&bucket, items);
        self.persist_or_log(&bucket, &merged);
        merged
    }

    /// Move anonymous history into the signed-in identity's bucket.
    ///
    /// The global list is only removed once the merged list has been written; if that
    /// write fails both buckets keep their previous contents.
    pub fn adopt_global_history(&mut self) -> Vec<HistoryItem> {
        let bucket = self.bucket();
        if bucket == Bucket::Global {
            return self.load(&bucket);
        }
        let global = self.load(&Bucket::Global);
        if global.is_empty() {
            return self.load(&bucket);
        }
        let count = global.len();
        let merged = self.merge_into(&bucket, global);
        if let Err(err) = self.persist(&bucket, &merged) {
            log::warn!("Failed to adopt anonymous history into {bucket}: {err}");
            return self.load(&bucket);
        }
        if let Err(err) = self.store.remove(HISTORY_KEY) {
            log::warn!("Failed to clear global history after adoption: {err}");
        }
        log::info!("Moved {count} anonymous lookups into {bucket}");
        merged
    }

    fn merge_into(
        &self,
        bucket: &Bucket,
        items: impl IntoIterator<Item = HistoryItem>,
    ) -> Vec<HistoryItem> {
        let mut merged: Vec<HistoryItem> = items.into_iter().collect();
        merged.extend(self.load(bucket));
        merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut seen = HashSet::new();
        merged.retain(|item| seen.insert(dedupe_key(&item.value)));
        merged.truncate(self.config.cap);
        merged
    }

    fn load(&self, bucket: &Bucket) -> Vec<HistoryItem> {
        let mut items = match bucket {
            Bucket::Global => {
                let raw: Vec<serde_json::Value> = read_json_or_default(&self.store, HISTORY_KEY);
                decode_items(raw)
            }
            Bucket::User(identity) => load_users(&self.store)
                .remove(identity)
                .map(|record| record.history)
                .unwrap_or_default(),
        };
        items.truncate(self.config.cap);
        items
    }

    fn persist(&mut self, bucket: &Bucket, items: &[HistoryItem]) -> Result<(), StoreError> {
        match bucket {
            Bucket::Global => write_json(&mut self.store, HISTORY_KEY, items),
            Bucket::User(identity) => {
                let mut users = load_users(&self.store);
                users.entry(identity.clone()).or_default().history = items.to_vec();
                write_json(&mut self.store, USERS_KEY, &users)
            }
        }
    }

    fn persist_or_log(&mut self, bucket: &Bucket, items: &[HistoryItem]) {
        if let Err(err) = self.persist(bucket, items) {
            log::warn!("Failed to persist {bucket} history ({} items): {err}", items.len());
        }
    }
}

/// Values are compared in their normalized form.
fn dedupe_key(value: &str) -> String {
    normalize_value(value).unwrap_or_default()
}

fn same_value(a: &str, b: &str) -> bool {
    dedupe_key(a) == dedupe_key(b)
}
