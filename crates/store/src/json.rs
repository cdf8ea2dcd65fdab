use crate::error::{DecodeError, Result};
use crate::store::Store;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Decode the JSON document stored under `key`. `Ok(None)` when the key was never written.
pub fn read_json<T, S>(store: &S, key: &str) -> std::result::Result<Option<T>, DecodeError>
where
    T: DeserializeOwned,
    S: Store + ?Sized,
{
    let Some(raw) = store.get(key) else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| DecodeError {
            key: key.to_string(),
            source,
        })
}

/// Like [`read_json`], but absent and corrupt documents both become `T::default()`.
pub fn read_json_or_default<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: Store + ?Sized,
{
    match read_json(store, key) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(err) => {
            log::warn!("{err}; treating as empty");
            T::default()
        }
    }
}

pub fn write_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: Store + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}
