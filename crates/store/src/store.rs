use crate::error::{Result, StoreError};

/// Durable key → JSON text mapping scoped to one device.
///
/// Reads never fail: anything that cannot be read is reported as absent so callers
/// degrade to an empty collection. Writes may fail (quota, I/O) and the caller decides
/// whether that matters.
pub trait Store {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Removing an absent key is a no-op.
    fn remove(&mut self, key: &str) -> Result<()>;
}

impl<S: Store + ?Sized> Store for &mut S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// Keys double as file names for [`crate::FileStore`], so both backends accept the same
/// conservative alphabet.
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

pub(crate) fn check_quota(key: &str, needed: usize, limit: Option<usize>) -> Result<()> {
    match limit {
        Some(limit) if needed > limit => Err(StoreError::QuotaExceeded {
            key: key.to_string(),
            needed,
            limit,
        }),
        _ => Ok(()),
    }
}
