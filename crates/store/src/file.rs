use crate::error::Result;
use crate::store::{check_quota, validate_key, Store};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const ENTRY_EXTENSION: &str = "json";

/// One JSON document per key under a data directory.
///
/// Writes land in `<key>.json.tmp` first and are renamed into place, so a reader never
/// observes a half-written document.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota: Option<usize>,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        log::debug!("Opened FileStore at {}", dir.display());
        Ok(Self { dir, quota: None })
    }

    pub fn with_quota(mut self, limit: usize) -> Self {
        self.quota = Some(limit);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{ENTRY_EXTENSION}")))
    }

    fn used_bytes_excluding(&self, path: &Path) -> Result<usize> {
        let mut total = 0usize;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let entry_path = entry.path();
            if entry_path == path
                || entry_path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION)
            {
                continue;
            }
            let len = entry.metadata()?.len();
            total = total.saturating_add(usize::try_from(len).unwrap_or(usize::MAX));
        }
        Ok(total)
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = match self.path_for(key) {
            Ok(path) => path,
            Err(err) => {
                log::warn!("Store read skipped: {err}");
                return None;
            }
        };
        match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                log::warn!("Failed to read {}: {err}", path.display());
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if self.quota.is_some() {
            let needed = self.used_bytes_excluding(&path)? + value.len();
            check_quota(key, needed, self.quota)?;
        }
        let tmp = path.with_extension(format!("{ENTRY_EXTENSION}.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        log::debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreError;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn survives_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let mut store = FileStore::open(temp.path()).unwrap();
            store.set("vin_diesel_theme", "\"dark\"").unwrap();
        }
        let store = FileStore::open(temp.path()).unwrap();
        assert_eq!(store.get("vin_diesel_theme").as_deref(), Some("\"dark\""));
        assert!(temp.path().join("vin_diesel_theme.json").exists());
        assert!(!temp.path().join("vin_diesel_theme.json.tmp").exists());
    }

    #[test]
    fn missing_key_is_absent() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path().join("nested/dir")).unwrap();
        assert_eq!(store.get("nothing"), None);
    }

    #[test]
    fn invalid_key_reads_as_absent_and_fails_writes() {
        let temp = TempDir::new().unwrap();
        let mut store = FileStore::open(temp.path()).unwrap();
        assert_eq!(store.get("../etc/passwd"), None);
        assert!(matches!(
            store.set("../x", "1"),
            Err(StoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn remove_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let mut store = FileStore::open(temp.path()).unwrap();
        store.set("k", "1").unwrap();
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn quota_rejects_oversized_write_and_keeps_previous_value() {
        let temp = TempDir::new().unwrap();
        let mut store = FileStore::open(temp.path()).unwrap().with_quota(16);
        store.set("a", "0123456789").unwrap();
        store.set("b", "abcdef").unwrap();
        let err = store.set("b", "abcdefg").unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { needed: 17, limit: 16, .. }));
        assert_eq!(store.get("b").as_deref(), Some("abcdef"));
    }
}
