use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::AppError;
use crate::store::KeyValueStore;

/// In-process store with an optional byte quota, mirroring how browser
/// storage behaves when it fills up or is switched off.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
    disabled: bool,
}

impl Inner {
    fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.disabled {
            return Err(AppError::StorageUnavailable("storage is disabled".to_string()));
        }
        Ok(())
    }

    fn check_quota(&self, writes: &[(String, String)], removals: &[String]) -> Result<(), AppError> {
        let Some(quota) = self.quota else {
            return Ok(());
        };

        let mut projected = self.entries.clone();
        for key in removals {
            projected.remove(key);
        }
        for (key, value) in writes {
            projected.insert(key.clone(), value.clone());
        }
        let needed: usize = projected.iter().map(|(k, v)| k.len() + v.len()).sum();
        if needed > quota {
            return Err(AppError::StorageUnavailable(format!(
                "quota exceeded: {} of {} bytes",
                needed, quota
            )));
        }
        Ok(())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(bytes: usize) -> Self {
        let store = Self::default();
        if let Ok(mut inner) = store.inner.lock() {
            inner.quota = Some(bytes);
        }
        store
    }

    /// Makes every subsequent operation fail until re-enabled.
    pub fn disable(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.disabled = true;
        }
    }

    pub fn enable(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.disabled = false;
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.inner.lock().map(|inner| inner.used_bytes()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, AppError> {
        self.inner
            .lock()
            .map_err(|_| AppError::StorageUnavailable("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let inner = self.lock()?;
        inner.check_available()?;
        Ok(inner.entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.set_many(&[(key.to_string(), value.to_string())]).await
    }

    async fn remove(&self, key: &str) -> Result<bool, AppError> {
        let mut inner = self.lock()?;
        inner.check_available()?;
        Ok(inner.entries.remove(key).is_some())
    }

    async fn apply(&self, writes: &[(String, String)], removals: &[String]) -> Result<(), AppError> {
        let mut inner = self.lock()?;
        inner.check_available()?;
        inner.check_quota(writes, removals)?;
        for key in removals {
            inner.entries.remove(key);
        }
        for (key, value) in writes {
            inner.entries.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_quota_rejects_whole_batch() {
        let store = MemoryStore::with_quota(32);
        store.set("a", "1").await.unwrap();

        let result = store
            .set_many(&[
                ("b".to_string(), "2".to_string()),
                ("c".to_string(), "x".repeat(64)),
            ])
            .await;

        assert!(matches!(result, Err(AppError::StorageUnavailable(_))));
        assert_eq!(store.get("b").await.unwrap(), None);
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_overwrite_counts_replaced_value_once() {
        let store = MemoryStore::with_quota(10);
        store.set("k", "12345678").await.unwrap();
        store.set("k", "87654321").await.unwrap();
        assert_eq!(store.used_bytes(), 9);
    }

    #[tokio::test]
    async fn test_removals_free_quota_in_the_same_batch() {
        let store = MemoryStore::with_quota(24);
        store.set("old", "x".repeat(16).as_str()).await.unwrap();

        store
            .apply(&[("new".to_string(), "y".repeat(16))], &["old".to_string()])
            .await
            .unwrap();

        assert_eq!(store.get("old").await.unwrap(), None);
        assert_eq!(store.used_bytes(), 19);
    }

    #[tokio::test]
    async fn test_disabled_store_fails() {
        let store = MemoryStore::new();
        store.set("font", "Inter").await.unwrap();
        store.disable();

        assert!(matches!(store.get("font").await, Err(AppError::StorageUnavailable(_))));
        assert!(matches!(store.set("font", "x").await, Err(AppError::StorageUnavailable(_))));

        store.enable();
        assert_eq!(store.get("font").await.unwrap().as_deref(), Some("Inter"));
    }
}
