//! The content repository: single source of truth for the semester tree, the
//! user collection, the announcement and the handful of site settings.
//!
//! Every mutation follows the same shape: re-read the persisted value, apply
//! a pure transformation, write the whole result in one `set_many`, then
//! publish exactly one change event. Nothing is cached between calls, so a
//! handle never overwrites a newer write from another context with a stale
//! copy it loaded earlier. Two contexts racing on the same collection still
//! resolve as last writer wins.

pub mod announcement;
pub mod content;
pub mod defaults;
pub mod session;
pub mod settings;
pub mod users;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;
use uuid::Uuid;

use crate::blobs::BlobStore;
use crate::clock::Clock;
use crate::error::AppError;
use crate::notify::{ChangeEvent, ChangeNotifier, ContextId, KeyFilter, Resource, Subscription};
use crate::store::KeyValueStore;

pub use content::PdfSource;

#[derive(Clone)]
pub struct ContentRepository {
    store: Arc<dyn KeyValueStore>,
    notifier: ChangeNotifier,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    context: ContextId,
}

impl ContentRepository {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        notifier: ChangeNotifier,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            blobs,
            clock,
            context: Uuid::new_v4(),
        }
    }

    /// Handle for an existing context sharing this repository's store and bus.
    pub fn for_context(&self, context: ContextId) -> Self {
        Self {
            context,
            ..self.clone()
        }
    }

    pub fn new_context(&self) -> Self {
        self.for_context(Uuid::new_v4())
    }

    pub fn context_id(&self) -> ContextId {
        self.context
    }

    /// Change notifications from every other context, filtered by key.
    pub fn subscribe(&self, filter: KeyFilter) -> Subscription {
        self.notifier.subscribe(self.context, filter)
    }

    pub async fn check_storage(&self) -> Result<(), AppError> {
        self.store.get(crate::keys::SEMESTERS).await.map(|_| ())
    }

    async fn read_raw(&self, key: &str) -> Result<Option<String>, AppError> {
        self.store.get(key).await
    }

    /// Reads and decodes a JSON value. A value that no longer decodes is
    /// logged and treated as absent so the caller falls back to its default.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("ignoring unreadable value under {}: {}", key, e);
                Ok(None)
            }
        }
    }

    fn encode<T: Serialize>(key: &str, value: &T) -> Result<(String, String), AppError> {
        Ok((key.to_string(), serde_json::to_string(value)?))
    }

    /// Persists every entry atomically and then announces the change once.
    async fn commit(&self, resource: Resource, writes: Vec<(String, String)>) -> Result<(), AppError> {
        self.store.set_many(&writes).await?;
        let keys = writes.into_iter().map(|(k, _)| k).collect();
        self.publish(resource, keys);
        Ok(())
    }

    fn publish(&self, resource: Resource, keys: Vec<String>) {
        self.notifier
            .publish(ChangeEvent::new(resource, keys, self.context));
    }

    fn today(&self) -> String {
        self.clock.today_string()
    }
}

pub(crate) fn required(value: &str, what: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{} must not be empty", what)));
    }
    Ok(trimmed.to_string())
}
