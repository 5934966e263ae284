pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::AppError;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// String-keyed durable storage shared by every context.
///
/// Implementations must make `apply` all-or-nothing: either every write and
/// removal lands or the store is left exactly as it was.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    async fn remove(&self, key: &str) -> Result<bool, AppError>;
    async fn apply(&self, writes: &[(String, String)], removals: &[String]) -> Result<(), AppError>;

    async fn set_many(&self, entries: &[(String, String)]) -> Result<(), AppError> {
        self.apply(entries, &[]).await
    }
}
