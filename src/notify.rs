//! Publish/subscribe bus for "a persisted key changed" notifications.
//!
//! Every repository handle belongs to a context (a browser tab, an API
//! client). A subscription never yields events published by its own context:
//! the writer already knows about its own write.

use chrono::{DateTime, Utc};
use futures::Stream;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};
use uuid::Uuid;

pub type ContextId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Semesters,
    Users,
    Announcement,
    Session,
    Settings,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Semesters => "semesters",
            Resource::Users => "users",
            Resource::Announcement => "announcement",
            Resource::Session => "session",
            Resource::Settings => "settings",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangeEvent {
    pub resource: Resource,
    pub keys: Vec<String>,
    pub origin: ContextId,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(resource: Resource, keys: Vec<String>, origin: ContextId) -> Self {
        Self {
            resource,
            keys,
            origin,
            at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyPattern {
    Exact(String),
    Prefix(String),
}

/// Which keys a subscriber cares about. An empty filter matches everything.
///
/// A trailing `*` turns a pattern into a prefix match, so `user-name-*`
/// follows every user's display-name override.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFilter {
    patterns: Vec<KeyPattern>,
}

impl KeyFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = keys
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .map(|k| match k.strip_suffix('*') {
                Some(prefix) => KeyPattern::Prefix(prefix.to_string()),
                None => KeyPattern::Exact(k),
            })
            .collect();
        Self { patterns }
    }

    /// Parses a comma separated list, as sent in `?keys=` query strings.
    pub fn parse_list(raw: &str) -> Self {
        Self::keys(raw.split(','))
    }

    pub fn matches(&self, key: &str) -> bool {
        if self.patterns.is_empty() {
            return true;
        }
        self.patterns.iter().any(|p| match p {
            KeyPattern::Exact(k) => k == key,
            KeyPattern::Prefix(prefix) => key.starts_with(prefix.as_str()),
        })
    }

    pub fn matches_any(&self, keys: &[String]) -> bool {
        keys.iter().any(|k| self.matches(k))
    }
}

#[derive(Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: ChangeEvent) {
        let resource = event.resource;
        match self.tx.send(event) {
            Ok(receivers) => debug!("published {} change to {} receivers", resource.as_str(), receivers),
            Err(_) => debug!("no subscribers for {} change", resource.as_str()),
        }
    }

    pub fn subscribe(&self, context: ContextId, filter: KeyFilter) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            context,
            filter,
        }
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

pub struct Subscription {
    rx: broadcast::Receiver<ChangeEvent>,
    context: ContextId,
    filter: KeyFilter,
}

impl Subscription {
    fn wants(&self, event: &ChangeEvent) -> bool {
        event.origin != self.context && self.filter.matches_any(&event.keys)
    }

    /// Waits for the next relevant event. Returns `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.wants(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("subscriber for context {} lagged, skipped {} events", self.context, skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`Subscription::recv`].
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.wants(&event) => return Some(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("subscriber for context {} lagged, skipped {} events", self.context, skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = ChangeEvent> + Send + 'static {
        futures::stream::unfold(self, |mut sub| async move {
            sub.recv().await.map(|event| (event, sub))
        })
    }
}
