use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::api::{CONTEXT_HEADER, parse_context};
use crate::notify::KeyFilter;
use crate::state::AppState;

#[derive(Deserialize)]
pub(super) struct EventParams {
    #[serde(default)]
    keys: Option<String>,
    /// Browsers cannot set headers on an `EventSource`, so the context id may
    /// also come in the query string.
    #[serde(default)]
    context: Option<String>,
}

pub(super) async fn stream_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<EventParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let header = headers.get(CONTEXT_HEADER).and_then(|v| v.to_str().ok());
    let repo = match parse_context(params.context.as_deref()).or_else(|| parse_context(header)) {
        Some(context) => state.repo.for_context(context),
        None => state.repo.new_context(),
    };
    let filter = KeyFilter::parse_list(params.keys.as_deref().unwrap_or(""));
    debug!("event stream opened for context {}", repo.context_id());

    let stream = repo.subscribe(filter).into_stream().filter_map(|change| async move {
        match Event::default().event(change.resource.as_str()).json_data(&change) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                warn!("dropping change event that failed to encode: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
