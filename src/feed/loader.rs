use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{render, FeedError, FeedKind, FormulaCard};
use crate::app::AppEvent;
use crate::identity::Session;
use crate::records::{DocumentStore, FieldFilter};
use crate::util::catch_task_panic;

/// Run one read against the store and render the result.
///
/// This is the only suspension point of a feed load. Never retries.
pub async fn fetch_feed(
    store: &dyn DocumentStore,
    collection: &str,
    filter: &FieldFilter,
    auth: Option<&SecretString>,
    timeout: Duration,
) -> Result<Vec<FormulaCard>, FeedError> {
    let records = tokio::time::timeout(timeout, store.query(collection, filter, auth))
        .await
        .map_err(|_| FeedError::Timeout(timeout.as_secs()))??;
    Ok(render(&records))
}

#[derive(Default)]
struct Slot {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

/// Spawns feed reads and keeps the latest one per feed authoritative.
///
/// Each feed kind has a generation counter. Starting a load bumps it and
/// aborts whatever was in flight for that kind, so a result is applied only
/// if `is_current` still holds when it arrives.
pub struct FeedLoader {
    store: Arc<dyn DocumentStore>,
    collection: Arc<str>,
    timeout: Duration,
    slots: [Slot; 2],
}

impl FeedLoader {
    pub fn new(store: Arc<dyn DocumentStore>, collection: &str, timeout: Duration) -> Self {
        Self {
            store,
            collection: Arc::from(collection),
            timeout,
            slots: Default::default(),
        }
    }

    /// Start loading `kind`. Refuses `My` without a session before spawning
    /// anything.
    ///
    /// Returns the generation the result will carry.
    pub fn start(
        &mut self,
        kind: FeedKind,
        session: Option<&Session>,
        tx: mpsc::Sender<AppEvent>,
    ) -> Result<u64, FeedError> {
        let filter = kind.filter(session.map(|s| s.user_id.as_str()))?;
        // Home is public; only the owner's feed carries a token.
        let auth = match kind {
            FeedKind::Home => None,
            FeedKind::My => session.map(|s| Arc::clone(&s.id_token)),
        };

        let slot = &mut self.slots[kind.index()];
        if let Some(handle) = slot.handle.take() {
            handle.abort();
            tracing::debug!(feed = kind.id(), "Aborted superseded feed load");
        }
        slot.generation += 1;
        let generation = slot.generation;

        let store = Arc::clone(&self.store);
        let collection = Arc::clone(&self.collection);
        let timeout = self.timeout;

        tracing::debug!(feed = kind.id(), generation, filter = %filter, "Starting feed load");
        slot.handle = Some(tokio::spawn(async move {
            let read = fetch_feed(
                store.as_ref(),
                &collection,
                &filter,
                auth.as_deref(),
                timeout,
            );
            let result = match catch_task_panic(read).await {
                Ok(result) => result,
                Err(msg) => {
                    tracing::error!(feed = kind.id(), error = %msg, "Feed load panicked");
                    Err(FeedError::Panicked(msg))
                }
            };

            if let Err(e) = tx
                .send(AppEvent::FeedLoaded {
                    kind,
                    generation,
                    result,
                })
                .await
            {
                tracing::warn!(error = %e, event = "FeedLoaded", "Channel send failed (receiver dropped)");
            }
        }));

        Ok(generation)
    }

    /// Whether a result for `generation` should still reach the container.
    pub fn is_current(&self, kind: FeedKind, generation: u64) -> bool {
        self.slots[kind.index()].generation == generation
    }

    /// Forget `kind`'s in-flight load. Any result still on its way is stale.
    pub fn cancel(&mut self, kind: FeedKind) {
        let slot = &mut self.slots[kind.index()];
        slot.generation += 1;
        if let Some(handle) = slot.handle.take() {
            handle.abort();
            tracing::debug!(feed = kind.id(), "Cancelled feed load");
        }
    }

    /// Drop the handle of a load that has delivered its result.
    pub fn finish(&mut self, kind: FeedKind, generation: u64) {
        if self.is_current(kind, generation) {
            self.slots[kind.index()].handle = None;
        }
    }

    pub fn is_loading(&self, kind: FeedKind) -> bool {
        self.slots[kind.index()]
            .handle
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for FeedLoader {
    fn drop(&mut self) {
        for kind in FeedKind::ALL {
            if let Some(handle) = self.slots[kind.index()].handle.take() {
                handle.abort();
            }
        }
    }
}
