use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

use super::{Credentials, IdentityError, IdentityProvider, Session};

/// Receiving end of a subscription: one `Option<Session>` per transition,
/// starting with the state current at subscription time.
pub type SessionChanges = mpsc::UnboundedReceiver<Option<Session>>;

#[derive(Default)]
struct TrackerState {
    current: Option<Session>,
    subscribers: Vec<mpsc::UnboundedSender<Option<Session>>>,
}

/// Observes sign-in state and notifies subscribers on every transition.
///
/// A transition is a change of user id. Replacing a session with another
/// for the same user (e.g. a fresh token) updates `current_session` but
/// does not notify.
pub struct SessionTracker {
    provider: Arc<dyn IdentityProvider>,
    state: Mutex<TrackerState>,
}

impl SessionTracker {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            state: Mutex::new(TrackerState::default()),
        }
    }

    // The lock is never held across an await, and nothing inside it can
    // panic, so a poisoned mutex still holds consistent state.
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a subscriber. The current state is delivered immediately.
    pub fn subscribe(&self) -> SessionChanges {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        // Receiver is alive in this scope, so the send cannot fail.
        let _ = tx.send(state.current.clone());
        state.subscribers.push(tx);
        rx
    }

    pub fn current_session(&self) -> Option<Session> {
        self.lock().current.clone()
    }

    pub fn current_user_id(&self) -> Option<String> {
        self.lock().current.as_ref().map(|s| s.user_id.clone())
    }

    /// Run the credential flow. Success replaces the session and notifies
    /// if the user changed.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<Session, IdentityError> {
        match self.provider.sign_in(credentials).await {
            Ok(session) => {
                tracing::info!(user_id = %session.user_id, "Signed in");
                self.transition(Some(session.clone()));
                Ok(session)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sign-in failed");
                Err(e)
            }
        }
    }

    /// The user dismissed the credential flow. Silent: no notification.
    pub fn sign_in_cancelled(&self) {
        tracing::debug!("Sign-in dismissed by user");
    }

    /// End the current session. Signing out while signed out is a no-op.
    pub async fn sign_out(&self) -> Result<(), IdentityError> {
        let Some(session) = self.current_session() else {
            tracing::debug!("Sign-out requested with no session");
            return Ok(());
        };

        self.provider.sign_out(&session).await?;
        tracing::info!(user_id = %session.user_id, "Signed out");
        self.transition(None);
        Ok(())
    }

    /// Replace the current session, notifying only if the user changed.
    fn transition(&self, next: Option<Session>) {
        let mut state = self.lock();
        let changed =
            state.current.as_ref().map(|s| &s.user_id) != next.as_ref().map(|s| &s.user_id);
        state.current = next;

        if !changed {
            return;
        }

        let current = state.current.clone();
        state
            .subscribers
            .retain(|tx| tx.send(current.clone()).is_ok());
        tracing::debug!(
            subscribers = state.subscribers.len(),
            signed_in = current.is_some(),
            "Session change delivered"
        );
    }
}
