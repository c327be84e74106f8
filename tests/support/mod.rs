//! Fake collaborators and event pumping shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use formulary::app::{App, AppContext, AppEvent, FeedContainer};
use formulary::feed::FeedKind;
use formulary::identity::{Credentials, IdentityError, IdentityProvider, Session, SessionTracker};
use formulary::records::{DocumentStore, FieldFilter, FormulaRecord, StoreError};
use formulary::storage::Database;
use formulary::theme::ThemeStore;
use formulary::ui::handle_app_event;

/// What the fake store answers for one filter field.
#[derive(Clone)]
pub enum Reply {
    Records(Vec<FormulaRecord>),
    Deny,
}

/// Document store answering per filter field (`public` or `uid`), logging
/// every call.
#[derive(Default)]
pub struct FakeStore {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<(FieldFilter, bool)>>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, field: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .insert(field.to_string(), reply);
    }

    /// Every filter queried so far, with whether a token was attached.
    pub fn calls(&self) -> Vec<(FieldFilter, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn query(
        &self,
        _collection: &str,
        filter: &FieldFilter,
        auth: Option<&SecretString>,
    ) -> Result<Vec<FormulaRecord>, StoreError> {
        self.calls
            .lock()
            .unwrap()
            .push((filter.clone(), auth.is_some()));
        let reply = self.replies.lock().unwrap().get(&filter.field).cloned();
        match reply {
            Some(Reply::Records(records)) => Ok(records),
            Some(Reply::Deny) => Err(StoreError::PermissionDenied),
            None => Ok(Vec::new()),
        }
    }
}

/// Accepts any password and signs in as the local part of the email.
pub struct FakeIdentity;

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_in(&self, credentials: Credentials) -> Result<Session, IdentityError> {
        let user = credentials
            .email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string();
        let mut session = Session::new(user, SecretString::from("tok"));
        session.email = Some(credentials.email);
        Ok(session)
    }

    async fn sign_out(&self, _session: &Session) -> Result<(), IdentityError> {
        Ok(())
    }
}

pub fn record(id: &str, name: &str, concentration: &str, uid: &str, public: bool) -> FormulaRecord {
    FormulaRecord {
        id: id.to_string(),
        name: Some(name.to_string()),
        concentration: Some(concentration.to_string()),
        public,
        uid: uid.to_string(),
        updated: None,
    }
}

pub fn credentials(email: &str) -> Credentials {
    Credentials {
        email: email.to_string(),
        password: SecretString::from("pw"),
    }
}

pub struct Harness {
    pub app: App,
    pub rx: mpsc::Receiver<AppEvent>,
    pub tx: mpsc::Sender<AppEvent>,
    pub store: Arc<FakeStore>,
    pub tracker: Arc<SessionTracker>,
    pub db: Database,
}

pub async fn harness_with_db(db: Database) -> Harness {
    let store = FakeStore::new();
    let tracker = Arc::new(SessionTracker::new(Arc::new(FakeIdentity)));
    let theme_store = ThemeStore::new(Arc::new(db.clone()));
    let theme_dark = theme_store.load_theme().await;
    let (tx, rx) = mpsc::channel(32);

    let ctx = AppContext {
        store: store.clone(),
        tracker: Arc::clone(&tracker),
        theme_store,
        collection: "formulas".to_string(),
        request_timeout: Duration::from_secs(5),
    };
    let app = App::new(ctx, theme_dark, tx.clone());

    Harness {
        app,
        rx,
        tx,
        store,
        tracker,
        db,
    }
}

pub async fn harness() -> Harness {
    harness_with_db(Database::open(":memory:").await.unwrap()).await
}

impl Harness {
    /// Receive and apply the next background event.
    pub async fn pump_one(&mut self) {
        let event = tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("event channel closed");
        handle_app_event(&mut self.app, event);
    }

    /// Pump until `kind`'s container has settled.
    pub async fn settle(&mut self, kind: FeedKind) {
        while *self.app.container(kind) == FeedContainer::Loading {
            self.pump_one().await;
        }
    }

    pub async fn sign_in_as(&mut self, user: &str) {
        let session = self
            .tracker
            .sign_in(credentials(&format!("{}@example.com", user)))
            .await
            .unwrap();
        self.app.on_session_changed(Some(session));
        self.settle(FeedKind::Home).await;
    }
}
