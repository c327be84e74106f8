use crate::feed::{FeedError, FeedKind, FeedLoader, FormulaCard};
use crate::identity::{Credentials, Session, SessionChanges, SessionTracker};
use crate::records::DocumentStore;
use crate::theme::{StyleMap, ThemeStore, ThemeVariant};
use crate::util::catch_task_panic;
use ratatui::style::Style;
use secrecy::SecretString;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Text of the blocking notice shown when My is opened signed out.
pub const SIGN_IN_REQUIRED: &str = "Sign in required";

/// How long a status message stays up.
const STATUS_TTL: Duration = Duration::from_secs(3);

// ============================================================================
// Pages
// ============================================================================

/// Top-level views. Exactly one is visible unless navigation targeted an
/// unknown id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    My,
    Settings,
    About,
}

impl Page {
    /// Drawer order.
    pub const ALL: [Page; 4] = [Page::Home, Page::My, Page::Settings, Page::About];

    pub fn id(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::My => "my",
            Self::Settings => "settings",
            Self::About => "about",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Home => "Public formulas",
            Self::My => "My formulas",
            Self::Settings => "Settings",
            Self::About => "About",
        }
    }

    /// The feed shown on this page, if any.
    pub fn feed(self) -> Option<FeedKind> {
        match self {
            Self::Home => Some(FeedKind::Home),
            Self::My => Some(FeedKind::My),
            Self::Settings | Self::About => None,
        }
    }
}

// ============================================================================
// View State
// ============================================================================

/// Everything the render pass needs to know about navigation and chrome.
///
/// `overlay_visible` always equals `drawer_open`; both change together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    /// `None` after navigating to an unknown page id.
    pub active_page: Option<Page>,
    pub drawer_open: bool,
    pub overlay_visible: bool,
    pub theme_dark: bool,
}

/// Display target for one feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FeedContainer {
    /// Never loaded, or cleared on identity change.
    #[default]
    Untouched,
    Loading,
    Empty,
    Failed(String),
    Cards(Vec<FormulaCard>),
}

impl FeedContainer {
    pub fn cards(&self) -> &[FormulaCard] {
        match self {
            Self::Cards(cards) => cards,
            _ => &[],
        }
    }
}

// ============================================================================
// Sign-in Dialog
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInStage {
    Email,
    Password,
    /// Credentials sent; waiting for the identity collaborator.
    Submitting,
}

/// Terminal stand-in for the interactive credential popup.
pub struct SignInDialog {
    pub stage: SignInStage,
    pub email: String,
    pub password: String,
}

impl SignInDialog {
    fn new() -> Self {
        Self {
            stage: SignInStage::Email,
            email: String::new(),
            password: String::new(),
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// Events from background tasks
pub enum AppEvent {
    /// A feed read settled.
    ///
    /// Fields:
    /// - `kind`: Which feed was loaded
    /// - `generation`: The generation counter when this load was spawned
    /// - `result`: Rendered cards, or why the read failed
    FeedLoaded {
        kind: FeedKind,
        generation: u64,
        result: Result<Vec<FormulaCard>, FeedError>,
    },
    /// The session tracker reported a transition (or the initial state).
    SessionChanged(Option<Session>),
    /// The credential flow finished. Success arrives separately as
    /// `SessionChanged`; this only carries the error text for display.
    SignInFinished(Result<(), String>),
    SignOutFinished(Result<(), String>),
    /// A background task panicked.
    TaskPanicked { task: &'static str, error: String },
}

/// Relay tracker notifications into the event channel.
pub fn forward_session_changes(
    mut changes: SessionChanges,
    tx: mpsc::Sender<AppEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(session) = changes.recv().await {
            if tx.send(AppEvent::SessionChanged(session)).await.is_err() {
                tracing::debug!("Event channel closed, stopping session forwarder");
                break;
            }
        }
    })
}

// ============================================================================
// Application State
// ============================================================================

/// Collaborators the controller drives.
pub struct AppContext {
    pub store: Arc<dyn DocumentStore>,
    pub tracker: Arc<SessionTracker>,
    pub theme_store: ThemeStore,
    pub collection: String,
    pub request_timeout: Duration,
}

/// Central application state: the view controller.
pub struct App {
    pub view: ViewState,

    // Theme
    pub theme_variant: ThemeVariant,
    /// Active style map for all UI rendering.
    pub theme: StyleMap,

    // Data
    pub home: FeedContainer,
    pub my: FeedContainer,
    pub session: Option<Session>,

    // UI State
    pub selected_card: usize,
    pub drawer_cursor: usize,
    /// Blocking notice; dismissed by any key.
    pub notice: Option<&'static str>,
    pub sign_in: Option<SignInDialog>,
    /// Whether the help overlay is currently displayed.
    pub show_help: bool,
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub needs_redraw: bool,
    pub spinner_frame: usize,

    tracker: Arc<SessionTracker>,
    loader: FeedLoader,
    theme_store: ThemeStore,
    event_tx: mpsc::Sender<AppEvent>,
    sign_in_handle: Option<JoinHandle<()>>,
}

impl App {
    /// Nothing is loaded until the first session notification arrives,
    /// which navigates to home.
    pub fn new(ctx: AppContext, theme_dark: bool, event_tx: mpsc::Sender<AppEvent>) -> Self {
        let variant = ThemeVariant::from_dark(theme_dark);
        Self {
            view: ViewState {
                active_page: Some(Page::Home),
                drawer_open: false,
                overlay_visible: false,
                theme_dark,
            },
            theme_variant: variant,
            theme: StyleMap::from_palette(&variant.palette()),
            home: FeedContainer::Untouched,
            my: FeedContainer::Untouched,
            session: None,
            selected_card: 0,
            drawer_cursor: 0,
            notice: None,
            sign_in: None,
            show_help: false,
            status_message: None,
            needs_redraw: true,
            spinner_frame: 0,
            loader: FeedLoader::new(ctx.store, &ctx.collection, ctx.request_timeout),
            tracker: ctx.tracker,
            theme_store: ctx.theme_store,
            event_tx,
            sign_in_handle: None,
        }
    }

    /// Resolve a semantic role name to its `Style`.
    pub fn style(&self, role: &str) -> Style {
        self.theme.resolve(role)
    }

    pub fn container(&self, kind: FeedKind) -> &FeedContainer {
        match kind {
            FeedKind::Home => &self.home,
            FeedKind::My => &self.my,
        }
    }

    fn container_mut(&mut self, kind: FeedKind) -> &mut FeedContainer {
        match kind {
            FeedKind::Home => &mut self.home,
            FeedKind::My => &mut self.my,
        }
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Show `page_id` and nothing else, closing the drawer.
    ///
    /// Home always reloads. My reloads with a session and raises the
    /// sign-in notice without one, leaving its container alone. An unknown
    /// id blanks the view.
    pub fn set_active_page(&mut self, page_id: &str) {
        self.close_drawer();
        self.selected_card = 0;
        self.needs_redraw = true;

        let page = Page::from_id(page_id);
        self.view.active_page = page;

        match page {
            None => tracing::warn!(page = %page_id, "Navigation to unknown page"),
            Some(Page::Home) => self.load_feed(FeedKind::Home),
            Some(Page::My) if self.session.is_some() => self.load_feed(FeedKind::My),
            Some(Page::My) => {
                tracing::debug!("My formulas requested while signed out");
                self.notice = Some(SIGN_IN_REQUIRED);
            }
            Some(Page::Settings | Page::About) => {}
        }
    }

    pub fn navigate(&mut self, page: Page) {
        self.set_active_page(page.id());
    }

    /// Mark the container loading and spawn the read.
    ///
    /// The tracker holds the freshest token; a same-user re-sign-in updates
    /// it there without a change notification.
    fn load_feed(&mut self, kind: FeedKind) {
        let session = self.tracker.current_session();
        match self
            .loader
            .start(kind, session.as_ref(), self.event_tx.clone())
        {
            Ok(generation) => {
                tracing::debug!(feed = kind.id(), generation, "Feed load started");
                *self.container_mut(kind) = FeedContainer::Loading;
            }
            Err(FeedError::Unauthenticated) => {
                self.notice = Some(SIGN_IN_REQUIRED);
            }
            Err(e) => {
                tracing::error!(feed = kind.id(), error = %e, "Feed load could not start");
                *self.container_mut(kind) = FeedContainer::Failed(e.to_string());
            }
        }
    }

    /// Re-navigate to the active page. The manual retry path.
    pub fn reload(&mut self) {
        match self.view.active_page {
            Some(page) => self.navigate(page),
            None => self.set_status("Nothing to reload"),
        }
    }

    /// Apply a settled feed read, unless a newer load superseded it.
    pub fn on_feed_loaded(
        &mut self,
        kind: FeedKind,
        generation: u64,
        result: Result<Vec<FormulaCard>, FeedError>,
    ) {
        if !self.loader.is_current(kind, generation) {
            tracing::debug!(feed = kind.id(), generation, "Dropping stale feed result");
            return;
        }
        self.loader.finish(kind, generation);

        let next = match result {
            Ok(cards) if cards.is_empty() => FeedContainer::Empty,
            Ok(cards) => {
                tracing::info!(feed = kind.id(), count = cards.len(), "Feed loaded");
                FeedContainer::Cards(cards)
            }
            Err(e) => {
                tracing::error!(feed = kind.id(), error = %e, "Feed load failed");
                FeedContainer::Failed(e.to_string())
            }
        };
        *self.container_mut(kind) = next;
        self.clamp_selection();
        self.needs_redraw = true;
    }

    /// Identity changed: forget the old user's feed and start over at home.
    pub fn on_session_changed(&mut self, session: Option<Session>) {
        tracing::info!(
            signed_in = session.is_some(),
            "Session changed, resetting to home"
        );
        if session.is_some() && self.notice == Some(SIGN_IN_REQUIRED) {
            self.notice = None;
        }
        self.session = session;
        self.loader.cancel(FeedKind::My);
        self.my = FeedContainer::Untouched;
        self.navigate(Page::Home);
    }

    pub fn is_loading(&self, kind: FeedKind) -> bool {
        self.loader.is_loading(kind)
    }

    // ------------------------------------------------------------------------
    // Drawer
    // ------------------------------------------------------------------------

    pub fn open_drawer(&mut self) {
        self.view.drawer_open = true;
        self.view.overlay_visible = true;
        self.drawer_cursor = self
            .view
            .active_page
            .and_then(|active| Page::ALL.iter().position(|p| *p == active))
            .unwrap_or(0);
        self.needs_redraw = true;
    }

    pub fn close_drawer(&mut self) {
        self.view.drawer_open = false;
        self.view.overlay_visible = false;
        self.needs_redraw = true;
    }

    pub fn drawer_next(&mut self) {
        self.drawer_cursor = (self.drawer_cursor + 1).min(Page::ALL.len() - 1);
    }

    pub fn drawer_prev(&mut self) {
        self.drawer_cursor = self.drawer_cursor.saturating_sub(1);
    }

    /// Navigate to the page under the drawer cursor.
    pub fn drawer_activate(&mut self) {
        let page = Page::ALL[self.drawer_cursor.min(Page::ALL.len() - 1)];
        self.navigate(page);
    }

    // ------------------------------------------------------------------------
    // Cards
    // ------------------------------------------------------------------------

    /// Cards of the feed on the active page.
    pub fn visible_cards(&self) -> &[FormulaCard] {
        self.view
            .active_page
            .and_then(Page::feed)
            .map(|kind| self.container(kind).cards())
            .unwrap_or(&[])
    }

    pub fn select_next(&mut self) {
        let len = self.visible_cards().len();
        if len > 0 {
            self.selected_card = (self.selected_card + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected_card = self.selected_card.saturating_sub(1);
    }

    pub fn clamp_selection(&mut self) {
        let len = self.visible_cards().len();
        self.selected_card = self.selected_card.min(len.saturating_sub(1));
    }

    // ------------------------------------------------------------------------
    // Theme
    // ------------------------------------------------------------------------

    /// Apply and persist the theme.
    pub async fn set_theme(&mut self, is_dark: bool) {
        let variant = ThemeVariant::from_dark(is_dark);
        self.view.theme_dark = is_dark;
        self.theme_variant = variant;
        self.theme = StyleMap::from_palette(&variant.palette());
        self.needs_redraw = true;
        self.theme_store.set_theme(is_dark).await;
    }

    /// Flip dark mode. Returns the new theme's name for status display.
    pub async fn toggle_theme(&mut self) -> &'static str {
        let next = !self.view.theme_dark;
        self.set_theme(next).await;
        self.theme_variant.name()
    }

    // ------------------------------------------------------------------------
    // Account
    // ------------------------------------------------------------------------

    pub fn avatar_url(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|s| s.display_avatar_url.as_deref())
    }

    /// Header label for the signed-in user.
    pub fn account_label(&self) -> Option<&str> {
        self.session
            .as_ref()
            .map(|s| s.email.as_deref().unwrap_or(&s.user_id))
    }

    pub fn sign_in_visible(&self) -> bool {
        self.session.is_none()
    }

    pub fn sign_out_visible(&self) -> bool {
        self.session.is_some()
    }

    /// Open the credential dialog. No-op when already signed in.
    pub fn begin_sign_in(&mut self) {
        if self.session.is_some() || self.sign_in.is_some() {
            return;
        }
        self.sign_in = Some(SignInDialog::new());
        self.needs_redraw = true;
    }

    /// Send the dialog's credentials to the tracker in the background.
    pub fn submit_sign_in(&mut self) {
        let Some(dialog) = self.sign_in.as_mut() else {
            return;
        };
        dialog.stage = SignInStage::Submitting;
        let credentials = Credentials {
            email: dialog.email.trim().to_string(),
            password: SecretString::from(std::mem::take(&mut dialog.password)),
        };

        let tracker = Arc::clone(&self.tracker);
        let tx = self.event_tx.clone();
        if let Some(previous) = self.sign_in_handle.take() {
            previous.abort();
        }
        self.sign_in_handle = Some(tokio::spawn(async move {
            let event = match catch_task_panic(tracker.sign_in(credentials)).await {
                Ok(result) => AppEvent::SignInFinished(result.map(|_| ()).map_err(|e| e.to_string())),
                Err(error) => AppEvent::TaskPanicked {
                    task: "sign_in",
                    error,
                },
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, event = "SignInFinished", "Channel send failed (receiver dropped)");
            }
        }));
        self.needs_redraw = true;
    }

    /// The user dismissed the dialog. Silent by contract.
    pub fn cancel_sign_in(&mut self) {
        if let Some(handle) = self.sign_in_handle.take() {
            handle.abort();
        }
        if self.sign_in.take().is_some() {
            self.tracker.sign_in_cancelled();
        }
        self.needs_redraw = true;
    }

    pub fn on_sign_in_finished(&mut self, result: Result<(), String>) {
        self.sign_in_handle = None;
        self.sign_in = None;
        if let Err(e) = result {
            self.set_status(format!("Sign-in failed: {}", e));
        }
        self.needs_redraw = true;
    }

    pub fn sign_out(&mut self) {
        if self.session.is_none() {
            return;
        }
        let tracker = Arc::clone(&self.tracker);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let event = match catch_task_panic(tracker.sign_out()).await {
                Ok(result) => AppEvent::SignOutFinished(result.map_err(|e| e.to_string())),
                Err(error) => AppEvent::TaskPanicked {
                    task: "sign_out",
                    error,
                },
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, event = "SignOutFinished", "Channel send failed (receiver dropped)");
            }
        });
    }

    pub fn on_sign_out_finished(&mut self, result: Result<(), String>) {
        match result {
            Ok(()) => self.set_status("Signed out"),
            Err(e) => self.set_status(format!("Sign-out failed: {}", e)),
        }
    }

    // ------------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------------

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
        self.needs_redraw = true;
    }

    /// Clear status message if expired.
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() >= STATUS_TTL {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
        self.needs_redraw = true;
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(handle) = self.sign_in_handle.take() {
            handle.abort();
            tracing::debug!("Aborted sign-in task on App drop");
        }
    }
}
