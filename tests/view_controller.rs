//! Integration tests for the view controller: navigation, feed loading,
//! identity changes and theme persistence, driven through fake
//! collaborators.

mod support;

use pretty_assertions::assert_eq;
use std::sync::Arc;

use formulary::app::{forward_session_changes, FeedContainer, Page, SIGN_IN_REQUIRED};
use formulary::feed::FeedKind;
use formulary::records::FieldFilter;
use formulary::storage::Database;
use formulary::theme::{ThemeStore, THEME_PREF_KEY};

use support::{harness, harness_with_db, record, Reply};

// ============================================================================
// Navigation
// ============================================================================

#[tokio::test]
async fn test_my_without_session_shows_notice_and_leaves_container() {
    let mut h = harness().await;

    h.app.set_active_page("my");

    assert_eq!(h.app.notice, Some(SIGN_IN_REQUIRED));
    assert_eq!(h.app.view.active_page, Some(Page::My));
    assert_eq!(h.app.my, FeedContainer::Untouched);
    assert!(!h.app.is_loading(FeedKind::My));
    assert!(h.store.calls().is_empty());
}

#[tokio::test]
async fn test_home_filter_is_public_regardless_of_session() {
    let mut h = harness().await;

    h.app.set_active_page("home");
    h.settle(FeedKind::Home).await;
    h.sign_in_as("u1").await;

    let calls = h.store.calls();
    assert_eq!(calls.len(), 2);
    for (filter, authed) in calls {
        assert_eq!(filter, FieldFilter::public_only());
        assert!(!authed);
    }
}

#[tokio::test]
async fn test_home_twice_equals_once_and_closes_drawer() {
    let mut h = harness().await;
    h.store.reply(
        "public",
        Reply::Records(vec![record("a", "Rose", "EDT", "u2", true)]),
    );

    h.app.open_drawer();
    h.app.set_active_page("home");
    h.settle(FeedKind::Home).await;
    let view_once = h.app.view.clone();
    let home_once = h.app.home.clone();

    h.app.open_drawer();
    h.app.set_active_page("home");
    h.settle(FeedKind::Home).await;

    assert_eq!(h.app.view, view_once);
    assert_eq!(h.app.home, home_once);
    assert!(!h.app.view.drawer_open);
    assert!(!h.app.view.overlay_visible);
}

#[tokio::test]
async fn test_unknown_page_is_blank_and_reload_is_noop() {
    let mut h = harness().await;

    h.app.set_active_page("formulas-v2");
    assert_eq!(h.app.view.active_page, None);
    assert!(h.app.visible_cards().is_empty());

    h.app.reload();
    assert_eq!(h.app.view.active_page, None);
    assert!(h.store.calls().is_empty());
}

#[tokio::test]
async fn test_static_pages_do_not_load() {
    let mut h = harness().await;
    h.app.navigate(Page::Settings);
    h.app.navigate(Page::About);
    assert_eq!(h.app.view.active_page, Some(Page::About));
    assert!(h.store.calls().is_empty());
}

// ============================================================================
// Feed Results
// ============================================================================

#[tokio::test]
async fn test_my_feed_renders_cards_with_defaults() {
    let mut h = harness().await;
    h.store.reply(
        "uid",
        Reply::Records(vec![
            record("a", "Rose", "EDT", "u1", false),
            record("b", "", "", "u1", false),
        ]),
    );
    h.sign_in_as("u1").await;

    h.app.set_active_page("my");
    assert_eq!(h.app.my, FeedContainer::Loading);
    h.settle(FeedKind::My).await;

    let shown: Vec<(String, String)> = h
        .app
        .my
        .cards()
        .iter()
        .map(|c| (c.name.clone(), c.concentration.clone()))
        .collect();
    assert_eq!(
        shown,
        vec![
            ("Rose".to_string(), "EDT".to_string()),
            ("Untitled".to_string(), "EDP".to_string()),
        ]
    );

    let (filter, authed) = h.store.calls().last().cloned().unwrap();
    assert_eq!(filter, FieldFilter::owned_by("u1"));
    assert!(authed);
}

#[tokio::test]
async fn test_error_replaces_previous_cards() {
    let mut h = harness().await;
    h.store.reply(
        "public",
        Reply::Records(vec![record("a", "Rose", "EDT", "u2", true)]),
    );
    h.app.set_active_page("home");
    h.settle(FeedKind::Home).await;
    assert_eq!(h.app.home.cards().len(), 1);

    h.store.reply("public", Reply::Deny);
    h.app.reload();
    h.settle(FeedKind::Home).await;

    assert!(matches!(h.app.home, FeedContainer::Failed(_)));
    assert!(h.app.home.cards().is_empty());
    assert!(h.app.visible_cards().is_empty());
}

#[tokio::test]
async fn test_empty_result_is_distinct_from_error_and_cards() {
    let mut h = harness().await;
    h.store.reply("public", Reply::Records(Vec::new()));

    h.app.set_active_page("home");
    h.settle(FeedKind::Home).await;

    assert_eq!(h.app.home, FeedContainer::Empty);
    assert!(h.app.home.cards().is_empty());
}

#[tokio::test]
async fn test_failed_read_is_not_retried() {
    let mut h = harness().await;
    h.store.reply("public", Reply::Deny);

    h.app.set_active_page("home");
    h.settle(FeedKind::Home).await;

    assert!(matches!(h.app.home, FeedContainer::Failed(_)));
    assert_eq!(h.store.calls().len(), 1);
}

// ============================================================================
// Identity Changes
// ============================================================================

#[tokio::test]
async fn test_sign_in_resets_to_home_and_reloads() {
    let mut h = harness().await;
    let _forwarder = forward_session_changes(h.tracker.subscribe(), h.tx.clone());

    // Initial notification: signed out.
    h.pump_one().await;
    assert!(h.app.session.is_none());
    h.settle(FeedKind::Home).await;

    h.app.navigate(Page::Settings);
    let before = h.store.calls().len();

    h.tracker
        .sign_in(support::credentials("u1@example.com"))
        .await
        .unwrap();
    h.pump_one().await;

    assert_eq!(h.app.session.as_ref().map(|s| s.user_id.as_str()), Some("u1"));
    assert_eq!(h.app.view.active_page, Some(Page::Home));
    assert_eq!(h.app.home, FeedContainer::Loading);
    h.settle(FeedKind::Home).await;
    assert_eq!(h.store.calls().len(), before + 1);
}

#[tokio::test]
async fn test_sign_out_clears_my_feed() {
    let mut h = harness().await;
    h.store.reply(
        "uid",
        Reply::Records(vec![record("a", "Rose", "EDT", "u1", false)]),
    );
    h.sign_in_as("u1").await;
    h.app.navigate(Page::My);
    h.settle(FeedKind::My).await;
    assert_eq!(h.app.my.cards().len(), 1);

    h.tracker.sign_out().await.unwrap();
    h.app.on_session_changed(h.tracker.current_session());

    assert_eq!(h.app.my, FeedContainer::Untouched);
    assert_eq!(h.app.view.active_page, Some(Page::Home));
    assert!(h.app.sign_in_visible());
}

#[tokio::test]
async fn test_identity_change_drops_in_flight_my_result() {
    let mut h = harness().await;
    h.store.reply(
        "uid",
        Reply::Records(vec![record("a", "Private", "EDP", "u1", false)]),
    );
    h.sign_in_as("u1").await;
    h.app.navigate(Page::My);

    // Switch user before the u1 result is applied.
    h.sign_in_as("u2").await;

    // Drain whatever is still queued; none of it may reach the My container.
    while let Ok(event) = h.rx.try_recv() {
        formulary::ui::handle_app_event(&mut h.app, event);
    }
    assert_eq!(h.app.my, FeedContainer::Untouched);
}

#[tokio::test]
async fn test_sign_in_clears_sign_in_notice() {
    let mut h = harness().await;
    h.app.set_active_page("my");
    assert_eq!(h.app.notice, Some(SIGN_IN_REQUIRED));

    h.sign_in_as("u1").await;
    assert_eq!(h.app.notice, None);
}

// ============================================================================
// Theme
// ============================================================================

#[tokio::test]
async fn test_dark_theme_survives_restart() {
    let path = std::env::temp_dir().join(format!(
        "formulary_theme_restart_{}.db",
        std::process::id()
    ));
    let path_str = path.to_str().unwrap().to_string();
    let _ = std::fs::remove_file(&path);

    {
        let db = Database::open(&path_str).await.unwrap();
        let mut h = harness_with_db(db).await;
        assert!(!h.app.view.theme_dark);
        h.app.set_theme(true).await;
        h.db.close().await;
    }

    let db = Database::open(&path_str).await.unwrap();
    assert_eq!(
        db.get_preference(THEME_PREF_KEY).await.unwrap().as_deref(),
        Some("dark")
    );
    assert!(ThemeStore::new(Arc::new(db.clone())).load_theme().await);

    let h = harness_with_db(db).await;
    assert!(h.app.view.theme_dark);

    let _ = std::fs::remove_file(&path);
}
