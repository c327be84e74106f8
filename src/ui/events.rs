//! Application event handling.
//!
//! Routes background task results into the view controller.

use crate::app::{App, AppEvent};

/// Apply one background event to the application state.
pub fn handle_app_event(app: &mut App, event: AppEvent) {
    app.needs_redraw = true;

    match event {
        AppEvent::FeedLoaded {
            kind,
            generation,
            result,
        } => app.on_feed_loaded(kind, generation, result),
        AppEvent::SessionChanged(session) => app.on_session_changed(session),
        AppEvent::SignInFinished(result) => app.on_sign_in_finished(result),
        AppEvent::SignOutFinished(result) => app.on_sign_out_finished(result),
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task = task, error = %error, "Background task panicked");
            if task == "sign_in" {
                app.sign_in = None;
            }
            app.set_status(format!("Internal error in {}: {}", task, error));
        }
    }
}
